mod util;

use lumen_wallet::blockchain::stellar::transaction::Memo;
use lumen_wallet::blockchain::stellar::Keypair;
use lumen_wallet::core::errors::WalletError;
use lumen_wallet::core::KeyStore;
use lumen_wallet::service::{PaymentRequest, SendGuard, SendSettings, SendStage, SendWorkflow};
use pretty_assertions::assert_eq;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use util::{snapshot, MockLedger, DESTINATION, SECRET, SOURCE, START_SEQUENCE};

// 1250.75 XLM with two subentries: spendable 1248.75
const BALANCE: i64 = 12_507_500_000;

fn workflow(ledger: &Arc<MockLedger>) -> SendWorkflow {
    SendWorkflow::new(ledger.clone(), SendSettings::default())
}

fn keys() -> KeyStore {
    let store = KeyStore::new();
    store.import_secret(SECRET).unwrap();
    store
}

#[tokio::test]
async fn successful_send_reaches_the_ledger() {
    let ledger = Arc::new(MockLedger::new(snapshot(BALANCE, 2)));
    let wf = workflow(&ledger);

    let request = PaymentRequest::new(DESTINATION, "1").with_memo("Test payment");
    let result = wf.send(&keys(), request).await.unwrap();

    let accepted = ledger.accepted();
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].sequence, START_SEQUENCE + 1);
    assert_eq!(accepted[0].amount, 10_000_000);
    assert_eq!(accepted[0].fee, 150);
    assert_eq!(accepted[0].destination, DESTINATION);
    assert_eq!(accepted[0].memo, Memo::Text("Test payment".into()));
    assert_eq!(result.hash, accepted[0].hash);
    assert_eq!(result.ledger, 1_001);

    let state = wf.state();
    assert_eq!(state.stage, SendStage::Success);
    assert!(state.success);
    assert!(!state.is_loading);
    assert_eq!(state.error, None);
    assert_eq!(state.result, Some(result));

    assert!(wf.acknowledge());
    assert_eq!(wf.state().stage, SendStage::Idle);
    assert!(!wf.acknowledge());
}

#[tokio::test]
async fn empty_memo_sends_without_memo() {
    let ledger = Arc::new(MockLedger::new(snapshot(BALANCE, 2)));
    let wf = workflow(&ledger);
    wf.send(&keys(), PaymentRequest::new(DESTINATION, "2.5").with_memo("")).await.unwrap();
    assert_eq!(ledger.accepted()[0].memo, Memo::None);
}

#[tokio::test]
async fn empty_key_store_is_not_ready() {
    let ledger = Arc::new(MockLedger::new(snapshot(BALANCE, 2)));
    let wf = workflow(&ledger);

    let failure = wf.send(&KeyStore::new(), PaymentRequest::new(DESTINATION, "1")).await.unwrap_err();
    assert!(matches!(failure.error, WalletError::WalletNotReady));
    assert_eq!(failure.stage, SendStage::Validating);
    assert_eq!(ledger.loads.load(Ordering::SeqCst), 0);
    assert_eq!(wf.state().stage, SendStage::Failed);
}

#[tokio::test]
async fn invalid_input_never_touches_the_network() {
    let ledger = Arc::new(MockLedger::new(snapshot(BALANCE, 2)));
    let wf = workflow(&ledger);

    for request in [
        PaymentRequest::new("GINVALID", "1"),
        PaymentRequest::new(DESTINATION, "-3"),
        PaymentRequest::new(DESTINATION, "abc"),
        PaymentRequest::new(DESTINATION, "0.123456789"),
        PaymentRequest::new(DESTINATION, "1").with_memo("a memo that is longer than 28 bytes"),
    ] {
        let failure = wf.send(&keys(), request).await.unwrap_err();
        assert!(matches!(failure.error, WalletError::InvalidInput(_)), "{:?}", failure.error);
        assert_eq!(failure.stage, SendStage::Validating);
    }
    assert_eq!(ledger.loads.load(Ordering::SeqCst), 0);
    assert_eq!(ledger.submissions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn spend_limit_counts_reserve_and_fee() {
    let ledger = Arc::new(MockLedger::new(snapshot(BALANCE, 2)).without_fee_stats());
    let wf = workflow(&ledger);

    // 1248.75 plus the 100 stroop fee is one fee over the limit
    let failure = wf.send(&keys(), PaymentRequest::new(DESTINATION, "1248.75")).await.unwrap_err();
    assert_eq!(failure.stage, SendStage::Building);
    assert!(matches!(
        failure.error,
        WalletError::InsufficientBalance { required: 12_487_500_100, spendable: 12_487_500_000 }
    ));
    assert_eq!(ledger.submissions.load(Ordering::SeqCst), 0);

    // exactly spendable once the fee is included
    wf.send(&keys(), PaymentRequest::new(DESTINATION, "1248.74999")).await.unwrap();
    assert_eq!(ledger.accepted()[0].amount, 12_487_499_900);
}

#[tokio::test]
async fn reserve_check_can_be_disabled() {
    let ledger = Arc::new(MockLedger::new(snapshot(BALANCE, 2)));
    let settings = SendSettings { enforce_reserve_check: false, ..SendSettings::default() };
    let wf = SendWorkflow::new(ledger.clone(), settings);

    wf.send(&keys(), PaymentRequest::new(DESTINATION, "1250")).await.unwrap();
    assert_eq!(ledger.accepted().len(), 1);
}

#[tokio::test]
async fn fee_lookup_failure_uses_fallback() {
    let ledger = Arc::new(MockLedger::new(snapshot(BALANCE, 0)).without_fee_stats());
    let wf = workflow(&ledger);

    wf.send(&keys(), PaymentRequest::new(DESTINATION, "1")).await.unwrap();
    assert_eq!(ledger.accepted()[0].fee, 100);

    let recommended = wf.recommended_fee().await;
    assert!(recommended.is_fallback());
    assert_eq!(recommended.fee, 100);
}

#[tokio::test]
async fn configured_fallback_fee_is_used() {
    let ledger = Arc::new(MockLedger::new(snapshot(BALANCE, 0)).without_fee_stats());
    let settings = SendSettings { fallback_fee: 250, ..SendSettings::default() };
    let wf = SendWorkflow::new(ledger.clone(), settings);

    wf.send(&keys(), PaymentRequest::new(DESTINATION, "1")).await.unwrap();
    assert_eq!(ledger.accepted()[0].fee, 250);
}

#[tokio::test]
async fn recommended_fee_is_p90() {
    let ledger = Arc::new(MockLedger::new(snapshot(BALANCE, 0)));
    let recommended = workflow(&ledger).recommended_fee().await;
    assert!(!recommended.is_fallback());
    assert_eq!(recommended.fee, 400);
}

#[tokio::test]
async fn bad_sequence_rejection_keeps_result_code() {
    let ledger = Arc::new(MockLedger::new(snapshot(BALANCE, 2)).rejecting("tx_bad_seq", &[]));
    let wf = workflow(&ledger);

    let failure = wf.send(&keys(), PaymentRequest::new(DESTINATION, "1")).await.unwrap_err();
    assert_eq!(failure.stage, SendStage::Submitting);
    assert_eq!(
        failure.to_string(),
        "Transaction failed: tx_bad_seq (sequence number does not match the account)"
    );
    let codes = failure.error.result_codes().unwrap();
    assert_eq!(codes.transaction.as_deref(), Some("tx_bad_seq"));

    let state = wf.state();
    assert_eq!(state.stage, SendStage::Failed);
    assert!(!state.success);
    assert_eq!(state.error.as_deref(), Some(failure.to_string().as_str()));
    // one attempt, no retry
    assert_eq!(ledger.submissions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn operation_code_explains_tx_failed() {
    let ledger = Arc::new(MockLedger::new(snapshot(BALANCE, 2)).rejecting("tx_failed", &["op_no_destination"]));
    let failure = workflow(&ledger).send(&keys(), PaymentRequest::new(DESTINATION, "1")).await.unwrap_err();
    assert_eq!(
        failure.to_string(),
        "Transaction failed: tx_failed / op_no_destination (destination account does not exist)"
    );
}

#[tokio::test]
async fn missing_account_fails_fetch_stage() {
    let ledger = Arc::new(MockLedger::new(snapshot(BALANCE, 2)));
    *ledger.account.lock() = None;
    let wf = workflow(&ledger);

    let failure = wf.send(&keys(), PaymentRequest::new(DESTINATION, "1")).await.unwrap_err();
    assert_eq!(failure.stage, SendStage::FetchingAccount);
    assert!(matches!(failure.error, WalletError::NetworkFetchFailure(_)));
    assert_eq!(ledger.submissions.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overlapping_sends_use_consecutive_sequences() {
    let ledger = Arc::new(MockLedger::new(snapshot(BALANCE, 2)).with_submit_delay(Duration::from_millis(50)));
    let wf = Arc::new(workflow(&ledger));
    let keypair = Arc::new(Keypair::from_secret(SECRET).unwrap());

    let tasks: Vec<_> = ["1", "2", "3"]
        .into_iter()
        .map(|amount| {
            let wf = Arc::clone(&wf);
            let keypair = Arc::clone(&keypair);
            tokio::spawn(async move { wf.send_with(&keypair, PaymentRequest::new(DESTINATION, amount)).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let mut sequences: Vec<i64> = ledger.accepted().iter().map(|a| a.sequence).collect();
    sequences.sort_unstable();
    assert_eq!(sequences, vec![START_SEQUENCE + 1, START_SEQUENCE + 2, START_SEQUENCE + 3]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn workflows_sharing_a_guard_serialize() {
    let ledger = Arc::new(MockLedger::new(snapshot(BALANCE, 2)).with_submit_delay(Duration::from_millis(50)));
    let guard = SendGuard::new();
    let a = workflow(&ledger).with_guard(guard.clone());
    let b = workflow(&ledger).with_guard(guard);
    let keys = keys();

    let (ra, rb) = tokio::join!(
        a.send(&keys, PaymentRequest::new(DESTINATION, "1")),
        b.send(&keys, PaymentRequest::new(DESTINATION, "1"))
    );
    assert!(ra.is_ok() && rb.is_ok());
    assert_eq!(ledger.accepted().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn subscribers_see_stages_in_order() {
    let ledger = Arc::new(MockLedger::new(snapshot(BALANCE, 2)).with_submit_delay(Duration::from_millis(20)));
    let wf = workflow(&ledger);
    let mut rx = wf.subscribe();

    let watcher = tokio::spawn(async move {
        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            let stage = state.stage;
            if stage != SendStage::Success {
                assert!(state.is_loading);
            }
            seen.push(stage);
            if stage.is_terminal() {
                break;
            }
        }
        seen
    });

    wf.send(&keys(), PaymentRequest::new(DESTINATION, "1")).await.unwrap();
    let seen = tokio::time::timeout(Duration::from_secs(5), watcher).await.unwrap().unwrap();

    let order = [
        SendStage::Validating,
        SendStage::FetchingAccount,
        SendStage::EstimatingFee,
        SendStage::Building,
        SendStage::Signing,
        SendStage::Submitting,
        SendStage::Success,
    ];
    let positions: Vec<usize> = seen
        .iter()
        .map(|s| order.iter().position(|o| o == s).expect("unexpected stage"))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] <= w[1]), "{:?}", seen);
    assert_eq!(seen.last(), Some(&SendStage::Success));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn queued_send_does_not_clobber_the_one_in_flight() {
    let ledger = Arc::new(MockLedger::new(snapshot(BALANCE, 2)).with_submit_delay(Duration::from_millis(200)));
    let wf = Arc::new(workflow(&ledger));
    let keypair = Arc::new(Keypair::from_secret(SECRET).unwrap());
    let mut events = wf.events();

    let spawn_send = |amount: &'static str| {
        let wf = Arc::clone(&wf);
        let keypair = Arc::clone(&keypair);
        tokio::spawn(async move { wf.send_with(&keypair, PaymentRequest::new(DESTINATION, amount)).await })
    };

    let first = spawn_send("1");
    tokio::time::timeout(Duration::from_secs(5), async {
        while wf.state().stage != SendStage::Submitting {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    let second = spawn_send("2");
    tokio::time::sleep(Duration::from_millis(50)).await;
    // the queued send has not published anything yet
    assert_eq!(wf.state().stage, SendStage::Submitting);
    assert_eq!(ledger.submissions.load(Ordering::SeqCst), 1);

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    let mut seen = Vec::new();
    while let Ok(state) = events.try_recv() {
        seen.push(state.stage);
    }
    let run = [
        SendStage::Validating,
        SendStage::FetchingAccount,
        SendStage::EstimatingFee,
        SendStage::Building,
        SendStage::Signing,
        SendStage::Submitting,
        SendStage::Success,
    ];
    let expected: Vec<SendStage> = run.iter().chain(run.iter()).copied().collect();
    assert_eq!(seen, expected);

    assert_eq!(wf.state().stage, SendStage::Success);
    assert!(wf.acknowledge());
    assert_eq!(wf.state().stage, SendStage::Idle);
}

#[tokio::test]
async fn events_report_failures_and_acknowledgement() {
    let ledger = Arc::new(MockLedger::new(snapshot(BALANCE, 2)).rejecting("tx_bad_seq", &[]));
    let wf = workflow(&ledger);
    let mut events = wf.events();

    let failure = wf.send(&keys(), PaymentRequest::new(DESTINATION, "1")).await.unwrap_err();
    assert_eq!(failure.stage, SendStage::Submitting);
    assert!(wf.acknowledge());
    assert!(!wf.acknowledge());

    let mut seen = Vec::new();
    while let Ok(state) = events.try_recv() {
        seen.push(state);
    }
    let failed = &seen[seen.len() - 2];
    assert_eq!(failed.stage, SendStage::Failed);
    assert!(!failed.is_loading);
    assert!(failed.error.as_deref().unwrap_or_default().contains("tx_bad_seq"));
    assert_eq!(seen.last().map(|s| s.stage), Some(SendStage::Idle));
}

#[tokio::test]
async fn balance_summary_reports_spendable() {
    let ledger = Arc::new(MockLedger::new(snapshot(BALANCE, 2)));
    let summary = workflow(&ledger).balance_summary(SOURCE).await.unwrap();
    assert_eq!(summary.spendable, 12_487_500_000);
    assert_eq!(summary.to_string(), "balance 1250.75 XLM, reserve 2 XLM, spendable 1248.75 XLM");
}
