// tests/util.rs
// Shared fixtures and an in-memory ledger for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use lumen_wallet::blockchain::stellar::transaction::{Memo, SignedEnvelope};
use lumen_wallet::blockchain::stellar::types::{
    AccountSnapshot, Balance, FeeDistribution, FeeStats, SubmissionResult,
};
use lumen_wallet::blockchain::BlockchainClient;
use lumen_wallet::core::errors::{ResultCodes, WalletError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Funded testnet account used by the harness.
pub const SECRET: &str = "SDLCVG2JJUJ67OHYQHYXRTAA5UKOKIQ2DKWUXUKSNQYPAJD6CKQGO3JM";
pub const SOURCE: &str = "GCATSTRYXK5H7NA2C73PNZMR757YCJ5VQ7NW364SWISWAESHRAWIIU5M";
pub const DESTINATION: &str = "GBJDTATBCDDB4GPBZGQ2XICE5OFZTJQA6EHVR7XVV6KT5WRREIWPPSKE";

pub const START_SEQUENCE: i64 = 4_294_967_296;

pub fn snapshot(native_stroops: i64, subentry_count: u32) -> AccountSnapshot {
    AccountSnapshot {
        account_id: SOURCE.to_string(),
        sequence: START_SEQUENCE,
        balances: vec![Balance {
            asset_type: "native".to_string(),
            asset_code: None,
            asset_issuer: None,
            balance: native_stroops,
        }],
        subentry_count,
    }
}

pub fn fee_stats(p50: u32, p90: u32) -> FeeStats {
    FeeStats {
        last_ledger_base_fee: 100,
        fee_charged: FeeDistribution { min: 100, mode: 100, p10: 100, p50, p90, p99: p90, max: p90 },
    }
}

/// What the ledger saw for an accepted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub sequence: i64,
    pub fee: u32,
    pub amount: i64,
    pub destination: String,
    pub memo: Memo,
    pub hash: String,
}

/// Behaves like a single-account ledger: accepts an envelope only if it is
/// signed by the source and uses the next sequence number.
pub struct MockLedger {
    pub account: Mutex<Option<AccountSnapshot>>,
    pub fees: Mutex<Option<FeeStats>>,
    pub reject_with: Mutex<Option<ResultCodes>>,
    pub accepted: Mutex<Vec<Accepted>>,
    pub submit_delay: Duration,
    pub loads: AtomicUsize,
    pub submissions: AtomicUsize,
}

impl MockLedger {
    pub fn new(account: AccountSnapshot) -> Self {
        Self {
            account: Mutex::new(Some(account)),
            fees: Mutex::new(Some(fee_stats(150, 400))),
            reject_with: Mutex::new(None),
            accepted: Mutex::new(Vec::new()),
            submit_delay: Duration::ZERO,
            loads: AtomicUsize::new(0),
            submissions: AtomicUsize::new(0),
        }
    }

    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    pub fn without_fee_stats(self) -> Self {
        *self.fees.lock() = None;
        self
    }

    pub fn rejecting(self, transaction: &str, operations: &[&str]) -> Self {
        *self.reject_with.lock() = Some(ResultCodes {
            transaction: Some(transaction.to_string()),
            operations: operations.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn accepted(&self) -> Vec<Accepted> {
        self.accepted.lock().clone()
    }
}

fn bad_seq() -> WalletError {
    WalletError::SubmissionRejected {
        codes: ResultCodes { transaction: Some("tx_bad_seq".into()), operations: vec![] },
    }
}

#[async_trait]
impl BlockchainClient for MockLedger {
    async fn load_account(&self, account_id: &str) -> Result<AccountSnapshot, WalletError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        match self.account.lock().as_ref() {
            Some(acc) if acc.account_id == account_id => Ok(acc.clone()),
            _ => Err(WalletError::NetworkFetchFailure(format!(
                "Failed to load account {}: account not found (is it funded?)",
                account_id
            ))),
        }
    }

    async fn fee_stats(&self) -> Result<FeeStats, WalletError> {
        (*self.fees.lock())
            .ok_or_else(|| WalletError::NetworkFetchFailure("Failed to fetch fee stats: HTTP 503".into()))
    }

    async fn submit_transaction(&self, envelope: &SignedEnvelope) -> Result<SubmissionResult, WalletError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }
        if let Some(codes) = self.reject_with.lock().clone() {
            return Err(WalletError::SubmissionRejected { codes });
        }
        if !envelope.verify() {
            return Err(WalletError::SubmissionRejected {
                codes: ResultCodes { transaction: Some("tx_bad_auth".into()), operations: vec![] },
            });
        }

        let tx = envelope.transaction();
        let mut guard = self.account.lock();
        let account = guard.as_mut().ok_or_else(bad_seq)?;
        if tx.sequence() != account.sequence + 1 {
            return Err(bad_seq());
        }
        account.sequence = tx.sequence();

        let op = &tx.operations()[0];
        let mut accepted = self.accepted.lock();
        accepted.push(Accepted {
            sequence: tx.sequence(),
            fee: tx.fee(),
            amount: op.amount,
            destination: op.destination.clone(),
            memo: tx.memo().clone(),
            hash: envelope.hash_hex(),
        });
        Ok(SubmissionResult {
            hash: envelope.hash_hex(),
            ledger: 1_000 + accepted.len() as u32,
            envelope_xdr: Some(envelope.to_xdr_base64()),
            result_xdr: None,
        })
    }

    fn endpoint(&self) -> &str {
        "mock://ledger"
    }
}
