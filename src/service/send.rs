//! Send workflow: validate, fetch, estimate, build, sign, submit.
//!
//! Every attempt walks the stages in order and stops at the first failure.
//! Progress is published as a [`SendState`]: the latest value on a watch
//! channel, every transition on a broadcast channel. Sends on one workflow
//! run one at a time, so a queued send never overwrites the state of the
//! send in flight.

use crate::blockchain::stellar::account::Keypair;
use crate::blockchain::stellar::fee::{FeeEstimate, FeeEstimator, FeePercentile};
use crate::blockchain::stellar::network::Network;
use crate::blockchain::stellar::submit::{sign, submit};
use crate::blockchain::stellar::transaction::{build_payment, check_spendable, BuildOptions, DEFAULT_TIMEOUT};
use crate::blockchain::stellar::types::{BalanceSummary, SubmissionResult, DEFAULT_BASE_RESERVE_STROOPS};
use crate::blockchain::traits::BlockchainClient;
use crate::core::amount::{format_xlm, parse_xlm};
use crate::core::config::WalletConfig;
use crate::core::errors::WalletError;
use crate::core::key_store::KeyStore;
use crate::core::validation::{validate_address, validate_amount, validate_memo};
use crate::service::guard::SendGuard;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, watch, Mutex as AsyncMutex};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SendStage {
    #[default]
    Idle,
    Validating,
    FetchingAccount,
    EstimatingFee,
    Building,
    Signing,
    Submitting,
    Success,
    Failed,
}

impl SendStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, SendStage::Success | SendStage::Failed)
    }
}

impl fmt::Display for SendStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SendStage::Idle => "idle",
            SendStage::Validating => "validating",
            SendStage::FetchingAccount => "fetching account",
            SendStage::EstimatingFee => "estimating fee",
            SendStage::Building => "building",
            SendStage::Signing => "signing",
            SendStage::Submitting => "submitting",
            SendStage::Success => "success",
            SendStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Observable progress of the current (or last) send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SendState {
    pub stage: SendStage,
    pub is_loading: bool,
    pub error: Option<String>,
    pub success: bool,
    pub result: Option<SubmissionResult>,
}

impl SendState {
    fn in_progress(stage: SendStage) -> Self {
        Self { stage, is_loading: true, ..Default::default() }
    }

    fn failed(error: &WalletError) -> Self {
        Self { stage: SendStage::Failed, error: Some(error.to_string()), ..Default::default() }
    }

    fn succeeded(result: SubmissionResult) -> Self {
        Self { stage: SendStage::Success, success: true, result: Some(result), ..Default::default() }
    }
}

/// A failed send, tagged with the stage that failed.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct SendFailure {
    pub stage: SendStage,
    #[source]
    pub error: WalletError,
}

/// What the user asked to send. Amount is a decimal XLM string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub destination: String,
    pub amount: String,
    pub memo: Option<String>,
}

impl PaymentRequest {
    pub fn new(destination: impl Into<String>, amount: impl Into<String>) -> Self {
        Self { destination: destination.into(), amount: amount.into(), memo: None }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    /// Checks address, then amount, then memo. Returns the amount in stroops.
    pub fn validate(&self) -> Result<i64, WalletError> {
        if !validate_address(&self.destination) {
            return Err(WalletError::InvalidInput("Invalid destination address".to_string()));
        }
        if !validate_amount(&self.amount) {
            return Err(WalletError::InvalidInput("Amount must be a positive number".to_string()));
        }
        let stroops = parse_xlm(&self.amount)?;
        validate_memo(self.memo.as_deref())?;
        Ok(stroops)
    }
}

/// Knobs the workflow needs, resolved from [`WalletConfig`].
#[derive(Debug, Clone)]
pub struct SendSettings {
    pub network: Network,
    pub fallback_fee: u32,
    pub base_reserve: i64,
    pub timeout: Duration,
    pub enforce_reserve_check: bool,
}

impl Default for SendSettings {
    fn default() -> Self {
        Self {
            network: Network::testnet(),
            fallback_fee: crate::blockchain::stellar::fee::BASE_FEE_STROOPS,
            base_reserve: DEFAULT_BASE_RESERVE_STROOPS,
            timeout: DEFAULT_TIMEOUT,
            enforce_reserve_check: true,
        }
    }
}

impl SendSettings {
    pub fn from_config(config: &WalletConfig) -> Result<Self, WalletError> {
        Ok(Self {
            network: config.network()?,
            fallback_fee: config.fees.fallback_fee_stroops,
            base_reserve: config.fees.base_reserve_stroops,
            timeout: config.transaction_timeout(),
            enforce_reserve_check: config.transaction.enforce_reserve_check,
        })
    }
}

/// Buffered transitions per [`SendWorkflow::events`] receiver.
const EVENT_CAPACITY: usize = 64;

pub struct SendWorkflow {
    client: Arc<dyn BlockchainClient>,
    settings: SendSettings,
    fees: FeeEstimator,
    guard: SendGuard,
    // held for a whole send, from validation to the terminal state
    active: AsyncMutex<()>,
    state: watch::Sender<SendState>,
    events: broadcast::Sender<SendState>,
}

impl SendWorkflow {
    pub fn new(client: Arc<dyn BlockchainClient>, settings: SendSettings) -> Self {
        let fees = FeeEstimator::new(settings.fallback_fee);
        let (state, _) = watch::channel(SendState::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { client, settings, fees, guard: SendGuard::new(), active: AsyncMutex::new(()), state, events }
    }

    /// Shares a guard with other workflows sending from the same accounts.
    pub fn with_guard(mut self, guard: SendGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn settings(&self) -> &SendSettings {
        &self.settings
    }

    pub fn network(&self) -> &Network {
        &self.settings.network
    }

    pub fn subscribe(&self) -> watch::Receiver<SendState> {
        self.state.subscribe()
    }

    /// Every state transition, in order. Unlike [`subscribe`](Self::subscribe)
    /// nothing is coalesced, so a terminal state is seen even when the next
    /// send starts right after it.
    pub fn events(&self) -> broadcast::Receiver<SendState> {
        self.events.subscribe()
    }

    pub fn state(&self) -> SendState {
        self.state.borrow().clone()
    }

    /// Returns a finished send to `Idle`. No-op while a send is running.
    pub fn acknowledge(&self) -> bool {
        let reset = self.state.send_if_modified(|state| {
            if state.stage.is_terminal() {
                *state = SendState::default();
                true
            } else {
                false
            }
        });
        if reset {
            let _ = self.events.send(SendState::default());
        }
        reset
    }

    /// Sends with the key store's active keypair.
    pub async fn send(&self, keys: &KeyStore, request: PaymentRequest) -> Result<SubmissionResult, SendFailure> {
        let _active = self.active.lock().await;
        self.enter(SendStage::Validating);
        let keypair = keys.current().map_err(|e| self.fail(SendStage::Validating, e))?;
        self.run(&keypair, request).await
    }

    /// Waits for any send already running on this workflow, then sends.
    pub async fn send_with(&self, keypair: &Keypair, request: PaymentRequest) -> Result<SubmissionResult, SendFailure> {
        let _active = self.active.lock().await;
        self.enter(SendStage::Validating);
        self.run(keypair, request).await
    }

    async fn run(&self, keypair: &Keypair, request: PaymentRequest) -> Result<SubmissionResult, SendFailure> {
        let amount = request.validate().map_err(|e| self.fail(SendStage::Validating, e))?;
        info!(
            from = keypair.public_key(),
            to = %request.destination,
            amount = %format_xlm(amount),
            "Sending payment"
        );

        let _permit = self.guard.acquire(keypair.public_key()).await;

        self.enter(SendStage::FetchingAccount);
        let account = self
            .client
            .load_account(keypair.public_key())
            .await
            .map_err(|e| self.fail(SendStage::FetchingAccount, e))?;

        self.enter(SendStage::EstimatingFee);
        let fee = self.fees.estimate(self.client.as_ref(), FeePercentile::P50).await;
        if fee.is_fallback() {
            warn!("Submitting with fallback fee of {} stroops", fee.fee);
        }

        self.enter(SendStage::Building);
        if self.settings.enforce_reserve_check {
            let summary = check_spendable(&account, amount, fee.fee, self.settings.base_reserve)
                .map_err(|e| self.fail(SendStage::Building, e))?;
            info!("Pre-check passed: {}", summary);
        }
        let options = BuildOptions::new(fee.fee, self.settings.network.clone()).with_timeout(self.settings.timeout);
        let transaction = build_payment(&account, &request.destination, amount, request.memo.as_deref(), &options)
            .map_err(|e| self.fail(SendStage::Building, e))?;

        self.enter(SendStage::Signing);
        let envelope = sign(transaction, keypair).map_err(|e| self.fail(SendStage::Signing, e))?;

        self.enter(SendStage::Submitting);
        let result = submit(self.client.as_ref(), &envelope)
            .await
            .map_err(|e| self.fail(SendStage::Submitting, e))?;

        info!(hash = %result.hash, ledger = result.ledger, "Payment succeeded");
        self.publish(SendState::succeeded(result.clone()));
        Ok(result)
    }

    /// P90 fee for display; falls back like the send path does.
    pub async fn recommended_fee(&self) -> FeeEstimate {
        self.fees.estimate(self.client.as_ref(), FeePercentile::P90).await
    }

    pub async fn balance_summary(&self, account_id: &str) -> Result<BalanceSummary, WalletError> {
        let account = self.client.load_account(account_id).await?;
        Ok(account.balance_summary(self.settings.base_reserve))
    }

    fn publish(&self, state: SendState) {
        self.state.send_replace(state.clone());
        // no event subscribers is fine
        let _ = self.events.send(state);
    }

    fn enter(&self, stage: SendStage) {
        info!("Send stage: {}", stage);
        self.publish(SendState::in_progress(stage));
    }

    fn fail(&self, stage: SendStage, error: WalletError) -> SendFailure {
        error!(stage = %stage, kind = error.kind(), "Send failed: {}", error);
        self.publish(SendState::failed(&error));
        SendFailure { stage, error }
    }
}
