use async_trait::async_trait;

use crate::blockchain::stellar::transaction::SignedEnvelope;
use crate::blockchain::stellar::types::{AccountSnapshot, FeeStats, SubmissionResult};
use crate::core::errors::WalletError;

/// The three ledger calls a payment needs. Implemented over HTTP by
/// [`HorizonClient`](crate::blockchain::stellar::HorizonClient); tests plug
/// in their own.
#[async_trait]
pub trait BlockchainClient: Send + Sync {
    /// Fetches the current account state (sequence, balances, subentries).
    async fn load_account(&self, account_id: &str) -> Result<AccountSnapshot, WalletError>;

    /// Fetches the recent fee distribution.
    async fn fee_stats(&self) -> Result<FeeStats, WalletError>;

    /// Submits a signed envelope once. Rejections carry the network's
    /// result codes.
    async fn submit_transaction(
        &self,
        envelope: &SignedEnvelope,
    ) -> Result<SubmissionResult, WalletError>;

    /// Human-readable endpoint name for logs.
    fn endpoint(&self) -> &str;
}
