use super::account::Keypair;
use super::transaction::{SignedEnvelope, Transaction};
use super::types::SubmissionResult;
use crate::blockchain::traits::BlockchainClient;
use crate::core::errors::WalletError;
use tracing::{error, info};

/// Signs with the source account's keypair.
pub fn sign(transaction: Transaction, keypair: &Keypair) -> Result<SignedEnvelope, WalletError> {
    let envelope = transaction.sign(keypair)?;
    info!(
        hash = %envelope.hash_hex(),
        sequence = envelope.transaction().sequence(),
        "Signed transaction"
    );
    Ok(envelope)
}

/// Submits once. No retry: a rejected sequence number needs a fresh
/// account snapshot, so the caller starts over instead.
pub async fn submit(
    client: &dyn BlockchainClient,
    envelope: &SignedEnvelope,
) -> Result<SubmissionResult, WalletError> {
    match client.submit_transaction(envelope).await {
        Ok(result) => Ok(result),
        Err(e) => {
            error!("Submission of {} to {} failed: {}", envelope.hash_hex(), client.endpoint(), e);
            Err(e)
        }
    }
}

pub async fn sign_and_submit(
    client: &dyn BlockchainClient,
    transaction: Transaction,
    keypair: &Keypair,
) -> Result<SubmissionResult, WalletError> {
    let envelope = sign(transaction, keypair)?;
    submit(client, &envelope).await
}
