//! Stellar payment transactions
//!
//! Builds single-payment transactions, hashes them for a network, signs
//! them into envelopes and serializes envelopes to base64 XDR. Wire types
//! come from `stellar-xdr`.

use super::account::{verify_signature, Keypair};
use super::address::{decode_check, VersionByte};
use super::network::Network;
use super::types::{AccountSnapshot, BalanceSummary};
use crate::core::errors::WalletError;
use crate::core::validation::validate_memo;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use std::time::Duration;
use stellar_xdr::curr::{self as xdr, Limits, WriteXdr};
use tracing::debug;

/// Default validity window for a built transaction.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

fn xdr_error(e: xdr::Error) -> WalletError {
    WalletError::UnknownFailure(format!("XDR encoding failed: {}", e))
}

fn muxed_account(key: &[u8; 32]) -> xdr::MuxedAccount {
    xdr::MuxedAccount::Ed25519(xdr::Uint256(*key))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Memo {
    None,
    Text(String),
}

impl Memo {
    /// `None` and empty strings both mean "no memo".
    pub fn from_optional(memo: Option<&str>) -> Result<Self, WalletError> {
        match memo {
            None | Some("") => Ok(Memo::None),
            Some(text) => {
                validate_memo(Some(text))?;
                Ok(Memo::Text(text.to_string()))
            }
        }
    }

    fn as_xdr(&self) -> Result<xdr::Memo, WalletError> {
        match self {
            Memo::None => Ok(xdr::Memo::None),
            Memo::Text(text) => Ok(xdr::Memo::Text(text.as_bytes().to_vec().try_into().map_err(xdr_error)?)),
        }
    }
}

/// Unix-seconds validity window; `max_time == 0` would mean unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

/// Native-asset payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOperation {
    pub destination: String,
    destination_key: [u8; 32],
    /// stroops
    pub amount: i64,
}

impl PaymentOperation {
    fn as_xdr(&self) -> xdr::Operation {
        xdr::Operation {
            source_account: None,
            body: xdr::OperationBody::Payment(xdr::PaymentOp {
                destination: muxed_account(&self.destination_key),
                asset: xdr::Asset::Native,
                amount: self.amount,
            }),
        }
    }
}

/// Parameters shared by every payment the wallet builds.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Per-operation fee in stroops.
    pub fee: u32,
    pub network: Network,
    pub timeout: Duration,
}

impl BuildOptions {
    pub fn new(fee: u32, network: Network) -> Self {
        Self { fee, network, timeout: DEFAULT_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// An unsigned transaction. Consumed by [`Transaction::sign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    source_account: String,
    source_key: [u8; 32],
    fee: u32,
    sequence: i64,
    time_bounds: TimeBounds,
    memo: Memo,
    operations: Vec<PaymentOperation>,
    network: Network,
    hash: [u8; 32],
}

impl Transaction {
    pub fn source_account(&self) -> &str {
        &self.source_account
    }

    /// Total fee in stroops (per-operation fee times operation count).
    pub fn fee(&self) -> u32 {
        self.fee
    }

    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    pub fn time_bounds(&self) -> TimeBounds {
        self.time_bounds
    }

    pub fn memo(&self) -> &Memo {
        &self.memo
    }

    pub fn operations(&self) -> &[PaymentOperation] {
        &self.operations
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// SHA-256 of the signature payload: network id, envelope type, tx body.
    pub fn hash(&self) -> [u8; 32] {
        self.hash
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// XDR of the transaction body alone.
    pub fn to_xdr(&self) -> Result<Vec<u8>, WalletError> {
        self.as_xdr()?.to_xdr(Limits::none()).map_err(xdr_error)
    }

    fn as_xdr(&self) -> Result<xdr::Transaction, WalletError> {
        let operations: Vec<xdr::Operation> = self.operations.iter().map(PaymentOperation::as_xdr).collect();
        Ok(xdr::Transaction {
            source_account: muxed_account(&self.source_key),
            fee: self.fee,
            seq_num: xdr::SequenceNumber(self.sequence),
            cond: xdr::Preconditions::Time(xdr::TimeBounds {
                min_time: xdr::TimePoint(self.time_bounds.min_time),
                max_time: xdr::TimePoint(self.time_bounds.max_time),
            }),
            memo: self.memo.as_xdr()?,
            operations: operations.try_into().map_err(xdr_error)?,
            ext: xdr::TransactionExt::V0,
        })
    }

    fn signature_payload_hash(&self) -> Result<[u8; 32], WalletError> {
        let payload = xdr::TransactionSignaturePayload {
            network_id: xdr::Hash(self.network.network_id()),
            tagged_transaction: xdr::TransactionSignaturePayloadTaggedTransaction::Tx(self.as_xdr()?),
        };
        let bytes = payload.to_xdr(Limits::none()).map_err(xdr_error)?;
        Ok(Sha256::digest(bytes).into())
    }

    /// Signs with the source keypair. A keypair for any other account is
    /// refused: the envelope carries exactly one signature, the source's.
    pub fn sign(self, keypair: &Keypair) -> Result<SignedEnvelope, WalletError> {
        if keypair.public_key() != self.source_account {
            return Err(WalletError::InvalidInput(format!(
                "Signer {} is not the transaction source {}",
                keypair.public_key(),
                self.source_account
            )));
        }
        let signature = DecoratedSignature { hint: keypair.signature_hint(), signature: keypair.sign(&self.hash) };

        let envelope = xdr::TransactionEnvelope::Tx(xdr::TransactionV1Envelope {
            tx: self.as_xdr()?,
            signatures: vec![signature.as_xdr()?].try_into().map_err(xdr_error)?,
        });
        let envelope_xdr = envelope.to_xdr(Limits::none()).map_err(xdr_error)?;

        debug!(hash = %self.hash_hex(), "Transaction signed");
        let hash = self.hash;
        Ok(SignedEnvelope { tx: self, signature, hash, envelope_xdr })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratedSignature {
    pub hint: [u8; 4],
    pub signature: [u8; 64],
}

impl DecoratedSignature {
    fn as_xdr(&self) -> Result<xdr::DecoratedSignature, WalletError> {
        Ok(xdr::DecoratedSignature {
            hint: xdr::SignatureHint(self.hint),
            signature: xdr::Signature(self.signature.to_vec().try_into().map_err(xdr_error)?),
        })
    }
}

/// A signed transaction ready for submission. Immutable: resubmitting after
/// a failure means building a new transaction from a fresh account snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    tx: Transaction,
    signature: DecoratedSignature,
    hash: [u8; 32],
    envelope_xdr: Vec<u8>,
}

impl SignedEnvelope {
    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    pub fn signatures(&self) -> &[DecoratedSignature] {
        std::slice::from_ref(&self.signature)
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Checks the signature against the source account's key.
    pub fn verify(&self) -> bool {
        verify_signature(&self.tx.source_key, &self.hash, &self.signature.signature)
    }

    /// `TransactionEnvelope` XDR bytes.
    pub fn to_xdr(&self) -> &[u8] {
        &self.envelope_xdr
    }

    pub fn to_xdr_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.envelope_xdr)
    }
}

/// Computes the spendable balance and rejects `amount + fee` above it.
pub fn check_spendable(
    account: &AccountSnapshot,
    amount: i64,
    fee: u32,
    base_reserve: i64,
) -> Result<BalanceSummary, WalletError> {
    let summary = account.balance_summary(base_reserve);
    summary.ensure_can_send(amount, fee)?;
    Ok(summary)
}

/// Builds an unsigned payment using the current wall clock for time bounds.
pub fn build_payment(
    account: &AccountSnapshot,
    destination: &str,
    amount: i64,
    memo: Option<&str>,
    options: &BuildOptions,
) -> Result<Transaction, WalletError> {
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    build_payment_at(account, destination, amount, memo, options, now)
}

/// Builds an unsigned payment with an explicit clock (`now`, unix seconds).
/// Performs no I/O.
pub fn build_payment_at(
    account: &AccountSnapshot,
    destination: &str,
    amount: i64,
    memo: Option<&str>,
    options: &BuildOptions,
    now: u64,
) -> Result<Transaction, WalletError> {
    if amount <= 0 {
        return Err(WalletError::InvalidInput("Amount must be a positive number".to_string()));
    }
    if options.fee == 0 {
        return Err(WalletError::InvalidInput("Fee must be at least one stroop".to_string()));
    }
    let source_key = decode_check(VersionByte::AccountId, &account.account_id)?;
    let destination_key = decode_check(VersionByte::AccountId, destination)
        .map_err(|_| WalletError::InvalidInput("Invalid destination address".to_string()))?;
    let memo = Memo::from_optional(memo)?;

    let sequence = account.sequence.checked_add(1).ok_or_else(|| {
        WalletError::InvalidInput(format!("Sequence number overflow for {}", account.account_id))
    })?;

    let operations = vec![PaymentOperation {
        destination: destination.to_string(),
        destination_key,
        amount,
    }];
    let fee = options
        .fee
        .checked_mul(operations.len() as u32)
        .ok_or_else(|| WalletError::InvalidInput("Fee overflow".to_string()))?;

    let mut tx = Transaction {
        source_account: account.account_id.clone(),
        source_key,
        fee,
        sequence,
        time_bounds: TimeBounds { min_time: 0, max_time: now.saturating_add(options.timeout.as_secs()) },
        memo,
        operations,
        network: options.network.clone(),
        hash: [0u8; 32],
    };
    tx.hash = tx.signature_payload_hash()?;
    Ok(tx)
}
