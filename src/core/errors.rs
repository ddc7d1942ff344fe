use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result codes returned by Horizon in `extras.result_codes` when a
/// submitted transaction is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultCodes {
    /// Top-level transaction code, e.g. `tx_bad_seq`.
    #[serde(default)]
    pub transaction: Option<String>,
    /// Per-operation codes, in operation order.
    #[serde(default)]
    pub operations: Vec<String>,
}

impl ResultCodes {
    /// The first operation-level code, if any.
    pub fn first_operation(&self) -> Option<&str> {
        self.operations.first().map(String::as_str)
    }

    /// The most specific code worth reporting: a failing operation code when
    /// the transaction code is the generic `tx_failed`, otherwise the
    /// transaction code.
    pub fn primary(&self) -> Option<&str> {
        match (self.transaction.as_deref(), self.first_operation()) {
            (Some("tx_failed"), Some(op)) if op != "op_success" => Some(op),
            (Some(tx), _) => Some(tx),
            (None, op) => op,
        }
    }
}

impl fmt::Display for ResultCodes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tx = self.transaction.as_deref();
        let op = self.first_operation();
        match (tx, op) {
            (Some(tx), Some(op)) => write!(f, "{} / {}", tx, op)?,
            (Some(tx), None) => write!(f, "{}", tx)?,
            (None, Some(op)) => write!(f, "{}", op)?,
            (None, None) => return write!(f, "unknown result code"),
        }
        if let Some(description) = self.primary().and_then(describe_result_code) {
            write!(f, " ({})", description)?;
        }
        Ok(())
    }
}

/// Human-readable meaning of the result codes a payment can hit.
pub fn describe_result_code(code: &str) -> Option<&'static str> {
    let text = match code {
        "tx_bad_seq" => "sequence number does not match the account",
        "tx_too_late" => "transaction expired before it was included in a ledger",
        "tx_too_early" => "transaction is not valid yet",
        "tx_insufficient_fee" => "fee is below the network minimum",
        "tx_insufficient_balance" => "fee would drop the account below its minimum reserve",
        "tx_no_source_account" => "source account does not exist",
        "tx_bad_auth" => "signature is missing or does not match the source account",
        "tx_bad_auth_extra" => "transaction carries unused signatures",
        "tx_missing_operation" => "transaction has no operations",
        "tx_malformed" => "transaction is malformed",
        "tx_internal_error" => "Horizon reported an internal error",
        "op_underfunded" => "not enough XLM to cover the payment",
        "op_low_reserve" => "payment would drop the account below its minimum reserve",
        "op_no_destination" => "destination account does not exist",
        "op_no_trust" => "destination does not trust this asset",
        "op_line_full" => "destination cannot hold more of this asset",
        "op_malformed" => "payment operation is malformed",
        "op_not_authorized" => "destination is not authorized to hold this asset",
        _ => return None,
    };
    Some(text)
}

/// Errors produced by the wallet while preparing or sending a payment.
#[derive(Debug, Error)]
pub enum WalletError {
    /// Bad address, amount or memo. Recovered by fixing the input.
    #[error("{0}")]
    InvalidInput(String),

    /// No keypair is loaded in the key store.
    #[error("Wallet not ready: no keypair loaded")]
    WalletNotReady,

    /// Account lookup (or another required read) failed.
    #[error("{0}")]
    NetworkFetchFailure(String),

    /// Local pre-check: amount plus fee exceeds the spendable balance.
    /// Both values are in stroops.
    #[error(
        "Insufficient balance: need {} XLM for amount and fee, spendable is {} XLM",
        xlm(.required),
        xlm(.spendable)
    )]
    InsufficientBalance { required: i64, spendable: i64 },

    /// Horizon rejected the transaction with structured result codes.
    #[error("Transaction failed: {codes}")]
    SubmissionRejected { codes: ResultCodes },

    /// Secret strkey could not be decoded into a signing key.
    #[error("Invalid secret key: {0}")]
    InvalidSecretKey(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Catch-all carrying the raw message.
    #[error("{0}")]
    UnknownFailure(String),
}

fn xlm(stroops: &i64) -> String {
    crate::core::amount::format_xlm(*stroops)
}

impl WalletError {
    /// Short machine-readable kind, stable across message wording changes.
    pub fn kind(&self) -> &'static str {
        match self {
            WalletError::InvalidInput(_) => "invalid_input",
            WalletError::WalletNotReady => "wallet_not_ready",
            WalletError::NetworkFetchFailure(_) => "network_fetch_failure",
            WalletError::InsufficientBalance { .. } => "insufficient_balance",
            WalletError::SubmissionRejected { .. } => "submission_rejected",
            WalletError::InvalidSecretKey(_) => "invalid_secret_key",
            WalletError::ConfigError(_) => "config_error",
            WalletError::UnknownFailure(_) => "unknown_failure",
        }
    }

    /// Horizon result codes, when the network rejected the transaction.
    pub fn result_codes(&self) -> Option<&ResultCodes> {
        match self {
            WalletError::SubmissionRejected { codes } => Some(codes),
            _ => None,
        }
    }

    /// True when the failure was detected before anything reached the network.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            WalletError::InvalidInput(_)
                | WalletError::WalletNotReady
                | WalletError::InsufficientBalance { .. }
                | WalletError::InvalidSecretKey(_)
                | WalletError::ConfigError(_)
        )
    }
}

impl From<toml::de::Error> for WalletError {
    fn from(err: toml::de::Error) -> Self {
        WalletError::ConfigError(err.to_string())
    }
}
