//! Input validators for payment forms.
//!
//! `validate_address` and `validate_amount` are total: they answer `false`
//! for anything they do not accept and never panic.

use crate::blockchain::stellar::address::{decode_check, VersionByte};
use crate::core::amount::is_positive_numeral;
use crate::core::errors::WalletError;

/// Maximum length of a text memo, in bytes.
pub const MAX_MEMO_TEXT_BYTES: usize = 28;

/// True iff `address` is a well-formed ed25519 public-key strkey (`G...`).
pub fn validate_address(address: &str) -> bool {
    decode_check(VersionByte::AccountId, address).is_ok()
}

/// True iff `amount` is a plain decimal strictly greater than zero.
pub fn validate_amount(amount: &str) -> bool {
    is_positive_numeral(amount)
}

/// Checks an optional text memo against the network's 28-byte limit.
pub fn validate_memo(memo: Option<&str>) -> Result<(), WalletError> {
    match memo {
        Some(text) if text.len() > MAX_MEMO_TEXT_BYTES => Err(WalletError::InvalidInput(format!(
            "Memo must be at most {} bytes, got {}",
            MAX_MEMO_TEXT_BYTES,
            text.len()
        ))),
        _ => Ok(()),
    }
}
