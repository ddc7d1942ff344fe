//! XLM amount handling.
//!
//! Amounts travel as decimal strings at the edges and as integer stroops
//! (1 XLM = 10^7 stroops) everywhere else.

use crate::core::errors::WalletError;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Stroops per lumen.
pub const STROOPS_PER_XLM: i64 = 10_000_000;

/// Fractional digits the network can represent.
pub const MAX_DECIMALS: u32 = 7;

// plain decimal numeral: no sign, no exponent, no separators
static DECIMAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d+(?:\.\d+)?|\.\d+)$").expect("Hardcoded decimal regex should always compile")
});

/// Splits a plain decimal numeral into its significant whole and fractional
/// digits (leading zeros of the whole part and trailing zeros of the
/// fraction removed). `None` if `s` is not a plain numeral.
fn significant_digits(s: &str) -> Option<(&str, &str)> {
    if !DECIMAL_RE.is_match(s) {
        return None;
    }
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    Some((whole.trim_start_matches('0'), frac.trim_end_matches('0')))
}

/// True iff `s` is a plain decimal numeral with a non-zero value, however
/// large or precise.
pub fn is_positive_numeral(s: &str) -> bool {
    significant_digits(s).map(|(whole, frac)| !whole.is_empty() || !frac.is_empty()).unwrap_or(false)
}

/// Parses a plain decimal numeral. Returns `None` for anything else,
/// including values too large or too precise to represent.
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    let (whole, frac) = significant_digits(s)?;
    let whole = if whole.is_empty() { "0" } else { whole };
    if frac.is_empty() {
        Decimal::from_str(whole).ok()
    } else {
        Decimal::from_str(&format!("{}.{}", whole, frac)).ok()
    }
}

/// Converts a positive XLM amount string into stroops.
pub fn parse_xlm(s: &str) -> Result<i64, WalletError> {
    if !is_positive_numeral(s) {
        return Err(WalletError::InvalidInput("Amount must be a positive number".to_string()));
    }
    if significant_digits(s).map_or(0, |(_, frac)| frac.len()) > MAX_DECIMALS as usize {
        return Err(WalletError::InvalidInput(format!(
            "Amount can have at most {} decimal places",
            MAX_DECIMALS
        )));
    }

    parse_decimal(s)
        .and_then(|d| d.checked_mul(Decimal::from(STROOPS_PER_XLM)))
        .and_then(|d| d.to_i64())
        .ok_or_else(|| WalletError::InvalidInput("Amount exceeds the maximum payment size".to_string()))
}

/// Converts a non-negative decimal string, such as a Horizon balance
/// (`"1250.7500000"`), into stroops.
pub fn decimal_to_stroops(s: &str) -> Option<i64> {
    let (_, frac) = significant_digits(s)?;
    if frac.len() > MAX_DECIMALS as usize {
        return None;
    }
    parse_decimal(s)?.checked_mul(Decimal::from(STROOPS_PER_XLM))?.to_i64()
}

/// Renders stroops as a trimmed XLM decimal, e.g. `12_500_000` -> `"1.25"`.
pub fn format_xlm(stroops: i64) -> String {
    Decimal::new(stroops, MAX_DECIMALS).normalize().to_string()
}

/// Quick-pick amount: `percent` of `spendable` stroops, rounded down to two
/// decimals so the result never exceeds the available balance.
pub fn amount_for_percentage(spendable: i64, percent: u32) -> Result<String, WalletError> {
    if percent == 0 || percent > 100 {
        return Err(WalletError::InvalidInput(format!(
            "Percentage must be between 1 and 100, got {}",
            percent
        )));
    }
    let base = Decimal::new(spendable.max(0), MAX_DECIMALS);
    let mut share = (base * Decimal::from(percent) / Decimal::from(100))
        .round_dp_with_strategy(2, RoundingStrategy::ToZero);
    share.rescale(2);
    Ok(share.to_string())
}
