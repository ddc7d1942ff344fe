//! Ledger-facing data: account snapshots, fee statistics, submission results.

use crate::core::amount::format_xlm;
use crate::core::errors::WalletError;
use serde::{Deserialize, Serialize};

/// Base reserve on the public networks: 0.5 XLM.
pub const DEFAULT_BASE_RESERVE_STROOPS: i64 = 5_000_000;

/// One balance line of an account, amount in stroops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub asset_type: String,
    pub asset_code: Option<String>,
    pub asset_issuer: Option<String>,
    pub balance: i64,
}

impl Balance {
    pub fn is_native(&self) -> bool {
        self.asset_type == "native"
    }

    /// `XLM` for the native asset, the asset code otherwise.
    pub fn symbol(&self) -> &str {
        if self.is_native() {
            "XLM"
        } else {
            self.asset_code.as_deref().unwrap_or("?")
        }
    }
}

/// Account state at the moment it was fetched. Never cached: the sequence
/// number is single-use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account_id: String,
    pub sequence: i64,
    pub balances: Vec<Balance>,
    pub subentry_count: u32,
}

impl AccountSnapshot {
    /// Native balance in stroops; zero when the account lists no native line.
    pub fn native_balance(&self) -> i64 {
        self.balances.iter().find(|b| b.is_native()).map(|b| b.balance).unwrap_or(0)
    }

    /// `(2 + subentry_count) * base_reserve`
    pub fn minimum_reserve(&self, base_reserve: i64) -> i64 {
        (2 + self.subentry_count as i64).saturating_mul(base_reserve)
    }

    pub fn balance_summary(&self, base_reserve: i64) -> BalanceSummary {
        let native = self.native_balance();
        let reserve = self.minimum_reserve(base_reserve);
        BalanceSummary {
            account_id: self.account_id.clone(),
            native_balance: native,
            minimum_reserve: reserve,
            spendable: native.saturating_sub(reserve),
        }
    }
}

/// Native balance broken down into the locked reserve and what can be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceSummary {
    pub account_id: String,
    pub native_balance: i64,
    pub minimum_reserve: i64,
    /// May be negative for accounts below their reserve.
    pub spendable: i64,
}

impl BalanceSummary {
    /// Rejects a send when `amount + fee` exceeds the spendable balance.
    pub fn ensure_can_send(&self, amount: i64, fee: u32) -> Result<(), WalletError> {
        let required = amount.saturating_add(fee as i64);
        if required > self.spendable {
            return Err(WalletError::InsufficientBalance { required, spendable: self.spendable });
        }
        Ok(())
    }
}

impl std::fmt::Display for BalanceSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "balance {} XLM, reserve {} XLM, spendable {} XLM",
            format_xlm(self.native_balance),
            format_xlm(self.minimum_reserve),
            format_xlm(self.spendable)
        )
    }
}

/// Distribution of fees charged in recent ledgers, per operation, in stroops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeDistribution {
    pub min: u32,
    pub mode: u32,
    pub p10: u32,
    pub p50: u32,
    pub p90: u32,
    pub p99: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeStats {
    pub last_ledger_base_fee: u32,
    pub fee_charged: FeeDistribution,
}

/// A transaction accepted into a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub hash: String,
    pub ledger: u32,
    #[serde(default)]
    pub envelope_xdr: Option<String>,
    #[serde(default)]
    pub result_xdr: Option<String>,
}
