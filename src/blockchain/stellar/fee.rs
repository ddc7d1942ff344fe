//! Fee estimation over Horizon fee statistics.

use super::types::FeeStats;
use crate::blockchain::traits::BlockchainClient;
use serde::Serialize;
use tracing::{debug, warn};

/// Network minimum per operation; used whenever no estimate is available.
pub const BASE_FEE_STROOPS: u32 = 100;

/// Which point of the charged-fee distribution to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeePercentile {
    /// Median: what the send flow actually pays.
    P50,
    /// Shown to users as the "recommended" fee.
    P90,
}

impl FeePercentile {
    fn pick(self, stats: &FeeStats) -> u32 {
        match self {
            FeePercentile::P50 => stats.fee_charged.p50,
            FeePercentile::P90 => stats.fee_charged.p90,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeeSource {
    Estimated,
    FallbackDefault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeEstimate {
    /// Stroops per operation
    pub fee: u32,
    pub source: FeeSource,
}

impl FeeEstimate {
    pub fn is_fallback(&self) -> bool {
        self.source == FeeSource::FallbackDefault
    }
}

/// Reads a percentile from `fee_stats`, falling back to a fixed fee when
/// the call fails or reports zero. Never fails.
#[derive(Debug, Clone, Copy)]
pub struct FeeEstimator {
    fallback: u32,
}

impl Default for FeeEstimator {
    fn default() -> Self {
        Self { fallback: BASE_FEE_STROOPS }
    }
}

impl FeeEstimator {
    pub fn new(fallback: u32) -> Self {
        Self { fallback: fallback.max(BASE_FEE_STROOPS) }
    }

    pub fn fallback(&self) -> u32 {
        self.fallback
    }

    pub async fn estimate(&self, client: &dyn BlockchainClient, percentile: FeePercentile) -> FeeEstimate {
        match client.fee_stats().await {
            Ok(stats) => self.from_stats(&stats, percentile),
            Err(e) => {
                warn!("Fee estimation failed, using fallback of {} stroops: {}", self.fallback, e);
                self.fallback_estimate()
            }
        }
    }

    pub fn from_stats(&self, stats: &FeeStats, percentile: FeePercentile) -> FeeEstimate {
        let fee = percentile.pick(stats);
        if fee == 0 {
            warn!("Horizon reported a zero {:?} fee, using fallback of {} stroops", percentile, self.fallback);
            return self.fallback_estimate();
        }
        debug!("Estimated {:?} fee: {} stroops", percentile, fee);
        FeeEstimate { fee, source: FeeSource::Estimated }
    }

    fn fallback_estimate(&self) -> FeeEstimate {
        FeeEstimate { fee: self.fallback, source: FeeSource::FallbackDefault }
    }
}
