//! Stellar network support: strkeys, XDR, transactions and the Horizon client.

pub mod account;
pub mod address;
pub mod client;
pub mod fee;
pub mod network;
pub mod submit;
pub mod transaction;
pub mod types;

pub use account::Keypair;
pub use client::HorizonClient;
pub use fee::{FeeEstimate, FeeEstimator, FeePercentile, FeeSource};
pub use network::{Network, NetworkKind};
pub use submit::sign_and_submit;
pub use transaction::{build_payment, BuildOptions, SignedEnvelope, Transaction};
pub use types::{AccountSnapshot, Balance, BalanceSummary, FeeStats, SubmissionResult};
