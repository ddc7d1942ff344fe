// src/lib.rs
//! Stellar XLM payment wallet: validation, transaction building, signing
//! and submission against Horizon.

pub mod blockchain;
pub mod cli;
pub mod core;
pub mod security;
pub mod service;

pub use crate::core::{KeyStore, WalletConfig, WalletError};
pub use crate::service::{PaymentRequest, SendWorkflow};
