// src/security/mod.rs
//! Secret handling for the wallet: zeroizing buffers and log redaction.

pub mod secret;

// Redaction helpers to avoid accidental secret prints
pub mod redaction;
pub use redaction::{mask_secret, redact_body};
pub use secret::SecretString;
