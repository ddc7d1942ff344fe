//! Stellar strkey 编码
//!
//! Thin wrapper over `stellar-strkey` for the two 32-byte ed25519 kinds the
//! wallet handles: account ids (`G...`) and secret seeds (`S...`).

use crate::core::errors::WalletError;
use stellar_strkey::{ed25519, Strkey};

/// Payload length for ed25519 keys.
pub const KEY_LEN: usize = 32;

/// Encoded length of a 32-byte key: 1 + 32 + 2 bytes -> 56 chars.
pub const ENCODED_LEN: usize = 56;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionByte {
    /// `G`, ed25519 public key
    AccountId,
    /// `S`, ed25519 secret seed
    SecretSeed,
}

impl VersionByte {
    fn label(self) -> &'static str {
        match self {
            VersionByte::AccountId => "account id",
            VersionByte::SecretSeed => "secret seed",
        }
    }
}

/// Encodes a 32-byte key with the given version byte.
pub fn encode_check(version: VersionByte, payload: &[u8; KEY_LEN]) -> String {
    match version {
        VersionByte::AccountId => ed25519::PublicKey(*payload).to_string(),
        VersionByte::SecretSeed => ed25519::PrivateKey(*payload).to_string(),
    }
}

/// Decodes and verifies a strkey of the expected kind.
pub fn decode_check(version: VersionByte, encoded: &str) -> Result<[u8; KEY_LEN], WalletError> {
    let invalid = |reason: &str| {
        WalletError::InvalidInput(format!("Invalid {}: {}", version.label(), reason))
    };

    // muxed accounts and signed payloads are longer; refuse them up front
    if encoded.len() != ENCODED_LEN {
        return Err(invalid("wrong length"));
    }

    match (version, Strkey::from_string(encoded)) {
        (VersionByte::AccountId, Ok(Strkey::PublicKeyEd25519(key))) => Ok(key.0),
        (VersionByte::SecretSeed, Ok(Strkey::PrivateKeyEd25519(key))) => Ok(key.0),
        (_, Ok(_)) => Err(invalid("wrong version byte")),
        (_, Err(_)) => Err(invalid("malformed strkey or checksum mismatch")),
    }
}
