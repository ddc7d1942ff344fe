//! Stellar 账户密钥对
//!
//! ed25519 signing keys, imported from or exported to strkey seeds.

use super::address::{decode_check, encode_check, VersionByte};
use crate::core::errors::WalletError;
use crate::security::secret::{SecretString, vec_to_secret_string};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use std::fmt;
use tracing::{debug, info};
use zeroize::Zeroize;

/// ed25519 keypair for a Stellar account. The signing key is zeroized on drop.
pub struct Keypair {
    signing_key: SigningKey,
    public_key: [u8; 32],
    address: String,
}

impl Keypair {
    /// Creates a fresh random keypair (wallet creation).
    pub fn random() -> Self {
        info!("Generating new Stellar keypair");
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_signing_key(signing_key)
    }

    /// Imports a keypair from an `S...` secret seed.
    pub fn from_secret(secret: &str) -> Result<Self, WalletError> {
        let mut seed = decode_check(VersionByte::SecretSeed, secret.trim())
            .map_err(|e| WalletError::InvalidSecretKey(e.to_string()))?;
        let signing_key = SigningKey::from_bytes(&seed);
        seed.zeroize();

        let keypair = Self::from_signing_key(signing_key);
        debug!(address = %keypair.address, "Imported Stellar keypair");
        Ok(keypair)
    }

    /// Builds a keypair from raw seed bytes.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(seed))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key = signing_key.verifying_key().to_bytes();
        let address = encode_check(VersionByte::AccountId, &public_key);
        Self { signing_key, public_key, address }
    }

    /// The account id (`G...`).
    pub fn public_key(&self) -> &str {
        &self.address
    }

    pub fn public_key_bytes(&self) -> &[u8; 32] {
        &self.public_key
    }

    /// Exports the `S...` seed in a buffer that is wiped on drop.
    pub fn secret_key(&self) -> SecretString {
        let mut seed = self.signing_key.to_bytes();
        let encoded = encode_check(VersionByte::SecretSeed, &seed);
        seed.zeroize();
        vec_to_secret_string(encoded)
    }

    /// Last four bytes of the public key, used to match signatures to signers.
    pub fn signature_hint(&self) -> [u8; 4] {
        let mut hint = [0u8; 4];
        hint.copy_from_slice(&self.public_key[28..]);
        hint
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> bool {
        verify_signature(&self.public_key, message, signature)
    }
}

/// Checks an ed25519 signature against a raw public key.
pub fn verify_signature(public_key: &[u8; 32], message: &[u8], signature: &[u8; 64]) -> bool {
    match VerifyingKey::from_bytes(public_key) {
        Ok(key) => key.verify(message, &Signature::from_bytes(signature)).is_ok(),
        Err(_) => false,
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair").field("public_key", &self.address).finish_non_exhaustive()
    }
}
