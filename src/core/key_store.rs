//! Holds the wallet's active keypair.
//!
//! A `KeyStore` is passed to whoever needs to sign; there is no global.

use crate::blockchain::stellar::account::Keypair;
use crate::core::errors::WalletError;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default)]
pub struct KeyStore {
    keypair: RwLock<Option<Arc<Keypair>>>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keypair(keypair: Keypair) -> Self {
        let store = Self::new();
        store.set(keypair);
        store
    }

    /// Imports an `S...` secret.
    pub fn import_secret(&self, secret: &str) -> Result<Arc<Keypair>, WalletError> {
        let keypair = Keypair::from_secret(secret)?;
        Ok(self.set(keypair))
    }

    /// Replaces the active keypair, returning the shared handle.
    pub fn set(&self, keypair: Keypair) -> Arc<Keypair> {
        let keypair = Arc::new(keypair);
        info!("Loaded keypair for {}", keypair.public_key());
        *self.keypair.write() = Some(Arc::clone(&keypair));
        keypair
    }

    /// The active keypair, or `WalletNotReady`.
    pub fn current(&self) -> Result<Arc<Keypair>, WalletError> {
        self.keypair.read().clone().ok_or(WalletError::WalletNotReady)
    }

    pub fn public_key(&self) -> Option<String> {
        self.keypair.read().as_ref().map(|k| k.public_key().to_string())
    }

    pub fn is_ready(&self) -> bool {
        self.keypair.read().is_some()
    }

    pub fn clear(&self) {
        if self.keypair.write().take().is_some() {
            info!("Cleared keypair from key store");
        }
    }
}
