//! Network identity: passphrase, network id and well-known endpoints.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";
pub const PUBLIC_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";

pub const TESTNET_HORIZON_URL: &str = "https://horizon-testnet.stellar.org";
pub const PUBLIC_HORIZON_URL: &str = "https://horizon.stellar.org";

/// Which network a wallet talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
    #[default]
    Testnet,
    Public,
    Custom,
}

impl std::str::FromStr for NetworkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "testnet" | "test" => Ok(NetworkKind::Testnet),
            "public" | "mainnet" | "pubnet" => Ok(NetworkKind::Public),
            "custom" => Ok(NetworkKind::Custom),
            other => Err(format!("unknown network '{}'", other)),
        }
    }
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NetworkKind::Testnet => "testnet",
            NetworkKind::Public => "public",
            NetworkKind::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// A network as seen by the signer: the passphrase determines the network
/// id every signature commits to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    kind: NetworkKind,
    passphrase: String,
}

impl Network {
    pub fn testnet() -> Self {
        Self { kind: NetworkKind::Testnet, passphrase: TESTNET_PASSPHRASE.to_string() }
    }

    pub fn public() -> Self {
        Self { kind: NetworkKind::Public, passphrase: PUBLIC_PASSPHRASE.to_string() }
    }

    pub fn custom(passphrase: impl Into<String>) -> Self {
        Self { kind: NetworkKind::Custom, passphrase: passphrase.into() }
    }

    pub fn kind(&self) -> NetworkKind {
        self.kind
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    /// SHA-256 of the passphrase.
    pub fn network_id(&self) -> [u8; 32] {
        Sha256::digest(self.passphrase.as_bytes()).into()
    }

    /// Default Horizon endpoint, if the network has a public one.
    pub fn default_horizon_url(&self) -> Option<&'static str> {
        match self.kind {
            NetworkKind::Testnet => Some(TESTNET_HORIZON_URL),
            NetworkKind::Public => Some(PUBLIC_HORIZON_URL),
            NetworkKind::Custom => None,
        }
    }

    /// stellar.expert link for a transaction hash.
    pub fn explorer_tx_url(&self, hash: &str) -> Option<String> {
        let segment = match self.kind {
            NetworkKind::Testnet => "testnet",
            NetworkKind::Public => "public",
            NetworkKind::Custom => return None,
        };
        Some(format!("https://stellar.expert/explorer/{}/tx/{}", segment, hash))
    }
}
