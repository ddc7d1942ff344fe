use crate::blockchain::stellar::fee::BASE_FEE_STROOPS;
use crate::blockchain::stellar::network::{Network, NetworkKind};
use crate::blockchain::stellar::types::DEFAULT_BASE_RESERVE_STROOPS;
use crate::core::errors::WalletError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const NETWORK_ENV: &str = "STELLAR_NETWORK";
pub const HORIZON_URL_ENV: &str = "STELLAR_HORIZON_URL";

/// Network selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    #[serde(default)]
    pub kind: NetworkKind,

    /// Overrides the network's default Horizon endpoint.
    #[serde(default)]
    pub horizon_url: Option<String>,

    /// Required for `custom` networks, ignored otherwise.
    #[serde(default)]
    pub passphrase: Option<String>,

    /// Per HTTP request (seconds)
    #[serde(default = "NetworkSettings::default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl NetworkSettings {
    fn default_request_timeout() -> u64 { 30 }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            kind: NetworkKind::default(),
            horizon_url: None,
            passphrase: None,
            request_timeout_secs: Self::default_request_timeout(),
        }
    }
}

/// Fee and reserve parameters, in stroops
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeSettings {
    #[serde(default = "FeeSettings::default_fallback_fee")]
    pub fallback_fee_stroops: u32,

    #[serde(default = "FeeSettings::default_base_reserve")]
    pub base_reserve_stroops: i64,
}

impl FeeSettings {
    fn default_fallback_fee() -> u32 { BASE_FEE_STROOPS }
    fn default_base_reserve() -> i64 { DEFAULT_BASE_RESERVE_STROOPS }
}

impl Default for FeeSettings {
    fn default() -> Self {
        Self {
            fallback_fee_stroops: Self::default_fallback_fee(),
            base_reserve_stroops: Self::default_base_reserve(),
        }
    }
}

/// Transaction building
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSettings {
    /// Validity window after build (seconds)
    #[serde(default = "TransactionSettings::default_timeout")]
    pub timeout_secs: u64,

    /// Reject sends exceeding the spendable balance before touching the network.
    #[serde(default = "TransactionSettings::default_enforce_reserve_check")]
    pub enforce_reserve_check: bool,
}

impl TransactionSettings {
    fn default_timeout() -> u64 { 30 }
    fn default_enforce_reserve_check() -> bool { true }
}

impl Default for TransactionSettings {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout(),
            enforce_reserve_check: Self::default_enforce_reserve_check(),
        }
    }
}

/// wallet配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletConfig {
    #[serde(default)]
    pub network: NetworkSettings,

    #[serde(default)]
    pub fees: FeeSettings,

    #[serde(default)]
    pub transaction: TransactionSettings,
}

impl WalletConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, WalletError> {
        Ok(toml::from_str(content)?)
    }

    /// Loads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        if !path.exists() {
            warn!("Config file {} not found, using default configuration", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            WalletError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Resolves the config path (`explicit`, then `CONFIG_PATH`, then
    /// `config.toml`), loads it and applies environment overrides. Callers
    /// run [`validate`](Self::validate) once their own overrides are in.
    pub fn load_with_env(explicit: Option<&Path>) -> Result<Self, WalletError> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => {
                let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
                Self::load(Path::new(&path))?
            }
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), WalletError> {
        if let Ok(kind) = std::env::var(NETWORK_ENV) {
            self.network.kind = kind
                .parse()
                .map_err(|e: String| WalletError::ConfigError(format!("{}: {}", NETWORK_ENV, e)))?;
        }
        if let Ok(url) = std::env::var(HORIZON_URL_ENV) {
            if !url.trim().is_empty() {
                self.network.horizon_url = Some(url.trim().to_string());
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        if self.network.request_timeout_secs == 0 {
            return Err(WalletError::ConfigError("network.request_timeout_secs must be > 0".into()));
        }
        if self.transaction.timeout_secs == 0 {
            return Err(WalletError::ConfigError("transaction.timeout_secs must be > 0".into()));
        }
        if self.fees.fallback_fee_stroops == 0 {
            return Err(WalletError::ConfigError("fees.fallback_fee_stroops must be > 0".into()));
        }
        if self.fees.base_reserve_stroops < 0 {
            return Err(WalletError::ConfigError("fees.base_reserve_stroops must not be negative".into()));
        }
        self.network()?;
        let url = self.horizon_url()?;
        let parsed = reqwest::Url::parse(&url)
            .map_err(|e| WalletError::ConfigError(format!("Invalid Horizon URL '{}': {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(WalletError::ConfigError(format!("Horizon URL must be http(s), got '{}'", url)));
        }
        Ok(())
    }

    pub fn network(&self) -> Result<Network, WalletError> {
        match self.network.kind {
            NetworkKind::Testnet => Ok(Network::testnet()),
            NetworkKind::Public => Ok(Network::public()),
            NetworkKind::Custom => match self.network.passphrase.as_deref() {
                Some(p) if !p.trim().is_empty() => Ok(Network::custom(p)),
                _ => Err(WalletError::ConfigError(
                    "network.passphrase is required for a custom network".into(),
                )),
            },
        }
    }

    /// Explicit `horizon_url`, else the network's public endpoint.
    pub fn horizon_url(&self) -> Result<String, WalletError> {
        if let Some(url) = &self.network.horizon_url {
            return Ok(url.clone());
        }
        self.network()?
            .default_horizon_url()
            .map(str::to_string)
            .ok_or_else(|| WalletError::ConfigError("network.horizon_url is required for a custom network".into()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.network.request_timeout_secs)
    }

    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_secs(self.transaction.timeout_secs)
    }
}
