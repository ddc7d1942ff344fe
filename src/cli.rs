use crate::blockchain::stellar::network::NetworkKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Environment variable holding the signing secret (`S...`).
pub const SECRET_KEY_ENV: &str = "STELLAR_SECRET_KEY";

/// Stellar XLM wallet CLI (library-facing definitions)
#[derive(Debug, Parser)]
#[command(name = "lumen-wallet", about = "Send XLM payments on the Stellar network", version)]
pub struct Cli {
    /// Config file (defaults to $CONFIG_PATH or ./config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// testnet, public or custom
    #[arg(long, global = true)]
    pub network: Option<NetworkKind>,

    /// Horizon server URL
    #[arg(long = "horizon-url", global = true)]
    pub horizon_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Send XLM from the account whose secret is in STELLAR_SECRET_KEY
    Send {
        /// Destination account (G...)
        #[arg(long)]
        to: String,
        /// Amount in XLM, at most 7 decimals
        #[arg(long)]
        amount: String,
        /// Text memo, at most 28 bytes
        #[arg(long)]
        memo: Option<String>,
    },
    /// Show balance, reserve and spendable amount
    Balance {
        /// Account to inspect; defaults to the STELLAR_SECRET_KEY account
        #[arg(long)]
        account: Option<String>,
    },
    /// Show current network fees
    Fee,
    /// Generate a new keypair
    Keygen {
        /// Also print the secret seed
        #[arg(long)]
        reveal_secret: bool,
    },
    /// Check whether an address is a valid account id
    ValidateAddress { address: String },
}
