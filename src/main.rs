// src/main.rs
//! Stellar wallet CLI entry point.
use anyhow::{Context, Result};
use clap::Parser;
use lumen_wallet::blockchain::stellar::{HorizonClient, Keypair};
use lumen_wallet::blockchain::BlockchainClient;
use lumen_wallet::cli::{Cli, Commands, SECRET_KEY_ENV};
use lumen_wallet::core::amount::{amount_for_percentage, format_xlm};
use lumen_wallet::core::validation::validate_address;
use lumen_wallet::core::{KeyStore, WalletConfig};
use lumen_wallet::security::secret::secret_from_env;
use lumen_wallet::service::{PaymentRequest, SendSettings, SendWorkflow};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging()?;

    // Commands that never touch the network
    match &cli.command {
        Commands::Keygen { reveal_secret } => {
            keygen(*reveal_secret);
            return Ok(());
        }
        Commands::ValidateAddress { address } => {
            if validate_address(address.trim()) {
                println!("valid: {}", address.trim());
                return Ok(());
            }
            println!("invalid: {}", address.trim());
            std::process::exit(1);
        }
        _ => {}
    }

    let config = load_config(&cli)?;
    let horizon_url = config.horizon_url()?;
    info!("Network: {} ({})", config.network.kind, horizon_url);

    let client: Arc<dyn BlockchainClient> = Arc::new(HorizonClient::new(&horizon_url, config.request_timeout())?);
    let workflow = SendWorkflow::new(Arc::clone(&client), SendSettings::from_config(&config)?);

    match cli.command {
        Commands::Send { to, amount, memo } => {
            let keys = load_key_store()?;
            let mut request = PaymentRequest::new(to.trim(), amount.trim());
            request.memo = memo;

            match workflow.send(&keys, request).await {
                Ok(result) => {
                    println!("Transaction hash: {}", result.hash);
                    println!("Ledger: {}", result.ledger);
                    if let Some(link) = workflow.network().explorer_tx_url(&result.hash) {
                        println!("Explorer: {}", link);
                    }
                }
                Err(failure) => {
                    eprintln!("Send failed while {}: {}", failure.stage, failure.error);
                    std::process::exit(1);
                }
            }
        }
        Commands::Balance { account } => {
            let account_id = match account {
                Some(id) => id.trim().to_string(),
                None => load_key_store()?.public_key().context("no account loaded")?,
            };
            let snapshot = client.load_account(&account_id).await?;
            let summary = snapshot.balance_summary(workflow.settings().base_reserve);

            println!("Account:   {}", summary.account_id);
            println!("Balance:   {} XLM", format_xlm(summary.native_balance));
            println!("Reserve:   {} XLM", format_xlm(summary.minimum_reserve));
            println!("Spendable: {} XLM", format_xlm(summary.spendable));
            let picks = [25u32, 50, 75, 100]
                .iter()
                .map(|p| amount_for_percentage(summary.spendable, *p).map(|a| format!("{}%={}", p, a)))
                .collect::<Result<Vec<_>, _>>()?;
            println!("Quick picks: {}", picks.join("  "));
            for line in snapshot.balances.iter().filter(|b| !b.is_native()) {
                println!("  {} {} (not sendable)", format_xlm(line.balance), line.symbol());
            }
        }
        Commands::Fee => {
            let recommended = workflow.recommended_fee().await;
            let stats = client.fee_stats().await.ok();
            println!(
                "Recommended fee: {} stroops ({} XLM){}",
                recommended.fee,
                format_xlm(recommended.fee as i64),
                if recommended.is_fallback() { " [fallback]" } else { "" }
            );
            if let Some(stats) = stats {
                println!("Last ledger base fee: {} stroops", stats.last_ledger_base_fee);
                println!("Median fee charged: {} stroops", stats.fee_charged.p50);
            }
        }
        Commands::Keygen { .. } | Commands::ValidateAddress { .. } => {}
    }

    Ok(())
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// File, then environment, then command-line flags.
fn load_config(cli: &Cli) -> Result<WalletConfig> {
    let mut config = WalletConfig::load_with_env(cli.config.as_deref())?;
    if let Some(kind) = cli.network {
        config.network.kind = kind;
    }
    if let Some(url) = &cli.horizon_url {
        config.network.horizon_url = Some(url.trim().to_string());
    }
    config.validate()?;
    Ok(config)
}

fn load_key_store() -> Result<KeyStore> {
    let secret = secret_from_env(SECRET_KEY_ENV)
        .with_context(|| format!("{} is not set", SECRET_KEY_ENV))?;
    let keys = KeyStore::new();
    keys.import_secret(&secret)?;
    Ok(keys)
}

fn keygen(reveal_secret: bool) {
    let keypair = Keypair::random();
    println!("Public key: {}", keypair.public_key());
    if reveal_secret {
        println!("Secret key: {}", keypair.secret_key().as_str());
    } else {
        println!("Secret key: (hidden, pass --reveal-secret to print it)");
    }
}
