//! Sends 1 XLM on testnet from a funded test account through the regular
//! send path. Exits non-zero on failure.
//!
//! `TEST_SOURCE_SECRET` and `TEST_DESTINATION` replace the built-in accounts.
use std::sync::Arc;

use lumen_wallet::blockchain::stellar::network::TESTNET_HORIZON_URL;
use lumen_wallet::blockchain::stellar::{HorizonClient, Keypair};
use lumen_wallet::core::validation::validate_address;
use lumen_wallet::security::redaction::mask_secret;
use lumen_wallet::security::secret::{secret_from_env, vec_to_secret_string};
use lumen_wallet::service::{PaymentRequest, SendSettings, SendWorkflow};

const SOURCE_SECRET: &str = "SDLCVG2JJUJ67OHYQHYXRTAA5UKOKIQ2DKWUXUKSNQYPAJD6CKQGO3JM";
const DESTINATION: &str = "GBJDTATBCDDB4GPBZGQ2XICE5OFZTJQA6EHVR7XVV6KT5WRREIWPPSKE";
const AMOUNT: &str = "1";
const MEMO: &str = "Test payment";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let secret = secret_from_env("TEST_SOURCE_SECRET")
        .unwrap_or_else(|| vec_to_secret_string(SOURCE_SECRET.to_string()));
    let destination = std::env::var("TEST_DESTINATION").unwrap_or_else(|_| DESTINATION.to_string());

    if !secret.starts_with('S') {
        eprintln!("Error: please provide a valid testnet secret key");
        std::process::exit(1);
    }
    if !validate_address(&destination) {
        eprintln!("Error: invalid destination address");
        std::process::exit(1);
    }

    println!("Starting test payment...");
    println!("Source secret: {}", mask_secret(&secret));
    println!("Destination: {}", destination);
    println!("Amount: {} XLM", AMOUNT);
    println!("Memo: {}", MEMO);

    let keypair = match Keypair::from_secret(&secret) {
        Ok(kp) => kp,
        Err(e) => {
            eprintln!("Test payment failed: {}", e);
            std::process::exit(1);
        }
    };

    let horizon_url = std::env::var("STELLAR_HORIZON_URL").unwrap_or_else(|_| TESTNET_HORIZON_URL.to_string());
    let client = Arc::new(HorizonClient::new(&horizon_url, std::time::Duration::from_secs(30))?);
    let workflow = SendWorkflow::new(client, SendSettings::default());

    let request = PaymentRequest::new(destination, AMOUNT).with_memo(MEMO);
    match workflow.send_with(&keypair, request).await {
        Ok(result) => {
            println!("Test payment successful!");
            println!("Transaction hash: {}", result.hash);
            println!("Ledger: {}", result.ledger);
            if let Some(link) = workflow.network().explorer_tx_url(&result.hash) {
                println!("Check transaction at: {}", link);
            }
            Ok(())
        }
        Err(failure) => {
            eprintln!("Test payment failed ({}): {}", failure.stage, failure.error);
            std::process::exit(1);
        }
    }
}
