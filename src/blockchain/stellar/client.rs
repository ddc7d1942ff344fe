//! Horizon HTTP 客户端
//!
//! Talks to a Horizon server over its public JSON API:
//! `GET /accounts/{id}`, `GET /fee_stats`, `POST /transactions`.

use super::transaction::SignedEnvelope;
use super::types::{AccountSnapshot, Balance, FeeDistribution, FeeStats, SubmissionResult};
use crate::blockchain::traits::BlockchainClient;
use crate::core::amount::decimal_to_stroops;
use crate::core::errors::{ResultCodes, WalletError};
use crate::security::redaction::redact_body;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Horizon REST client.
#[derive(Debug, Clone)]
pub struct HorizonClient {
    /// Base URL without trailing slash
    base_url: String,
    http_client: HttpClient,
}

impl HorizonClient {
    pub fn new(horizon_url: &str, timeout: Duration) -> Result<Self, WalletError> {
        let trimmed = horizon_url.trim();
        let parsed = reqwest::Url::parse(trimmed).map_err(|e| {
            WalletError::ConfigError(format!("Invalid Horizon URL '{}': {}", trimmed, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(WalletError::ConfigError(format!(
                "Horizon URL must be http(s), got '{}'",
                trimmed
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert("X-Client-Name", HeaderValue::from_static("lumen-wallet"));
        headers.insert("X-Client-Version", HeaderValue::from_static(env!("CARGO_PKG_VERSION")));

        let http_client = HttpClient::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| WalletError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        info!("Using Horizon at {}", trimmed);
        Ok(Self { base_url: trimmed.trim_end_matches('/').to_string(), http_client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl BlockchainClient for HorizonClient {
    async fn load_account(&self, account_id: &str) -> Result<AccountSnapshot, WalletError> {
        let url = self.url(&format!("accounts/{}", account_id));
        debug!(%url, "Loading account");
        let fetch_err =
            |msg: String| WalletError::NetworkFetchFailure(format!("Failed to load account {}: {}", account_id, msg));

        let response = self.http_client.get(&url).send().await.map_err(|e| fetch_err(e.to_string()))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(fetch_err("account not found (is it funded?)".to_string()));
        }
        let body = response.text().await.map_err(|e| fetch_err(e.to_string()))?;
        if !status.is_success() {
            return Err(fetch_err(describe_problem(status, &body)));
        }

        let account: AccountResponse =
            serde_json::from_str(&body).map_err(|e| fetch_err(format!("unexpected response: {}", e)))?;
        account.into_snapshot().map_err(fetch_err)
    }

    async fn fee_stats(&self) -> Result<FeeStats, WalletError> {
        let url = self.url("fee_stats");
        debug!(%url, "Fetching fee stats");
        let fetch_err = |msg: String| WalletError::NetworkFetchFailure(format!("Failed to fetch fee stats: {}", msg));

        let response = self.http_client.get(&url).send().await.map_err(|e| fetch_err(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| fetch_err(e.to_string()))?;
        if !status.is_success() {
            return Err(fetch_err(describe_problem(status, &body)));
        }

        let stats: FeeStatsResponse =
            serde_json::from_str(&body).map_err(|e| fetch_err(format!("unexpected response: {}", e)))?;
        Ok(stats.into())
    }

    async fn submit_transaction(
        &self,
        envelope: &SignedEnvelope,
    ) -> Result<SubmissionResult, WalletError> {
        let url = self.url("transactions");
        let tx = envelope.to_xdr_base64();
        info!(hash = %envelope.hash_hex(), "Submitting transaction");
        debug!(envelope = %redact_body(&tx), "Envelope XDR");

        let submit_err = |msg: String| WalletError::UnknownFailure(format!("Failed to submit transaction: {}", msg));

        let response = self
            .http_client
            .post(&url)
            .form(&[("tx", tx.as_str())])
            .send()
            .await
            .map_err(|e| submit_err(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| submit_err(e.to_string()))?;

        if status.is_success() {
            let accepted: SubmitResponse = serde_json::from_str(&body)
                .map_err(|e| submit_err(format!("unexpected response: {}", e)))?;
            info!(hash = %accepted.hash, ledger = accepted.ledger, "Transaction accepted");
            return Ok(accepted.into());
        }

        let problem: Problem = serde_json::from_str(&body).unwrap_or_default();
        if let Some(codes) = problem.extras.as_ref().and_then(|e| e.result_codes.clone()) {
            warn!(status = status.as_u16(), codes = ?codes, "Transaction rejected");
            return Err(WalletError::SubmissionRejected { codes });
        }
        Err(submit_err(problem.describe(status)))
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }
}

fn describe_problem(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Problem>(body).unwrap_or_default().describe(status)
}

// ---- wire types -------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Text(String),
    Int(i64),
}

fn de_i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    match Numeric::deserialize(d)? {
        Numeric::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
        Numeric::Int(n) => Ok(n),
    }
}

fn de_u32<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let value = de_i64(d)?;
    u32::try_from(value).map_err(serde::de::Error::custom)
}

#[derive(Deserialize)]
struct AccountResponse {
    account_id: String,
    #[serde(deserialize_with = "de_i64")]
    sequence: i64,
    #[serde(default)]
    subentry_count: u32,
    #[serde(default)]
    balances: Vec<BalanceResponse>,
}

#[derive(Deserialize)]
struct BalanceResponse {
    balance: String,
    asset_type: String,
    #[serde(default)]
    asset_code: Option<String>,
    #[serde(default)]
    asset_issuer: Option<String>,
}

impl AccountResponse {
    fn into_snapshot(self) -> Result<AccountSnapshot, String> {
        let balances = self
            .balances
            .into_iter()
            .map(|b| {
                let stroops = decimal_to_stroops(&b.balance)
                    .ok_or_else(|| format!("malformed balance '{}'", b.balance))?;
                Ok(Balance {
                    asset_type: b.asset_type,
                    asset_code: b.asset_code,
                    asset_issuer: b.asset_issuer,
                    balance: stroops,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;

        Ok(AccountSnapshot {
            account_id: self.account_id,
            sequence: self.sequence,
            balances,
            subentry_count: self.subentry_count,
        })
    }
}

#[derive(Deserialize)]
struct FeeStatsResponse {
    #[serde(default, deserialize_with = "de_u32")]
    last_ledger_base_fee: u32,
    fee_charged: FeeChargedResponse,
}

#[derive(Deserialize)]
struct FeeChargedResponse {
    #[serde(default, deserialize_with = "de_u32")]
    min: u32,
    #[serde(default, deserialize_with = "de_u32")]
    mode: u32,
    #[serde(default, deserialize_with = "de_u32")]
    p10: u32,
    #[serde(default, deserialize_with = "de_u32")]
    p50: u32,
    #[serde(default, deserialize_with = "de_u32")]
    p90: u32,
    #[serde(default, deserialize_with = "de_u32")]
    p99: u32,
    #[serde(default, deserialize_with = "de_u32")]
    max: u32,
}

impl From<FeeStatsResponse> for FeeStats {
    fn from(r: FeeStatsResponse) -> Self {
        let c = r.fee_charged;
        FeeStats {
            last_ledger_base_fee: r.last_ledger_base_fee,
            fee_charged: FeeDistribution {
                min: c.min,
                mode: c.mode,
                p10: c.p10,
                p50: c.p50,
                p90: c.p90,
                p99: c.p99,
                max: c.max,
            },
        }
    }
}

#[derive(Deserialize)]
struct SubmitResponse {
    hash: String,
    #[serde(deserialize_with = "de_u32")]
    ledger: u32,
    #[serde(default)]
    envelope_xdr: Option<String>,
    #[serde(default)]
    result_xdr: Option<String>,
}

impl From<SubmitResponse> for SubmissionResult {
    fn from(r: SubmitResponse) -> Self {
        SubmissionResult {
            hash: r.hash,
            ledger: r.ledger,
            envelope_xdr: r.envelope_xdr,
            result_xdr: r.result_xdr,
        }
    }
}

/// RFC 7807 problem document returned by Horizon on errors.
#[derive(Debug, Default, Deserialize)]
struct Problem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    detail: String,
    #[serde(default)]
    extras: Option<ProblemExtras>,
}

#[derive(Debug, Default, Deserialize)]
struct ProblemExtras {
    #[serde(default)]
    result_codes: Option<ResultCodes>,
}

impl Problem {
    fn describe(&self, status: StatusCode) -> String {
        let mut msg = format!("HTTP {}", status.as_u16());
        if !self.title.is_empty() {
            msg.push_str(&format!(" {}", self.title));
        }
        if !self.detail.is_empty() {
            msg.push_str(&format!(": {}", self.detail));
        }
        msg
    }
}
