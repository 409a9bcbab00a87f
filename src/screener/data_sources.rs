//! Market data provider contract and the DexScreener HTTP implementation.
//!
//! The pipeline only sees [`MarketDataProvider`]. Every method returns the
//! records it could get plus diagnostics; transport and parse failures turn
//! into an empty record list with a populated [`FetchDebug`].

use crate::screener::rate_limit::{Bucket, EndpointRateLimiter};
use crate::screener::types::{FetchDebug, Fetched};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::{debug, instrument, warn};

/// HTTP statuses retried with backoff.
const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Error bodies are truncated to this many characters in diagnostics.
const SNIPPET_CHARS: usize = 200;

/// Source of promotion, pair and order records.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_boosts_latest(&self) -> Fetched;
    async fn fetch_boosts_top(&self) -> Fetched;
    async fn fetch_ads_latest(&self) -> Fetched;
    async fn fetch_profiles_latest(&self) -> Fetched;
    async fn fetch_community_takeovers_latest(&self) -> Fetched;
    /// Pairs for up to 30 token addresses in one call.
    async fn fetch_pairs_batch(&self, chain_id: &str, token_addresses: &[String]) -> Fetched;
    /// Pairs for a single token.
    async fn fetch_pairs_fallback(&self, chain_id: &str, token_address: &str) -> Fetched;
    /// Paid order records for a token.
    async fn fetch_orders_for_token(&self, chain_id: &str, token_address: &str) -> Fetched;
}

/// HTTP provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
    /// Retries after the first attempt
    pub retry_attempts: usize,
    /// First backoff delay; each retry doubles it
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    pub promotion_requests_per_minute: u32,
    pub pairs_requests_per_minute: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.dexscreener.com".to_string(),
            timeout_seconds: 12,
            user_agent: "paid-runners/0.1 (contact: local)".to_string(),
            retry_attempts: 3,
            backoff_base_ms: 350,
            backoff_max_ms: 3_000,
            promotion_requests_per_minute: 60,
            pairs_requests_per_minute: 300,
        }
    }
}

/// Trim and lowercase a chain id, mapping known aliases to `solana`.
pub fn normalize_chain_id(chain_id: &str) -> String {
    let chain = chain_id.trim().to_lowercase();
    match chain.as_str() {
        "sol" | "solana-mainnet" | "mainnet" | "sol-mainnet" => "solana".to_string(),
        _ => chain,
    }
}

/// Unwrap a response body into its record list.
///
/// Accepts a bare array, or an object carrying the array under the first
/// matching key of `keys`.
pub fn extract_records(data: Option<Value>, keys: &[&str]) -> Vec<Value> {
    match data {
        Some(Value::Array(items)) => items,
        Some(Value::Object(mut map)) => keys
            .iter()
            .find(|key| map.get(**key).is_some_and(Value::is_array))
            .and_then(|key| map.remove(*key))
            .and_then(|value| match value {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Profiles may also come back as a single profile object.
fn extract_profiles(data: Option<Value>) -> Vec<Value> {
    let single = data.as_ref().is_some_and(|value| {
        value.get("tokenAddress").is_some_and(Value::is_string)
            && value.get("chainId").is_some_and(Value::is_string)
    });
    if single {
        return data.into_iter().collect();
    }
    extract_records(data, &["data", "profiles", "results"])
}

/// Keep the first spelling of each address, case-insensitively, skipping blanks.
fn dedupe_addresses(token_addresses: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    token_addresses
        .iter()
        .map(|address| address.trim())
        .filter(|address| !address.is_empty() && seen.insert(address.to_lowercase()))
        .map(str::to_string)
        .collect()
}

fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_CHARS).collect()
}

/// A request that reached the server and should not be retried.
struct Attempt {
    status: u16,
    elapsed_s: f64,
    body: AttemptBody,
}

enum AttemptBody {
    Json(Value),
    ErrorText(String),
    Unparseable(String),
}

/// A request worth retrying.
enum AttemptFailure {
    Transport(String),
    Status {
        status: u16,
        elapsed_s: f64,
        text: String,
    },
}

/// DexScreener public API client.
pub struct DexScreenerClient {
    http: Client,
    config: ClientConfig,
    limiter: EndpointRateLimiter,
}

impl DexScreenerClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .context("Failed to create DexScreener HTTP client")?;

        let limiter = EndpointRateLimiter::new(
            config.promotion_requests_per_minute,
            config.pairs_requests_per_minute,
        );

        Ok(Self {
            http,
            config,
            limiter,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// GET a JSON document with retries. Never fails; problems land in the debug info.
    #[instrument(skip(self))]
    async fn get_json(&self, url: &str, bucket: Bucket) -> (Option<Value>, FetchDebug) {
        let mut info = FetchDebug::for_url(url);

        // 2^n * factor: base, 2x base, 4x base...
        let retry_strategy = ExponentialBackoff::from_millis(2)
            .factor((self.config.backoff_base_ms / 2).max(1))
            .max_delay(Duration::from_millis(self.config.backoff_max_ms))
            .take(self.config.retry_attempts);

        match Retry::spawn(retry_strategy, || self.attempt(url, bucket)).await {
            Ok(attempt) => {
                info.status = Some(attempt.status);
                info.elapsed_s = Some(attempt.elapsed_s);
                match attempt.body {
                    AttemptBody::Json(value) => return (Some(value), info),
                    AttemptBody::ErrorText(text) => {
                        warn!("DexScreener returned HTTP {} for {}", attempt.status, url);
                        info.text_snippet = Some(snippet(&text));
                    }
                    AttemptBody::Unparseable(error) => {
                        warn!("Failed to parse DexScreener response from {}: {}", url, error);
                        info.error = Some(error);
                    }
                }
            }
            Err(AttemptFailure::Status {
                status,
                elapsed_s,
                text,
            }) => {
                warn!("DexScreener still returning HTTP {} after retries: {}", status, url);
                info.status = Some(status);
                info.elapsed_s = Some(elapsed_s);
                info.text_snippet = Some(snippet(&text));
            }
            Err(AttemptFailure::Transport(error)) => {
                warn!("DexScreener request failed after retries: {}: {}", url, error);
                info.error = Some(error);
            }
        }

        (None, info)
    }

    async fn attempt(&self, url: &str, bucket: Bucket) -> Result<Attempt, AttemptFailure> {
        self.limiter.until_ready(bucket).await;

        let started = Instant::now();
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AttemptFailure::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let elapsed_s = started.elapsed().as_secs_f64();

        if RETRYABLE_STATUSES.contains(&status) {
            debug!("Retryable HTTP {} from {}", status, url);
            let text = response.text().await.unwrap_or_default();
            return Err(AttemptFailure::Status {
                status,
                elapsed_s,
                text,
            });
        }

        let body = if status >= 400 {
            AttemptBody::ErrorText(response.text().await.unwrap_or_default())
        } else {
            match response.json::<Value>().await {
                Ok(value) => AttemptBody::Json(value),
                Err(e) => AttemptBody::Unparseable(e.to_string()),
            }
        };

        Ok(Attempt {
            status,
            elapsed_s,
            body,
        })
    }

    async fn fetch_list(&self, path: &str, bucket: Bucket, keys: &[&str]) -> Fetched {
        let (data, info) = self.get_json(&self.url(path), bucket).await;
        let records = extract_records(data, keys);
        debug!("{} returned {} records", path, records.len());
        Fetched::new(records, info)
    }
}

#[async_trait]
impl MarketDataProvider for DexScreenerClient {
    async fn fetch_boosts_latest(&self) -> Fetched {
        self.fetch_list(
            "/token-boosts/latest/v1",
            Bucket::Promotion,
            &["data", "boosts", "tokens", "results"],
        )
        .await
    }

    async fn fetch_boosts_top(&self) -> Fetched {
        self.fetch_list(
            "/token-boosts/top/v1",
            Bucket::Promotion,
            &["data", "boosts", "tokens", "results"],
        )
        .await
    }

    async fn fetch_ads_latest(&self) -> Fetched {
        self.fetch_list("/ads/latest/v1", Bucket::Promotion, &["data", "ads", "results"])
            .await
    }

    async fn fetch_profiles_latest(&self) -> Fetched {
        let (data, info) = self
            .get_json(&self.url("/token-profiles/latest/v1"), Bucket::Promotion)
            .await;
        Fetched::new(extract_profiles(data), info)
    }

    async fn fetch_community_takeovers_latest(&self) -> Fetched {
        self.fetch_list(
            "/community-takeovers/latest/v1",
            Bucket::Promotion,
            &["data", "results", "ctos"],
        )
        .await
    }

    #[instrument(skip(self, token_addresses), fields(count = token_addresses.len()))]
    async fn fetch_pairs_batch(&self, chain_id: &str, token_addresses: &[String]) -> Fetched {
        let addresses = dedupe_addresses(token_addresses);
        if addresses.is_empty() {
            return Fetched::empty(FetchDebug::with_note("empty_token_addresses"));
        }

        let path = format!(
            "/tokens/v1/{}/{}",
            normalize_chain_id(chain_id),
            addresses.join(",")
        );
        self.fetch_list(&path, Bucket::Pairs, &["pairs", "data", "results"])
            .await
    }

    #[instrument(skip(self))]
    async fn fetch_pairs_fallback(&self, chain_id: &str, token_address: &str) -> Fetched {
        let path = format!(
            "/token-pairs/v1/{}/{}",
            normalize_chain_id(chain_id),
            token_address
        );
        self.fetch_list(&path, Bucket::Pairs, &["pairs", "data", "results"])
            .await
    }

    #[instrument(skip(self))]
    async fn fetch_orders_for_token(&self, chain_id: &str, token_address: &str) -> Fetched {
        let path = format!("/orders/v1/{}/{}", normalize_chain_id(chain_id), token_address);
        self.fetch_list(&path, Bucket::Promotion, &["orders", "data", "results"])
            .await
    }
}
