//! SteamApis market price integration.
//!
//! API: `https://api.steamapis.com/market/item/{app_id}/{market_hash_name}`
//! Auth: `api_key` query parameter.
//! Rate limit: plan-dependent; pace requests with `CachedPriceLookup`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::prelude::*;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use tracing::debug;

use super::{market_hash_name, parse_price, PriceLookup};

pub const DEFAULT_BASE_URL: &str = "https://api.steamapis.com";

/// Counter-Strike app id on the Steam market.
pub const DEFAULT_APP_ID: u32 = 730;

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

/// Item summary. Prices arrive either as numbers or as currency strings.
#[derive(Debug, Deserialize)]
struct MarketItemResponse {
    #[serde(default)]
    median_price: Option<serde_json::Value>,
    #[serde(default)]
    lowest_price: Option<serde_json::Value>,
}

impl MarketItemResponse {
    fn price(&self) -> Option<Decimal> {
        self.median_price
            .as_ref()
            .and_then(value_to_price)
            .or_else(|| self.lowest_price.as_ref().and_then(value_to_price))
    }
}

fn value_to_price(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().and_then(Decimal::from_f64),
        serde_json::Value::String(s) => Some(parse_price(s)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct SteamApisClient {
    http: Client,
    api_key: Secret<String>,
    base_url: String,
    app_id: u32,
}

impl SteamApisClient {
    pub fn new(api_key: String, base_url: Option<String>, app_id: Option<u32>, timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent("tradeup/0.1.0")
            .build()
            .context("Failed to build HTTP client for SteamApis")?;

        Ok(Self {
            http,
            api_key: Secret::new(api_key),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            app_id: app_id.unwrap_or(DEFAULT_APP_ID),
        })
    }

    fn item_url(&self, hash_name: &str) -> String {
        format!(
            "{}/market/item/{}/{}",
            self.base_url,
            self.app_id,
            urlencoding::encode(hash_name),
        )
    }
}

#[async_trait]
impl PriceLookup for SteamApisClient {
    async fn get_price(&self, item_name: &str, wear: Option<&str>) -> Result<Decimal> {
        let hash_name = market_hash_name(item_name, wear);
        let url = self.item_url(&hash_name);

        debug!(url = %url, "Fetching market price");

        let resp = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.expose_secret().as_str())])
            .send()
            .await
            .with_context(|| format!("SteamApis request failed for {hash_name}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("SteamApis error {status} for {hash_name}: {body}");
        }

        let item: MarketItemResponse = resp
            .json()
            .await
            .context("Failed to parse SteamApis item response")?;

        item.price()
            .with_context(|| format!("No price data for {hash_name}"))
    }

    fn name(&self) -> &str {
        "steamapis"
    }
}
