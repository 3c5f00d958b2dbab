//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys) are referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use crate::pricing::steamapis::{DEFAULT_APP_ID, DEFAULT_BASE_URL};
use crate::pricing::{CacheConfig, DEFAULT_WEAR};
use crate::types::QualityTier;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSection,
    pub pricing: PricingConfig,
    pub scan: ScanConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
    /// Label appended to money amounts in logs.
    pub currency: String,
}

/// Which price source backs the calculator.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Simulated,
    SteamApis,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PricingConfig {
    pub source: PriceSource,
    /// Env var holding the SteamApis key.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_app_id")]
    pub app_id: u32,
    /// Wear condition requested for every item. Empty string for none.
    #[serde(default = "default_wear")]
    pub wear: String,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: i64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    /// Tier names to evaluate, e.g. `["mil-spec", "restricted"]`.
    pub tiers: Vec<String>,
    /// Custom catalog file. The built-in catalog is used when absent.
    #[serde(default)]
    pub catalog_path: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_app_id() -> u32 {
    DEFAULT_APP_ID
}

fn default_wear() -> String {
    DEFAULT_WEAR.to_string()
}

fn default_request_delay_ms() -> u64 {
    1500
}

fn default_cache_ttl_secs() -> i64 {
    300
}

fn default_timeout_secs() -> u64 {
    15
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}

impl PricingConfig {
    /// Wear condition to request, `None` when configured empty.
    pub fn wear(&self) -> Option<String> {
        let wear = self.wear.trim();
        (!wear.is_empty()).then(|| wear.to_string())
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl: chrono::Duration::seconds(self.cache_ttl_secs),
            request_delay: std::time::Duration::from_millis(self.request_delay_ms),
        }
    }
}

impl ScanConfig {
    /// Parsed tier list. Fails on the first unknown name.
    pub fn tiers(&self) -> Result<Vec<QualityTier>> {
        self.tiers
            .iter()
            .map(|t| t.parse::<QualityTier>().map_err(anyhow::Error::from))
            .collect()
    }
}
