//! Caching and request pacing around a price source.
//!
//! Wraps any `PriceLookup` with an in-memory TTL cache keyed by market
//! hash name, and enforces a minimum delay between upstream requests.
//! Failed lookups are not cached.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use super::{market_hash_name, PriceLookup};

/// Default cache lifetime for a price.
const DEFAULT_TTL_SECS: i64 = 5 * 60;

/// Default minimum spacing between upstream requests.
const DEFAULT_REQUEST_DELAY_MS: u64 = 1500;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub request_delay: std::time::Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(DEFAULT_TTL_SECS),
            request_delay: std::time::Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
        }
    }
}

struct CacheEntry {
    price: Decimal,
    inserted_at: DateTime<Utc>,
}

/// A `PriceLookup` that serves repeated names from memory and paces
/// calls to the wrapped source.
pub struct CachedPriceLookup<P> {
    inner: P,
    config: CacheConfig,
    entries: Mutex<HashMap<String, CacheEntry>>,
    /// Held across the pacing sleep so upstream calls are serialised.
    last_request: tokio::sync::Mutex<Option<tokio::time::Instant>>,
}

impl<P: PriceLookup> CachedPriceLookup<P> {
    pub fn new(inner: P, config: CacheConfig) -> Self {
        Self {
            inner,
            config,
            entries: Mutex::new(HashMap::new()),
            last_request: tokio::sync::Mutex::new(None),
        }
    }

    /// Drop every cached price.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
        debug!(source = self.inner.name(), "Price cache cleared");
    }

    /// Number of cached entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, key: &str) -> Option<Decimal> {
        let entries = self.entries.lock().ok()?;
        entries.get(key).and_then(|entry| {
            if Utc::now() - entry.inserted_at < self.config.ttl {
                Some(entry.price)
            } else {
                None
            }
        })
    }

    fn store(&self, key: String, price: Decimal) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key, CacheEntry { price, inserted_at: Utc::now() });
        }
    }

    /// Fetch from the wrapped source, one request at a time.
    ///
    /// Concurrent misses for the same key queue on the pacing lock; the
    /// first stores its price and the rest are served from the cache.
    async fn fetch_paced(&self, key: &str, item_name: &str, wear: Option<&str>) -> Result<Decimal> {
        let mut last = self.last_request.lock().await;

        if let Some(price) = self.cached(key) {
            debug!(item = %key, "Price cache hit after wait");
            return Ok(price);
        }

        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.config.request_delay {
                tokio::time::sleep(self.config.request_delay - elapsed).await;
            }
        }
        *last = Some(tokio::time::Instant::now());

        let price = self.inner.get_price(item_name, wear).await?;
        self.store(key.to_string(), price);
        Ok(price)
    }
}

#[async_trait]
impl<P: PriceLookup> PriceLookup for CachedPriceLookup<P> {
    async fn get_price(&self, item_name: &str, wear: Option<&str>) -> Result<Decimal> {
        let key = market_hash_name(item_name, wear);

        if let Some(price) = self.cached(&key) {
            debug!(item = %key, "Price cache hit");
            return Ok(price);
        }

        self.fetch_paced(&key, item_name, wear).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
