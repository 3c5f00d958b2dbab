//! Price lookup providers.
//!
//! Defines the `PriceLookup` trait consumed by the engine and provides:
//! - `SimulatedPrices` — deterministic offline prices derived from item names
//! - `SteamApisClient` — live market prices over HTTP
//! - `CachedPriceLookup` — TTL cache and request pacing around any provider
//!
//! plus helpers for batch lookups and case prices.

pub mod cache;
pub mod simulated;
pub mod steamapis;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

use crate::catalog::CollectionInfo;

pub use cache::{CacheConfig, CachedPriceLookup};
pub use simulated::SimulatedPrices;
pub use steamapis::SteamApisClient;

/// Wear condition used when none is configured.
pub const DEFAULT_WEAR: &str = "Field-Tested";

/// Abstraction over item price sources.
///
/// Implementors may be slow, rate-limited or fallible. Callers decide
/// how to treat failures; the engine maps them to a zero price.
#[async_trait]
pub trait PriceLookup: Send + Sync {
    /// Price of one item, optionally at a specific wear condition.
    async fn get_price(&self, item_name: &str, wear: Option<&str>) -> Result<Decimal>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

/// Market listing name: `"AWP | Duality (Field-Tested)"`.
pub fn market_hash_name(item_name: &str, wear: Option<&str>) -> String {
    match wear {
        Some(w) if !w.is_empty() => format!("{item_name} ({w})"),
        _ => item_name.to_string(),
    }
}

/// Extract a number from a currency string (`"¥ 1,234.50"` → `1234.50`).
///
/// Everything but digits and dots is stripped, then the longest leading
/// number is read, so `"1.2.3"` gives `1.2`. Returns zero when nothing
/// numeric remains.
pub fn parse_price(raw: &str) -> Decimal {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let end = digits
        .match_indices('.')
        .nth(1)
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    let number = digits[..end].trim_end_matches('.');

    match number {
        "" => Decimal::ZERO,
        n if n.starts_with('.') => Decimal::from_str(&format!("0{n}")).unwrap_or(Decimal::ZERO),
        n => Decimal::from_str(n).unwrap_or(Decimal::ZERO),
    }
}

/// Market price of the case that drops a collection. Cases have no
/// wear, so the lookup uses the bare market name.
pub async fn case_price(lookup: &dyn PriceLookup, collection: &CollectionInfo) -> Result<Decimal> {
    lookup.get_price(&collection.market_name, None).await
}

/// Resolve prices for many names one at a time. Failed lookups are
/// logged and recorded as zero.
pub async fn batch_prices(
    lookup: &dyn PriceLookup,
    names: &[String],
    wear: Option<&str>,
) -> HashMap<String, Decimal> {
    let mut prices = HashMap::with_capacity(names.len());

    for name in names {
        let price = match lookup.get_price(name, wear).await {
            Ok(p) => p,
            Err(e) => {
                warn!(item = %name, source = lookup.name(), error = %e, "Price lookup failed");
                Decimal::ZERO
            }
        };
        prices.insert(name.clone(), price);
    }

    prices
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
