//! Deterministic simulated prices.
//!
//! Produces a stable, plausible price for any item name without network
//! access. Used for offline runs and as the default price source.

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

use super::PriceLookup;

/// Base price and spread for a weapon family.
struct PriceBand {
    keywords: &'static [&'static str],
    base: Decimal,
    variance: Decimal,
}

const BANDS: &[PriceBand] = &[
    PriceBand { keywords: &["AK-47", "M4A4", "M4A1-S"], base: dec!(10), variance: dec!(50) },
    PriceBand { keywords: &["AWP"], base: dec!(15), variance: dec!(100) },
    PriceBand { keywords: &["Desert Eagle", "USP-S", "Glock-18"], base: dec!(3), variance: dec!(15) },
];

const DEFAULT_BASE: Decimal = dec!(0.5);
const DEFAULT_VARIANCE: Decimal = dec!(2);

/// Name-hashed price source. Wear is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedPrices;

impl SimulatedPrices {
    pub fn new() -> Self {
        Self
    }

    /// The simulated price for `item_name`, rounded to cents.
    pub fn price_of(item_name: &str) -> Decimal {
        let hash: u32 = item_name.encode_utf16().map(u32::from).sum();

        let (base, variance) = BANDS
            .iter()
            .find(|band| band.keywords.iter().any(|kw| item_name.contains(kw)))
            .map(|band| (band.base, band.variance))
            .unwrap_or((DEFAULT_BASE, DEFAULT_VARIANCE));

        let factor = Decimal::from(hash % 100) / dec!(100);
        (base + factor * variance).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

#[async_trait]
impl PriceLookup for SimulatedPrices {
    async fn get_price(&self, item_name: &str, _wear: Option<&str>) -> Result<Decimal> {
        Ok(Self::price_of(item_name))
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
