//! Shared types for the trade-up calculator.
//!
//! These types form the data model used across the catalog, pricing,
//! and engine modules. They carry no behaviour beyond small derived
//! quantities so every module can depend on them without cycles.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of items consumed by a single trade-up contract.
pub const CONTRACT_SIZE: usize = 10;

// ---------------------------------------------------------------------------
// Quality tier
// ---------------------------------------------------------------------------

/// Rarity classification of an item. Ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualityTier {
    Consumer,
    Industrial,
    MilSpec,
    Restricted,
    Classified,
    Covert,
}

impl QualityTier {
    /// All tiers in ascending order.
    pub const ALL: &'static [QualityTier] = &[
        QualityTier::Consumer,
        QualityTier::Industrial,
        QualityTier::MilSpec,
        QualityTier::Restricted,
        QualityTier::Classified,
        QualityTier::Covert,
    ];

    /// The tier a contract of this tier produces. `None` for the top tier.
    pub fn successor(&self) -> Option<QualityTier> {
        match self {
            QualityTier::Consumer => Some(QualityTier::Industrial),
            QualityTier::Industrial => Some(QualityTier::MilSpec),
            QualityTier::MilSpec => Some(QualityTier::Restricted),
            QualityTier::Restricted => Some(QualityTier::Classified),
            QualityTier::Classified => Some(QualityTier::Covert),
            QualityTier::Covert => None,
        }
    }

    /// Key used in catalog files and config (`"mil-spec"`).
    pub fn key(&self) -> &'static str {
        match self {
            QualityTier::Consumer => "consumer",
            QualityTier::Industrial => "industrial",
            QualityTier::MilSpec => "mil-spec",
            QualityTier::Restricted => "restricted",
            QualityTier::Classified => "classified",
            QualityTier::Covert => "covert",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityTier::Consumer => write!(f, "Consumer"),
            QualityTier::Industrial => write!(f, "Industrial"),
            QualityTier::MilSpec => write!(f, "Mil-Spec"),
            QualityTier::Restricted => write!(f, "Restricted"),
            QualityTier::Classified => write!(f, "Classified"),
            QualityTier::Covert => write!(f, "Covert"),
        }
    }
}

/// Parse a tier name (case-insensitive).
impl std::str::FromStr for QualityTier {
    type Err = TradeUpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "consumer" => Ok(QualityTier::Consumer),
            "industrial" => Ok(QualityTier::Industrial),
            "mil-spec" | "milspec" | "mil_spec" => Ok(QualityTier::MilSpec),
            "restricted" => Ok(QualityTier::Restricted),
            "classified" => Ok(QualityTier::Classified),
            "covert" => Ok(QualityTier::Covert),
            _ => Err(TradeUpError::UnknownTier(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// A tradeable item. The price is late-bound: `None` until priced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub tier: QualityTier,
    pub collection_id: String,
    pub price: Option<Decimal>,
}

impl Item {
    pub fn new(name: impl Into<String>, tier: QualityTier, collection_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tier,
            collection_id: collection_id.into(),
            price: None,
        }
    }

    /// Builder-style price assignment.
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    /// Price with a missing value treated as zero.
    pub fn price_or_zero(&self) -> Decimal {
        self.price.unwrap_or(Decimal::ZERO)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.price {
            Some(p) => write!(f, "{} [{} / {}] {:.2}", self.name, self.tier, self.collection_id, p),
            None => write!(f, "{} [{} / {}] unpriced", self.name, self.tier, self.collection_id),
        }
    }
}

/// One possible result of a contract, with its draw probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputCandidate {
    pub name: String,
    pub tier: QualityTier,
    pub collection_id: String,
    /// Display name of the source collection.
    pub collection_name: String,
    pub probability: Decimal,
    pub price: Option<Decimal>,
}

impl OutputCandidate {
    /// Price with a missing value treated as zero.
    pub fn price_or_zero(&self) -> Decimal {
        self.price.unwrap_or(Decimal::ZERO)
    }

    /// price × probability.
    pub fn expected_contribution(&self) -> Decimal {
        self.price_or_zero() * self.probability
    }
}

impl fmt::Display for OutputCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) p={} price={:.2} ev={:.2}",
            self.name,
            self.collection_name,
            format_probability(self.probability),
            self.price_or_zero(),
            self.expected_contribution(),
        )
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of pricing one contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeUpResult {
    pub total_cost: Decimal,
    pub expected_value: Decimal,
    /// expected_value − total_cost
    pub profit: Decimal,
    /// profit / total_cost × 100; 0 when total_cost is 0.
    pub roi: Decimal,
    /// Probability mass of outputs whose price covers the total cost (0–1).
    pub break_even_probability: Decimal,
    pub best_output: Option<OutputCandidate>,
    pub worst_output: Option<OutputCandidate>,
    /// In distribution order.
    pub outputs: Vec<OutputCandidate>,
    pub inputs: Vec<Item>,
    pub computed_at: DateTime<Utc>,
}

impl TradeUpResult {
    /// Whether the contract is expected to return more than it costs.
    pub fn is_profitable(&self) -> bool {
        self.profit > Decimal::ZERO
    }

    /// Sum of output probabilities. Below 1 when a source collection had
    /// no items at the output tier.
    pub fn total_probability(&self) -> Decimal {
        self.outputs.iter().map(|o| o.probability).sum()
    }
}

impl fmt::Display for TradeUpResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cost={:.2} ev={:.2} profit={:.2} roi={} break_even={} outputs={}",
            self.total_cost,
            self.expected_value,
            self.profit,
            format_percent(self.roi),
            format_probability(self.break_even_probability),
            self.outputs.len(),
        )
    }
}

/// One row of a contract comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractSummary {
    pub inputs: Vec<String>,
    pub roi: Decimal,
    pub profit: Decimal,
    pub break_even_probability: Decimal,
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format a value already expressed in percent (`12.345` → `"12.35%"`).
pub fn format_percent(value: Decimal) -> String {
    format!("{:.2}%", value)
}

/// Format a 0–1 probability as a percentage (`0.0857` → `"8.57%"`).
pub fn format_probability(probability: Decimal) -> String {
    format_percent(probability * dec!(100))
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Rejected contract input. Always recoverable by correcting the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TradeUpError {
    #[error("A trade-up contract needs exactly 10 items, got {found}")]
    WrongCount { found: usize },

    #[error("All contract inputs must share one quality tier, found {tiers:?}")]
    MixedQuality { tiers: Vec<QualityTier> },

    #[error("Not enough {tier} items for a contract: {available} available")]
    InsufficientSupply { tier: QualityTier, available: usize },

    #[error("Unknown quality tier: {0}")]
    UnknownTier(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
