//! Trade-up calculator.
//!
//! Validates a contract's inputs, derives the output distribution,
//! prices inputs and outputs through an injected `PriceLookup`, and
//! computes cost, expected value, profit, ROI and break-even odds.

use chrono::Utc;
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::distribution::build_distribution;
use crate::catalog::CatalogLookup;
use crate::pricing::{PriceLookup, DEFAULT_WEAR};
use crate::types::{
    ContractSummary, Item, OutputCandidate, QualityTier, TradeUpError, TradeUpResult,
    CONTRACT_SIZE,
};

/// Slot a fetched price is written back to.
#[derive(Debug, Clone, Copy)]
enum PriceSlot {
    Input(usize),
    Output(usize),
}

/// Expected-value calculator for one contract.
///
/// Owns its inputs and outputs exclusively; the catalog is shared.
pub struct TradeUpCalculator {
    catalog: Arc<dyn CatalogLookup>,
    /// Wear condition requested from the price source.
    wear: Option<String>,
    inputs: Vec<Item>,
    outputs: Vec<OutputCandidate>,
    result: Option<TradeUpResult>,
}

impl TradeUpCalculator {
    pub fn new(catalog: Arc<dyn CatalogLookup>) -> Self {
        Self {
            catalog,
            wear: Some(DEFAULT_WEAR.to_string()),
            inputs: Vec::new(),
            outputs: Vec::new(),
            result: None,
        }
    }

    /// Override the wear condition used for price lookups.
    pub fn with_wear(mut self, wear: Option<String>) -> Self {
        self.wear = wear;
        self
    }

    pub fn inputs(&self) -> &[Item] {
        &self.inputs
    }

    /// Possible outputs in distribution order.
    pub fn outputs(&self) -> &[OutputCandidate] {
        &self.outputs
    }

    /// Shared tier of the current inputs.
    pub fn input_tier(&self) -> Option<QualityTier> {
        self.inputs.first().map(|i| i.tier)
    }

    /// The most recently computed result.
    pub fn result(&self) -> Option<&TradeUpResult> {
        self.result.as_ref()
    }

    // -- Inputs ----------------------------------------------------------

    /// Replace the contract inputs and derive the output distribution.
    ///
    /// Rejected inputs leave the calculator unchanged. Prices are not
    /// fetched here.
    pub fn set_inputs(&mut self, items: Vec<Item>) -> Result<(), TradeUpError> {
        if items.len() != CONTRACT_SIZE {
            return Err(TradeUpError::WrongCount { found: items.len() });
        }

        let mut tiers: Vec<QualityTier> = items.iter().map(|i| i.tier).collect();
        tiers.sort();
        tiers.dedup();
        if tiers.len() != 1 {
            return Err(TradeUpError::MixedQuality { tiers });
        }

        self.outputs = build_distribution(self.catalog.as_ref(), &items);
        self.inputs = items;
        self.result = None;

        debug!(
            tier = %tiers[0],
            outputs = self.outputs.len(),
            "Contract inputs set"
        );

        Ok(())
    }

    // -- Pricing ---------------------------------------------------------

    /// Price every input and output that has no price yet.
    ///
    /// Lookups run concurrently. A failed lookup prices that item at zero
    /// and never aborts the batch.
    pub async fn price_all(&mut self, prices: &dyn PriceLookup) {
        let pending: Vec<(PriceSlot, String)> = self
            .inputs
            .iter()
            .enumerate()
            .filter(|(_, item)| item.price.is_none())
            .map(|(i, item)| (PriceSlot::Input(i), item.name.clone()))
            .chain(
                self.outputs
                    .iter()
                    .enumerate()
                    .filter(|(_, out)| out.price.is_none())
                    .map(|(i, out)| (PriceSlot::Output(i), out.name.clone())),
            )
            .collect();

        if pending.is_empty() {
            return;
        }

        let wear = self.wear.clone();
        let fetched = join_all(
            pending
                .iter()
                .map(|(_, name)| prices.get_price(name, wear.as_deref())),
        )
        .await;

        let mut failures = 0usize;
        for ((slot, name), outcome) in pending.iter().zip(fetched) {
            let price = match outcome {
                Ok(p) => p,
                Err(e) => {
                    failures += 1;
                    warn!(item = %name, source = prices.name(), error = %e, "Price lookup failed, using 0");
                    Decimal::ZERO
                }
            };
            match *slot {
                PriceSlot::Input(i) => self.inputs[i].price = Some(price),
                PriceSlot::Output(i) => self.outputs[i].price = Some(price),
            }
        }

        info!(
            source = prices.name(),
            priced = pending.len(),
            failures,
            "Contract priced"
        );
    }

    // -- Metrics ---------------------------------------------------------

    /// Sum of input prices; unpriced inputs count as zero.
    pub fn total_cost(&self) -> Decimal {
        self.inputs.iter().map(Item::price_or_zero).sum()
    }

    /// Probability-weighted sum of output prices; unpriced outputs count
    /// as zero.
    pub fn expected_value(&self) -> Decimal {
        self.outputs.iter().map(OutputCandidate::expected_contribution).sum()
    }

    /// Probability that the drawn output is worth at least the total cost.
    pub fn break_even_probability(&self) -> Decimal {
        let total_cost = self.total_cost();
        self.outputs
            .iter()
            .filter(|o| o.price_or_zero() >= total_cost)
            .map(|o| o.probability)
            .sum()
    }

    /// Highest-priced output. Ties keep the earliest in distribution order.
    pub fn best_output(&self) -> Option<&OutputCandidate> {
        let mut iter = self.outputs.iter();
        let first = iter.next()?;
        Some(iter.fold(first, |best, o| {
            if o.price_or_zero() > best.price_or_zero() { o } else { best }
        }))
    }

    /// Lowest-priced output. Ties keep the earliest in distribution order.
    pub fn worst_output(&self) -> Option<&OutputCandidate> {
        let mut iter = self.outputs.iter();
        let first = iter.next()?;
        Some(iter.fold(first, |worst, o| {
            if o.price_or_zero() < worst.price_or_zero() { o } else { worst }
        }))
    }

    /// Compute, store and return the contract result from current prices.
    pub fn compute_result(&mut self) -> TradeUpResult {
        let total_cost = self.total_cost();
        let expected_value = self.expected_value();
        let profit = expected_value - total_cost;
        let roi = roi_percent(profit, total_cost);

        let result = TradeUpResult {
            total_cost,
            expected_value,
            profit,
            roi,
            break_even_probability: self.break_even_probability(),
            best_output: self.best_output().cloned(),
            worst_output: self.worst_output().cloned(),
            outputs: self.outputs.clone(),
            inputs: self.inputs.clone(),
            computed_at: Utc::now(),
        };

        debug!(
            total_cost = %result.total_cost,
            expected_value = %result.expected_value,
            roi = %format!("{:.2}%", result.roi),
            "Contract evaluated"
        );

        self.result = Some(result.clone());
        result
    }

    // -- Search ----------------------------------------------------------

    /// Build a contract from the cheapest `tier` items in `available`.
    ///
    /// Greedy: takes the ten lowest-priced items (stable on ties, unpriced
    /// items count as zero), then prices and evaluates the contract. This
    /// is not a search over every possible ten-item subset.
    pub async fn find_optimal_trade_up(
        catalog: Arc<dyn CatalogLookup>,
        available: &[Item],
        tier: QualityTier,
        prices: &dyn PriceLookup,
    ) -> Result<Self, TradeUpError> {
        let mut candidates: Vec<Item> = available
            .iter()
            .filter(|i| i.tier == tier)
            .cloned()
            .collect();

        if candidates.len() < CONTRACT_SIZE {
            return Err(TradeUpError::InsufficientSupply {
                tier,
                available: candidates.len(),
            });
        }

        candidates.sort_by(|a, b| a.price_or_zero().cmp(&b.price_or_zero()));
        candidates.truncate(CONTRACT_SIZE);

        info!(
            tier = %tier,
            pool = available.len(),
            "Selected cheapest contract inputs"
        );

        let mut calculator = Self::new(catalog);
        calculator.set_inputs(candidates)?;
        calculator.price_all(prices).await;
        calculator.compute_result();
        Ok(calculator)
    }
}

/// `profit / total_cost × 100`, or zero for a free contract. Saturates
/// at the `Decimal` bounds instead of overflowing.
fn roi_percent(profit: Decimal, total_cost: Decimal) -> Decimal {
    if total_cost <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    match profit
        .checked_div(total_cost)
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
    {
        Some(roi) => roi,
        None => {
            let saturated = if profit.is_sign_negative() { Decimal::MIN } else { Decimal::MAX };
            warn!(%profit, %total_cost, "ROI out of range, saturating");
            saturated
        }
    }
}

/// Rank contracts by ROI, best first. Contracts without a computed
/// result rank as zero ROI and zero profit.
pub fn compare_contracts(contracts: &[TradeUpCalculator]) -> Vec<ContractSummary> {
    let mut summaries: Vec<ContractSummary> = contracts
        .iter()
        .map(|c| ContractSummary {
            inputs: c.inputs.iter().map(|i| i.name.clone()).collect(),
            roi: c.result.as_ref().map(|r| r.roi).unwrap_or(Decimal::ZERO),
            profit: c.result.as_ref().map(|r| r.profit).unwrap_or(Decimal::ZERO),
            break_even_probability: c.break_even_probability(),
        })
        .collect();

    summaries.sort_by(|a, b| b.roi.cmp(&a.roi));
    summaries
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
