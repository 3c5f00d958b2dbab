//! Mock price source for integration testing.
//!
//! Provides a deterministic `PriceLookup` implementation backed by an
//! in-memory table, with per-name forced failures and a call log, so
//! tests can control every price the engine sees.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tradeup::pricing::PriceLookup;

/// A mock price source. Unlisted names price at `default_price`.
/// Clones share the failure set and the call log.
#[derive(Clone)]
pub struct MockPrices {
    table: HashMap<String, Decimal>,
    default_price: Decimal,
    failing: Arc<Mutex<HashSet<String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockPrices {
    pub fn new(default_price: Decimal) -> Self {
        Self {
            table: HashMap::new(),
            default_price,
            failing: Arc::new(Mutex::new(HashSet::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set a fixed price for one name.
    pub fn with_price(mut self, name: &str, price: Decimal) -> Self {
        self.table.insert(name.to_string(), price);
        self
    }

    /// Make every lookup of `name` fail.
    pub fn fail_on(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    /// Names looked up so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceLookup for MockPrices {
    async fn get_price(&self, item_name: &str, _wear: Option<&str>) -> Result<Decimal> {
        self.calls.lock().unwrap().push(item_name.to_string());

        if self.failing.lock().unwrap().contains(item_name) {
            return Err(anyhow!("mock failure for {item_name}"));
        }

        Ok(self.table.get(item_name).copied().unwrap_or(self.default_price))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
