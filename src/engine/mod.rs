//! Expected-value engine — distribution → pricing → evaluation.

pub mod calculator;
pub mod distribution;

pub use calculator::{compare_contracts, TradeUpCalculator};
