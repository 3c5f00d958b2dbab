//! End-to-end contract evaluation against the built-in catalog.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use tradeup::catalog::{Catalog, CatalogLookup};
use tradeup::engine::{compare_contracts, TradeUpCalculator};
use tradeup::pricing::{batch_prices, CacheConfig, CachedPriceLookup, SimulatedPrices};
use tradeup::types::{Item, QualityTier, TradeUpError};

use crate::mock_prices::MockPrices;

const TOLERANCE: Decimal = dec!(0.000000001);

fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::builtin().unwrap())
}

fn shared(catalog: &Arc<Catalog>) -> Arc<dyn CatalogLookup> {
    catalog.clone()
}

/// The first `n` catalog items of `collection` at `tier`.
fn take(catalog: &Catalog, collection: &str, tier: QualityTier, n: usize) -> Vec<Item> {
    catalog
        .items_at(tier)
        .into_iter()
        .filter(|i| i.collection_id == collection)
        .take(n)
        .collect()
}

/// Six Revolution and four Kilowatt mil-spec inputs.
fn revolution_kilowatt(catalog: &Catalog) -> Vec<Item> {
    let mut inputs = take(catalog, "revolution", QualityTier::MilSpec, 6);
    inputs.extend(take(catalog, "kilowatt", QualityTier::MilSpec, 4));
    inputs
}

#[tokio::test]
async fn test_full_pipeline() {
    let catalog = catalog();
    let prices = MockPrices::new(dec!(1)).with_price("AWP | Devourer", dec!(100));

    let mut calc = TradeUpCalculator::new(shared(&catalog));
    calc.set_inputs(revolution_kilowatt(&catalog)).unwrap();
    calc.price_all(&prices).await;
    let result = calc.compute_result();

    assert_eq!(result.outputs.len(), 10);
    assert!(result.outputs[..5].iter().all(|o| o.probability == dec!(0.12)));
    assert!(result.outputs[5..].iter().all(|o| o.probability == dec!(0.08)));
    assert_eq!(result.total_probability(), Decimal::ONE);

    assert_eq!(result.total_cost, dec!(10));
    assert_eq!(result.expected_value, dec!(12.88));
    assert_eq!(result.profit, dec!(2.88));
    assert_eq!(result.roi, dec!(28.8));
    assert_eq!(result.break_even_probability, dec!(0.12));
    assert!(result.is_profitable());

    assert_eq!(result.best_output.as_ref().unwrap().name, "AWP | Devourer");
    assert_eq!(result.worst_output.as_ref().unwrap().name, "M4A4 | Etch Lord");
    assert_eq!(prices.calls().len(), 20);
}

#[tokio::test]
async fn test_price_failures_are_absorbed() {
    let catalog = catalog();
    let prices = MockPrices::new(dec!(1)).with_price("AWP | Devourer", dec!(100));
    prices.fail_on("AWP | Devourer");
    prices.fail_on("Tec-9 | Rebel");

    let mut calc = TradeUpCalculator::new(shared(&catalog));
    calc.set_inputs(revolution_kilowatt(&catalog)).unwrap();
    calc.price_all(&prices).await;
    let result = calc.compute_result();

    assert_eq!(result.total_cost, dec!(9));
    assert_eq!(result.expected_value, dec!(0.88));
    assert_eq!(result.profit, result.expected_value - result.total_cost);
    assert_eq!(result.worst_output.as_ref().unwrap().name, "AWP | Devourer");
}

#[tokio::test]
async fn test_top_tier_contract_has_no_outputs() {
    let catalog = catalog();
    let prices = MockPrices::new(dec!(1));

    let mut inputs = take(&catalog, "recoil", QualityTier::Covert, 2);
    inputs.extend(take(&catalog, "kilowatt", QualityTier::Covert, 2));
    inputs.extend(take(&catalog, "revolution", QualityTier::Covert, 2));
    inputs.extend(take(&catalog, "dreams_and_nightmares", QualityTier::Covert, 2));
    inputs.extend(take(&catalog, "recoil", QualityTier::Covert, 2));

    let mut calc = TradeUpCalculator::new(shared(&catalog));
    calc.set_inputs(inputs).unwrap();
    calc.price_all(&prices).await;
    let result = calc.compute_result();

    assert!(result.outputs.is_empty());
    assert_eq!(result.expected_value, Decimal::ZERO);
    assert_eq!(result.total_cost, dec!(10));
    assert_eq!(result.roi, dec!(-100));
}

#[tokio::test]
async fn test_zero_cost_roi_is_zero() {
    let catalog = catalog();
    let prices = MockPrices::new(Decimal::ZERO).with_price("AWP | Devourer", dec!(40));

    let mut calc = TradeUpCalculator::new(shared(&catalog));
    calc.set_inputs(revolution_kilowatt(&catalog)).unwrap();
    calc.price_all(&prices).await;
    let result = calc.compute_result();

    assert_eq!(result.total_cost, Decimal::ZERO);
    assert_eq!(result.expected_value, dec!(4.8));
    assert_eq!(result.roi, Decimal::ZERO);
    assert_eq!(result.break_even_probability, Decimal::ONE);
}

#[test]
fn test_validation_errors() {
    let catalog = catalog();
    let mut calc = TradeUpCalculator::new(shared(&catalog));

    let nine = take(&catalog, "revolution", QualityTier::MilSpec, 7)
        .into_iter()
        .chain(take(&catalog, "recoil", QualityTier::MilSpec, 2))
        .collect();
    assert_eq!(calc.set_inputs(nine), Err(TradeUpError::WrongCount { found: 9 }));

    let mut mixed = take(&catalog, "revolution", QualityTier::MilSpec, 7);
    mixed.extend(take(&catalog, "revolution", QualityTier::Restricted, 3));
    assert!(matches!(calc.set_inputs(mixed), Err(TradeUpError::MixedQuality { .. })));
}

#[test]
fn test_every_two_collection_split_sums_to_one() {
    let catalog = catalog();
    let ids: Vec<String> = catalog.all_collections().iter().map(|c| c.id.clone()).collect();

    for tier in [QualityTier::MilSpec, QualityTier::Restricted, QualityTier::Classified] {
        for a in &ids {
            for b in &ids {
                for k in 1..10 {
                    let mut inputs: Vec<Item> = (0..k).map(|i| Item::new(format!("x{i}"), tier, a.as_str())).collect();
                    inputs.extend((k..10).map(|i| Item::new(format!("x{i}"), tier, b.as_str())));

                    let mut calc = TradeUpCalculator::new(shared(&catalog));
                    calc.set_inputs(inputs).unwrap();
                    let total: Decimal = calc.outputs().iter().map(|o| o.probability).sum();

                    assert!((total - Decimal::ONE).abs() < TOLERANCE, "{a}/{b} k={k} {tier}: {total}");
                    assert!(calc.outputs().iter().all(|o| Some(o.tier) == tier.successor()));
                }
            }
        }
    }
}

#[tokio::test]
async fn test_find_optimal_insufficient_covert_supply() {
    let catalog = catalog();
    let pool = catalog.items_at(QualityTier::Covert);
    let prices = MockPrices::new(dec!(1));

    let err = TradeUpCalculator::find_optimal_trade_up(shared(&catalog), &pool, QualityTier::Covert, &prices)
        .await
        .err()
        .unwrap();

    assert_eq!(err, TradeUpError::InsufficientSupply { tier: QualityTier::Covert, available: 8 });
}

#[tokio::test]
async fn test_find_optimal_selects_cheapest_simulated() {
    let catalog = catalog();
    let prices = SimulatedPrices::new();

    let mut pool = catalog.items_at(QualityTier::MilSpec);
    let names: Vec<String> = pool.iter().map(|i| i.name.clone()).collect();
    let quoted = batch_prices(&prices, &names, None).await;
    for item in pool.iter_mut() {
        item.price = quoted.get(&item.name).copied();
    }

    let calc = TradeUpCalculator::find_optimal_trade_up(shared(&catalog), &pool, QualityTier::MilSpec, &prices)
        .await
        .unwrap();

    let chosen_max = calc.inputs().iter().map(|i| i.price_or_zero()).max().unwrap();
    let chosen: Vec<&str> = calc.inputs().iter().map(|i| i.name.as_str()).collect();
    let excluded_min = pool
        .iter()
        .filter(|i| !chosen.contains(&i.name.as_str()))
        .map(|i| i.price_or_zero())
        .min()
        .unwrap();
    assert!(chosen_max <= excluded_min);

    let result = calc.result().unwrap();
    assert!((result.total_probability() - Decimal::ONE).abs() < TOLERANCE);
    assert!(result.outputs.iter().all(|o| o.price.is_some()));
    assert_eq!(result.profit, result.expected_value - result.total_cost);
}

#[tokio::test]
async fn test_shared_cache_serves_second_contract() {
    let catalog = catalog();
    let cached = CachedPriceLookup::new(
        MockPrices::new(dec!(2)),
        CacheConfig {
            ttl: chrono::Duration::minutes(5),
            request_delay: std::time::Duration::ZERO,
        },
    );

    let mut first = TradeUpCalculator::new(shared(&catalog));
    first.set_inputs(revolution_kilowatt(&catalog)).unwrap();
    first.price_all(&cached).await;
    let cached_after_first = cached.len();

    let mut second = TradeUpCalculator::new(shared(&catalog));
    second.set_inputs(revolution_kilowatt(&catalog)).unwrap();
    second.price_all(&cached).await;

    assert_eq!(cached.len(), cached_after_first);
    assert_eq!(first.compute_result().expected_value, second.compute_result().expected_value);
}

#[tokio::test]
async fn test_identical_inputs_fetch_each_name_once() {
    let catalog = catalog();
    let upstream = MockPrices::new(dec!(3));
    let cached = CachedPriceLookup::new(
        upstream.clone(),
        CacheConfig {
            ttl: chrono::Duration::minutes(5),
            request_delay: std::time::Duration::from_millis(5),
        },
    );

    let rebel = take(&catalog, "revolution", QualityTier::MilSpec, 1).remove(0);
    let mut calc = TradeUpCalculator::new(shared(&catalog));
    calc.set_inputs(vec![rebel; 10]).unwrap();
    calc.price_all(&cached).await;
    let result = calc.compute_result();

    // One input name plus five Revolution restricted outputs.
    assert_eq!(upstream.calls().len(), 6);
    assert_eq!(cached.len(), 6);
    assert_eq!(result.total_cost, dec!(30));
    assert_eq!(result.expected_value, dec!(3));
}

#[tokio::test]
async fn test_compare_contracts_across_tiers() {
    let catalog = catalog();
    let prices = MockPrices::new(dec!(1)).with_price("AWP | Devourer", dec!(100));

    let mut mil_spec = TradeUpCalculator::new(shared(&catalog));
    mil_spec.set_inputs(revolution_kilowatt(&catalog)).unwrap();
    mil_spec.price_all(&prices).await;
    mil_spec.compute_result();

    let mut restricted_inputs = take(&catalog, "recoil", QualityTier::Restricted, 5);
    restricted_inputs.extend(take(&catalog, "kilowatt", QualityTier::Restricted, 5));
    let mut restricted = TradeUpCalculator::new(shared(&catalog));
    restricted.set_inputs(restricted_inputs).unwrap();
    restricted.price_all(&prices).await;
    restricted.compute_result();

    let ranked = compare_contracts(&[restricted, mil_spec]);

    assert_eq!(ranked[0].roi, dec!(28.8));
    assert_eq!(ranked[0].inputs[0], "Tec-9 | Rebel");
    assert_eq!(ranked[1].roi, dec!(-90));
}
