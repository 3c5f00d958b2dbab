//! TRADEUP — trade-up contract expected-value calculator
//!
//! Entry point. Loads configuration, initialises structured logging,
//! builds the catalog and price source, logs case prices, then evaluates
//! the cheapest contract for each configured tier and ranks them by ROI.

use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use tradeup::catalog::{Catalog, CatalogLookup};
use tradeup::config::{self, PriceSource, PricingConfig};
use tradeup::engine::{compare_contracts, TradeUpCalculator};
use tradeup::pricing::{batch_prices, case_price, CachedPriceLookup, PriceLookup, SimulatedPrices, SteamApisClient};
use tradeup::types::{format_probability, QualityTier, TradeUpError};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = config::AppConfig::load("config.toml")?;

    init_logging();

    info!(
        name = %cfg.app.name,
        source = ?cfg.pricing.source,
        wear = %cfg.pricing.wear,
        "TRADEUP starting up"
    );

    let catalog = Arc::new(match &cfg.scan.catalog_path {
        Some(path) => Catalog::load(path)?,
        None => Catalog::builtin()?,
    });
    info!(collections = catalog.all_collections().len(), "Catalog ready");

    let prices = build_price_source(&cfg.pricing)?;

    for collection in catalog.all_collections() {
        match case_price(prices.as_ref(), collection).await {
            Ok(price) => info!(
                case = %collection.market_name,
                price = format!("{:.2} {}", price, cfg.app.currency),
                "Case price"
            ),
            Err(e) => warn!(case = %collection.market_name, error = %e, "Case price lookup failed"),
        }
    }
    let tiers = cfg.scan.tiers()?;
    let wear = cfg.pricing.wear();

    let mut contracts = Vec::new();
    for tier in tiers {
        match evaluate_tier(&catalog, tier, prices.as_ref(), wear.clone(), &cfg.app.currency).await {
            Ok(calc) => contracts.push(calc),
            Err(TradeUpError::InsufficientSupply { tier, available }) => {
                warn!(tier = %tier, available, "Not enough catalog items for a contract, skipping");
            }
            Err(e) => warn!(tier = %tier, error = %e, "Tier evaluation failed"),
        }
    }

    for (rank, summary) in compare_contracts(&contracts).iter().enumerate() {
        info!(
            rank = rank + 1,
            roi = format!("{:.2}%", summary.roi),
            profit = format!("{:.2} {}", summary.profit, cfg.app.currency),
            break_even = %format_probability(summary.break_even_probability),
            first_input = summary.inputs.first().map(String::as_str).unwrap_or("-"),
            "Contract ranking"
        );
    }

    Ok(())
}

/// Select the configured price source. SteamApis falls back to
/// simulated prices when its key is missing.
fn build_price_source(cfg: &PricingConfig) -> Result<Box<dyn PriceLookup>> {
    match cfg.source {
        PriceSource::Simulated => Ok(Box::new(SimulatedPrices::new())),
        PriceSource::SteamApis => {
            let key = cfg
                .api_key_env
                .as_deref()
                .and_then(|env| config::AppConfig::resolve_env(env).ok());

            match key {
                Some(key) => {
                    let client = SteamApisClient::new(
                        key,
                        Some(cfg.base_url.clone()),
                        Some(cfg.app_id),
                        cfg.timeout_secs,
                    )?;
                    info!(base_url = %cfg.base_url, "Using SteamApis price source");
                    Ok(Box::new(CachedPriceLookup::new(client, cfg.cache_config())))
                }
                None => {
                    warn!("No SteamApis key configured, falling back to simulated prices");
                    Ok(Box::new(SimulatedPrices::new()))
                }
            }
        }
    }
}

/// Price every catalog item at `tier` and evaluate the cheapest contract.
async fn evaluate_tier(
    catalog: &Arc<Catalog>,
    tier: QualityTier,
    prices: &dyn PriceLookup,
    wear: Option<String>,
    currency: &str,
) -> Result<TradeUpCalculator, TradeUpError> {
    let mut pool = catalog.items_at(tier);

    let mut seen = HashSet::new();
    let names: Vec<String> = pool
        .iter()
        .filter(|i| seen.insert(i.name.clone()))
        .map(|i| i.name.clone())
        .collect();
    let pool_prices = batch_prices(prices, &names, wear.as_deref()).await;
    for item in pool.iter_mut() {
        item.price = pool_prices.get(&item.name).copied();
    }

    let shared: Arc<dyn CatalogLookup> = catalog.clone();
    let calc = TradeUpCalculator::find_optimal_trade_up(shared, &pool, tier, prices).await?;

    if let Some(result) = calc.result() {
        info!(
            tier = %tier,
            cost = format!("{:.2} {currency}", result.total_cost),
            ev = format!("{:.2} {currency}", result.expected_value),
            profit = format!("{:.2} {currency}", result.profit),
            roi = format!("{:.2}%", result.roi),
            break_even = %format_probability(result.break_even_probability),
            best = result.best_output.as_ref().map(|o| o.name.as_str()).unwrap_or("-"),
            worst = result.worst_output.as_ref().map(|o| o.name.as_str()).unwrap_or("-"),
            "Contract evaluated"
        );
        for output in &result.outputs {
            debug!(tier = %tier, "{output}");
        }
    }

    Ok(calc)
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tradeup=info"));

    let json_logging = std::env::var("TRADEUP_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
