//! Collection catalog.
//!
//! Defines the `CatalogLookup` trait and the static `Catalog` table that
//! answers which items exist in which collection at which quality tier.
//! The built-in table is embedded as TOML and parsed once at startup.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use tracing::debug;

use crate::types::{Item, QualityTier};

/// The embedded catalog data file.
const BUILTIN_CATALOG: &str = include_str!("collections.toml");

/// Read-only reference lookups used by the engine.
///
/// Lookups never fail: unknown collections and empty tiers yield
/// empty results.
pub trait CatalogLookup: Send + Sync {
    /// The tier produced by a contract of `tier`.
    fn successor_of(&self, tier: QualityTier) -> Option<QualityTier> {
        tier.successor()
    }

    /// Item names in `collection_id` at `tier`, in catalog order.
    fn items_of(&self, collection_id: &str, tier: QualityTier) -> &[String];

    /// Every known collection, in catalog order.
    fn all_collections(&self) -> &[CollectionInfo];

    /// Display name for a collection id.
    fn collection_name(&self, collection_id: &str) -> Option<&str> {
        self.all_collections()
            .iter()
            .find(|c| c.id == collection_id)
            .map(|c| c.display_name.as_str())
    }
}

/// Identity of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub id: String,
    pub display_name: String,
    /// Market listing name of the case itself.
    pub market_name: String,
}

// ---------------------------------------------------------------------------
// File format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CatalogFile {
    collections: Vec<CollectionEntry>,
}

#[derive(Debug, Deserialize)]
struct CollectionEntry {
    id: String,
    name: String,
    #[serde(default)]
    market_name: Option<String>,
    #[serde(default)]
    items: HashMap<String, Vec<String>>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable tier → collection → ordered item names table.
#[derive(Debug, Clone)]
pub struct Catalog {
    collections: Vec<CollectionInfo>,
    by_tier: HashMap<QualityTier, HashMap<String, Vec<String>>>,
}

impl Catalog {
    /// The catalog shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CATALOG).context("Failed to parse built-in catalog")
    }

    /// Load a catalog from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {path}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse catalog file: {path}"))
    }

    /// Parse a catalog from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(contents)?;

        let mut seen = HashSet::new();
        let mut collections = Vec::with_capacity(file.collections.len());
        let mut by_tier: HashMap<QualityTier, HashMap<String, Vec<String>>> = HashMap::new();

        for entry in file.collections {
            if !seen.insert(entry.id.clone()) {
                anyhow::bail!("Duplicate collection id: {}", entry.id);
            }

            for (key, names) in entry.items {
                let tier: QualityTier = key
                    .parse()
                    .with_context(|| format!("Bad tier key in collection {}", entry.id))?;
                by_tier
                    .entry(tier)
                    .or_default()
                    .insert(entry.id.clone(), names);
            }

            collections.push(CollectionInfo {
                market_name: entry.market_name.unwrap_or_else(|| entry.name.clone()),
                display_name: entry.name,
                id: entry.id,
            });
        }

        debug!(collections = collections.len(), "Catalog loaded");

        Ok(Self { collections, by_tier })
    }

    /// Every catalog item at `tier`, unpriced, collection by collection.
    pub fn items_at(&self, tier: QualityTier) -> Vec<Item> {
        self.collections
            .iter()
            .flat_map(|c| {
                self.items_of(&c.id, tier)
                    .iter()
                    .map(move |name| Item::new(name.clone(), tier, c.id.clone()))
            })
            .collect()
    }
}

impl CatalogLookup for Catalog {
    fn items_of(&self, collection_id: &str, tier: QualityTier) -> &[String] {
        self.by_tier
            .get(&tier)
            .and_then(|cols| cols.get(collection_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn all_collections(&self) -> &[CollectionInfo] {
        &self.collections
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
