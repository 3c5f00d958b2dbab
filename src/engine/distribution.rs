//! Output distribution.
//!
//! Derives the probability of each possible contract output from the
//! provenance of the inputs: every input contributes an equal share of
//! the draw to its source collection, and each collection splits its
//! share evenly across its items at the next tier.

use rust_decimal::Decimal;
use tracing::debug;

use crate::catalog::CatalogLookup;
use crate::types::{Item, OutputCandidate};

/// Share of the draw owned by each source collection, in order of first
/// appearance among the inputs.
pub fn collection_weights(inputs: &[Item]) -> Vec<(String, Decimal)> {
    let mut counts: Vec<(String, usize)> = Vec::new();

    for item in inputs {
        match counts.iter_mut().find(|(id, _)| *id == item.collection_id) {
            Some((_, count)) => *count += 1,
            None => counts.push((item.collection_id.clone(), 1)),
        }
    }

    if inputs.is_empty() {
        return Vec::new();
    }

    let total = Decimal::from(inputs.len());
    counts
        .into_iter()
        .map(|(id, count)| (id, Decimal::from(count) / total))
        .collect()
}

/// Every possible output of a contract over `inputs`.
///
/// Inputs must already share one tier. A top-tier contract has no
/// outputs. A collection without items at the output tier contributes
/// nothing and its share is not redistributed, so the probabilities then
/// sum to less than one.
pub fn build_distribution(catalog: &dyn CatalogLookup, inputs: &[Item]) -> Vec<OutputCandidate> {
    let Some(input_tier) = inputs.first().map(|i| i.tier) else {
        return Vec::new();
    };
    let Some(output_tier) = catalog.successor_of(input_tier) else {
        debug!(tier = %input_tier, "Top tier input, no outputs");
        return Vec::new();
    };

    let mut outputs = Vec::new();

    for (collection_id, weight) in collection_weights(inputs) {
        let names = catalog.items_of(&collection_id, output_tier);
        if names.is_empty() {
            debug!(
                collection = %collection_id,
                tier = %output_tier,
                weight = %weight,
                "Collection has no items at output tier, share dropped"
            );
            continue;
        }

        let per_item = weight / Decimal::from(names.len());
        let collection_name = catalog
            .collection_name(&collection_id)
            .unwrap_or(&collection_id)
            .to_string();

        outputs.extend(names.iter().map(|name| OutputCandidate {
            name: name.clone(),
            tier: output_tier,
            collection_id: collection_id.clone(),
            collection_name: collection_name.clone(),
            probability: per_item,
            price: None,
        }));
    }

    outputs
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
