//! Price hash: the cache key of a price table.
//!
//! The hash is a SHA-256 digest over a canonical JSON rendering of every input
//! that can change a price table: the tax inputs (only when taxes are
//! included), the identities of registered field filters and the catalog
//! version tag. Hash-hook callbacks may add further entries before digesting.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use sha2::{Digest, Sha256};

use varistore_core::ValueObject;

use crate::filters::PriceFilters;
use crate::product::VariableProduct;
use crate::state::CatalogState;

/// Seed key holding the tax inputs (or `false` when taxes are excluded).
pub const SEED_TAX: &str = "tax";

/// Seed key holding the catalog version tag.
pub const SEED_VERSION: &str = "version";

/// Hex-encoded SHA-256 digest identifying one price table variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceHash(String);

impl PriceHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PriceHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ValueObject for PriceHash {}

/// Structured hash input. Keys are kept sorted so the rendering is canonical.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceHashSeed(BTreeMap<String, JsonValue>);

impl PriceHashSeed {
    /// Seed built from the captured catalog state.
    pub fn from_state(state: &CatalogState, include_taxes: bool) -> Self {
        let mut seed = Self::default();
        let tax = if include_taxes {
            json!([state.tax.tax_display_shop, state.tax.rates])
        } else {
            JsonValue::Bool(false)
        };
        seed.insert(SEED_TAX, tax);
        for (hook, identities) in &state.filters {
            seed.insert(*hook, json!(identities));
        }
        seed.insert(SEED_VERSION, json!(state.version));
        seed
    }

    pub fn insert(&mut self, key: impl Into<String>, value: JsonValue) -> Option<JsonValue> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    /// Canonical JSON rendering.
    pub fn canonical(&self) -> String {
        JsonValue::Object(self.0.clone().into_iter().collect()).to_string()
    }

    pub fn digest(&self) -> PriceHash {
        let digest = Sha256::digest(self.canonical().as_bytes());
        PriceHash(hex::encode(digest))
    }
}

/// Compute the cache key of the price table for `parent`.
pub fn compute_price_hash(
    state: &CatalogState,
    filters: &PriceFilters,
    parent: &VariableProduct,
    include_taxes: bool,
) -> PriceHash {
    let seed = PriceHashSeed::from_state(state, include_taxes);
    filters.apply_hash(seed, parent, include_taxes).digest()
}
