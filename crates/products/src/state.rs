//! Immutable snapshot of the catalog-wide state that prices depend on.

use serde::{Deserialize, Serialize};

use varistore_core::ValueObject;

use crate::filters::{FilterIdentities, PriceFilters};
use crate::tax::TaxSettings;

/// Catalog version tag for one entity class.
///
/// Opaque; bumped externally whenever the catalog changes in a way that may
/// affect derived data. Only equality is meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionTag(String);

impl VersionTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for VersionTag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ValueObject for VersionTag {}

/// Everything global that can change a computed price table, captured once
/// per computation instead of being read from ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogState {
    pub version: VersionTag,
    pub tax: TaxSettings,
    pub filters: FilterIdentities,
}

impl CatalogState {
    pub fn capture(version: VersionTag, tax: &TaxSettings, filters: &PriceFilters) -> Self {
        Self {
            version,
            tax: tax.clone(),
            filters: filters.identities(),
        }
    }
}
