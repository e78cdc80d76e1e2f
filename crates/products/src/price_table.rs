//! Price tables and the cached envelope that holds them.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use varistore_core::{ProductId, ValueObject};

use crate::filters::{FilterContext, PriceField, PriceFilters};
use crate::hash::PriceHash;
use crate::price::{format_decimal, format_sale_decimal, raw_price};
use crate::product::{VariableProduct, Variation};
use crate::state::VersionTag;
use crate::tax::TaxSettings;

/// Normalized prices of the visible variations of one parent, per child.
///
/// A child appears in all three maps or in none of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTable {
    pub price: BTreeMap<ProductId, Decimal>,
    pub regular_price: BTreeMap<ProductId, Decimal>,
    pub sale_price: BTreeMap<ProductId, Decimal>,
}

impl ValueObject for PriceTable {}

impl PriceTable {
    pub fn is_empty(&self) -> bool {
        self.price.is_empty()
    }

    pub fn contains(&self, child: ProductId) -> bool {
        self.price.contains_key(&child)
    }

    pub fn insert(&mut self, child: ProductId, row: PriceRow) {
        self.price.insert(child, row.price);
        self.regular_price.insert(child, row.regular_price);
        self.sale_price.insert(child, row.sale_price);
    }

    pub fn min_price(&self) -> Option<Decimal> {
        self.price.values().copied().min()
    }

    pub fn max_price(&self) -> Option<Decimal> {
        self.price.values().copied().max()
    }

    /// A parent is on sale when any child's sale price differs from its
    /// regular price and equals its active price.
    pub fn is_on_sale(&self) -> bool {
        self.sale_price.iter().any(|(child, sale)| {
            self.regular_price.get(child) != Some(sale) && self.price.get(child) == Some(sale)
        })
    }
}

/// One child's normalized prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRow {
    pub price: Decimal,
    pub regular_price: Decimal,
    pub sale_price: Decimal,
}

/// Every price table computed so far for one parent, keyed by price hash and
/// tagged with the catalog version they were computed under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionTag>,
    #[serde(flatten)]
    pub tables: BTreeMap<PriceHash, PriceTable>,
}

impl PriceEnvelope {
    pub fn new(version: VersionTag) -> Self {
        Self {
            version: Some(version),
            tables: BTreeMap::new(),
        }
    }

    /// Drop every table unless the envelope was written under `current`.
    /// Returns whether the envelope was reset.
    pub fn ensure_version(&mut self, current: &VersionTag) -> bool {
        let fresh = matches!(&self.version, Some(tag) if !tag.as_str().is_empty() && tag == current);
        if !fresh {
            *self = Self::new(current.clone());
        }
        !fresh
    }

    pub fn table(&self, hash: &PriceHash) -> Option<&PriceTable> {
        self.tables.get(hash)
    }

    pub fn insert(&mut self, hash: PriceHash, table: PriceTable) {
        self.tables.insert(hash, table);
    }
}

/// Inputs shared by every row of one price table build.
#[derive(Debug, Clone, Copy)]
pub struct PriceTableBuilder<'a> {
    parent: &'a VariableProduct,
    filters: &'a PriceFilters,
    tax: &'a TaxSettings,
    include_taxes: bool,
}

impl<'a> PriceTableBuilder<'a> {
    pub fn new(
        parent: &'a VariableProduct,
        filters: &'a PriceFilters,
        tax: &'a TaxSettings,
        include_taxes: bool,
    ) -> Self {
        Self {
            parent,
            filters,
            tax,
            include_taxes,
        }
    }

    /// Build the table from variations in visible-children order.
    pub fn build<'v>(&self, variations: impl IntoIterator<Item = &'v Variation>) -> PriceTable {
        let mut table = PriceTable::default();
        for variation in variations {
            if let Some(row) = self.row(variation) {
                table.insert(variation.id_typed(), row);
            }
        }
        table
    }

    /// Filtered, sale-normalized, optionally taxed and rounded prices of one
    /// variation; `None` when its filtered price is empty.
    pub fn row(&self, variation: &Variation) -> Option<PriceRow> {
        let ctx = FilterContext {
            variation,
            parent: self.parent,
        };
        let price = self.filters.apply_field(PriceField::Price, variation.price(), &ctx);
        let regular_price = self
            .filters
            .apply_field(PriceField::RegularPrice, variation.regular_price(), &ctx);
        let sale_price = self.filters.apply_field(PriceField::SalePrice, variation.sale_price(), &ctx);

        let price = price?;
        let sale_price = normalize_sale_price(price, regular_price, sale_price);

        let (price, regular_price, sale_price) = if self.include_taxes {
            (
                self.tax.display_price(price),
                regular_price.map(|p| self.tax.display_price(p)),
                sale_price.map(|p| self.tax.display_price(p)),
            )
        } else {
            (price, regular_price, sale_price)
        };

        let decimals = self.tax.price_decimals;
        Some(PriceRow {
            price: format_decimal(&raw_price(Some(price)), decimals),
            regular_price: format_decimal(&raw_price(regular_price), decimals),
            sale_price: format_sale_decimal(&raw_price(sale_price), decimals),
        })
    }
}

/// A variation is only on sale when its active price is its sale price and
/// that differs from the regular price; otherwise the sale price falls back to
/// the regular price.
pub fn normalize_sale_price(
    price: Decimal,
    regular_price: Option<Decimal>,
    sale_price: Option<Decimal>,
) -> Option<Decimal> {
    if sale_price == regular_price || sale_price != Some(price) {
        regular_price
    } else {
        sale_price
    }
}
