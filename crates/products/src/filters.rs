//! Extension points for price computation.
//!
//! External code customizes prices by registering callbacks on named hooks.
//! Callbacks run in ascending priority, and in registration order within one
//! priority. Every callback carries a caller-chosen identity: identities feed
//! the price hash, so two registries with the same identities in the same
//! order produce the same cache key, and distinct closures never collide as
//! long as they are registered under distinct names.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::hash::PriceHashSeed;
use crate::price_table::PriceTable;
use crate::product::{VariableProduct, Variation};

/// Priority used when a caller has no ordering preference.
pub const DEFAULT_PRIORITY: i32 = 10;

/// Hook run over the price hash seed before it is digested.
pub const HASH_HOOK: &str = "variation_prices_hash";

/// Hook run over a finished price table before it is memoized.
pub const TABLE_HOOK: &str = "variation_prices";

/// One of the three per-variation price fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PriceField {
    Price,
    RegularPrice,
    SalePrice,
}

impl PriceField {
    pub const ALL: [PriceField; 3] = [PriceField::Price, PriceField::RegularPrice, PriceField::SalePrice];

    /// Hook name under which field overrides are registered.
    pub fn hook_name(self) -> &'static str {
        match self {
            PriceField::Price => "variation_prices_price",
            PriceField::RegularPrice => "variation_prices_regular_price",
            PriceField::SalePrice => "variation_prices_sale_price",
        }
    }
}

/// Context handed to field filters.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    pub variation: &'a Variation,
    pub parent: &'a VariableProduct,
}

pub type FieldFilter = Box<dyn Fn(Option<Decimal>, &FilterContext<'_>) -> Option<Decimal> + Send + Sync>;
pub type HashSeedFilter = Box<dyn Fn(PriceHashSeed, &VariableProduct, bool) -> PriceHashSeed + Send + Sync>;
pub type TableFilter = Box<dyn Fn(PriceTable, &VariableProduct, bool) -> PriceTable + Send + Sync>;

/// Callback identities per hook name: outer list by ascending priority, inner
/// list in registration order. Hooks with no callbacks are absent.
pub type FilterIdentities = BTreeMap<&'static str, Vec<Vec<String>>>;

struct Hook<F> {
    by_priority: BTreeMap<i32, Vec<(String, F)>>,
}

impl<F> Default for Hook<F> {
    fn default() -> Self {
        Self {
            by_priority: BTreeMap::new(),
        }
    }
}

impl<F> Hook<F> {
    /// Re-registering an identity at the same priority replaces the callback
    /// in place.
    fn add(&mut self, priority: i32, id: String, callback: F) {
        let slot = self.by_priority.entry(priority).or_default();
        match slot.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => entry.1 = callback,
            None => slot.push((id, callback)),
        }
    }

    fn remove(&mut self, id: &str) -> bool {
        let mut removed = false;
        for slot in self.by_priority.values_mut() {
            let before = slot.len();
            slot.retain(|(existing, _)| existing != id);
            removed |= slot.len() != before;
        }
        self.by_priority.retain(|_, slot| !slot.is_empty());
        removed
    }

    fn callbacks(&self) -> impl Iterator<Item = &F> {
        self.by_priority.values().flatten().map(|(_, callback)| callback)
    }

    fn identities(&self) -> Vec<Vec<String>> {
        self.by_priority
            .values()
            .map(|slot| slot.iter().map(|(id, _)| id.clone()).collect())
            .collect()
    }

    fn is_empty(&self) -> bool {
        self.by_priority.is_empty()
    }
}

/// Registry of every price extension point.
#[derive(Default)]
pub struct PriceFilters {
    price: Hook<FieldFilter>,
    regular_price: Hook<FieldFilter>,
    sale_price: Hook<FieldFilter>,
    hash: Hook<HashSeedFilter>,
    table: Hook<TableFilter>,
}

impl core::fmt::Debug for PriceFilters {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PriceFilters")
            .field("fields", &self.identities())
            .field(HASH_HOOK, &self.hash.identities())
            .field(TABLE_HOOK, &self.table.identities())
            .finish()
    }
}

impl PriceFilters {
    pub fn new() -> Self {
        Self::default()
    }

    fn field_hook(&self, field: PriceField) -> &Hook<FieldFilter> {
        match field {
            PriceField::Price => &self.price,
            PriceField::RegularPrice => &self.regular_price,
            PriceField::SalePrice => &self.sale_price,
        }
    }

    fn field_hook_mut(&mut self, field: PriceField) -> &mut Hook<FieldFilter> {
        match field {
            PriceField::Price => &mut self.price,
            PriceField::RegularPrice => &mut self.regular_price,
            PriceField::SalePrice => &mut self.sale_price,
        }
    }

    /// Register an override for one price field.
    pub fn add_field_filter<F>(&mut self, field: PriceField, priority: i32, id: impl Into<String>, callback: F)
    where
        F: Fn(Option<Decimal>, &FilterContext<'_>) -> Option<Decimal> + Send + Sync + 'static,
    {
        self.field_hook_mut(field).add(priority, id.into(), Box::new(callback));
    }

    pub fn remove_field_filter(&mut self, field: PriceField, id: &str) -> bool {
        self.field_hook_mut(field).remove(id)
    }

    /// Register extra state that must distinguish cached price tables.
    pub fn add_hash_filter<F>(&mut self, priority: i32, id: impl Into<String>, callback: F)
    where
        F: Fn(PriceHashSeed, &VariableProduct, bool) -> PriceHashSeed + Send + Sync + 'static,
    {
        self.hash.add(priority, id.into(), Box::new(callback));
    }

    /// Register a last-chance rewrite of the finished price table.
    pub fn add_table_filter<F>(&mut self, priority: i32, id: impl Into<String>, callback: F)
    where
        F: Fn(PriceTable, &VariableProduct, bool) -> PriceTable + Send + Sync + 'static,
    {
        self.table.add(priority, id.into(), Box::new(callback));
    }

    pub fn apply_field(&self, field: PriceField, value: Option<Decimal>, ctx: &FilterContext<'_>) -> Option<Decimal> {
        self.field_hook(field).callbacks().fold(value, |acc, callback| callback(acc, ctx))
    }

    pub fn apply_hash(&self, seed: PriceHashSeed, parent: &VariableProduct, include_taxes: bool) -> PriceHashSeed {
        self.hash
            .callbacks()
            .fold(seed, |acc, callback| callback(acc, parent, include_taxes))
    }

    pub fn apply_table(&self, table: PriceTable, parent: &VariableProduct, include_taxes: bool) -> PriceTable {
        self.table
            .callbacks()
            .fold(table, |acc, callback| callback(acc, parent, include_taxes))
    }

    /// Identities of the field filters, as they contribute to the price hash.
    pub fn identities(&self) -> FilterIdentities {
        PriceField::ALL
            .into_iter()
            .map(|field| (field, self.field_hook(field)))
            .filter(|(_, hook)| !hook.is_empty())
            .map(|(field, hook)| (field.hook_name(), hook.identities()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{ProductRecord, ProductType};
    use varistore_core::ProductId;

    fn context_fixture() -> (Variation, VariableProduct) {
        let mut record = ProductRecord::new(ProductId::new(2), ProductType::Variation);
        record.parent_id = Some(ProductId::new(1));
        let variation = Variation::from_record(record).unwrap();
        (variation, VariableProduct::empty(ProductId::new(1)))
    }

    #[test]
    fn field_filters_run_in_priority_then_registration_order() {
        let mut filters = PriceFilters::new();
        filters.add_field_filter(PriceField::Price, 20, "double", |v, _| v.map(|p| p * Decimal::TWO));
        filters.add_field_filter(PriceField::Price, 5, "plus-one", |v, _| v.map(|p| p + Decimal::ONE));
        filters.add_field_filter(PriceField::Price, 5, "plus-ten", |v, _| v.map(|p| p + Decimal::TEN));

        let (variation, parent) = context_fixture();
        let ctx = FilterContext {
            variation: &variation,
            parent: &parent,
        };
        // (1 + 1 + 10) * 2
        assert_eq!(filters.apply_field(PriceField::Price, Some(Decimal::ONE), &ctx), Some(Decimal::new(24, 0)));
        assert_eq!(filters.apply_field(PriceField::SalePrice, None, &ctx), None);
    }

    #[test]
    fn identities_group_by_priority() {
        let mut filters = PriceFilters::new();
        filters.add_field_filter(PriceField::RegularPrice, 10, "b", |v, _| v);
        filters.add_field_filter(PriceField::RegularPrice, 1, "a", |v, _| v);
        filters.add_field_filter(PriceField::RegularPrice, 10, "c", |v, _| v);

        let ids = filters.identities();
        assert_eq!(ids.len(), 1);
        assert_eq!(
            ids["variation_prices_regular_price"],
            vec![vec!["a".to_string()], vec!["b".to_string(), "c".to_string()]]
        );
    }

    #[test]
    fn reregistering_replaces_without_duplicating() {
        let mut filters = PriceFilters::new();
        filters.add_field_filter(PriceField::Price, 10, "markup", |v, _| v);
        filters.add_field_filter(PriceField::Price, 10, "markup", |_, _| None);

        let (variation, parent) = context_fixture();
        let ctx = FilterContext {
            variation: &variation,
            parent: &parent,
        };
        assert_eq!(filters.identities()["variation_prices_price"], vec![vec!["markup".to_string()]]);
        assert_eq!(filters.apply_field(PriceField::Price, Some(Decimal::ONE), &ctx), None);
    }

    #[test]
    fn removing_last_callback_drops_hook_from_identities() {
        let mut filters = PriceFilters::new();
        filters.add_field_filter(PriceField::SalePrice, 10, "clearance", |v, _| v);
        assert!(filters.remove_field_filter(PriceField::SalePrice, "clearance"));
        assert!(!filters.remove_field_filter(PriceField::SalePrice, "clearance"));
        assert!(filters.identities().is_empty());
    }
}
