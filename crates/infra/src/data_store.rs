//! Variable product data store.
//!
//! Reads variable products, their children listings and price tables, and
//! answers the attribute probes. Price tables are served from three layers:
//! a per-unit-of-work memo, a shared versioned envelope per parent, and a
//! rebuild from the catalog.
//!
//! A [`VariableProductDataStore`] is created per unit of work from the shared
//! [`CatalogServices`] and dropped when the work is done.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;
use tracing::instrument;

use varistore_core::{ProductId, UnitOfWorkId};
use varistore_products::{
    CatalogState, ChildrenListing, PriceEnvelope, PriceFilters, PriceHash, PriceTable, PriceTableBuilder,
    StockStatus, TaxSettings, VariableProduct, Variation,
};

use crate::cache::{Cache, MemoCache, ObjectCache, TransientCache, TransientStore};
use crate::catalog::{CatalogQuery, ChildAttribute, ChildPredicate, ProductQuery, ProductRepository};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::version::{PRODUCT_CLASS, VersionCounter};

pub const CHILDREN_TRANSIENT_PREFIX: &str = "wc_product_children_";
pub const PRICES_TRANSIENT_PREFIX: &str = "wc_var_prices_";

/// Object cache group of the attribute probes.
pub const PROBE_GROUP: &str = "product";

const WEIGHT_SLOT: &str = "woocommerce_product_child_has_weight_";
const DIMENSIONS_SLOT: &str = "woocommerce_product_child_has_dimensions_";
const IN_STOCK_SLOT: &str = "woocommerce_product_child_is_in_stock_";

/// Long-lived collaborators shared by every unit of work.
#[derive(Clone)]
pub struct CatalogServices {
    pub repository: Arc<dyn ProductRepository>,
    pub catalog: Arc<dyn CatalogQuery>,
    pub transients: Arc<dyn TransientStore>,
    pub object_cache: Arc<dyn ObjectCache>,
    pub versions: Arc<dyn VersionCounter>,
    pub filters: Arc<PriceFilters>,
    pub config: StoreConfig,
}

impl CatalogServices {
    /// Start a unit of work with an empty memo.
    pub fn unit_of_work(&self) -> VariableProductDataStore {
        VariableProductDataStore::new(self.clone())
    }
}

pub struct VariableProductDataStore {
    services: CatalogServices,
    tax: TaxSettings,
    children: TransientCache<ProductId, ChildrenListing>,
    envelopes: TransientCache<ProductId, PriceEnvelope>,
    memo: MemoCache<(ProductId, PriceHash), PriceTable>,
    unit_of_work: UnitOfWorkId,
}

impl VariableProductDataStore {
    pub fn new(services: CatalogServices) -> Self {
        let config = &services.config;
        let children = TransientCache::new(
            services.transients.clone(),
            CHILDREN_TRANSIENT_PREFIX,
            Some(config.children_ttl()),
        );
        let envelopes = TransientCache::new(
            services.transients.clone(),
            PRICES_TRANSIENT_PREFIX,
            Some(config.prices_ttl()),
        );
        Self {
            tax: config.tax_settings(),
            children,
            envelopes,
            memo: MemoCache::new(),
            unit_of_work: UnitOfWorkId::new(),
            services,
        }
    }

    pub fn unit_of_work_id(&self) -> UnitOfWorkId {
        self.unit_of_work
    }

    /// Load a variable product with its children listing.
    ///
    /// The parent's own regular and sale prices are always cleared. Returns
    /// `Ok(None)` when no product exists under `parent`.
    #[instrument(skip(self), fields(unit_of_work = %self.unit_of_work), err)]
    pub fn read_product(&mut self, parent: ProductId) -> Result<Option<VariableProduct>, StoreError> {
        let Some(record) = self.services.repository.read(parent)? else {
            return Ok(None);
        };
        let mut product = VariableProduct::from_record(record)?;

        let listing = self.get_children(parent, false)?;
        product.set_children(listing.all);
        product.set_visible_children(listing.visible);
        product.set_variation_attributes(BTreeMap::new());

        Ok(Some(product))
    }

    /// Children of `parent`, from the shared cache unless `force_refresh`.
    #[instrument(skip(self), fields(unit_of_work = %self.unit_of_work), err)]
    pub fn get_children(&mut self, parent: ProductId, force_refresh: bool) -> Result<ChildrenListing, StoreError> {
        if !force_refresh {
            if let Some(listing) = self.children.get(&parent)? {
                tracing::debug!(%parent, "children listing cache hit");
                return Ok(listing);
            }
        }

        let query = ProductQuery::variations_of(parent);
        let all = self.services.catalog.find_products(&query)?;
        let listing = if self.services.config.hide_out_of_stock_items {
            let visible = self
                .services
                .catalog
                .find_products(&query.with_stock_status(StockStatus::InStock))?;
            ChildrenListing { all, visible }
        } else {
            ChildrenListing::unfiltered(all)
        };

        tracing::debug!(
            %parent,
            all = listing.all.len(),
            visible = listing.visible.len(),
            "children listing rebuilt"
        );
        self.children.set(parent, listing.clone())?;
        Ok(listing)
    }

    /// Cache key of the price table for `parent` under the current catalog
    /// state.
    pub fn compute_price_hash(&self, parent: &VariableProduct, include_taxes: bool) -> Result<PriceHash, StoreError> {
        let state = self.capture_state()?;
        Ok(self.hash_for(&state, parent, include_taxes))
    }

    /// Price table of the visible children of `parent`.
    ///
    /// Children that no longer resolve to a variation, or whose filtered price
    /// is empty, are left out.
    #[instrument(
        skip(self, parent),
        fields(unit_of_work = %self.unit_of_work, parent = %parent.id_typed()),
        err
    )]
    pub fn get_price_table(&mut self, parent: &VariableProduct, include_taxes: bool) -> Result<PriceTable, StoreError> {
        let state = self.capture_state()?;
        let hash = self.hash_for(&state, parent, include_taxes);
        let parent_id = parent.id_typed();
        let memo_key = (parent_id, hash.clone());

        if let Some(table) = self.memo.get(&memo_key)? {
            tracing::debug!(%hash, "price table memo hit");
            return Ok(table);
        }

        let mut envelope = self.envelopes.get(&parent_id)?.unwrap_or_default();
        if envelope.ensure_version(&state.version) {
            tracing::debug!(version = %state.version, "price envelope reset");
        }

        let table = match envelope.table(&hash) {
            Some(table) => {
                tracing::debug!(%hash, "price table shared cache hit");
                table.clone()
            }
            None => {
                let table = self.build_price_table(parent, include_taxes)?;
                tracing::debug!(%hash, children = table.price.len(), "price table rebuilt");
                envelope.insert(hash, table.clone());
                self.envelopes.set(parent_id, envelope)?;
                table
            }
        };

        let table = self.services.filters.apply_table(table, parent, include_taxes);
        self.memo.set(memo_key, table.clone())?;
        Ok(table)
    }

    /// Lowest and highest active price among the visible children.
    pub fn price_range(
        &mut self,
        parent: &VariableProduct,
        include_taxes: bool,
    ) -> Result<Option<(Decimal, Decimal)>, StoreError> {
        let table = self.get_price_table(parent, include_taxes)?;
        Ok(table.min_price().zip(table.max_price()))
    }

    pub fn is_on_sale(&mut self, parent: &VariableProduct, include_taxes: bool) -> Result<bool, StoreError> {
        Ok(self.get_price_table(parent, include_taxes)?.is_on_sale())
    }

    /// Whether any child has a positive weight. Only in-stock children count
    /// when out-of-stock items are hidden.
    pub fn child_has_weight(&self, parent: ProductId) -> Result<bool, StoreError> {
        self.probe(WEIGHT_SLOT, parent, ChildAttribute::Weight, self.services.config.hide_out_of_stock_items)
    }

    /// Whether any child has a positive length, width or height. Only in-stock
    /// children count when out-of-stock items are hidden.
    pub fn child_has_dimensions(&self, parent: ProductId) -> Result<bool, StoreError> {
        self.probe(
            DIMENSIONS_SLOT,
            parent,
            ChildAttribute::Dimensions,
            self.services.config.hide_out_of_stock_items,
        )
    }

    pub fn child_is_in_stock(&self, parent: ProductId) -> Result<bool, StoreError> {
        self.probe(IN_STOCK_SLOT, parent, ChildAttribute::InStock, false)
    }

    /// Forget everything cached for `parent`: the children listing, the price
    /// envelope, the probe slots and this unit of work's memoized tables.
    #[instrument(skip(self), fields(unit_of_work = %self.unit_of_work), err)]
    pub fn clear_caches(&mut self, parent: ProductId) -> Result<(), StoreError> {
        self.children.delete(&parent)?;
        self.envelopes.delete(&parent)?;
        for slot in [WEIGHT_SLOT, DIMENSIONS_SLOT, IN_STOCK_SLOT] {
            self.services.object_cache.delete(&probe_key(slot, parent), PROBE_GROUP)?;
        }
        self.memo.retain(|(id, _)| *id != parent);
        Ok(())
    }

    fn capture_state(&self) -> Result<CatalogState, StoreError> {
        let version = self.services.versions.current_version(PRODUCT_CLASS)?;
        Ok(CatalogState::capture(version, &self.tax, &self.services.filters))
    }

    fn hash_for(&self, state: &CatalogState, parent: &VariableProduct, include_taxes: bool) -> PriceHash {
        varistore_products::compute_price_hash(state, &self.services.filters, parent, include_taxes)
    }

    fn build_price_table(&self, parent: &VariableProduct, include_taxes: bool) -> Result<PriceTable, StoreError> {
        let mut variations: Vec<Variation> = Vec::with_capacity(parent.visible_children().len());
        for child in parent.visible_children() {
            match self.services.catalog.get_variation(*child)? {
                Some(variation) => variations.push(variation),
                None => tracing::debug!(%child, "skipping unresolvable child"),
            }
        }

        let builder = PriceTableBuilder::new(parent, &self.services.filters, &self.tax, include_taxes);
        Ok(builder.build(&variations))
    }

    fn probe(
        &self,
        slot: &str,
        parent: ProductId,
        attribute: ChildAttribute,
        in_stock_only: bool,
    ) -> Result<bool, StoreError> {
        let key = probe_key(slot, parent);
        let cache = &self.services.object_cache;

        if let Some(cached) = cache.get(&key, PROBE_GROUP)?.and_then(|v| v.as_u64()) {
            return Ok(cached == 1);
        }

        let predicate = ChildPredicate {
            attribute,
            in_stock_only,
        };
        let found = self.services.catalog.child_exists(parent, predicate)?;
        tracing::debug!(%parent, ?attribute, found, "attribute probe miss");
        cache.set(&key, PROBE_GROUP, json!(u8::from(found)))?;
        Ok(found)
    }
}

fn probe_key(slot: &str, parent: ProductId) -> String {
    format!("{slot}{parent}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{InMemoryObjectCache, InMemoryTransientStore};
    use crate::catalog::InMemoryCatalog;
    use crate::version::TransientVersionCounter;
    use core::str::FromStr;
    use varistore_products::{ProductRecord, ProductType};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    struct Fixture {
        catalog: Arc<InMemoryCatalog>,
        transients: Arc<InMemoryTransientStore>,
        object_cache: Arc<InMemoryObjectCache>,
        services: CatalogServices,
    }

    fn fixture(config: StoreConfig) -> Fixture {
        let catalog = Arc::new(InMemoryCatalog::new());
        let transients = Arc::new(InMemoryTransientStore::new());
        let object_cache = Arc::new(InMemoryObjectCache::new());
        let services = CatalogServices {
            repository: catalog.clone(),
            catalog: catalog.clone(),
            transients: transients.clone(),
            object_cache: object_cache.clone(),
            versions: Arc::new(TransientVersionCounter::new(transients.clone())),
            filters: Arc::new(PriceFilters::new()),
            config,
        };
        Fixture {
            catalog,
            transients,
            object_cache,
            services,
        }
    }

    fn seed_parent(catalog: &InMemoryCatalog, id: u64) {
        let mut parent = ProductRecord::new(ProductId::new(id), ProductType::Variable);
        parent.regular_price = Some(dec("99"));
        parent.sale_price = Some(dec("89"));
        catalog.upsert(parent).unwrap();
    }

    fn seed_child(catalog: &InMemoryCatalog, parent: u64, id: u64, price: &str) -> ProductRecord {
        let mut record = ProductRecord::new(ProductId::new(id), ProductType::Variation);
        record.parent_id = Some(ProductId::new(parent));
        record.price = Some(dec(price));
        record.regular_price = Some(dec(price));
        catalog.upsert(record.clone()).unwrap();
        record
    }

    #[test]
    fn read_product_clears_own_prices_and_loads_children() {
        let fx = fixture(StoreConfig::default());
        seed_parent(&fx.catalog, 1);
        seed_child(&fx.catalog, 1, 2, "5");
        seed_child(&fx.catalog, 1, 3, "6");

        let mut store = fx.services.unit_of_work();
        let product = store.read_product(ProductId::new(1)).unwrap().unwrap();
        assert_eq!(product.regular_price(), None);
        assert_eq!(product.sale_price(), None);
        assert_eq!(product.children(), &[ProductId::new(2), ProductId::new(3)]);
        assert_eq!(product.visible_children(), product.children());
        assert!(product.variation_attributes().is_empty());
    }

    #[test]
    fn read_product_of_missing_id_is_none() {
        let fx = fixture(StoreConfig::default());
        assert!(fx.services.unit_of_work().read_product(ProductId::new(7)).unwrap().is_none());
    }

    #[test]
    fn read_product_rejects_non_variable_rows() {
        let fx = fixture(StoreConfig::default());
        fx.catalog
            .upsert(ProductRecord::new(ProductId::new(4), ProductType::Simple))
            .unwrap();
        let err = fx.services.unit_of_work().read_product(ProductId::new(4)).unwrap_err();
        assert!(matches!(err, StoreError::Domain(_)));
    }

    #[test]
    fn children_listing_is_written_to_shared_cache() {
        let fx = fixture(StoreConfig::default());
        seed_child(&fx.catalog, 1, 2, "5");

        let mut store = fx.services.unit_of_work();
        store.get_children(ProductId::new(1), false).unwrap();

        let raw = fx.transients.get("wc_product_children_1").unwrap().unwrap();
        let cached: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(cached, json!({"all": [2], "visible": [2]}));
    }

    #[test]
    fn cached_listing_is_served_until_forced() {
        let fx = fixture(StoreConfig::default());
        seed_child(&fx.catalog, 1, 2, "5");

        let mut store = fx.services.unit_of_work();
        store.get_children(ProductId::new(1), false).unwrap();
        seed_child(&fx.catalog, 1, 3, "6");

        assert_eq!(store.get_children(ProductId::new(1), false).unwrap().all, vec![ProductId::new(2)]);
        assert_eq!(
            store.get_children(ProductId::new(1), true).unwrap().all,
            vec![ProductId::new(2), ProductId::new(3)]
        );
    }

    #[test]
    fn listing_missing_visible_is_recomputed() {
        let fx = fixture(StoreConfig::default());
        seed_child(&fx.catalog, 1, 2, "5");
        fx.transients
            .set("wc_product_children_1", br#"{"all":[9]}"#.to_vec(), None)
            .unwrap();

        let listing = fx.services.unit_of_work().get_children(ProductId::new(1), false).unwrap();
        assert_eq!(listing.all, vec![ProductId::new(2)]);
    }

    #[test]
    fn price_envelope_persists_version_and_table() {
        let fx = fixture(StoreConfig::default());
        seed_parent(&fx.catalog, 1);
        seed_child(&fx.catalog, 1, 2, "5");

        let mut store = fx.services.unit_of_work();
        let product = store.read_product(ProductId::new(1)).unwrap().unwrap();
        let hash = store.compute_price_hash(&product, false).unwrap();
        store.get_price_table(&product, false).unwrap();

        let raw = fx.transients.get("wc_var_prices_1").unwrap().unwrap();
        let cached: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert!(cached["version"].is_string());
        assert_eq!(cached[hash.as_str()]["price"]["2"], json!("5.00"));
        assert_eq!(cached[hash.as_str()]["sale_price"]["2"], json!("5.00"));
    }

    #[test]
    fn price_range_spans_visible_children() {
        let fx = fixture(StoreConfig::default());
        seed_parent(&fx.catalog, 1);
        seed_child(&fx.catalog, 1, 2, "5");
        seed_child(&fx.catalog, 1, 3, "12.5");

        let mut store = fx.services.unit_of_work();
        let product = store.read_product(ProductId::new(1)).unwrap().unwrap();
        assert_eq!(store.price_range(&product, false).unwrap(), Some((dec("5.00"), dec("12.50"))));
        assert!(!store.is_on_sale(&product, false).unwrap());
    }

    #[test]
    fn probe_results_are_cached_as_flags() {
        let fx = fixture(StoreConfig::default());
        let mut heavy = seed_child(&fx.catalog, 1, 2, "5");
        heavy.weight = Some(dec("1.5"));
        fx.catalog.upsert(heavy).unwrap();

        let store = fx.services.unit_of_work();
        assert!(store.child_has_weight(ProductId::new(1)).unwrap());
        assert!(!store.child_has_dimensions(ProductId::new(1)).unwrap());
        assert!(store.child_is_in_stock(ProductId::new(1)).unwrap());

        assert_eq!(
            fx.object_cache
                .get("woocommerce_product_child_has_weight_1", PROBE_GROUP)
                .unwrap(),
            Some(json!(1))
        );
        assert_eq!(
            fx.object_cache
                .get("woocommerce_product_child_has_dimensions_1", PROBE_GROUP)
                .unwrap(),
            Some(json!(0))
        );
    }

    #[test]
    fn hidden_out_of_stock_children_do_not_count_for_weight() {
        let fx = fixture(StoreConfig {
            hide_out_of_stock_items: true,
            ..StoreConfig::default()
        });
        let mut heavy = seed_child(&fx.catalog, 1, 2, "5");
        heavy.weight = Some(dec("2"));
        heavy.stock_status = StockStatus::OutOfStock;
        fx.catalog.upsert(heavy).unwrap();

        let store = fx.services.unit_of_work();
        assert!(!store.child_has_weight(ProductId::new(1)).unwrap());
        assert!(!store.child_is_in_stock(ProductId::new(1)).unwrap());
    }

    #[test]
    fn clear_caches_drops_every_slot() {
        let fx = fixture(StoreConfig::default());
        seed_parent(&fx.catalog, 1);
        seed_child(&fx.catalog, 1, 2, "5");

        let mut store = fx.services.unit_of_work();
        let product = store.read_product(ProductId::new(1)).unwrap().unwrap();
        store.get_price_table(&product, false).unwrap();
        store.child_has_weight(ProductId::new(1)).unwrap();

        store.clear_caches(ProductId::new(1)).unwrap();
        assert!(fx.transients.get("wc_product_children_1").unwrap().is_none());
        assert!(fx.transients.get("wc_var_prices_1").unwrap().is_none());
        assert!(fx
            .object_cache
            .get("woocommerce_product_child_has_weight_1", PROBE_GROUP)
            .unwrap()
            .is_none());
    }
}
