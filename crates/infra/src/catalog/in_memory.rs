use std::collections::BTreeMap;
use std::sync::RwLock;

use varistore_core::ProductId;
use varistore_products::{ProductRecord, Variation};

use super::{CatalogQuery, ChildPredicate, OrderBy, ProductQuery, ProductRepository};
use crate::error::StoreError;

/// In-memory catalog for tests/dev.
///
/// Store order is id order.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<BTreeMap<ProductId, ProductRecord>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, record: ProductRecord) -> Result<(), StoreError> {
        let mut products = self.products.write().map_err(|_| StoreError::LockPoisoned)?;
        products.insert(record.id, record);
        Ok(())
    }

    pub fn remove(&self, id: ProductId) -> Result<Option<ProductRecord>, StoreError> {
        let mut products = self.products.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(products.remove(&id))
    }

}

impl ProductRepository for InMemoryCatalog {
    fn read(&self, id: ProductId) -> Result<Option<ProductRecord>, StoreError> {
        let products = self.products.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(products.get(&id).cloned())
    }
}

impl CatalogQuery for InMemoryCatalog {
    fn find_products(&self, query: &ProductQuery) -> Result<Vec<ProductId>, StoreError> {
        let products = self.products.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut rows: Vec<&ProductRecord> = products
            .values()
            .filter(|r| r.parent_id == Some(query.parent) && r.kind == query.kind)
            .filter(|r| query.stock_status.is_none_or(|status| r.stock_status == status))
            .collect();

        if query.order_by == OrderBy::MenuOrder {
            // Stable sort keeps id order among equal menu orders.
            rows.sort_by_key(|r| r.menu_order);
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(rows.into_iter().take(limit).map(|r| r.id).collect())
    }

    fn get_variation(&self, id: ProductId) -> Result<Option<Variation>, StoreError> {
        Ok(self.read(id)?.and_then(Variation::from_record))
    }

    fn child_exists(&self, parent: ProductId, predicate: ChildPredicate) -> Result<bool, StoreError> {
        let products = self.products.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(products
            .values()
            .filter(|r| r.parent_id == Some(parent))
            .any(|r| predicate.matches(r)))
    }
}
