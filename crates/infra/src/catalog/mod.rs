//! Catalog persistence ports.
//!
//! The data stores never talk to a database directly. They consume two
//! collaborators: a base repository that reads product rows, and a catalog
//! query interface for child listings and existence checks.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryCatalog;
pub use postgres::PostgresCatalog;

use std::sync::Arc;

use varistore_core::ProductId;
use varistore_products::{ProductRecord, ProductType, StockStatus, Variation};

use crate::error::StoreError;

/// Ordering of a product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    /// Manual sort order ascending, ties by store order.
    MenuOrder,
    /// Store order.
    Id,
}

/// Listing query over catalog products; always returns ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub parent: ProductId,
    pub kind: ProductType,
    pub order_by: OrderBy,
    pub limit: Option<usize>,
    pub stock_status: Option<StockStatus>,
}

impl ProductQuery {
    /// Every variation of `parent` in manual sort order.
    pub fn variations_of(parent: ProductId) -> Self {
        Self {
            parent,
            kind: ProductType::Variation,
            order_by: OrderBy::MenuOrder,
            limit: None,
            stock_status: None,
        }
    }

    pub fn with_stock_status(mut self, status: StockStatus) -> Self {
        self.stock_status = Some(status);
        self
    }
}

/// Attribute tested by a child existence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildAttribute {
    /// `weight > 0`.
    Weight,
    /// Any of length, width or height `> 0`.
    Dimensions,
    /// `stock_status = instock`.
    InStock,
}

/// Existence check over the children of a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildPredicate {
    pub attribute: ChildAttribute,
    /// Only consider in-stock children.
    pub in_stock_only: bool,
}

impl ChildPredicate {
    /// Checked against any child row, whatever its product type.
    pub fn matches(&self, child: &ProductRecord) -> bool {
        if self.in_stock_only && !child.stock_status.is_in_stock() {
            return false;
        }
        match self.attribute {
            ChildAttribute::Weight => child.has_weight(),
            ChildAttribute::Dimensions => child.dimensions.has_any(),
            ChildAttribute::InStock => child.stock_status.is_in_stock(),
        }
    }
}

/// Base persistence collaborator: generic product row reads.
pub trait ProductRepository: Send + Sync {
    fn read(&self, id: ProductId) -> Result<Option<ProductRecord>, StoreError>;
}

/// Catalog query collaborator.
pub trait CatalogQuery: Send + Sync {
    fn find_products(&self, query: &ProductQuery) -> Result<Vec<ProductId>, StoreError>;

    /// `None` when the id does not resolve to a variation.
    fn get_variation(&self, id: ProductId) -> Result<Option<Variation>, StoreError>;

    /// Whether at least one child of `parent` satisfies `predicate`.
    fn child_exists(&self, parent: ProductId, predicate: ChildPredicate) -> Result<bool, StoreError>;
}

impl<S> ProductRepository for Arc<S>
where
    S: ProductRepository + ?Sized,
{
    fn read(&self, id: ProductId) -> Result<Option<ProductRecord>, StoreError> {
        (**self).read(id)
    }
}

impl<S> CatalogQuery for Arc<S>
where
    S: CatalogQuery + ?Sized,
{
    fn find_products(&self, query: &ProductQuery) -> Result<Vec<ProductId>, StoreError> {
        (**self).find_products(query)
    }

    fn get_variation(&self, id: ProductId) -> Result<Option<Variation>, StoreError> {
        (**self).get_variation(id)
    }

    fn child_exists(&self, parent: ProductId, predicate: ChildPredicate) -> Result<bool, StoreError> {
        (**self).child_exists(parent, predicate)
    }
}
