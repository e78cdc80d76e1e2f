//! Variable product pricing domain.
//!
//! Pure, deterministic logic for variable products and their variations:
//! decimal normalization, tax conversion, the filter registry, the price hash
//! and price table construction. No IO, no caching, no storage; the
//! `varistore-infra` crate wires these into the data store.

pub mod children;
pub mod filters;
pub mod hash;
pub mod price;
pub mod price_table;
pub mod product;
pub mod state;
pub mod tax;

pub use children::ChildrenListing;
pub use filters::{FilterContext, FilterIdentities, PriceField, PriceFilters, DEFAULT_PRIORITY};
pub use hash::{compute_price_hash, PriceHash, PriceHashSeed};
pub use price::{format_decimal, format_sale_decimal, DEFAULT_PRICE_DECIMALS};
pub use price_table::{PriceEnvelope, PriceRow, PriceTable, PriceTableBuilder};
pub use product::{Dimensions, ProductRecord, ProductType, StockStatus, VariableProduct, Variation};
pub use state::{CatalogState, VersionTag};
pub use tax::{TaxDisplay, TaxRate, TaxSettings};
