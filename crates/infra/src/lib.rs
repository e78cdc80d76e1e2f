//! Infrastructure layer: cache adapters, catalog persistence, version
//! counters, configuration and the variable product data store.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod data_store;
pub mod error;
pub mod version;

pub use config::StoreConfig;
pub use data_store::{CatalogServices, VariableProductDataStore};
pub use error::StoreError;
