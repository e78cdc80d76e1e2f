//! `varistore-core`: shared building blocks for the catalog data stores.
//!
//! This crate contains **pure** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ProductId, UnitOfWorkId};
pub use value_object::ValueObject;
