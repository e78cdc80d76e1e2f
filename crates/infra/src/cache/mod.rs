//! Cache layers used by the data stores.
//!
//! Two independent facilities back the data stores:
//! - a shared, TTL-bound byte store ([`TransientStore`]) for children listings
//!   and price envelopes, visible to every process;
//! - an object cache ([`ObjectCache`]) with namespaced keys and no expiry, for
//!   the attribute probes.
//!
//! On top of these, [`Cache`] is the typed cache-aside seam: [`MemoCache`]
//! keeps decoded values for one unit of work, [`TransientCache`] encodes them
//! into a shared store.

pub mod memo;
pub mod object;
#[cfg(feature = "redis")]
pub mod redis;
pub mod transient;

pub use memo::MemoCache;
pub use object::{InMemoryObjectCache, ObjectCache};
pub use transient::{InMemoryTransientStore, TransientCache, TransientStore};

use crate::error::StoreError;

/// Typed key/value cache.
pub trait Cache<K, V> {
    fn get(&self, key: &K) -> Result<Option<V>, StoreError>;
    fn set(&mut self, key: K, value: V) -> Result<(), StoreError>;
}
