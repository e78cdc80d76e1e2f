use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value as JsonValue;

use crate::error::StoreError;

/// Namespaced key/value cache with no expiry.
///
/// Entries live until something deletes them (or the backend evicts them).
pub trait ObjectCache: Send + Sync {
    fn get(&self, key: &str, group: &str) -> Result<Option<JsonValue>, StoreError>;
    fn set(&self, key: &str, group: &str, value: JsonValue) -> Result<(), StoreError>;
    fn delete(&self, key: &str, group: &str) -> Result<bool, StoreError>;
}

impl<S> ObjectCache for Arc<S>
where
    S: ObjectCache + ?Sized,
{
    fn get(&self, key: &str, group: &str) -> Result<Option<JsonValue>, StoreError> {
        (**self).get(key, group)
    }

    fn set(&self, key: &str, group: &str, value: JsonValue) -> Result<(), StoreError> {
        (**self).set(key, group, value)
    }

    fn delete(&self, key: &str, group: &str) -> Result<bool, StoreError> {
        (**self).delete(key, group)
    }
}

/// In-memory object cache for tests/dev and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryObjectCache {
    inner: RwLock<HashMap<(String, String), JsonValue>>,
}

impl InMemoryObjectCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ObjectCache for InMemoryObjectCache {
    fn get(&self, key: &str, group: &str) -> Result<Option<JsonValue>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.get(&(group.to_string(), key.to_string())).cloned())
    }

    fn set(&self, key: &str, group: &str, value: JsonValue) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        map.insert((group.to_string(), key.to_string()), value);
        Ok(())
    }

    fn delete(&self, key: &str, group: &str) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.remove(&(group.to_string(), key.to_string())).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn groups_isolate_keys() {
        let cache = InMemoryObjectCache::new();
        cache.set("k", "product", json!(1)).unwrap();
        assert_eq!(cache.get("k", "product").unwrap(), Some(json!(1)));
        assert_eq!(cache.get("k", "order").unwrap(), None);

        assert!(cache.delete("k", "product").unwrap());
        assert!(!cache.delete("k", "product").unwrap());
        assert_eq!(cache.get("k", "product").unwrap(), None);
    }
}
