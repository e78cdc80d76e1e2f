use std::collections::HashMap;
use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

use super::Cache;

/// Shared key/value byte store with optional expiry.
///
/// `ttl: None` keeps the entry until it is deleted or evicted.
pub trait TransientStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), StoreError>;
    fn delete(&self, key: &str) -> Result<bool, StoreError>;
}

impl<S> TransientStore for Arc<S>
where
    S: TransientStore + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), StoreError> {
        (**self).set(key, value, ttl)
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        (**self).delete(key)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// In-memory transient store for tests/dev.
///
/// Expired entries read as absent and are dropped on the next write.
#[derive(Debug, Default)]
pub struct InMemoryTransientStore {
    inner: RwLock<HashMap<String, Entry>>,
}

impl InMemoryTransientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Utc::now();
        self.inner
            .read()
            .map(|map| map.values().filter(|e| e.is_live(now)).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TransientStore for InMemoryTransientStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        let now = Utc::now();
        Ok(map.get(key).filter(|e| e.is_live(now)).map(|e| e.value.clone()))
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        let now = Utc::now();
        map.retain(|_, e| e.is_live(now));
        map.insert(
            key.to_string(),
            Entry {
                value,
                // A TTL past the end of time never expires.
                expires_at: ttl.and_then(|ttl| now.checked_add_signed(ttl)),
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.remove(key).is_some())
    }
}

/// Typed view over a [`TransientStore`]: JSON-encoded values under
/// `"{prefix}{key}"`, written with a fixed TTL.
///
/// An entry that no longer decodes reads as a miss.
pub struct TransientCache<K, V> {
    store: Arc<dyn TransientStore>,
    prefix: &'static str,
    ttl: Option<Duration>,
    _types: PhantomData<fn(K) -> V>,
}

impl<K, V> TransientCache<K, V> {
    pub fn new(store: Arc<dyn TransientStore>, prefix: &'static str, ttl: Option<Duration>) -> Self {
        Self {
            store,
            prefix,
            ttl,
            _types: PhantomData,
        }
    }
}

impl<K: Display, V> TransientCache<K, V> {
    pub fn key(&self, key: &K) -> String {
        format!("{}{}", self.prefix, key)
    }

    pub fn delete(&self, key: &K) -> Result<bool, StoreError> {
        self.store.delete(&self.key(key))
    }
}

impl<K, V> Cache<K, V> for TransientCache<K, V>
where
    K: Display,
    V: Serialize + DeserializeOwned,
{
    fn get(&self, key: &K) -> Result<Option<V>, StoreError> {
        let name = self.key(key);
        let Some(bytes) = self.store.get(&name)? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                tracing::warn!(key = %name, error = %err, "discarding undecodable cache entry");
                Ok(None)
            }
        }
    }

    fn set(&mut self, key: K, value: V) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(&value)?;
        self.store.set(&self.key(&key), bytes, self.ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_entries_read_as_absent() {
        let store = InMemoryTransientStore::new();
        store.set("gone", b"1".to_vec(), Some(Duration::zero())).unwrap();
        store.set("kept", b"2".to_vec(), Some(Duration::days(30))).unwrap();
        store.set("forever", b"3".to_vec(), None).unwrap();

        assert_eq!(store.get("gone").unwrap(), None);
        assert_eq!(store.get("kept").unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.get("forever").unwrap(), Some(b"3".to_vec()));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn ttl_beyond_calendar_range_never_expires() {
        let store = InMemoryTransientStore::new();
        store
            .set("forever", b"1".to_vec(), Some(Duration::seconds(i64::MAX / 1_000)))
            .unwrap();
        assert_eq!(store.get("forever").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn typed_cache_prefixes_keys() {
        let store = Arc::new(InMemoryTransientStore::new());
        let mut cache: TransientCache<u64, Vec<u64>> =
            TransientCache::new(store.clone(), "listing_", Some(Duration::days(1)));

        cache.set(7, vec![1, 2]).unwrap();
        assert_eq!(store.get("listing_7").unwrap(), Some(b"[1,2]".to_vec()));
        assert_eq!(cache.get(&7).unwrap(), Some(vec![1, 2]));

        assert!(cache.delete(&7).unwrap());
        assert_eq!(cache.get(&7).unwrap(), None);
    }

    #[test]
    fn undecodable_entry_is_a_miss() {
        let store = Arc::new(InMemoryTransientStore::new());
        store.set("listing_1", b"{broken".to_vec(), None).unwrap();
        let cache: TransientCache<u64, Vec<u64>> = TransientCache::new(store, "listing_", None);
        assert_eq!(cache.get(&1).unwrap(), None);
    }
}
