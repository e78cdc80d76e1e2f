//! Redis-backed transient store.
//!
//! Shares children listings and price envelopes across processes. Expiry is
//! delegated to Redis (`SET ... EX`).

use chrono::Duration;
use redis::Commands;

use crate::error::StoreError;

use super::TransientStore;

pub struct RedisTransientStore {
    client: redis::Client,
    namespace: String,
}

impl RedisTransientStore {
    /// Connect lazily to `redis_url`; keys are stored as `"{namespace}:{key}"`.
    pub fn open(redis_url: &str, namespace: impl Into<String>) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            namespace: namespace.into(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    fn connection(&self) -> Result<redis::Connection, StoreError> {
        Ok(self.client.get_connection()?)
    }
}

impl TransientStore for RedisTransientStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.connection()?;
        let value: Option<Vec<u8>> = conn.get(self.key(key))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        let key = self.key(key);
        match ttl {
            Some(ttl) => {
                // Redis rejects non-positive expiries; an already-expired entry is a delete.
                let secs = ttl.num_seconds();
                if secs <= 0 {
                    let _: () = conn.del(key)?;
                } else {
                    let _: () = conn.set_ex(key, value, secs as u64)?;
                }
            }
            None => {
                let _: () = conn.set(key, value)?;
            }
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection()?;
        let removed: u64 = conn.del(self.key(key))?;
        Ok(removed > 0)
    }
}
