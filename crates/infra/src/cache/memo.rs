use std::collections::HashMap;
use std::hash::Hash;

use crate::error::StoreError;

use super::Cache;

/// Process-local memo for one unit of work.
///
/// Holds already-decoded (and already-filtered) values. Owned by a single
/// data store instance and dropped with it; never shared between units of
/// work.
#[derive(Debug)]
pub struct MemoCache<K, V> {
    entries: HashMap<K, V>,
}

impl<K, V> MemoCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop every entry whose key fails `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) {
        self.entries.retain(|key, _| keep(key));
    }
}

impl<K, V> Default for MemoCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Cache<K, V> for MemoCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn get(&self, key: &K) -> Result<Option<V>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: K, value: V) -> Result<(), StoreError> {
        self.entries.insert(key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_returns_value() {
        let mut memo: MemoCache<String, u32> = MemoCache::new();
        assert_eq!(memo.get(&"a".to_string()).unwrap(), None);
        memo.set("a".to_string(), 1).unwrap();
        memo.set("a".to_string(), 2).unwrap();
        assert_eq!(memo.get(&"a".to_string()).unwrap(), Some(2));
        assert_eq!(memo.len(), 1);

        memo.set("b".to_string(), 3).unwrap();
        memo.retain(|key| key != "a");
        assert_eq!(memo.get(&"a".to_string()).unwrap(), None);
        assert_eq!(memo.get(&"b".to_string()).unwrap(), Some(3));

        memo.clear();
        assert!(memo.is_empty());
    }
}
