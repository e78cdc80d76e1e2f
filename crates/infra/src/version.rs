//! Catalog-wide version counters.
//!
//! A version tag per entity class is bumped whenever anything in that class
//! changes materially. Derived caches store the tag they were computed under
//! and discard themselves when it no longer matches, so a single bump
//! invalidates every parent's cached prices without touching them.

use std::sync::{Arc, Mutex};

use chrono::Utc;

use varistore_products::VersionTag;

use crate::cache::TransientStore;
use crate::error::StoreError;

/// Entity class whose version guards price envelopes.
pub const PRODUCT_CLASS: &str = "product";

pub trait VersionCounter: Send + Sync {
    /// Current tag for `class`, creating one if none exists yet.
    fn current_version(&self, class: &str) -> Result<VersionTag, StoreError>;

    /// Replace the tag for `class` with a new, different one.
    fn invalidate(&self, class: &str) -> Result<VersionTag, StoreError>;
}

impl<S> VersionCounter for Arc<S>
where
    S: VersionCounter + ?Sized,
{
    fn current_version(&self, class: &str) -> Result<VersionTag, StoreError> {
        (**self).current_version(class)
    }

    fn invalidate(&self, class: &str) -> Result<VersionTag, StoreError> {
        (**self).invalidate(class)
    }
}

/// Version counter persisted in a transient store under
/// `"{class}-transient-version"`, never expiring.
///
/// Tags are microsecond timestamps; a bump within the same microsecond still
/// yields a strictly greater tag.
pub struct TransientVersionCounter {
    store: Arc<dyn TransientStore>,
    bump: Mutex<()>,
}

impl TransientVersionCounter {
    pub fn new(store: Arc<dyn TransientStore>) -> Self {
        Self {
            store,
            bump: Mutex::new(()),
        }
    }

    fn key(class: &str) -> String {
        format!("{class}-transient-version")
    }

    fn read(&self, class: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .store
            .get(&Self::key(class))?
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .filter(|tag| !tag.is_empty()))
    }

    fn write_next(&self, class: &str, previous: Option<&str>) -> Result<VersionTag, StoreError> {
        let now = Utc::now().timestamp_micros();
        let floor = previous
            .and_then(|p| p.parse::<i64>().ok())
            .map(|p| p + 1)
            .unwrap_or(i64::MIN);
        let tag = now.max(floor).to_string();
        self.store.set(&Self::key(class), tag.clone().into_bytes(), None)?;
        Ok(VersionTag::new(tag))
    }
}

impl VersionCounter for TransientVersionCounter {
    fn current_version(&self, class: &str) -> Result<VersionTag, StoreError> {
        if let Some(tag) = self.read(class)? {
            return Ok(VersionTag::new(tag));
        }
        let _guard = self.bump.lock().map_err(|_| StoreError::LockPoisoned)?;
        match self.read(class)? {
            Some(tag) => Ok(VersionTag::new(tag)),
            None => self.write_next(class, None),
        }
    }

    fn invalidate(&self, class: &str) -> Result<VersionTag, StoreError> {
        let _guard = self.bump.lock().map_err(|_| StoreError::LockPoisoned)?;
        let previous = self.read(class)?;
        let tag = self.write_next(class, previous.as_deref())?;
        tracing::debug!(class, version = %tag, "catalog version bumped");
        Ok(tag)
    }
}
