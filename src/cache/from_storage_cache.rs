use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::cache::{Cache, Result};
use super::control::CacheControl;
use super::remote::{Remote, StoredValue};
use crate::storage::{Content, Key, Storage};

/// A cache that serves a valid stored copy first and falls back to the remote.
///
/// 1. If `key` exists in storage, `control` validates it (fed with the
///    stored value). A valid entry is re-read and returned without touching
///    the remote.
/// 2. Otherwise, or if anything fails while checking/validating/reading the
///    existing entry, the remote is fetched. Present content is saved under
///    `key` and the saved copy is re-read and returned, so callers always get
///    exactly what now lives in the cache.
///
/// Failures around the existing entry are logged and never surfaced. Remote
/// failures and failures saving fresh content are.
///
/// Two callers racing on the same missing key each fetch and save
/// independently; the last write wins. Wrap the call in a
/// [`StorageLock`](crate::lock::StorageLock) scoped to the key for
/// single-flight behaviour.
pub struct FromStorageCache {
    storage: Arc<dyn Storage>,
}

impl FromStorageCache {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Look up a valid existing entry, swallowing any failure.
    async fn cached(&self, key: &Key, control: &dyn CacheControl) -> Option<Content> {
        match self.storage.exists(key).await {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to check cache entry");
                return None;
            }
        }

        let stored = StoredValue::new(Arc::clone(&self.storage), key.clone());
        match control.validate(key, &stored).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(key = %key, "cache entry is stale");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "failed to validate cache entry");
                return None;
            }
        }

        match self.storage.value(key).await {
            Ok(content) => Some(content),
            Err(e) => {
                warn!(key = %key, error = %e, "failed to read cache entry");
                None
            }
        }
    }

    /// Fetch from the remote and populate the cache.
    async fn fetch(&self, key: &Key, remote: &dyn Remote) -> Result<Option<Content>> {
        let Some(content) = remote.get().await? else {
            return Ok(None);
        };
        self.storage.save(key, content).await?;
        debug!(key = %key, "cached remote content");
        Ok(Some(self.storage.value(key).await?))
    }
}

#[async_trait]
impl Cache for FromStorageCache {
    async fn load(
        &self,
        key: &Key,
        remote: &dyn Remote,
        control: &dyn CacheControl,
    ) -> Result<Option<Content>> {
        if let Some(content) = self.cached(key, control).await {
            return Ok(Some(content));
        }
        self.fetch(key, remote).await
    }
}
