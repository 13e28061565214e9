use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::cache::{Cache, Result};
use super::control::CacheControl;
use super::from_storage_cache::FromStorageCache;
use super::remote::{self, Remote, RemoteError};
use crate::storage::{Content, Key, Storage};

/// A cache that always asks the remote first and keeps the stored copy as a
/// fallback.
///
/// Present remote content is saved under `key`, re-read and returned;
/// `control` is not consulted on that path. When the remote fails or reports
/// the item absent, the load is delegated to [`FromStorageCache`] with a
/// remote pre-failed with that cause, so a previously cached copy that passes
/// `control` is still served.
///
/// Suited to resources that are cheap to refetch and where staleness is only
/// acceptable while the origin is unreachable.
pub struct FromRemoteCache {
    storage: Arc<dyn Storage>,
}

impl FromRemoteCache {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Cache for FromRemoteCache {
    async fn load(
        &self,
        key: &Key,
        remote: &dyn Remote,
        control: &dyn CacheControl,
    ) -> Result<Option<Content>> {
        let failure = match remote.get().await {
            Ok(Some(content)) => {
                self.storage.save(key, content).await?;
                debug!(key = %key, "refreshed cache from remote");
                return Ok(Some(self.storage.value(key).await?));
            }
            Ok(None) => RemoteError::Unavailable,
            Err(e) => {
                warn!(key = %key, error = %e, "remote failed, trying cache");
                e
            }
        };
        FromStorageCache::new(Arc::clone(&self.storage))
            .load(key, &remote::failed(failure), control)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::cache::remote::RemoteResult;
    use crate::cache::{CacheError, Standard};
    use crate::storage::MemoryStorage;

    async fn read(content: Option<Content>) -> Vec<u8> {
        content.unwrap().into_bytes().await.unwrap().to_vec()
    }

    #[tokio::test]
    async fn test_remote_always_asked_first() {
        let storage = Arc::new(MemoryStorage::new());
        let key = Key::new("first");
        storage
            .save(&key, Content::from_bytes(&b"cached"[..]))
            .await
            .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let remote = move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { RemoteResult::Ok(Some(Content::from_bytes(&b"fresh"[..]))) }
        };

        let cache = FromRemoteCache::new(storage.clone());
        let content = cache.load(&key, &remote, &Standard::Always).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(read(content).await, b"fresh");
        let stored = storage.value(&key).await.unwrap().into_bytes().await.unwrap();
        assert_eq!(&stored[..], b"fresh");
    }

    #[tokio::test]
    async fn test_control_not_consulted_on_success() {
        let storage = Arc::new(MemoryStorage::new());
        let key = Key::new("k");
        storage.save(&key, Content::from_bytes(&b"old"[..])).await.unwrap();

        let cache = FromRemoteCache::new(storage);
        let remote = || async { RemoteResult::Ok(Some(Content::from_bytes(&b"new"[..]))) };
        let content = cache.load(&key, &remote, &Standard::Never).await.unwrap();
        assert_eq!(read(content).await, b"new");
    }

    #[tokio::test]
    async fn test_falls_back_to_cache_on_failure() {
        let storage = Arc::new(MemoryStorage::new());
        let key = Key::new("fallback");
        storage
            .save(&key, Content::from_bytes(&b"cached"[..]))
            .await
            .unwrap();

        let cache = FromRemoteCache::new(storage);
        let failing = remote::failed(RemoteError::msg("origin down"));
        let content = cache.load(&key, &failing, &Standard::Always).await.unwrap();
        assert_eq!(read(content).await, b"cached");
    }

    #[tokio::test]
    async fn test_falls_back_to_cache_when_absent() {
        let storage = Arc::new(MemoryStorage::new());
        let key = Key::new("fallback");
        storage
            .save(&key, Content::from_bytes(&b"cached"[..]))
            .await
            .unwrap();

        let cache = FromRemoteCache::new(storage);
        let content = cache
            .load(&key, &remote::empty(), &Standard::Always)
            .await
            .unwrap();
        assert_eq!(read(content).await, b"cached");
    }

    #[tokio::test]
    async fn test_fails_when_nothing_usable() {
        let cache = FromRemoteCache::new(Arc::new(MemoryStorage::new()));
        let key = Key::new("missing");

        let result = cache.load(&key, &remote::empty(), &Standard::Always).await;
        assert!(matches!(
            result,
            Err(CacheError::Remote(RemoteError::Unavailable))
        ));

        let failing = remote::failed(RemoteError::msg("origin down"));
        let err = cache
            .load(&key, &failing, &Standard::Always)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "remote error: origin down");
    }

    #[tokio::test]
    async fn test_stale_fallback_is_rejected() {
        let storage = Arc::new(MemoryStorage::new());
        let key = Key::new("stale");
        storage.save(&key, Content::from_bytes(&b"old"[..])).await.unwrap();

        let cache = FromRemoteCache::new(storage);
        let result = cache.load(&key, &remote::empty(), &Standard::Never).await;
        assert!(result.is_err());
    }
}
