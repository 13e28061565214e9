//! Top-level application component.
//!
//! The [`App`] owns the configured storage and builds caches, locks and the
//! registry view on top of it.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::warn;

use crate::cache::{
    Cache, CacheControl, CacheError, DigestVerification, FromRemoteCache, FromStorageCache,
    HttpRemote, NoCache, Standard,
};
use crate::config::{read_config, CachePolicy, Config, ConfigSource, StorageType};
use crate::lock::{Lock, LockError, RetryLock, StorageLock};
use crate::registry::{AstoDocker, Digest};
use crate::storage::{Content, FsStorage, Key, LoggingStorage, MemoryStorage, Storage};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during App operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Cache(#[from] CacheError),

    #[error("{0}")]
    Lock(#[from] LockError),
}

/// Result type for App operations.
pub type Result<T> = std::result::Result<T, AppError>;

// =============================================================================
// Context Types
// =============================================================================

/// Context for creating an App.
#[derive(Default)]
pub struct AppContext {
    /// Source for configuration files.
    pub config_source: ConfigSource,
}

// =============================================================================
// App
// =============================================================================

/// The top-level application component.
pub struct App {
    config: Config,
    storage: Arc<dyn Storage>,
}

impl App {
    /// Create a new App with the given context.
    pub fn new(ctx: AppContext) -> Result<Self> {
        let config_result =
            read_config(&ctx.config_source).map_err(|e| AppError::Config(e.to_string()))?;
        for warning in &config_result.warnings {
            warn!("{}", warning);
        }
        Ok(Self::from_config(config_result.config))
    }

    /// Create an App from an already-built config.
    pub fn from_config(config: Config) -> Self {
        let engine: Arc<dyn Storage> = match config.storage.storage_type {
            StorageType::Fs => Arc::new(FsStorage::new(&config.storage.path)),
            StorageType::Memory => Arc::new(MemoryStorage::new()),
        };
        Self {
            config,
            storage: Arc::new(LoggingStorage::new(engine)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The configured storage.
    pub fn storage(&self) -> Arc<dyn Storage> {
        self.storage.clone()
    }

    /// The cache selected by `[cache] policy`.
    pub fn cache(&self) -> Box<dyn Cache> {
        match self.config.cache.policy {
            CachePolicy::StorageFirst => Box::new(FromStorageCache::new(self.storage())),
            CachePolicy::RemoteFirst => Box::new(FromRemoteCache::new(self.storage())),
            CachePolicy::None => Box::new(NoCache),
        }
    }

    /// A lock on `target` configured by the `[lock]` section.
    ///
    /// Passing the id of an earlier lock addresses the same proposal, which
    /// is how a separate process releases it.
    pub fn lock(&self, target: Key, id: Option<String>) -> Result<Arc<dyn Lock>> {
        let expiration = match self.config.lock.expiration {
            Some(lease) => {
                let lease = chrono::Duration::from_std(lease)
                    .map_err(|e| AppError::Config(format!("invalid lock expiration: {}", e)))?;
                Some(Utc::now() + lease)
            }
            None => None,
        };
        let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let lock: Arc<dyn Lock> = Arc::new(StorageLock::with_id(
            self.storage(),
            target,
            id,
            expiration,
        ));
        if self.config.lock.retry {
            Ok(Arc::new(RetryLock::new(lock)))
        } else {
            Ok(lock)
        }
    }

    /// The registry kept in the configured storage.
    pub fn registry(&self) -> AstoDocker {
        AstoDocker::new(self.storage())
    }

    /// Load `url` through the configured cache, storing it under `key`.
    ///
    /// With a digest the stored copy must hash to it to be served.
    pub async fn fetch(
        &self,
        url: &str,
        key: &Key,
        digest: Option<&Digest>,
    ) -> Result<Option<Content>> {
        let remote = HttpRemote::new(url);
        let control: Box<dyn CacheControl> = match digest {
            Some(digest) => {
                let algorithm = digest
                    .algorithm()
                    .map_err(|e| AppError::Config(e.to_string()))?;
                Box::new(DigestVerification::new(algorithm, digest.hex()))
            }
            None => Box::new(Standard::Always),
        };
        Ok(self.cache().load(key, &remote, control.as_ref()).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;
    use crate::config::{CacheConfig, LockConfig, StorageConfig};

    fn config(policy: CachePolicy, expiration: Option<Duration>, retry: bool) -> Config {
        Config {
            storage: StorageConfig {
                storage_type: StorageType::Memory,
                path: PathBuf::new(),
            },
            cache: CacheConfig { policy },
            lock: LockConfig { expiration, retry },
        }
    }

    #[tokio::test]
    async fn test_app_creation() {
        let app = App::new(AppContext::default()).unwrap();
        assert!(matches!(
            app.config().cache.policy,
            CachePolicy::StorageFirst | CachePolicy::RemoteFirst | CachePolicy::None
        ));
    }

    #[tokio::test]
    async fn test_fs_storage_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(CachePolicy::StorageFirst, None, false);
        config.storage.storage_type = StorageType::Fs;
        config.storage.path = dir.path().to_path_buf();
        let app = App::from_config(config);

        app.storage()
            .save(&Key::new("a/b"), Content::from_bytes(&b"x"[..]))
            .await
            .unwrap();

        assert!(dir.path().join("a").join("b").exists());
    }

    #[tokio::test]
    async fn test_lock_from_config() {
        let app = App::from_config(config(CachePolicy::None, None, false));
        let target = Key::new("target");

        let first = app.lock(target.clone(), Some("first".to_string())).unwrap();
        first.acquire().await.unwrap();
        let second = app.lock(target.clone(), None).unwrap();
        assert!(second.acquire().await.is_err());

        // The same id from another handle releases the first lock.
        app.lock(target, Some("first".to_string()))
            .unwrap()
            .release()
            .await
            .unwrap();
        second.acquire().await.unwrap();
    }

    #[tokio::test]
    async fn test_expiring_lock_from_config() {
        let app = App::from_config(config(
            CachePolicy::None,
            Some(Duration::from_secs(0)),
            false,
        ));
        let target = Key::new("target");

        app.lock(target.clone(), None).unwrap().acquire().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        app.lock(target, None).unwrap().acquire().await.unwrap();
    }

    #[tokio::test]
    async fn test_cache_policy_from_config() {
        let app = App::from_config(config(CachePolicy::StorageFirst, None, false));
        let key = Key::new("cached");
        app.storage()
            .save(&key, Content::from_bytes(&b"stored"[..]))
            .await
            .unwrap();
        let remote = || async { crate::cache::RemoteResult::Ok(None) };

        let content = app
            .cache()
            .load(&key, &remote, &Standard::Always)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(content.into_bytes().await.unwrap(), &b"stored"[..]);
    }
}
