//! The cache trait and its error type.

use async_trait::async_trait;
use thiserror::Error;

use super::control::CacheControl;
use super::remote::{Remote, RemoteError};
use crate::storage::{Content, Key, StorageError};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while loading through a cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The remote failed and no usable cache entry existed.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// The backing storage failed while populating the cache.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Reading content failed while validating it.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

// =============================================================================
// Cache Trait
// =============================================================================

/// Serves content from a local copy when possible, populating it from a
/// [`Remote`] otherwise.
///
/// `load` returns `Ok(None)` when the item exists neither in the cache nor
/// upstream. Which of cache and remote is consulted first, and whether
/// `control` is asked at all, is up to the implementation.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Load the item stored under `key`.
    async fn load(
        &self,
        key: &Key,
        remote: &dyn Remote,
        control: &dyn CacheControl,
    ) -> Result<Option<Content>>;
}

// =============================================================================
// NoCache
// =============================================================================

/// A cache that never caches anything.
///
/// Ignores `key` and `control` and returns whatever the remote produces.
/// Use this when caching is disabled via configuration.
pub struct NoCache;

#[async_trait]
impl Cache for NoCache {
    async fn load(
        &self,
        _key: &Key,
        remote: &dyn Remote,
        _control: &dyn CacheControl,
    ) -> Result<Option<Content>> {
        Ok(remote.get().await?)
    }
}
