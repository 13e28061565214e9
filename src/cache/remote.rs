//! Deferred providers of upstream content.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::storage::{Content, Key, Storage, StorageError};

/// A failure produced by a [`Remote`].
///
/// Cloneable so that a pre-failed remote can hand out the same cause on
/// every call.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// No content could be obtained and there was no more specific cause.
    #[error("failed to load content from remote")]
    Unavailable,

    /// The remote failed with the given cause.
    #[error("{0}")]
    Failed(Arc<dyn std::error::Error + Send + Sync>),
}

impl RemoteError {
    /// Wrap an arbitrary error as a remote failure.
    pub fn failed(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        RemoteError::Failed(Arc::new(error))
    }

    /// Build a remote failure from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        RemoteError::Failed(Arc::new(MessageError(message.into())))
    }
}

impl From<StorageError> for RemoteError {
    fn from(e: StorageError) -> Self {
        RemoteError::failed(e)
    }
}

impl From<std::io::Error> for RemoteError {
    fn from(e: std::io::Error) -> Self {
        RemoteError::failed(e)
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
struct MessageError(String);

/// Result of a remote fetch: absent, present, or failed.
pub type RemoteResult = std::result::Result<Option<Content>, RemoteError>;

/// A deferred source of an optional content blob.
///
/// Each call to [`Remote::get`] performs one fetch. Closures returning a
/// future implement this trait, so `|| async { RemoteResult::Ok(None) }` is a remote.
#[async_trait]
pub trait Remote: Send + Sync {
    /// Fetch the content, if it exists.
    async fn get(&self) -> RemoteResult;
}

#[async_trait]
impl<F, Fut> Remote for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = RemoteResult> + Send,
{
    async fn get(&self) -> RemoteResult {
        (self)().await
    }
}

/// A remote that turns any failure of `remote` into an absent result.
pub fn absorbing<R>(remote: R) -> impl Remote
where
    R: Remote + 'static,
{
    let remote = Arc::new(remote);
    move || {
        let remote = Arc::clone(&remote);
        async move {
            let result: RemoteResult = match remote.get().await {
                Ok(content) => Ok(content),
                Err(e) => {
                    debug!(error = %e, "remote failed, treating as absent");
                    Ok(None)
                }
            };
            result
        }
    }
}

/// A remote that immediately fails with `error` without doing any work.
pub fn failed(error: RemoteError) -> impl Remote {
    move || {
        let error = error.clone();
        async move { RemoteResult::Err(error) }
    }
}

/// A remote that always reports the content as absent.
pub fn empty() -> impl Remote {
    || async { RemoteResult::Ok(None) }
}

/// A remote reading the value currently stored under a key.
///
/// Used to hand an existing cache entry to a
/// [`CacheControl`](super::CacheControl) without the cache prescribing how it
/// is read.
pub struct StoredValue {
    storage: Arc<dyn Storage>,
    key: Key,
}

impl StoredValue {
    pub fn new(storage: Arc<dyn Storage>, key: Key) -> Self {
        Self { storage, key }
    }
}

#[async_trait]
impl Remote for StoredValue {
    async fn get(&self) -> RemoteResult {
        Ok(Some(self.storage.value(&self.key).await?))
    }
}
