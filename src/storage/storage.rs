//! The asynchronous key/value storage interface.

use async_trait::async_trait;
use thiserror::Error;

use super::{Content, Key};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No value is stored under the key.
    #[error("value not found: {0}")]
    NotFound(Key),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The key cannot be used for this operation.
    #[error("invalid key '{key}': {message}")]
    InvalidKey { key: Key, message: String },

    /// A custom error message.
    #[error("{0}")]
    Other(String),
}

impl StorageError {
    /// Whether this error means the value does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Metadata of a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meta {
    /// Size of the value in bytes.
    pub size: u64,
}

// =============================================================================
// Storage Trait
// =============================================================================

/// An asynchronous key/value storage.
///
/// Implementations are shared across tasks. No operation is atomic across
/// several keys; concurrent writers to the same key interleave arbitrarily
/// unless they coordinate through a [`StorageLock`](crate::lock::StorageLock).
#[async_trait]
pub trait Storage: Send + Sync {
    /// Check if a value exists under the key.
    async fn exists(&self, key: &Key) -> Result<bool>;

    /// List all keys under a prefix, in sorted order.
    ///
    /// Matching is segment-wise: listing `a/b` does not return `a/bc`.
    async fn list(&self, prefix: &Key) -> Result<Vec<Key>>;

    /// Save content under the key, replacing any existing value.
    async fn save(&self, key: &Key, content: Content) -> Result<()>;

    /// Move a value to a new key, replacing any value at the destination.
    async fn move_value(&self, source: &Key, destination: &Key) -> Result<()>;

    /// Read the metadata of a stored value.
    async fn metadata(&self, key: &Key) -> Result<Meta>;

    /// Read a stored value.
    ///
    /// Returns [`StorageError::NotFound`] if nothing is stored under the key.
    async fn value(&self, key: &Key) -> Result<Content>;

    /// Delete a stored value.
    ///
    /// Returns [`StorageError::NotFound`] if nothing is stored under the key.
    async fn delete(&self, key: &Key) -> Result<()>;

    /// Delete every value under a prefix, one at a time.
    async fn delete_all(&self, prefix: &Key) -> Result<()> {
        for key in self.list(prefix).await? {
            self.delete(&key).await?;
        }
        Ok(())
    }

    /// A human readable description of this storage instance.
    fn identifier(&self) -> String;
}

/// Reject the root key for write operations.
pub(crate) fn check_not_root(key: &Key) -> Result<()> {
    if key.is_root() {
        Err(StorageError::InvalidKey {
            key: key.clone(),
            message: "unable to write to root".to_string(),
        })
    } else {
        Ok(())
    }
}
