use async_trait::async_trait;
use thiserror::Error;

use crate::storage::{Key, StorageError};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while acquiring or releasing a lock.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another live proposal holds the lock.
    #[error(
        "failed to acquire lock\nown: `{own}`\nothers: {}\nnot expired: `{live}` `{expiration}`",
        quoted(.others)
    )]
    Contended {
        /// The caller's withdrawn proposal.
        own: Key,
        /// Every proposal seen while checking, the caller's included.
        others: Vec<Key>,
        /// The competing proposal that is still live.
        live: Key,
        /// Its expiration (empty when it never expires).
        expiration: String,
    },

    /// A competing proposal holds content that is not a valid instant.
    #[error("invalid lock proposal `{key}`: '{value}'")]
    InvalidProposal { key: Key, value: String },

    /// The backing storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

fn quoted(keys: &[Key]) -> String {
    keys.iter()
        .map(|key| format!("`{}`", key))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for lock operations.
pub type Result<T> = std::result::Result<T, LockError>;

// =============================================================================
// Lock Trait
// =============================================================================

/// An asynchronous lock.
#[async_trait]
pub trait Lock: Send + Sync {
    /// Acquire the lock, failing immediately if it is held by someone else.
    async fn acquire(&self) -> Result<()>;

    /// Release the lock.
    async fn release(&self) -> Result<()>;
}
