use std::io;

use thiserror::Error;

use super::types::Digest;
use crate::storage::StorageError;

/// Errors that can occur in registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid digest '{0}'")]
    InvalidDigest(String),

    #[error("invalid repository name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("invalid tag '{0}'")]
    InvalidTag(String),

    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("blob unknown: {0}")]
    BlobUnknown(Digest),

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: Digest, actual: Digest },

    /// The operation is not available on this repository, e.g. uploads
    /// through a cache-through repository.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
