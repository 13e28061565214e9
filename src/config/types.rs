//! Configuration types for pcache.
//!
//! This module defines the structures used to represent application configuration
//! as parsed from an INI-format config file.

use std::path::PathBuf;
use std::time::Duration;

// =============================================================================
// Config Sections
// =============================================================================

/// Which storage engine backs the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// Files under a base directory.
    Fs,
    /// Process memory; contents are lost on exit.
    Memory,
}

/// [storage] section - where cached content and lock proposals live.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub storage_type: StorageType,
    pub path: PathBuf,
}

/// How `fetch` combines the storage with the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Serve a valid stored copy, fetch only on a miss.
    StorageFirst,
    /// Always fetch, fall back to the stored copy when the remote fails.
    RemoteFirst,
    /// Never store anything.
    None,
}

/// [cache] section.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub policy: CachePolicy,
}

/// [lock] section.
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// Lease after which a proposal stops blocking others; `None` never expires.
    pub expiration: Option<Duration>,
    /// Retry acquisition and release with backoff.
    pub retry: bool,
}

// =============================================================================
// Top-Level Config
// =============================================================================

/// Complete application configuration as parsed from config file.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub lock: LockConfig,
}
