//! Cache-through loading.
//!
//! A [`Cache`] serves an item from a backing [`Storage`](crate::storage::Storage)
//! when it can and populates it from a [`Remote`] otherwise:
//!
//! - [`FromStorageCache`] - validate the stored copy, refetch when stale
//! - [`FromRemoteCache`] - always refetch, fall back to the stored copy
//! - [`NoCache`] - pass the remote straight through
//!
//! Freshness is decided by a [`CacheControl`]: [`Standard::Never`],
//! [`Standard::Always`], [`DigestVerification`], or a conjunction [`All`].

#[allow(clippy::module_inception)]
mod cache;
mod control;
mod from_remote_cache;
mod from_storage_cache;
mod http_remote;
pub mod remote;

pub use cache::{Cache, CacheError, NoCache, Result};
pub use control::{All, CacheControl, DigestVerification, Standard};
pub use from_remote_cache::FromRemoteCache;
pub use from_storage_cache::FromStorageCache;
pub use http_remote::HttpRemote;
pub use remote::{Remote, RemoteError, RemoteResult, StoredValue};
