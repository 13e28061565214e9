//! Mutual exclusion built from storage operations.
//!
//! A [`StorageLock`] claims a target key by writing a proposal record under
//! `.artipie-locks/<target>/<id>` and checking that no other live proposal
//! exists. [`RetryLock`] retries any [`Lock`] with a short backoff, and
//! [`exclusively`] runs a closure between acquire and release.

mod exclusively;
#[allow(clippy::module_inception)]
mod lock;
mod proposals;
mod retry_lock;
mod storage_lock;

pub use exclusively::exclusively;
pub use lock::{Lock, LockError, Result};
pub use proposals::LOCKS_ROOT;
pub use retry_lock::RetryLock;
pub use storage_lock::StorageLock;
