//! Asynchronous key/value storage.
//!
//! Every cache, lock and registry component in this crate is written against
//! the [`Storage`] trait. Concrete engines:
//!
//! - [`MemoryStorage`] - in-process map, used by tests and the `memory` config
//! - [`FsStorage`] - one file per key below a base directory
//!
//! and decorators:
//!
//! - [`SubStorage`] - view of another storage below a key prefix
//! - [`LoggingStorage`] - logs every operation through `tracing`

mod content;
mod fs_storage;
mod key;
mod logging_storage;
mod memory_storage;
#[allow(clippy::module_inception)]
mod storage;
mod sub_storage;

pub use content::Content;
pub use fs_storage::FsStorage;
pub use key::{Key, DELIMITER};
pub use logging_storage::LoggingStorage;
pub use memory_storage::MemoryStorage;
pub use storage::{Meta, Result, Storage, StorageError};
pub use sub_storage::SubStorage;
