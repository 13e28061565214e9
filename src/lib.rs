//! proxy-cache-rs - storage abstraction, read-through caches, storage-backed
//! locks and a caching Docker registry proxy.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod lock;
pub mod registry;
pub mod storage;
pub mod util;

pub use storage::{Content, Key, Storage, StorageError};
