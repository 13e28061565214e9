//! CLI subcommand implementations.

pub mod fetch;
pub mod lock;
pub mod registry;
pub mod storage;
