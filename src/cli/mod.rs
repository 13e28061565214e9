//! Command-line interface for pcache.

pub mod args;
mod commands;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::app::{App, AppError};
use crate::lock::LockError;
use crate::registry::RegistryError;
use crate::storage::StorageError;

pub use args::{GlobalArgs, OutputSink};
pub use commands::fetch::FetchArgs;
pub use commands::lock::LockCommand;
pub use commands::registry::RegistryCommand;
pub use commands::storage::StorageCommand;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during CLI execution.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument processing error.
    #[error("{0}")]
    Args(#[from] args::ArgsError),

    /// App error.
    #[error("{0}")]
    App(#[from] AppError),

    /// Storage error.
    #[error("{0}")]
    Storage(#[from] StorageError),

    /// Lock error.
    #[error("{0}")]
    Lock(#[from] LockError),

    /// Registry error.
    #[error("{0}")]
    Registry(#[from] RegistryError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Nothing could be loaded for the given location.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

// =============================================================================
// CLI Definition
// =============================================================================

/// pcache - storage-backed proxy cache utility.
#[derive(Parser, Debug)]
#[command(name = "pcache", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch a URL through the cache.
    Fetch(FetchArgs),

    /// Storage operations.
    Storage {
        #[command(subcommand)]
        command: StorageCommand,
    },

    /// Storage lock operations.
    Lock {
        #[command(subcommand)]
        command: LockCommand,
    },

    /// Registry operations.
    Registry {
        #[command(subcommand)]
        command: RegistryCommand,
    },
}

// =============================================================================
// CLI Execution
// =============================================================================

impl Cli {
    /// Parse command-line arguments and return the CLI instance.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let app = App::new(self.global.to_app_context())?;

        match self.command {
            Command::Fetch(args) => args.run(&app, &self.global).await,
            Command::Storage { command } => command.run(&app, &self.global).await,
            Command::Lock { command } => command.run(&app, &self.global).await,
            Command::Registry { command } => command.run(&app, &self.global).await,
        }
    }
}

/// Main entry point for the CLI.
pub async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli.run().await
}
