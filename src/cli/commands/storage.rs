//! Storage subcommands.

use clap::{Args, Subcommand};

use crate::app::App;
use crate::cli::{GlobalArgs, OutputSink, Result};
use crate::storage::Key;

// =============================================================================
// Storage Subcommands
// =============================================================================

/// Storage subcommands.
#[derive(Subcommand, Debug)]
pub enum StorageCommand {
    /// List keys under a prefix.
    List(ListArgs),

    /// Print the value stored under a key.
    Cat(CatArgs),

    /// Delete a key, or every key under a prefix.
    Delete(DeleteArgs),
}

impl StorageCommand {
    /// Run the storage subcommand.
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        match self {
            StorageCommand::List(args) => args.run(app, global).await,
            StorageCommand::Cat(args) => args.run(app, global).await,
            StorageCommand::Delete(args) => args.run(app, global).await,
        }
    }
}

// =============================================================================
// List
// =============================================================================

/// Arguments for the list command.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Prefix to list; the whole storage when omitted.
    pub prefix: Option<String>,

    #[command(flatten)]
    pub output: OutputSink,
}

impl ListArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let prefix = Key::new(self.prefix.as_deref().unwrap_or(""));
        let keys: Vec<String> = app
            .storage()
            .list(&prefix)
            .await?
            .iter()
            .map(Key::string)
            .collect();

        if global.json {
            self.output.write_json(&keys).await?;
        } else if !keys.is_empty() {
            self.output.write_str(&keys.join("\n")).await?;
        }
        Ok(())
    }
}

// =============================================================================
// Cat
// =============================================================================

/// Arguments for the cat command.
#[derive(Args, Debug)]
pub struct CatArgs {
    /// Key to read.
    pub key: String,

    #[command(flatten)]
    pub output: OutputSink,
}

impl CatArgs {
    pub async fn run(self, app: &App, _global: &GlobalArgs) -> Result<()> {
        let content = app.storage().value(&Key::new(&self.key)).await?;
        let bytes = content.into_bytes().await?;
        self.output.write_bytes(&bytes).await?;
        Ok(())
    }
}

// =============================================================================
// Delete
// =============================================================================

/// Arguments for the delete command.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Key to delete.
    pub key: String,

    /// Delete every key under `key` instead.
    #[arg(short, long)]
    pub recursive: bool,
}

impl DeleteArgs {
    pub async fn run(self, app: &App, _global: &GlobalArgs) -> Result<()> {
        let key = Key::new(&self.key);
        if self.recursive {
            app.storage().delete_all(&key).await?;
        } else {
            app.storage().delete(&key).await?;
        }
        Ok(())
    }
}
