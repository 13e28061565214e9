//! Lock subcommands.
//!
//! Each invocation is a separate process, so a lock taken by `acquire` is
//! released by passing its printed id to `release`.

use clap::{Args, Subcommand};

use crate::app::App;
use crate::cli::{GlobalArgs, OutputSink, Result};
use crate::storage::Key;

/// Lock subcommands.
#[derive(Subcommand, Debug)]
pub enum LockCommand {
    /// Acquire a lock and print its id.
    Acquire(AcquireArgs),

    /// Release a lock by id.
    Release(ReleaseArgs),
}

impl LockCommand {
    /// Run the lock subcommand.
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        match self {
            LockCommand::Acquire(args) => args.run(app, global).await,
            LockCommand::Release(args) => args.run(app, global).await,
        }
    }
}

/// Arguments for the acquire command.
#[derive(Args, Debug)]
pub struct AcquireArgs {
    /// Key to lock.
    pub target: String,

    /// Proposal id; random when omitted.
    #[arg(long)]
    pub id: Option<String>,

    #[command(flatten)]
    pub output: OutputSink,
}

impl AcquireArgs {
    pub async fn run(self, app: &App, _global: &GlobalArgs) -> Result<()> {
        let id = self
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        app.lock(Key::new(&self.target), Some(id.clone()))?
            .acquire()
            .await?;
        self.output.write_str(&id).await?;
        Ok(())
    }
}

/// Arguments for the release command.
#[derive(Args, Debug)]
pub struct ReleaseArgs {
    /// Key that was locked.
    pub target: String,

    /// Id printed by `acquire`.
    #[arg(long)]
    pub id: String,
}

impl ReleaseArgs {
    pub async fn run(self, app: &App, _global: &GlobalArgs) -> Result<()> {
        app.lock(Key::new(&self.target), Some(self.id))?
            .release()
            .await?;
        Ok(())
    }
}
