//! Registry subcommands, reading the registry kept in the configured storage.

use clap::{Args, Subcommand};

use crate::app::App;
use crate::cli::{GlobalArgs, OutputSink, Result};
use crate::registry::{Docker, RepoName, Tag};

const DEFAULT_LIMIT: usize = 100;

/// Registry subcommands.
#[derive(Subcommand, Debug)]
pub enum RegistryCommand {
    /// List repository names.
    Catalog(CatalogArgs),

    /// List the tags of a repository.
    Tags(TagsArgs),
}

impl RegistryCommand {
    /// Run the registry subcommand.
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        match self {
            RegistryCommand::Catalog(args) => args.run(app, global).await,
            RegistryCommand::Tags(args) => args.run(app, global).await,
        }
    }
}

/// Arguments for the catalog command.
#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Only list names after this one.
    #[arg(long)]
    pub from: Option<String>,

    /// Maximum number of names.
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,

    #[command(flatten)]
    pub output: OutputSink,
}

impl CatalogArgs {
    pub async fn run(self, app: &App, _global: &GlobalArgs) -> Result<()> {
        let from = self.from.map(RepoName::new).transpose()?;
        let catalog = app.registry().catalog(from.as_ref(), self.limit).await?;
        self.output.write_str(&catalog.to_json()?).await?;
        Ok(())
    }
}

/// Arguments for the tags command.
#[derive(Args, Debug)]
pub struct TagsArgs {
    /// Repository name.
    pub name: String,

    /// Only list tags after this one.
    #[arg(long)]
    pub from: Option<String>,

    /// Maximum number of tags.
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,

    #[command(flatten)]
    pub output: OutputSink,
}

impl TagsArgs {
    pub async fn run(self, app: &App, _global: &GlobalArgs) -> Result<()> {
        let name = RepoName::new(self.name)?;
        let from = self.from.map(Tag::new).transpose()?;
        let tags = app
            .registry()
            .repo(&name)
            .manifests()
            .tags(from.as_ref(), self.limit)
            .await?;
        self.output.write_str(&tags.to_json()?).await?;
        Ok(())
    }
}
