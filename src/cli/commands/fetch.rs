//! The fetch command: load a URL through the configured cache.

use clap::Args;

use crate::app::App;
use crate::cli::{CliError, GlobalArgs, OutputSink, Result};
use crate::registry::Digest;
use crate::storage::Key;

/// Arguments for the fetch command.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// URL of the item upstream.
    pub url: String,

    /// Storage key the item is cached under.
    #[arg(long)]
    pub key: String,

    /// Expected digest of the item (`sha256:<hex>`); a stored copy that does
    /// not match is fetched again.
    #[arg(long)]
    pub digest: Option<String>,

    #[command(flatten)]
    pub output: OutputSink,
}

impl FetchArgs {
    pub async fn run(self, app: &App, _global: &GlobalArgs) -> Result<()> {
        let key = Key::new(&self.key);
        let digest = self
            .digest
            .as_deref()
            .map(str::parse::<Digest>)
            .transpose()?;

        let content = app
            .fetch(&self.url, &key, digest.as_ref())
            .await?
            .ok_or_else(|| CliError::NotFound(self.url.clone()))?;

        let bytes = content.into_bytes().await?;
        self.output.write_bytes(&bytes).await?;
        Ok(())
    }
}
