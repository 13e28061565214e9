//! Arguments shared by every pcache command.

use std::path::PathBuf;

use clap::Args;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::app::AppContext;
use crate::config::ConfigSource;

// =============================================================================
// Error Types
// =============================================================================

/// Errors from writing command output.
#[derive(Debug, Error)]
pub enum ArgsError {
    /// Writing to stdout or the output file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The value could not be rendered as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output helpers.
pub type Result<T> = std::result::Result<T, ArgsError>;

// =============================================================================
// Global Arguments
// =============================================================================

/// Configuration flags accepted before or after any subcommand.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Base INI config file, replacing the PCACHE_CONFIG_FILE lookup.
    #[arg(long = "config-file", global = true)]
    pub config_file: Option<PathBuf>,

    /// INI file layered over the base config.
    #[arg(long = "config-file-overrides", global = true)]
    pub config_file_overrides: Option<PathBuf>,

    /// Single setting such as `--config lock.retry=true`; repeatable.
    #[arg(long = "config", value_parser = parse_config_override, global = true)]
    pub config_overrides: Vec<(String, String)>,

    /// Print listings as JSON arrays.
    #[arg(long, global = true)]
    pub json: bool,
}

impl GlobalArgs {
    /// The config layers named by these flags.
    pub fn to_config_source(&self) -> ConfigSource {
        ConfigSource {
            config_file: self.config_file.clone(),
            override_file: self.config_file_overrides.clone(),
            overrides: self.config_overrides.clone(),
        }
    }

    pub fn to_app_context(&self) -> AppContext {
        AppContext {
            config_source: self.to_config_source(),
        }
    }
}

/// Split `section.param=value` at the first `=`.
fn parse_config_override(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid config override '{}': expected name=value", s))?;
    Ok((name.to_string(), value.to_string()))
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Destination for a command's output: stdout unless `-o` is given.
#[derive(Args, Debug, Default)]
pub struct OutputSink {
    /// File to write instead of stdout.
    #[arg(id = "output_file", short = 'o', long = "output")]
    pub file: Option<PathBuf>,
}

impl OutputSink {
    /// Write `value` followed by a newline.
    pub async fn write_str(&self, value: &str) -> Result<()> {
        let mut line = String::with_capacity(value.len() + 1);
        line.push_str(value);
        line.push('\n');
        self.write_bytes(line.as_bytes()).await
    }

    /// Write `value` as pretty-printed JSON.
    pub async fn write_json<T: serde::Serialize>(&self, value: &T) -> Result<()> {
        self.write_str(&serde_json::to_string_pretty(value)?).await
    }

    /// Write `data` unchanged.
    pub async fn write_bytes(&self, data: &[u8]) -> Result<()> {
        if let Some(path) = &self.file {
            tokio::fs::write(path, data).await?;
            return Ok(());
        }
        let mut stdout = tokio::io::stdout();
        stdout.write_all(data).await?;
        stdout.flush().await?;
        Ok(())
    }
}
