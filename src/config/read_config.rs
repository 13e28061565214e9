//! Reading the INI configuration and its override layers.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use configparser::ini::Ini;
use thiserror::Error;

use super::{CacheConfig, CachePolicy, Config, LockConfig, StorageConfig, StorageType};

// =============================================================================
// Constants - Default Values
// =============================================================================

const DEFAULT_STORAGE_PATH: &str = "/tmp/pcache-storage";
const DEFAULT_LOCK_RETRY: bool = false;

const ENV_CONFIG_FILE: &str = "PCACHE_CONFIG_FILE";
const DEFAULT_CONFIG_FILENAME: &str = ".pcacheconfig";

/// Every `(section, key)` a config file may set.
const KEYS: [(&str, &str); 5] = [
    ("storage", "type"),
    ("storage", "path"),
    ("cache", "policy"),
    ("lock", "expiration"),
    ("lock", "retry"),
];

// =============================================================================
// Error Types
// =============================================================================

/// Errors from locating or interpreting configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid integer '{value}': {source}")]
    InvalidInteger {
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("invalid boolean '{value}' for key '{key}'")]
    InvalidBoolean { key: String, value: String },

    #[error("invalid value '{value}' for key '{key}': expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("invalid override key '{key}': {message}")]
    InvalidOverrideKey { key: String, message: String },
}

/// Result type for configuration reading.
pub type Result<T> = std::result::Result<T, ConfigError>;

// =============================================================================
// ConfigSource
// =============================================================================

/// Where configuration comes from, lowest precedence first.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    /// Base config file; must exist when given. Without it
    /// `PCACHE_CONFIG_FILE` and then `~/.pcacheconfig` are tried.
    pub config_file: Option<PathBuf>,

    /// File whose values replace those of the base file; must exist when given.
    pub override_file: Option<PathBuf>,

    /// `section.param` / value pairs such as `("lock.expiration", "30")`.
    pub overrides: Vec<(String, String)>,
}

// =============================================================================
// Value Parsing
// =============================================================================

fn parse_bool_value(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidBoolean {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_storage_type(key: &str, value: &str) -> Result<StorageType> {
    match value.to_lowercase().as_str() {
        "fs" => Ok(StorageType::Fs),
        "memory" => Ok(StorageType::Memory),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            expected: "fs or memory",
        }),
    }
}

fn parse_cache_policy(key: &str, value: &str) -> Result<CachePolicy> {
    match value.to_lowercase().as_str() {
        "storage-first" => Ok(CachePolicy::StorageFirst),
        "remote-first" => Ok(CachePolicy::RemoteFirst),
        "none" => Ok(CachePolicy::None),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            expected: "storage-first, remote-first or none",
        }),
    }
}

/// Parse a lease in whole seconds, or "none" for no expiration.
fn parse_expiration(value: &str) -> Result<Option<Duration>> {
    if value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let seconds: u64 = value.trim().parse().map_err(|e| ConfigError::InvalidInteger {
        value: value.to_string(),
        source: e,
    })?;
    Ok(Some(Duration::from_secs(seconds)))
}

// =============================================================================
// Config File Resolution
// =============================================================================

/// The base config file chosen for a [`ConfigSource`].
#[derive(Debug, Default)]
pub struct ResolvedConfigFile {
    pub path: Option<PathBuf>,
    /// Set when `PCACHE_CONFIG_FILE` names a file that is missing.
    pub warning: Option<String>,
}

impl ResolvedConfigFile {
    fn found(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            warning: None,
        }
    }
}

/// Pick the base config file: the explicit path, then the environment
/// variable, then the file in the home directory.
fn resolve_config_file(source: &ConfigSource) -> Result<ResolvedConfigFile> {
    if let Some(path) = &source.config_file {
        return match path.exists() {
            true => Ok(ResolvedConfigFile::found(path.clone())),
            false => Err(ConfigError::FileNotFound(path.clone())),
        };
    }

    if let Some(env_path) = env::var_os(ENV_CONFIG_FILE).map(PathBuf::from) {
        if env_path.exists() {
            return Ok(ResolvedConfigFile::found(env_path));
        }
        return Ok(ResolvedConfigFile {
            path: None,
            warning: Some(format!(
                "{} points to a missing file, using defaults: {}",
                ENV_CONFIG_FILE,
                env_path.display()
            )),
        });
    }

    Ok(env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(DEFAULT_CONFIG_FILENAME))
        .filter(|path| path.exists())
        .map(ResolvedConfigFile::found)
        .unwrap_or_default())
}

// =============================================================================
// Default Config
// =============================================================================

/// Built-in values used when nothing overrides them.
fn default_config() -> Config {
    Config {
        storage: StorageConfig {
            storage_type: StorageType::Fs,
            path: PathBuf::from(DEFAULT_STORAGE_PATH),
        },
        cache: CacheConfig {
            policy: CachePolicy::StorageFirst,
        },
        lock: LockConfig {
            expiration: None,
            retry: DEFAULT_LOCK_RETRY,
        },
    }
}

// =============================================================================
// Applying Values
// =============================================================================

/// Set one `section.param` value on the config.
fn apply_value(config: &mut Config, section: &str, param: &str, value: &str) -> Result<()> {
    let key = format!("{}.{}", section, param);
    match (section, param) {
        ("storage", "type") => config.storage.storage_type = parse_storage_type(&key, value)?,
        ("storage", "path") => config.storage.path = PathBuf::from(value),
        ("cache", "policy") => config.cache.policy = parse_cache_policy(&key, value)?,
        ("lock", "expiration") => config.lock.expiration = parse_expiration(value)?,
        ("lock", "retry") => config.lock.retry = parse_bool_value(&key, value)?,
        _ => {
            return Err(ConfigError::InvalidOverrideKey {
                key,
                message: "unknown parameter".to_string(),
            })
        }
    }
    Ok(())
}

/// Copy every recognised key present in `ini` onto `config`.
fn apply_ini_to_config(config: &mut Config, ini: &Ini) -> Result<()> {
    for (section, param) in KEYS {
        if let Some(value) = ini.get(section, param) {
            apply_value(config, section, param, &value)?;
        }
    }
    Ok(())
}

fn load_ini(path: &Path) -> Result<Ini> {
    let mut ini = Ini::new();
    ini.load(path).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e,
    })?;
    Ok(ini)
}

/// Apply one `section.param=value` override.
fn apply_override(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key.split_once('.') {
        Some((section, param)) => apply_value(config, section, param, value),
        None => Err(ConfigError::InvalidOverrideKey {
            key: key.to_string(),
            message: "expected section.param".to_string(),
        }),
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

/// A loaded configuration plus anything worth telling the user about it.
#[derive(Debug)]
pub struct ConfigResult {
    pub config: Config,
    pub warnings: Vec<String>,
}

/// Build the configuration: defaults, then the base file, then the override
/// file, then individual overrides.
pub fn read_config(source: &ConfigSource) -> Result<ConfigResult> {
    let mut config = default_config();

    let resolved = resolve_config_file(source)?;
    let files = resolved.path.iter().chain(source.override_file.iter());
    for path in files {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.clone()));
        }
        apply_ini_to_config(&mut config, &load_ini(path)?)?;
    }

    for (key, value) in &source.overrides {
        apply_override(&mut config, key, value)?;
    }

    Ok(ConfigResult {
        config,
        warnings: resolved.warning.into_iter().collect(),
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = default_config();
        assert_eq!(config.storage.storage_type, StorageType::Fs);
        assert_eq!(config.storage.path, PathBuf::from("/tmp/pcache-storage"));
        assert_eq!(config.cache.policy, CachePolicy::StorageFirst);
        assert_eq!(config.lock.expiration, None);
        assert!(!config.lock.retry);
    }

    #[test]
    fn test_apply_override() {
        let mut config = default_config();
        apply_override(&mut config, "storage.type", "memory").unwrap();
        apply_override(&mut config, "cache.policy", "remote-first").unwrap();
        apply_override(&mut config, "lock.expiration", "30").unwrap();
        apply_override(&mut config, "lock.retry", "yes").unwrap();

        assert_eq!(config.storage.storage_type, StorageType::Memory);
        assert_eq!(config.cache.policy, CachePolicy::RemoteFirst);
        assert_eq!(config.lock.expiration, Some(Duration::from_secs(30)));
        assert!(config.lock.retry);

        apply_override(&mut config, "lock.expiration", "none").unwrap();
        assert_eq!(config.lock.expiration, None);
    }

    #[test]
    fn test_apply_override_errors() {
        let mut config = default_config();
        assert!(matches!(
            apply_override(&mut config, "storage", "fs"),
            Err(ConfigError::InvalidOverrideKey { .. })
        ));
        assert!(matches!(
            apply_override(&mut config, "storage.colour", "blue"),
            Err(ConfigError::InvalidOverrideKey { .. })
        ));
        assert!(matches!(
            apply_override(&mut config, "storage.type", "s3"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            apply_override(&mut config, "lock.retry", "maybe"),
            Err(ConfigError::InvalidBoolean { .. })
        ));
        assert!(matches!(
            apply_override(&mut config, "lock.expiration", "soon"),
            Err(ConfigError::InvalidInteger { .. })
        ));
    }

    #[test]
    fn test_parse_ini_config() {
        let mut ini = Ini::new();
        ini.read(
            r#"
[storage]
type = memory
path = /custom/storage

[cache]
policy = none

[lock]
expiration = 60
retry = true
"#
            .to_string(),
        )
        .unwrap();

        let mut config = default_config();
        apply_ini_to_config(&mut config, &ini).unwrap();

        assert_eq!(config.storage.storage_type, StorageType::Memory);
        assert_eq!(config.storage.path, PathBuf::from("/custom/storage"));
        assert_eq!(config.cache.policy, CachePolicy::None);
        assert_eq!(config.lock.expiration, Some(Duration::from_secs(60)));
        assert!(config.lock.retry);
    }

    #[test]
    fn test_read_config_layers() {
        let mut base = tempfile::NamedTempFile::new().unwrap();
        writeln!(base, "[storage]\npath = /base\n[cache]\npolicy = remote-first").unwrap();
        let mut overrides = tempfile::NamedTempFile::new().unwrap();
        writeln!(overrides, "[storage]\npath = /override").unwrap();

        let result = read_config(&ConfigSource {
            config_file: Some(base.path().to_path_buf()),
            override_file: Some(overrides.path().to_path_buf()),
            overrides: vec![("lock.retry".to_string(), "true".to_string())],
        })
        .unwrap();

        assert_eq!(result.config.storage.path, PathBuf::from("/override"));
        assert_eq!(result.config.cache.policy, CachePolicy::RemoteFirst);
        assert!(result.config.lock.retry);
    }

    #[test]
    fn test_read_config_missing_explicit_file() {
        let source = ConfigSource {
            config_file: Some(PathBuf::from("/nonexistent/pcacheconfig")),
            ..Default::default()
        };
        assert!(matches!(
            read_config(&source),
            Err(ConfigError::FileNotFound(_))
        ));
    }
}
