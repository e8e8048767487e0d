//! Configuration management for vista.
//!
//! Settings come from:
//! 1. Default values
//! 2. Config file (`~/.vista/config.toml`, or `--config` / `VISTA_CONFIG`)
//!
//! The API key is never read from or written to the config file.

mod schema;

pub use schema::{AppConfig, ProviderSection, ServerSection, UiSection};

use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    /// Invalid value.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
    /// Refused to overwrite an existing file.
    #[error("config file already exists: {0}")]
    AlreadyExists(PathBuf),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Get the default config directory path.
#[must_use]
pub fn default_config_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".vista")
}

/// Get the default config file path.
#[must_use]
pub fn config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Path to use: the explicit one if given, otherwise the default.
#[must_use]
pub fn resolve_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(config_path)
}

/// Load configuration from a specific path. A missing file yields defaults.
///
/// # Errors
///
/// Fails if the file exists but cannot be read, parsed or validated.
pub async fn load_config_from(path: &Path) -> ConfigResult<AppConfig> {
    if !path.exists() {
        info!(path = %path.display(), "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    let content = tokio::fs::read_to_string(path).await?;
    let config: AppConfig = toml::from_str(&content)?;
    config.validate()?;
    debug!(path = %path.display(), "loaded config file");

    Ok(config)
}

/// Save configuration to a specific path, creating parent directories.
///
/// # Errors
///
/// Fails if the directory or file cannot be written.
pub async fn save_config_to(config: &AppConfig, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let content = toml::to_string_pretty(config)?;
    tokio::fs::write(path, content).await?;
    info!(path = %path.display(), "saved config file");

    Ok(())
}

/// Write a default config file.
///
/// # Errors
///
/// Returns [`ConfigError::AlreadyExists`] if the file exists and `force` is
/// not set, or an I/O error if it cannot be written.
pub async fn init_config(path: &Path, force: bool) -> ConfigResult<AppConfig> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }

    let config = AppConfig::default();
    save_config_to(&config, path).await?;
    Ok(config)
}
