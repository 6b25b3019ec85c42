//! `~/.storyland/config.toml` handling.
//!
//! Settings resolve as built-in defaults, then the TOML file, then
//! environment variables, then command-line flags (applied in `main`).

mod overrides;
mod schema;

pub use overrides::{StoryOverrides, VoiceOverrides};

pub use schema::{
    CapConfig, ConfigIssue, ElevenLabsProviderConfig, IssueLevel, NarrationConfig,
    NarrationProvider, OpenAIProviderConfig, ProvidersConfig, StoryConfig, StorylandConfig,
};

use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Why a config file could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading or writing the file failed.
    #[error("config file I/O: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid for [`StorylandConfig`].
    #[error("config file is malformed: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// Defaults could not be rendered as TOML.
    #[error("cannot write config: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    /// A setting the chosen command needs is absent.
    #[error("missing required config: {0}")]
    MissingField(String),
    /// One or more settings are out of range.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Shorthand for config results.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// `~/.storyland`, or `./.storyland` without a home directory.
#[must_use]
pub fn default_config_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".storyland")
}

/// `config.toml` inside [`default_config_dir`].
#[must_use]
pub fn config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Reads `path`; a missing file yields the defaults.
///
/// # Errors
///
/// I/O failures and malformed TOML.
pub async fn load_config_from(path: &Path) -> ConfigResult<StorylandConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(StorylandConfig::default());
    }

    let content = tokio::fs::read_to_string(path).await?;
    let config: StorylandConfig = toml::from_str(&content)?;
    debug!(path = %path.display(), "config loaded");

    Ok(config)
}

/// Load the file at `path`, then layer environment variables on top.
///
/// Warnings from [`StorylandConfig::validate`] are logged.
///
/// # Errors
///
/// Anything [`load_config_from`] reports, and validation errors joined
/// into one [`ConfigError::InvalidValue`].
pub async fn resolve_config(path: &Path) -> ConfigResult<StorylandConfig> {
    let config = load_config_from(path).await?.with_env();

    let mut errors = Vec::new();
    for issue in config.validate() {
        match issue.level {
            IssueLevel::Error => errors.push(issue.to_string()),
            IssueLevel::Warning => tracing::warn!(path = %issue.path, "{}", issue.message),
        }
    }
    if !errors.is_empty() {
        return Err(ConfigError::InvalidValue(errors.join("; ")));
    }

    Ok(config)
}

/// Writes `config` as pretty TOML, creating parent directories.
///
/// # Errors
///
/// I/O or serialization failures.
pub async fn save_config_to(config: &StorylandConfig, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let content = toml::to_string_pretty(config)?;
    tokio::fs::write(path, content).await?;
    info!(path = %path.display(), "config written");

    Ok(())
}

/// Writes a starter config (with the narration cap spelled out) unless a
/// file exists and `force` is off. Returns whether anything was written.
///
/// # Errors
///
/// See [`save_config_to`].
pub async fn init_config(path: &Path, force: bool) -> ConfigResult<bool> {
    if path.exists() && !force {
        return Ok(false);
    }

    let mut config = StorylandConfig::default();
    config.story.cap = Some(CapConfig::default());
    save_config_to(&config, path).await?;
    info!(path = %path.display(), "starter config created");

    Ok(true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use assert_fs::TempDir;
    use assert_fs::prelude::*;

    use super::*;

    #[test]
    fn paths_live_under_dot_storyland() {
        assert!(default_config_dir().ends_with(".storyland"));
        assert!(config_path().ends_with(".storyland/config.toml"));
    }

    #[tokio::test]
    async fn missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_config_from(&temp.path().join("absent.toml")).await.unwrap();
        assert_eq!(config.story.model, "gpt-4o");
    }

    #[tokio::test]
    async fn save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        let mut config = StorylandConfig::default();
        config.story.model = "gpt-4".into();
        config.narration.provider = NarrationProvider::Google;
        save_config_to(&config, &path).await.unwrap();

        let loaded = load_config_from(&path).await.unwrap();
        assert_eq!(loaded.story.model, "gpt-4");
        assert_eq!(loaded.narration.provider, NarrationProvider::Google);
    }

    #[tokio::test]
    async fn init_writes_once_unless_forced() {
        let temp = TempDir::new().unwrap();
        let file = temp.child("config.toml");

        assert!(init_config(file.path(), false).await.unwrap());
        assert!(std::fs::read_to_string(file.path()).unwrap().contains("[story.cap]"));

        file.write_str("[story]\nmodel = \"custom\"\n").unwrap();
        assert!(!init_config(file.path(), false).await.unwrap());
        assert_eq!(load_config_from(file.path()).await.unwrap().story.model, "custom");

        assert!(init_config(file.path(), true).await.unwrap());
        assert_eq!(load_config_from(file.path()).await.unwrap().story.model, "gpt-4o");
    }

    #[tokio::test]
    async fn malformed_file_is_a_parse_error() {
        let temp = TempDir::new().unwrap();
        let file = temp.child("config.toml");
        file.write_str("[story\nmodel = ").unwrap();

        let err = load_config_from(file.path()).await.unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[tokio::test]
    async fn resolve_rejects_invalid_values() {
        let temp = TempDir::new().unwrap();
        let file = temp.child("config.toml");
        file.write_str("[story]\ntemperature = 3.0\n").unwrap();

        let err = resolve_config(file.path()).await.unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue(ref msg) if msg.contains("story.temperature"))
        );
    }

    #[tokio::test]
    async fn resolve_rejects_zero_cap() {
        let temp = TempDir::new().unwrap();
        let file = temp.child("config.toml");
        file.write_str("[story.cap]
max_minutes = 0
").unwrap();

        let err = resolve_config(file.path()).await.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref msg) if msg.contains("story.cap")));
    }
}
