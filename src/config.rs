//! Configuration for apidoc
//!
//! Read from `apidoc.toml` in the working directory, or from an explicit
//! `--config` path. Every key is optional.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "apidoc.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Markdown rendering options
    #[serde(default)]
    pub render: RenderConfig,
}

/// Options for the Markdown renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// chrono strftime format of the generation timestamp
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,

    /// Stamp UTC instead of local time
    #[serde(default)]
    pub utc: bool,

    /// Prefix of the document title
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_timestamp_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}

fn default_title() -> String {
    "API Documentation".to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            timestamp_format: default_timestamp_format(),
            utc: false,
            title: default_title(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit path
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `apidoc.toml` from a directory or return defaults
    pub fn load_or_default(dir: &Path) -> Result<Self, ConfigError> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            tracing::debug!("Loading config from {:?}", config_path);
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the config for a run: explicit path if given, else the
    /// working directory's `apidoc.toml`, else defaults
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => Self::load_or_default(dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.render.timestamp_format, "%Y-%m-%d %H:%M:%S");
        assert_eq!(config.render.title, "API Documentation");
        assert!(!config.render.utc);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str("[render]\nutc = true\n").unwrap();
        assert!(config.render.utc);
        assert_eq!(config.render.title, "API Documentation");
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[render]\ntitle = \"Reference\"\ntimestamp_format = \"%Y\"\n",
        )
        .unwrap();

        let config = Config::load_or_default(dir.path()).unwrap();
        assert_eq!(config.render.title, "Reference");
        assert_eq!(config.render.timestamp_format, "%Y");
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Config::resolve(Some(missing.as_path()), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[render\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }
}
