//! Error types shared by the extraction and rendering stages

use std::path::PathBuf;
use thiserror::Error;

/// Reasons an extraction can fail
///
/// The `Display` text of each variant is what ends up in the `error`
/// field of an error record, so callers can only branch on its prefix.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Carries the lowercased suffix including its leading dot, or an
    /// empty string when the path has no extension.
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load grammar: {0}")]
    Grammar(String),
}

/// Reasons rendering can fail
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot render an error record: {0}")]
    ErrorRecord(String),

    #[error("invalid timestamp format: {0:?}")]
    TimestampFormat(String),
}

/// Reasons loading a configuration file can fail
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_messages() {
        assert_eq!(
            ExtractError::UnsupportedFileType(".txt".to_string()).to_string(),
            "unsupported file type: .txt"
        );
        assert_eq!(
            ExtractError::FileNotFound("missing.py".to_string()).to_string(),
            "file not found: missing.py"
        );
        assert!(ExtractError::Syntax("invalid syntax (line 1, column 1)".to_string())
            .to_string()
            .starts_with("syntax error: "));
    }
}
