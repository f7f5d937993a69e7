//! Configuration file support

use filediff_core::{DiffOptions, SessionOptions};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub diff: DiffOptions,
    pub session: SessionOptions,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Column width of each side in side-by-side output
    pub width: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { width: 60 }
    }
}

impl Config {
    /// Default config location (~/.config/filediff/config.toml on Linux)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("filediff").join("config.toml"))
    }

    /// Load from an explicit path, or from the default location if it exists
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.output.width, 60);
        assert!(config.diff.semantic_cleanup);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
            [diff]
            timeout_ms = 250
            semantic_cleanup = false

            [session]
            wrap = false
            "#,
        )
        .unwrap();

        assert_eq!(config.diff.timeout_ms, 250);
        assert!(!config.diff.semantic_cleanup);
        assert_eq!(config.diff.line_mode_threshold, DiffOptions::default().line_mode_threshold);
        assert!(!config.session.wrap);
        assert!(config.session.sync_scroll);
    }

    #[test]
    fn test_invalid_value_is_parse_error() {
        assert!(Config::parse("[diff]\ntimeout_ms = \"soon\"").is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/nonexistent/filediff.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
