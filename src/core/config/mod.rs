//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order, first hit wins:
//! 1. An explicit path passed by the caller (e.g. `--config`)
//! 2. `$REFKEEP_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/refkeep/config.toml`
//! 4. `~/.refkeep/config.toml`
//!
//! A missing file is not an error; defaults are used.
//!
//! # Example
//!
//! ```no_run
//! use refkeep::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("repositories live in {}", config.repos_root().display());
//! ```

pub mod schema;

pub use schema::{FileConfig, GitSettings};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Effective configuration with defaults applied through accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Values read from the config file
    pub file: FileConfig,
    /// Path the file was loaded from (if any)
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Build a configuration for the given directories.
    ///
    /// Used by embedders and tests that don't go through a config file.
    pub fn with_dirs(repos_root: impl Into<PathBuf>, tmp_dir: impl Into<PathBuf>) -> Self {
        Self {
            file: FileConfig {
                repos_root: Some(repos_root.into()),
                tmp_dir: Some(tmp_dir.into()),
                git: None,
            },
            loaded_from: None,
        }
    }

    /// Load configuration from `explicit` or the default locations.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NotFound`] if `explicit` is given but doesn't exist
    /// - [`ConfigError::ParseError`] / [`ConfigError::InvalidValue`] for bad files
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(),
        };

        let file = match &path {
            Some(path) => Self::read_config(path)?,
            None => FileConfig::default(),
        };
        file.validate()?;

        Ok(Self {
            file,
            loaded_from: path,
        })
    }

    /// Find the first existing config file in the standard locations.
    fn discover() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("REFKEEP_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("refkeep/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".refkeep/config.toml"))
            .filter(|path| path.exists())
    }

    fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Directory holding the bare repositories.
    ///
    /// Defaults to `~/.refkeep/repos`, or `./repos` without a home directory.
    pub fn repos_root(&self) -> PathBuf {
        self.file.repos_root.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .map(|home| home.join(".refkeep/repos"))
                .unwrap_or_else(|| PathBuf::from("repos"))
        })
    }

    /// Directory for disposable working copies.
    ///
    /// Defaults to `<system temp>/refkeep`.
    pub fn tmp_dir(&self) -> PathBuf {
        self.file
            .tmp_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("refkeep"))
    }

    /// The git executable.
    ///
    /// Defaults to `git` (resolved through `PATH`).
    pub fn git_executable(&self) -> &str {
        self.file
            .git
            .as_ref()
            .and_then(|g| g.executable.as_deref())
            .unwrap_or("git")
    }

    /// Prefix of the environment variables handed to hooks on push.
    ///
    /// Defaults to `REFKEEP`.
    pub fn push_env_prefix(&self) -> &str {
        self.file
            .git
            .as_ref()
            .and_then(|g| g.push_env_prefix.as_deref())
            .unwrap_or("REFKEEP")
    }

    /// Path of the loaded config file, if any.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}
