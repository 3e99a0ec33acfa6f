//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Config values are validated after parsing so that a bad file fails at
//! startup instead of on the first request.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Service configuration file.
///
/// # Example
///
/// ```toml
/// repos_root = "/var/lib/refkeep/repos"
/// tmp_dir = "/var/lib/refkeep/tmp"
///
/// [git]
/// executable = "/usr/bin/git"
/// push_env_prefix = "REFKEEP"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Directory holding the bare repositories (`<uid>.git`)
    pub repos_root: Option<PathBuf>,

    /// Directory in which disposable working copies are created
    pub tmp_dir: Option<PathBuf>,

    /// Git executable settings
    pub git: Option<GitSettings>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(root) = &self.repos_root {
            if root.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "repos_root cannot be empty".to_string(),
                ));
            }
        }

        if let Some(tmp) = &self.tmp_dir {
            if tmp.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "tmp_dir cannot be empty".to_string(),
                ));
            }
        }

        if let Some(git) = &self.git {
            git.validate()?;
        }

        Ok(())
    }
}

/// Settings for invoking the `git` executable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GitSettings {
    /// Path or name of the git executable
    pub executable: Option<String>,

    /// Prefix for environment variables handed to hooks on push
    pub push_env_prefix: Option<String>,
}

impl GitSettings {
    /// Validate the git settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(exe) = &self.executable {
            if exe.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "git executable cannot be empty".to_string(),
                ));
            }
        }

        if let Some(prefix) = &self.push_env_prefix {
            let valid = !prefix.is_empty()
                && prefix
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
            if !valid {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid push_env_prefix '{}', must match [A-Z0-9_]+",
                    prefix
                )));
            }
        }

        Ok(())
    }
}
