//! core::paths
//!
//! Centralized path routing for repository storage locations.
//!
//! # Storage Layout
//!
//! - `<repos_root>/<uid>.git` - bare repository for repo uid `<uid>`
//! - `<tmp_dir>/` - parent of the disposable working copies
//!
//! **Hard rule:** no code outside this module joins a repo uid onto a
//! directory. All repository paths must go through `RepoPaths`.
//!
//! # Example
//!
//! ```
//! use refkeep::core::paths::RepoPaths;
//! use std::path::PathBuf;
//!
//! let paths = RepoPaths::new(PathBuf::from("/srv/repos"), PathBuf::from("/srv/tmp"));
//! assert_eq!(paths.repo_path("acme"), PathBuf::from("/srv/repos/acme.git"));
//! ```

use std::path::{Path, PathBuf};

use crate::core::config::Config;

/// Suffix of every bare repository directory.
const GIT_REPO_SUFFIX: &str = "git";

/// Centralized path routing for repositories and working copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPaths {
    /// Directory holding all bare repositories.
    pub repos_root: PathBuf,
    /// Directory under which working copies are created.
    pub tmp_dir: PathBuf,
}

impl RepoPaths {
    /// Create a new `RepoPaths`.
    pub fn new(repos_root: PathBuf, tmp_dir: PathBuf) -> Self {
        Self {
            repos_root,
            tmp_dir,
        }
    }

    /// Derive paths from the effective configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.repos_root(), config.tmp_dir())
    }

    /// Full path of the bare repository for `repo_uid`.
    pub fn repo_path(&self, repo_uid: &str) -> PathBuf {
        self.repos_root
            .join(format!("{}.{}", repo_uid, GIT_REPO_SUFFIX))
    }

    /// Parent directory for working copies.
    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_dir
    }
}
