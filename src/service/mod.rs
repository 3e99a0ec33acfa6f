//! service
//!
//! The ref, tag and diff operations of a hosted repository.
//!
//! # Architecture
//!
//! [`Service`] is the entry point. Each operation validates its parameters
//! before any I/O, resolves the repository location through
//! [`RepoPaths`], and delegates to a [`GitBackend`]:
//!
//! - [`Service::get_ref`] / [`Service::update_ref`] - lease-guarded ref CAS
//! - [`Service::list_commit_tags`] - paginated, query-able tag listing
//! - [`Service::create_commit_tag`] / [`Service::delete_tag`]
//! - [`Service::raw_diff`] - streamed unified diff
//!
//! Mutations never touch the origin directly: they are staged in a
//! disposable [`SharedRepo`](crate::git::SharedRepo) and pushed back.
//! Operations hold no process-wide lock and may run concurrently.

mod diff;
mod error;
mod mapping;
mod params;
mod refs;
mod tag;

pub use diff::RawDiffParams;
pub use error::{Error, ErrorKind};
pub use mapping::{Commit, CommitTag, Signature};
pub use params::{Identity, ReadParams, WriteParams};
pub use refs::{GetRefParams, UpdateRefParams};
pub use tag::{
    CreateCommitTagParams, DeleteTagParams, ListCommitTagsParams, TagSortOption,
};

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::config::Config;
use crate::core::paths::RepoPaths;
use crate::git::{Git, GitBackend, SharedRepo};

/// Ref, tag and diff operations over the repositories under one root.
#[derive(Clone)]
pub struct Service {
    backend: Arc<dyn GitBackend>,
    paths: RepoPaths,
    env_prefix: String,
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("paths", &self.paths)
            .field("env_prefix", &self.env_prefix)
            .finish_non_exhaustive()
    }
}

impl Service {
    pub fn new(backend: Arc<dyn GitBackend>, paths: RepoPaths, env_prefix: impl Into<String>) -> Self {
        Self {
            backend,
            paths,
            env_prefix: env_prefix.into(),
        }
    }

    /// A service using the production backend, as configured.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(Git::from_config(config)),
            RepoPaths::from_config(config),
            config.push_env_prefix(),
        )
    }

    pub fn paths(&self) -> &RepoPaths {
        &self.paths
    }

    fn repo_path(&self, repo_uid: &str) -> PathBuf {
        self.paths.repo_path(repo_uid)
    }

    fn shared_repo(&self, repo_uid: &str, origin: &std::path::Path) -> Result<SharedRepo, crate::git::GitError> {
        SharedRepo::new(self.backend.clone(), self.paths.tmp_dir(), repo_uid, origin)
    }
}
