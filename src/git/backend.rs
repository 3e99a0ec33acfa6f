//! git::backend
//!
//! The Git Backend capability consumed by the service layer.
//!
//! # Design
//!
//! The trait is async because every operation touches the disk or a child
//! process. Operations that can run for a long time (walks, clones,
//! pushes, diffs) take a [`CancelToken`]; short object reads don't.
//!
//! Batched reads (`get_annotated_tags`, `get_commits`) return results in
//! the order of their input and fail as a whole if any object is missing.

use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use super::cancel::CancelToken;
use super::interface::GitError;
use super::types::{
    AnnotatedTag, CreateTagOptions, PushOptions, RawCommit, RepoInfo, WalkEntry, WalkOptions,
};
use crate::core::types::Oid;
use crate::walk::WalkInstructor;

/// Receives every walk entry its instructor marked `Handle`.
///
/// Returning an error ends the walk with that error.
pub type WalkHandler<'a> = dyn FnMut(WalkEntry) -> Result<(), GitError> + Send + 'a;

/// Repository operations needed by the service.
#[async_trait]
pub trait GitBackend: Send + Sync {
    /// Open the repository at `path`.
    async fn open_repository(&self, path: &Path) -> Result<RepoInfo, GitError>;

    /// Direct target of the reference at `ref_path`, following symbolic refs.
    async fn get_ref(&self, path: &Path, ref_path: &str) -> Result<Oid, GitError>;

    /// Walk the references matching `options`, in a single pass.
    ///
    /// `instructor` sees every entry; `handler` only those marked `Handle`.
    /// A `Stop` verdict ends the walk without draining the remainder.
    async fn walk_references(
        &self,
        path: &Path,
        options: &WalkOptions,
        instructor: &mut dyn WalkInstructor,
        handler: &mut WalkHandler<'_>,
        cancel: &CancelToken,
    ) -> Result<(), GitError>;

    /// Annotated tag objects for `shas`, in input order.
    async fn get_annotated_tags(
        &self,
        path: &Path,
        shas: &[Oid],
    ) -> Result<Vec<AnnotatedTag>, GitError>;

    /// The annotated tag object `refs/tags/<name>` points at.
    async fn get_annotated_tag(&self, path: &Path, name: &str) -> Result<AnnotatedTag, GitError>;

    /// Commits for `shas`, in input order.
    async fn get_commits(&self, path: &Path, shas: &[Oid]) -> Result<Vec<RawCommit>, GitError>;

    /// The commit `rev` (branch, tag or SHA) resolves to.
    async fn get_commit(&self, path: &Path, rev: &str) -> Result<RawCommit, GitError>;

    /// Create `refs/tags/<name>` at `target`; annotated iff the message is set.
    async fn create_tag(
        &self,
        path: &Path,
        name: &str,
        target: &Oid,
        options: &CreateTagOptions,
    ) -> Result<(), GitError>;

    /// Clone `origin` into the empty directory `dest`.
    ///
    /// `None` clones every branch; `Some(branch)` only that one.
    async fn clone_repository(
        &self,
        origin: &Path,
        dest: &Path,
        branch: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<(), GitError>;

    /// Push from the repository at `path`.
    async fn push(
        &self,
        path: &Path,
        options: &PushOptions,
        cancel: &CancelToken,
    ) -> Result<(), GitError>;

    /// Stream the unified diff between `base` and `head` into `sink`.
    ///
    /// With `merge_base`, diff against the merge base of the two instead.
    async fn raw_diff(
        &self,
        path: &Path,
        base: &str,
        head: &str,
        merge_base: bool,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        cancel: &CancelToken,
    ) -> Result<(), GitError>;
}
