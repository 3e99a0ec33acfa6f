//! git::interface
//!
//! Production Git backend and the error taxonomy shared by all backends.
//!
//! # Architecture
//!
//! [`Git`] answers object and reference reads through `git2` and shells out
//! to the `git` executable (see [`GitCommand`]) for everything libgit2
//! can't do or can't do cancellably: streaming reference walks, clones,
//! lease-guarded pushes and raw diffs.
//!
//! `git2` calls are blocking, so every one of them runs on the blocking
//! thread pool with owned arguments.
//!
//! # Error Handling
//!
//! Failures are categorized into typed variants:
//! - [`GitError::NotARepo`]: the path is not a repository
//! - [`GitError::RefNotFound`] / [`GitError::ObjectNotFound`]: missing target
//! - [`GitError::AlreadyExists`]: a tag or ref with that name exists
//! - [`GitError::StaleLease`]: a lease precondition did not hold on push
//! - [`GitError::Cancelled`]: the caller's cancel token fired
//!
//! # Example
//!
//! ```no_run
//! use refkeep::git::{Git, GitBackend};
//! use std::path::Path;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let git = Git::new("git");
//! let oid = git.get_ref(Path::new("/srv/repos/acme.git"), "refs/heads/main").await?;
//! println!("main is at {}", oid.short(7));
//! # Ok::<(), refkeep::git::GitError>(())
//! # });
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWrite;

use super::backend::{GitBackend, WalkHandler};
use super::cancel::CancelToken;
use super::command::GitCommand;
use super::types::{
    split_message, AnnotatedTag, CreateTagOptions, ObjectType, PushOptions, RawCommit,
    RawSignature, RepoInfo, WalkOptions,
};
use crate::core::config::Config;
use crate::core::refpath::TAG_PREFIX;
use crate::core::types::{Oid, TypeError};
use crate::walk::{WalkError, WalkInstructor};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The path is not a git repository.
    #[error("not a git repository: {}", path.display())]
    NotARepo { path: PathBuf },

    /// Requested ref or revision does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound { refname: String },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound { oid: String },

    /// A ref or tag with that name already exists.
    #[error("already exists: {name}")]
    AlreadyExists { name: String },

    /// The remote ref did not hold the value the lease expected.
    #[error("stale info, push rejected: {message}")]
    StaleLease { message: String },

    /// The remote refused the push for any other reason.
    #[error("push rejected: {message}")]
    Rejected { message: String },

    /// A walk instructor failed.
    #[error("reference walk failed: {0}")]
    Walk(#[from] WalkError),

    /// The caller's cancel token fired.
    #[error("operation cancelled")]
    Cancelled,

    /// The `git` executable exited unsuccessfully.
    #[error("git {command} failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// I/O failure talking to the filesystem or a child process.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid { oid: String },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal { message: String },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    pub(crate) fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::Exists => GitError::AlreadyExists {
                name: context.to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        GitError::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether the error means the addressed ref or object is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GitError::NotARepo { .. } | GitError::RefNotFound { .. } | GitError::ObjectNotFound { .. }
        )
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(oid) => GitError::InvalidOid { oid },
            other => GitError::Internal {
                message: other.to_string(),
            },
        }
    }
}

/// The production [`GitBackend`].
#[derive(Debug, Clone)]
pub struct Git {
    command: GitCommand,
}

impl Git {
    /// Create a backend running `executable` for CLI operations.
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            command: GitCommand::new(executable),
        }
    }

    /// Create a backend from the effective configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.git_executable())
    }

    /// The CLI runner used by this backend.
    pub fn command(&self) -> &GitCommand {
        &self.command
    }
}

fn open(path: &Path) -> Result<git2::Repository, GitError> {
    git2::Repository::open(path).map_err(|_| GitError::NotARepo {
        path: path.to_path_buf(),
    })
}

fn ensure_repo_dir(path: &Path) -> Result<(), GitError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(GitError::NotARepo {
            path: path.to_path_buf(),
        })
    }
}

fn to_git2_oid(oid: &Oid) -> Result<git2::Oid, GitError> {
    git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
}

fn raw_signature(sig: &git2::Signature<'_>) -> RawSignature {
    RawSignature {
        name: String::from_utf8_lossy(sig.name_bytes()).into_owned(),
        email: String::from_utf8_lossy(sig.email_bytes()).into_owned(),
        seconds: sig.when().seconds(),
        offset_minutes: sig.when().offset_minutes(),
    }
}

fn read_annotated_tag(tag: &git2::Tag<'_>) -> Result<AnnotatedTag, GitError> {
    let target_type =
        ObjectType::from_git2(tag.target_type()).ok_or_else(|| GitError::Internal {
            message: format!("tag {} has a target of unknown type", tag.id()),
        })?;
    let (title, message) = split_message(&String::from_utf8_lossy(
        tag.message_bytes().unwrap_or_default(),
    ));

    Ok(AnnotatedTag {
        sha: tag.id().into(),
        name: String::from_utf8_lossy(tag.name_bytes()).into_owned(),
        target_sha: tag.target_id().into(),
        target_type,
        title,
        message,
        tagger: tag.tagger().as_ref().map(raw_signature),
    })
}

fn read_commit(commit: &git2::Commit<'_>) -> RawCommit {
    let (title, message) = split_message(&String::from_utf8_lossy(commit.message_bytes()));
    RawCommit {
        sha: commit.id().into(),
        title,
        message,
        author: raw_signature(&commit.author()),
        committer: raw_signature(&commit.committer()),
        parent_shas: commit.parent_ids().map(Oid::from).collect(),
    }
}

async fn blocking<T, F>(f: F) -> Result<T, GitError>
where
    F: FnOnce() -> Result<T, GitError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| GitError::Internal {
            message: format!("blocking git task failed: {e}"),
        })?
}

#[async_trait]
impl GitBackend for Git {
    async fn open_repository(&self, path: &Path) -> Result<RepoInfo, GitError> {
        let path = path.to_path_buf();
        blocking(move || {
            let repo = open(&path)?;
            let is_empty = repo
                .is_empty()
                .map_err(|e| GitError::from_git2(e, "HEAD"))?;
            Ok(RepoInfo { path, is_empty })
        })
        .await
    }

    async fn get_ref(&self, path: &Path, ref_path: &str) -> Result<Oid, GitError> {
        let path = path.to_path_buf();
        let ref_path = ref_path.to_string();
        blocking(move || {
            let repo = open(&path)?;
            let reference = repo
                .find_reference(&ref_path)
                .and_then(|r| r.resolve())
                .map_err(|e| GitError::from_git2(e, &ref_path))?;
            let target = reference.target().ok_or_else(|| GitError::RefNotFound {
                refname: ref_path.clone(),
            })?;
            Ok(target.into())
        })
        .await
    }

    async fn walk_references(
        &self,
        path: &Path,
        options: &WalkOptions,
        instructor: &mut dyn WalkInstructor,
        handler: &mut WalkHandler<'_>,
        cancel: &CancelToken,
    ) -> Result<(), GitError> {
        ensure_repo_dir(path)?;
        self.command
            .for_each_ref(path, options, instructor, handler, cancel)
            .await
    }

    async fn get_annotated_tags(
        &self,
        path: &Path,
        shas: &[Oid],
    ) -> Result<Vec<AnnotatedTag>, GitError> {
        let path = path.to_path_buf();
        let shas = shas.to_vec();
        blocking(move || {
            let repo = open(&path)?;
            shas.iter()
                .map(|sha| {
                    let tag = repo
                        .find_tag(to_git2_oid(sha)?)
                        .map_err(|e| GitError::from_git2(e, sha.as_str()))?;
                    read_annotated_tag(&tag)
                })
                .collect()
        })
        .await
    }

    async fn get_annotated_tag(&self, path: &Path, name: &str) -> Result<AnnotatedTag, GitError> {
        let path = path.to_path_buf();
        let ref_path = format!("{TAG_PREFIX}{name}");
        blocking(move || {
            let repo = open(&path)?;
            let object = repo
                .revparse_single(&ref_path)
                .map_err(|e| GitError::from_git2(e, &ref_path))?;
            let tag = object.into_tag().map_err(|_| GitError::ObjectNotFound {
                oid: format!("{ref_path} is not an annotated tag"),
            })?;
            read_annotated_tag(&tag)
        })
        .await
    }

    async fn get_commits(&self, path: &Path, shas: &[Oid]) -> Result<Vec<RawCommit>, GitError> {
        let path = path.to_path_buf();
        let shas = shas.to_vec();
        blocking(move || {
            let repo = open(&path)?;
            shas.iter()
                .map(|sha| {
                    let commit = repo
                        .find_commit(to_git2_oid(sha)?)
                        .map_err(|e| GitError::from_git2(e, sha.as_str()))?;
                    Ok(read_commit(&commit))
                })
                .collect()
        })
        .await
    }

    async fn get_commit(&self, path: &Path, rev: &str) -> Result<RawCommit, GitError> {
        let path = path.to_path_buf();
        let rev = rev.to_string();
        blocking(move || {
            let repo = open(&path)?;
            let commit = repo
                .revparse_single(&rev)
                .and_then(|object| object.peel_to_commit())
                .map_err(|e| match e.code() {
                    // peeling a tree or blob to a commit is a type mismatch, not a miss
                    git2::ErrorCode::NotFound
                    | git2::ErrorCode::InvalidSpec
                    | git2::ErrorCode::Ambiguous
                    | git2::ErrorCode::Peel => GitError::ObjectNotFound { oid: rev.clone() },
                    _ => GitError::from_git2(e, &rev),
                })?;
            Ok(read_commit(&commit))
        })
        .await
    }

    async fn create_tag(
        &self,
        path: &Path,
        name: &str,
        target: &Oid,
        options: &CreateTagOptions,
    ) -> Result<(), GitError> {
        let path = path.to_path_buf();
        let name = name.to_string();
        let target = target.clone();
        let options = options.clone();
        blocking(move || {
            let repo = open(&path)?;
            let object = repo
                .find_object(to_git2_oid(&target)?, None)
                .map_err(|e| GitError::from_git2(e, target.as_str()))?;
            let ref_path = format!("{TAG_PREFIX}{name}");

            let created = if options.message.is_empty() {
                repo.tag_lightweight(&name, &object, false)
            } else {
                let tagger = &options.tagger;
                let when = git2::Time::new(tagger.seconds, tagger.offset_minutes);
                let signature = git2::Signature::new(&tagger.name, &tagger.email, &when)
                    .map_err(|e| GitError::from_git2(e, "tagger"))?;
                repo.tag(&name, &object, &signature, &options.message, false)
            };
            created.map_err(|e| GitError::from_git2(e, &ref_path))?;
            Ok(())
        })
        .await
    }

    async fn clone_repository(
        &self,
        origin: &Path,
        dest: &Path,
        branch: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<(), GitError> {
        ensure_repo_dir(origin)?;
        self.command.clone_shared(origin, dest, branch, cancel).await
    }

    async fn push(
        &self,
        path: &Path,
        options: &PushOptions,
        cancel: &CancelToken,
    ) -> Result<(), GitError> {
        self.command.push(path, options, cancel).await
    }

    async fn raw_diff(
        &self,
        path: &Path,
        base: &str,
        head: &str,
        merge_base: bool,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        cancel: &CancelToken,
    ) -> Result<(), GitError> {
        ensure_repo_dir(path)?;
        self.command
            .diff(path, base, head, merge_base, sink, cancel)
            .await
    }
}
