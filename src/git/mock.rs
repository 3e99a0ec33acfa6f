//! git::mock
//!
//! In-memory Git backend for deterministic testing.
//!
//! # Design
//!
//! The mock keeps a single ref namespace shared by every path, so a working
//! copy and its origin see the same refs. Walks replay a configured list of
//! entries through the caller's instructor; pushes apply their refspec and
//! honor leases against the stored refs. Every call is recorded, and any
//! operation can be made to fail.
//!
//! # Example
//!
//! ```
//! use refkeep::core::types::Oid;
//! use refkeep::git::mock::MockBackend;
//! use refkeep::git::GitBackend;
//! use std::path::Path;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let sha = Oid::new("a".repeat(40)).unwrap();
//! let mock = MockBackend::new().with_ref("refs/heads/main", sha.clone());
//!
//! let found = mock.get_ref(Path::new("/repos/acme.git"), "refs/heads/main").await.unwrap();
//! assert_eq!(found, sha);
//! assert_eq!(mock.operations().len(), 1);
//! # });
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::backend::{GitBackend, WalkHandler};
use super::cancel::CancelToken;
use super::interface::GitError;
use super::types::{
    split_message, AnnotatedTag, CreateTagOptions, ObjectType, PushOptions, RawCommit,
    RepoInfo, WalkEntry, WalkInstruction, WalkOptions,
};
use crate::core::refpath::TAG_PREFIX;
use crate::core::types::Oid;
use crate::walk::WalkInstructor;

/// Mock backend for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    inner: Arc<Mutex<MockBackendInner>>,
}

#[derive(Debug, Default)]
struct MockBackendInner {
    refs: BTreeMap<String, Oid>,
    walk_entries: Vec<WalkEntry>,
    annotated_tags: HashMap<Oid, AnnotatedTag>,
    commits: HashMap<Oid, RawCommit>,
    diff: Vec<u8>,
    is_empty: bool,
    fail_on: Option<(MockOp, fn() -> GitError)>,
    operations: Vec<MockOperation>,
}

/// Operation kinds, used to select which call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOp {
    OpenRepository,
    GetRef,
    WalkReferences,
    GetAnnotatedTags,
    GetAnnotatedTag,
    GetCommits,
    GetCommit,
    CreateTag,
    CloneRepository,
    Push,
    RawDiff,
}

/// Recorded operation for test verification.
#[derive(Debug, Clone)]
pub enum MockOperation {
    OpenRepository {
        path: PathBuf,
    },
    GetRef {
        path: PathBuf,
        ref_path: String,
    },
    WalkReferences {
        path: PathBuf,
        options: WalkOptions,
    },
    GetAnnotatedTags {
        shas: Vec<Oid>,
    },
    GetAnnotatedTag {
        name: String,
    },
    GetCommits {
        shas: Vec<Oid>,
    },
    GetCommit {
        rev: String,
    },
    CreateTag {
        path: PathBuf,
        name: String,
        target: Oid,
        annotated: bool,
    },
    CloneRepository {
        origin: PathBuf,
        dest: PathBuf,
        branch: Option<String>,
    },
    Push {
        path: PathBuf,
        options: PushOptions,
    },
    RawDiff {
        base: String,
        head: String,
        merge_base: bool,
    },
}

impl MockBackend {
    /// Create an empty, non-empty-repository mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a ref.
    pub fn with_ref(self, ref_path: &str, target: Oid) -> Self {
        self.lock().refs.insert(ref_path.to_string(), target);
        self
    }

    /// Entries replayed, in order, by every walk.
    pub fn with_walk_entries(self, entries: Vec<WalkEntry>) -> Self {
        self.lock().walk_entries = entries;
        self
    }

    /// Store an annotated tag object, keyed by its SHA.
    pub fn with_annotated_tag(self, tag: AnnotatedTag) -> Self {
        self.lock().annotated_tags.insert(tag.sha.clone(), tag);
        self
    }

    /// Store a commit object, keyed by its SHA.
    pub fn with_commit(self, commit: RawCommit) -> Self {
        self.lock().commits.insert(commit.sha.clone(), commit);
        self
    }

    /// Bytes every diff writes.
    pub fn with_diff(self, diff: impl Into<Vec<u8>>) -> Self {
        self.lock().diff = diff.into();
        self
    }

    /// Report the repository as having no commits.
    pub fn empty_repository(self) -> Self {
        self.lock().is_empty = true;
        self
    }

    /// Make every call of `op` fail with `error()`.
    pub fn fail_on(&self, op: MockOp, error: fn() -> GitError) {
        self.lock().fail_on = Some((op, error));
    }

    /// Stop failing.
    pub fn clear_failure(&self) {
        self.lock().fail_on = None;
    }

    /// Current value of a ref.
    pub fn ref_value(&self, ref_path: &str) -> Option<Oid> {
        self.lock().refs.get(ref_path).cloned()
    }

    /// All recorded operations, oldest first.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockBackendInner> {
        self.inner.lock().unwrap()
    }

    fn record(&self, op: MockOp, operation: MockOperation) -> Result<(), GitError> {
        let mut inner = self.lock();
        inner.operations.push(operation);
        match inner.fail_on {
            Some((failing, error)) if failing == op => Err(error()),
            _ => Ok(()),
        }
    }
}

fn resolve_source(refs: &BTreeMap<String, Oid>, src: &str) -> Result<Oid, GitError> {
    if let Some(oid) = refs.get(src) {
        return Ok(oid.clone());
    }
    Oid::new(src).map_err(|_| GitError::RefNotFound {
        refname: src.to_string(),
    })
}

#[async_trait]
impl GitBackend for MockBackend {
    async fn open_repository(&self, path: &Path) -> Result<RepoInfo, GitError> {
        self.record(
            MockOp::OpenRepository,
            MockOperation::OpenRepository {
                path: path.to_path_buf(),
            },
        )?;
        Ok(RepoInfo {
            path: path.to_path_buf(),
            is_empty: self.lock().is_empty,
        })
    }

    async fn get_ref(&self, path: &Path, ref_path: &str) -> Result<Oid, GitError> {
        self.record(
            MockOp::GetRef,
            MockOperation::GetRef {
                path: path.to_path_buf(),
                ref_path: ref_path.to_string(),
            },
        )?;
        self.ref_value(ref_path).ok_or_else(|| GitError::RefNotFound {
            refname: ref_path.to_string(),
        })
    }

    async fn walk_references(
        &self,
        path: &Path,
        options: &WalkOptions,
        instructor: &mut dyn WalkInstructor,
        handler: &mut WalkHandler<'_>,
        cancel: &CancelToken,
    ) -> Result<(), GitError> {
        self.record(
            MockOp::WalkReferences,
            MockOperation::WalkReferences {
                path: path.to_path_buf(),
                options: options.clone(),
            },
        )?;

        let entries = self.lock().walk_entries.clone();
        for entry in entries {
            if cancel.is_cancelled() {
                return Err(GitError::Cancelled);
            }
            match instructor.instruct(&entry)? {
                WalkInstruction::Handle => handler(entry)?,
                WalkInstruction::Skip => {}
                WalkInstruction::Stop => break,
            }
        }
        Ok(())
    }

    async fn get_annotated_tags(
        &self,
        _path: &Path,
        shas: &[Oid],
    ) -> Result<Vec<AnnotatedTag>, GitError> {
        self.record(
            MockOp::GetAnnotatedTags,
            MockOperation::GetAnnotatedTags {
                shas: shas.to_vec(),
            },
        )?;
        let inner = self.lock();
        shas.iter()
            .map(|sha| {
                inner
                    .annotated_tags
                    .get(sha)
                    .cloned()
                    .ok_or_else(|| GitError::ObjectNotFound {
                        oid: sha.to_string(),
                    })
            })
            .collect()
    }

    async fn get_annotated_tag(&self, _path: &Path, name: &str) -> Result<AnnotatedTag, GitError> {
        self.record(
            MockOp::GetAnnotatedTag,
            MockOperation::GetAnnotatedTag {
                name: name.to_string(),
            },
        )?;
        let inner = self.lock();
        let ref_path = format!("{TAG_PREFIX}{name}");
        inner
            .refs
            .get(&ref_path)
            .and_then(|sha| inner.annotated_tags.get(sha))
            .cloned()
            .ok_or(GitError::RefNotFound { refname: ref_path })
    }

    async fn get_commits(&self, _path: &Path, shas: &[Oid]) -> Result<Vec<RawCommit>, GitError> {
        self.record(
            MockOp::GetCommits,
            MockOperation::GetCommits {
                shas: shas.to_vec(),
            },
        )?;
        let inner = self.lock();
        shas.iter()
            .map(|sha| {
                inner
                    .commits
                    .get(sha)
                    .cloned()
                    .ok_or_else(|| GitError::ObjectNotFound {
                        oid: sha.to_string(),
                    })
            })
            .collect()
    }

    async fn get_commit(&self, _path: &Path, rev: &str) -> Result<RawCommit, GitError> {
        self.record(
            MockOp::GetCommit,
            MockOperation::GetCommit {
                rev: rev.to_string(),
            },
        )?;
        let inner = self.lock();
        let mut sha = resolve_source(&inner.refs, rev)
            .or_else(|_| resolve_source(&inner.refs, &format!("refs/heads/{rev}")))
            .or_else(|_| resolve_source(&inner.refs, &format!("{TAG_PREFIX}{rev}")))
            .map_err(|_| GitError::ObjectNotFound {
                oid: rev.to_string(),
            })?;
        if let Some(tag) = inner.annotated_tags.get(&sha) {
            sha = tag.target_sha.clone();
        }
        inner
            .commits
            .get(&sha)
            .cloned()
            .ok_or(GitError::ObjectNotFound {
                oid: rev.to_string(),
            })
    }

    async fn create_tag(
        &self,
        path: &Path,
        name: &str,
        target: &Oid,
        options: &CreateTagOptions,
    ) -> Result<(), GitError> {
        self.record(
            MockOp::CreateTag,
            MockOperation::CreateTag {
                path: path.to_path_buf(),
                name: name.to_string(),
                target: target.clone(),
                annotated: !options.message.is_empty(),
            },
        )?;
        let mut inner = self.lock();
        let ref_path = format!("{TAG_PREFIX}{name}");
        if inner.refs.contains_key(&ref_path) {
            return Err(GitError::AlreadyExists { name: ref_path });
        }
        if options.message.is_empty() {
            inner.refs.insert(ref_path, target.clone());
            return Ok(());
        }

        // synthetic tag object ids, distinct per mock
        let sha = Oid::new(format!("{:0>40x}", 0xfeed_0000_u64 + inner.annotated_tags.len() as u64))
            .map_err(GitError::from)?;
        let (title, message) = split_message(&options.message);
        inner.annotated_tags.insert(
            sha.clone(),
            AnnotatedTag {
                sha: sha.clone(),
                name: name.to_string(),
                target_sha: target.clone(),
                target_type: ObjectType::Commit,
                title,
                message,
                tagger: Some(options.tagger.clone()),
            },
        );
        inner.refs.insert(ref_path, sha);
        Ok(())
    }

    async fn clone_repository(
        &self,
        origin: &Path,
        dest: &Path,
        branch: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<(), GitError> {
        self.record(
            MockOp::CloneRepository,
            MockOperation::CloneRepository {
                origin: origin.to_path_buf(),
                dest: dest.to_path_buf(),
                branch: branch.map(str::to_string),
            },
        )?;
        if cancel.is_cancelled() {
            return Err(GitError::Cancelled);
        }
        Ok(())
    }

    async fn push(
        &self,
        path: &Path,
        options: &PushOptions,
        cancel: &CancelToken,
    ) -> Result<(), GitError> {
        self.record(
            MockOp::Push,
            MockOperation::Push {
                path: path.to_path_buf(),
                options: options.clone(),
            },
        )?;
        if cancel.is_cancelled() {
            return Err(GitError::Cancelled);
        }

        let mut inner = self.lock();
        let (src, dst) = options
            .refspec
            .split_once(':')
            .ok_or_else(|| GitError::Internal {
                message: format!("invalid refspec '{}'", options.refspec),
            })?;

        if let Some(lease) = &options.force_with_lease {
            let (leased_ref, expected) = lease.split_once(':').unwrap_or((lease.as_str(), ""));
            let current = inner.refs.get(leased_ref).map(Oid::to_string);
            let expected_absent = expected.chars().all(|c| c == '0');
            let holds = match current {
                Some(current) => current == expected,
                None => expected_absent,
            };
            if !holds {
                return Err(GitError::StaleLease {
                    message: format!("{dst} (stale info)"),
                });
            }
        }

        if src.is_empty() {
            return inner
                .refs
                .remove(dst)
                .map(|_| ())
                .ok_or(GitError::RefNotFound {
                    refname: format!("{dst}: remote ref does not exist"),
                });
        }
        if src == dst {
            // working copy and origin share one namespace
            return if inner.refs.contains_key(dst) {
                Ok(())
            } else {
                Err(GitError::RefNotFound {
                    refname: src.to_string(),
                })
            };
        }

        let value = resolve_source(&inner.refs, src)?;
        inner.refs.insert(dst.to_string(), value);
        Ok(())
    }

    async fn raw_diff(
        &self,
        _path: &Path,
        base: &str,
        head: &str,
        merge_base: bool,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        cancel: &CancelToken,
    ) -> Result<(), GitError> {
        self.record(
            MockOp::RawDiff,
            MockOperation::RawDiff {
                base: base.to_string(),
                head: head.to_string(),
                merge_base,
            },
        )?;
        if cancel.is_cancelled() {
            return Err(GitError::Cancelled);
        }
        let diff = self.lock().diff.clone();
        sink.write_all(&diff)
            .await
            .map_err(|e| GitError::io("failed to write diff", e))
    }
}
