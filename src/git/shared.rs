//! git::shared
//!
//! Disposable working copies for staging ref and tag mutations.
//!
//! A [`SharedRepo`] is a bare clone living in its own temporary directory
//! under the configured tmp dir. It borrows the origin's objects, so any
//! SHA the origin knows can be pushed from it. The directory is removed
//! when the value is dropped, on success, error and cancellation alike;
//! [`SharedRepo::close`] does the same but reports removal failures.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tracing::debug;

use super::backend::GitBackend;
use super::cancel::CancelToken;
use super::interface::GitError;
use super::types::PushOptions;
use crate::core::refpath::TAG_PREFIX;

/// A disposable clone of an origin repository.
pub struct SharedRepo {
    backend: Arc<dyn GitBackend>,
    dir: TempDir,
    remote: PathBuf,
}

impl std::fmt::Debug for SharedRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRepo")
            .field("path", &self.dir.path())
            .field("remote", &self.remote)
            .finish()
    }
}

impl SharedRepo {
    /// Create an empty working copy for `repo_uid` under `tmp_dir`.
    ///
    /// Nothing is cloned yet; call [`SharedRepo::clone_from_remote`].
    pub fn new(
        backend: Arc<dyn GitBackend>,
        tmp_dir: &Path,
        repo_uid: &str,
        remote: &Path,
    ) -> Result<Self, GitError> {
        std::fs::create_dir_all(tmp_dir)
            .map_err(|e| GitError::io(format!("failed to create {}", tmp_dir.display()), e))?;
        let remote = std::fs::canonicalize(remote).map_err(|_| GitError::NotARepo {
            path: remote.to_path_buf(),
        })?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", dir_prefix(repo_uid)))
            .tempdir_in(tmp_dir)
            .map_err(|e| GitError::io("failed to create working copy", e))?;

        debug!(path = %dir.path().display(), remote = %remote.display(), "created working copy");
        Ok(Self {
            backend,
            dir,
            remote,
        })
    }

    /// Path of the working copy.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the origin repository.
    pub fn remote_path(&self) -> &Path {
        &self.remote
    }

    /// Clone the origin into the working copy.
    ///
    /// `None` clones all branches, `Some(branch)` only that branch.
    pub async fn clone_from_remote(
        &self,
        branch: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<(), GitError> {
        self.backend
            .clone_repository(&self.remote, self.path(), branch, cancel)
            .await
    }

    /// Push to the origin. The remote in `options` is replaced by the origin.
    pub async fn push(&self, mut options: PushOptions, cancel: &CancelToken) -> Result<(), GitError> {
        options.remote = self.remote.display().to_string();
        self.backend.push(self.path(), &options, cancel).await
    }

    /// Push `refs/tags/<name>` to the origin. Fails if the origin has it.
    pub async fn push_tag(
        &self,
        name: &str,
        env: Vec<(String, String)>,
        cancel: &CancelToken,
    ) -> Result<(), GitError> {
        let ref_path = format!("{TAG_PREFIX}{name}");
        self.push(
            PushOptions {
                refspec: format!("{ref_path}:{ref_path}"),
                env,
                ..Default::default()
            },
            cancel,
        )
        .await
    }

    /// Delete `refs/tags/<name>` on the origin.
    pub async fn push_delete_tag(
        &self,
        name: &str,
        env: Vec<(String, String)>,
        cancel: &CancelToken,
    ) -> Result<(), GitError> {
        self.push(
            PushOptions {
                refspec: format!(":{TAG_PREFIX}{name}"),
                env,
                ..Default::default()
            },
            cancel,
        )
        .await
    }

    /// Remove the working copy.
    pub fn close(self) -> Result<(), GitError> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .map_err(|e| GitError::io(format!("failed to remove {}", path.display()), e))
    }
}

/// Directory name prefix derived from a repo uid.
fn dir_prefix(repo_uid: &str) -> String {
    let cleaned: String = repo_uid
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "repo".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mock::{MockBackend, MockOperation};
    use crate::core::types::Oid;

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let root = TempDir::new().unwrap();
        let origin = root.path().join("origin.git");
        std::fs::create_dir_all(&origin).unwrap();
        let tmp = root.path().join("tmp");
        (root, origin, tmp)
    }

    #[test]
    fn prefix_is_filesystem_safe() {
        assert_eq!(dir_prefix("acme/widgets"), "acme_widgets");
        assert_eq!(dir_prefix("space-1_x"), "space-1_x");
        assert_eq!(dir_prefix(""), "repo");
    }

    #[test]
    fn creates_under_tmp_dir_and_removes_on_drop() {
        let (_root, origin, tmp) = setup();
        let shared = SharedRepo::new(Arc::new(MockBackend::new()), &tmp, "acme", &origin).unwrap();
        let path = shared.path().to_path_buf();

        assert!(path.is_dir());
        assert!(path.starts_with(&tmp));
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("acme-"));

        drop(shared);
        assert!(!path.exists());
    }

    #[test]
    fn close_removes_directory() {
        let (_root, origin, tmp) = setup();
        let shared = SharedRepo::new(Arc::new(MockBackend::new()), &tmp, "acme", &origin).unwrap();
        let path = shared.path().to_path_buf();
        shared.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn missing_remote_is_not_a_repo() {
        let (root, _origin, tmp) = setup();
        let err = SharedRepo::new(
            Arc::new(MockBackend::new()),
            &tmp,
            "acme",
            &root.path().join("missing.git"),
        )
        .unwrap_err();
        assert!(matches!(err, GitError::NotARepo { .. }));
    }

    #[tokio::test]
    async fn tag_pushes_target_the_origin() {
        let (_root, origin, tmp) = setup();
        let mock = MockBackend::new().with_ref("refs/tags/v1", Oid::new("a".repeat(40)).unwrap());
        let shared = SharedRepo::new(Arc::new(mock.clone()), &tmp, "acme", &origin).unwrap();
        let cancel = CancelToken::new();

        shared.clone_from_remote(None, &cancel).await.unwrap();
        shared.push_tag("v1", vec![], &cancel).await.unwrap();

        let ops = mock.operations();
        assert!(matches!(&ops[0], MockOperation::CloneRepository { branch: None, .. }));
        match &ops[1] {
            MockOperation::Push { options, .. } => {
                assert_eq!(options.refspec, "refs/tags/v1:refs/tags/v1");
                assert!(!options.force);
                assert_eq!(options.remote, shared.remote_path().display().to_string());
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
