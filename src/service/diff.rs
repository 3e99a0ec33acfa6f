//! service::diff
//!
//! Raw unified diffs between two revisions.

use tokio::io::AsyncWrite;
use tracing::debug;

use super::error::Error;
use super::params::ReadParams;
use super::Service;
use crate::git::CancelToken;

/// Parameters of [`Service::raw_diff`].
#[derive(Debug, Clone)]
pub struct RawDiffParams {
    pub read: ReadParams,
    /// Branch, tag or SHA.
    pub base_ref: String,
    /// Branch, tag or SHA.
    pub head_ref: String,
    /// Diff against the merge base of both revisions instead of `base_ref`.
    pub merge_base: bool,
}

impl RawDiffParams {
    pub fn validate(&self) -> Result<(), Error> {
        self.read.validate()?;
        for (what, rev) in [("base", &self.base_ref), ("head", &self.head_ref)] {
            if rev.is_empty() {
                return Err(Error::InvalidArgument(format!("{what} ref cannot be empty")));
            }
            // would be taken for an option
            if rev.starts_with('-') {
                return Err(Error::InvalidArgument(format!(
                    "{what} ref '{rev}' cannot start with '-'"
                )));
            }
        }
        Ok(())
    }
}

impl Service {
    /// Stream the diff from `base_ref` to `head_ref` into `sink`.
    ///
    /// Output is written as git produces it. On error, whatever was written
    /// before the failure stays in `sink`.
    pub async fn raw_diff(
        &self,
        params: &RawDiffParams,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        cancel: &CancelToken,
    ) -> Result<(), Error> {
        params.validate()?;
        let repo_path = self.repo_path(&params.read.repo_uid);

        debug!(
            repo_uid = %params.read.repo_uid,
            base = %params.base_ref,
            head = %params.head_ref,
            merge_base = params.merge_base,
            "diffing"
        );
        self.backend
            .raw_diff(
                &repo_path,
                &params.base_ref,
                &params.head_ref,
                params.merge_base,
                sink,
                cancel,
            )
            .await
            .map_err(Error::git("RawDiff"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::paths::RepoPaths;
    use crate::git::mock::{MockBackend, MockOperation};
    use crate::service::ErrorKind;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn service(mock: &MockBackend) -> Service {
        Service::new(
            Arc::new(mock.clone()),
            RepoPaths::new(PathBuf::from("/repos"), PathBuf::from("/tmp/refkeep")),
            "REFKEEP",
        )
    }

    fn params(base: &str, head: &str, merge_base: bool) -> RawDiffParams {
        RawDiffParams {
            read: ReadParams::new("acme"),
            base_ref: base.into(),
            head_ref: head.into(),
            merge_base,
        }
    }

    #[tokio::test]
    async fn streams_backend_output() {
        let mock = MockBackend::new().with_diff("diff --git a/f b/f\n");
        let mut out: Vec<u8> = Vec::new();
        service(&mock)
            .raw_diff(&params("main", "dev", true), &mut out, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(out, b"diff --git a/f b/f\n");
        match &mock.operations()[0] {
            MockOperation::RawDiff {
                base,
                head,
                merge_base,
            } => {
                assert_eq!((base.as_str(), head.as_str(), *merge_base), ("main", "dev", true));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejects_option_like_refs() {
        let mock = MockBackend::new();
        for p in [
            params("", "dev", false),
            params("main", "", false),
            params("--output=/etc/passwd", "dev", false),
        ] {
            let err = service(&mock)
                .raw_diff(&p, &mut Vec::<u8>::new(), &CancelToken::new())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        assert!(mock.operations().is_empty());
    }
}
