//! service::error
//!
//! Error taxonomy of the service entry points.
//!
//! Callers translate an error into a protocol response through
//! [`Error::kind`]. Backend errors are wrapped with the name of the failing
//! operation and keep their source; their kind is derived from the source
//! rather than by rewriting the error.

use thiserror::Error;

use crate::core::types::TypeError;
use crate::git::GitError;

/// Coarse classification of a service error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input; never retried.
    InvalidArgument,
    /// The addressed repository, ref, tag or commit is absent.
    NotFound,
    /// Already exists, or a lease precondition failed; retry with fresh state.
    Conflict,
    /// The caller cancelled the operation.
    Cancelled,
    /// Anything else; aborts the whole operation.
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::NotFound => "not found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Errors returned by [`Service`](super::Service) operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("operation cancelled")]
    Cancelled,

    /// A backend failure, wrapped with the operation that hit it.
    #[error("{op}: {source}")]
    Git {
        op: &'static str,
        #[source]
        source: GitError,
    },

    #[error("{op}: {message}")]
    Internal { op: &'static str, message: String },
}

impl Error {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Git { source, .. } => git_error_kind(source),
            Error::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Wrap a backend error with the failing operation's name.
    pub(crate) fn git(op: &'static str) -> impl FnOnce(GitError) -> Error {
        move |source| Error::Git { op, source }
    }

    pub(crate) fn internal(op: &'static str, message: impl Into<String>) -> Error {
        Error::Internal {
            op,
            message: message.into(),
        }
    }
}

fn git_error_kind(err: &GitError) -> ErrorKind {
    match err {
        GitError::NotARepo { .. } | GitError::RefNotFound { .. } | GitError::ObjectNotFound { .. } => {
            ErrorKind::NotFound
        }
        GitError::AlreadyExists { .. } | GitError::StaleLease { .. } => ErrorKind::Conflict,
        GitError::Cancelled => ErrorKind::Cancelled,
        _ => ErrorKind::Internal,
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::InvalidArgument(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walk::WalkError;

    #[test]
    fn direct_kinds() {
        assert_eq!(
            Error::InvalidArgument("x".into()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(Error::NotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(Error::Conflict("x".into()).kind(), ErrorKind::Conflict);
        assert_eq!(Error::Cancelled.kind(), ErrorKind::Cancelled);
        assert_eq!(Error::internal("Op", "x").kind(), ErrorKind::Internal);
    }

    #[test]
    fn wrapped_kinds_follow_the_source() {
        let cases = [
            (
                GitError::RefNotFound {
                    refname: "refs/heads/x".into(),
                },
                ErrorKind::NotFound,
            ),
            (
                GitError::StaleLease {
                    message: "stale info".into(),
                },
                ErrorKind::Conflict,
            ),
            (
                GitError::AlreadyExists {
                    name: "refs/tags/v1".into(),
                },
                ErrorKind::Conflict,
            ),
            (GitError::Cancelled, ErrorKind::Cancelled),
            (
                GitError::Rejected {
                    message: "hook declined".into(),
                },
                ErrorKind::Internal,
            ),
            (
                GitError::Walk(WalkError::MissingField(
                    crate::git::ReferenceField::ObjectType,
                )),
                ErrorKind::Internal,
            ),
        ];
        for (source, kind) in cases {
            assert_eq!(Error::git("UpdateRef")(source).kind(), kind);
        }
    }

    #[test]
    fn wrapped_message_names_the_operation() {
        let err = Error::git("GetRef")(GitError::RefNotFound {
            refname: "refs/heads/x".into(),
        });
        assert_eq!(err.to_string(), "GetRef: ref not found: refs/heads/x");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn type_errors_are_invalid_arguments() {
        let err: Error = TypeError::InvalidRefType("bad".into()).into();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
