//! git
//!
//! The Git Backend capability and its implementations.
//!
//! # Architecture
//!
//! The service layer talks to repositories only through the [`GitBackend`]
//! trait. [`Git`] is the production implementation; [`mock::MockBackend`]
//! is an in-memory implementation for deterministic tests. No module
//! outside this one imports `git2` or spawns `git`.
//!
//! # Responsibilities
//!
//! - Repository opening and emptiness checks
//! - Reference reads and streaming reference walks
//! - Batched annotated tag and commit reads
//! - Tag creation in working copies
//! - Disposable working copies ([`SharedRepo`]) and guarded pushes
//! - Raw diff streaming
//!
//! # Invariants
//!
//! - Every long-running call honors its [`CancelToken`]
//! - Batched reads preserve input order
//! - Working copies are removed on every exit path

mod backend;
mod cancel;
mod command;
mod interface;
pub mod mock;
mod shared;
mod types;

pub use backend::{GitBackend, WalkHandler};
pub use cancel::CancelToken;
pub use command::GitCommand;
pub use interface::{Git, GitError};
pub use shared::SharedRepo;
pub use types::{
    AnnotatedTag, CreateTagOptions, ObjectType, PushOptions, RawCommit, RawSignature,
    ReferenceField, RepoInfo, SortOrder, WalkEntry, WalkInstruction, WalkOptions, WalkSort,
};
