//! refkeep - ref and tag management for hosted git repositories
//!
//! refkeep resolves, reads and atomically updates references of bare
//! repositories, lists and manages tags, and streams raw diffs. Mutations
//! are staged in disposable working copies and pushed back with lease-based
//! compare-and-swap, so concurrent writers never need a lock.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to service)
//! - [`service`] - The public operations and their error taxonomy
//! - [`walk`] - Filtering decisions applied to reference walks
//! - [`git`] - Single interface for all Git operations
//! - [`core`] - Domain types, ref paths, queries, configuration
//!
//! # Example
//!
//! ```no_run
//! use refkeep::core::config::Config;
//! use refkeep::core::types::RefType;
//! use refkeep::service::{GetRefParams, ReadParams, Service};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let service = Service::from_config(&Config::load(None).unwrap());
//! let sha = service
//!     .get_ref(&GetRefParams {
//!         read: ReadParams::new("acme"),
//!         name: "main".into(),
//!         ref_type: RefType::Branch,
//!     })
//!     .await
//!     .unwrap();
//! println!("main is at {sha}");
//! # });
//! ```

pub mod cli;
pub mod core;
pub mod git;
pub mod service;
pub mod walk;
