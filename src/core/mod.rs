//! core
//!
//! Core domain types and the pure algorithms the service is built from.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Oid, RefName, RefType
//! - [`refpath`] - Logical reference name to canonical path resolution
//! - [`query`] - Query sanitizing and walk pattern compilation
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized path routing for repository storage
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Nothing in here performs repository I/O
//! - All pattern and path computation is deterministic

pub mod config;
pub mod paths;
pub mod query;
pub mod refpath;
pub mod types;
