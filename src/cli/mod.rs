//! cli
//!
//! Command-line interface layer for refkeep.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and install logging
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Every command maps onto one
//! [`Service`](crate::service::Service) operation; output is plain text for
//! single values and JSON for entities.

pub mod args;
pub mod commands;

pub use args::Cli;

use anyhow::{Context as _, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::service::Service;

/// Execution context shared by command handlers.
#[derive(Debug, Clone)]
pub struct Context {
    pub service: Service,
    pub quiet: bool,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    let config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    let ctx = Context {
        service: Service::from_config(&config),
        quiet: cli.quiet,
    };

    commands::dispatch(cli.command, &ctx)
}

/// Log to stderr. `RUST_LOG` overrides the level picked by `--debug`.
fn init_logging(debug: bool) {
    let default = if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();

    // a second call (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
