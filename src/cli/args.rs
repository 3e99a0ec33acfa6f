//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this config file instead of the default locations
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::core::types::{Oid, RefType};
use crate::git::SortOrder;
use crate::service::{Identity, TagSortOption};

/// refkeep - ref and tag management for hosted git repositories
#[derive(Parser, Debug)]
#[command(name = "refkeep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// The principal a write is performed for.
#[derive(Args, Debug, Clone)]
pub struct ActorArgs {
    /// Name of the acting user
    #[arg(long, value_name = "NAME")]
    pub actor_name: String,

    /// Email of the acting user
    #[arg(long, value_name = "EMAIL")]
    pub actor_email: String,

    /// Extra variable for server hooks, as KEY=VALUE (repeatable)
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_var)]
    pub env_vars: Vec<(String, String)>,
}

impl ActorArgs {
    pub fn identity(&self) -> Identity {
        Identity::new(self.actor_name.as_str(), self.actor_email.as_str())
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the SHA a reference points at
    #[command(
        name = "get-ref",
        after_help = "\
EXAMPLES:
    refkeep get-ref acme main
    refkeep get-ref acme 42 --type pullreq-head"
    )]
    GetRef {
        /// Repository id
        repo: String,

        /// Reference name, without its namespace unless --type raw
        name: String,

        /// Reference type: raw, branch, tag, pullreq-head, pullreq-merge
        #[arg(long = "type", default_value = "branch")]
        ref_type: RefType,
    },

    /// Create, move or delete a reference
    #[command(
        name = "update-ref",
        long_about = "Create, move or delete a reference.\n\n\
            With --old the update only happens if the reference currently points \
            at that SHA (the all-zero SHA means it must not exist); otherwise it \
            fails with a conflict and nothing changes. Without --old the update \
            is unconditional.",
        after_help = "\
EXAMPLES:
    # Move main from A to B, failing if someone else moved it first
    refkeep update-ref acme main --new <B> --old <A> --actor-name Ada --actor-email ada@example.com

    # Delete a branch
    refkeep update-ref acme old-feature --delete --actor-name Ada --actor-email ada@example.com"
    )]
    UpdateRef {
        /// Repository id
        repo: String,

        /// Reference name
        name: String,

        /// Reference type: raw, branch, tag, pullreq-head, pullreq-merge
        #[arg(long = "type", default_value = "branch")]
        ref_type: RefType,

        /// New value of the reference
        #[arg(long = "new", value_name = "SHA", value_parser = parse_oid, required_unless_present = "delete")]
        new_value: Option<Oid>,

        /// Delete the reference
        #[arg(long, conflicts_with = "new_value")]
        delete: bool,

        /// Expected current value of the reference
        #[arg(long = "old", value_name = "SHA", value_parser = parse_oid)]
        old_value: Option<Oid>,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// List tags pointing at commits, as JSON
    #[command(name = "list-tags")]
    ListTags {
        /// Repository id
        repo: String,

        /// Name filter; a leading ^ or trailing $ anchors it
        #[arg(long, default_value = "")]
        query: String,

        /// Sort key
        #[arg(long, value_enum, default_value_t = SortArg::Default)]
        sort: SortArg,

        /// Sort order
        #[arg(long, value_enum, default_value_t = OrderArg::Default)]
        order: OrderArg,

        /// Page to show (1-based)
        #[arg(long, default_value_t = 1)]
        page: i32,

        /// Tags per page; 0 lists all tags
        #[arg(long, default_value_t = 0)]
        page_size: i32,

        /// Include the tagged commit of each tag
        #[arg(long)]
        include_commit: bool,
    },

    /// Tag a commit, as JSON
    #[command(name = "create-tag")]
    CreateTag {
        /// Repository id
        repo: String,

        /// Tag name
        name: String,

        /// Branch, tag or SHA to tag
        target: String,

        /// Tag message; makes the tag annotated
        #[arg(short, long, default_value = "")]
        message: String,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Delete a tag
    #[command(name = "delete-tag")]
    DeleteTag {
        /// Repository id
        repo: String,

        /// Tag name
        name: String,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Write the unified diff between two revisions to stdout
    Diff {
        /// Repository id
        repo: String,

        /// Base branch, tag or SHA
        base: String,

        /// Head branch, tag or SHA
        head: String,

        /// Diff against the merge base of base and head
        #[arg(long)]
        merge_base: bool,
    },
}

/// Tag sort key.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortArg {
    Default,
    Name,
    Date,
}

impl From<SortArg> for TagSortOption {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Default => TagSortOption::Default,
            SortArg::Name => TagSortOption::Name,
            SortArg::Date => TagSortOption::Date,
        }
    }
}

/// Sort order.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderArg {
    Default,
    Asc,
    Desc,
}

impl From<OrderArg> for SortOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Default => SortOrder::Default,
            OrderArg::Asc => SortOrder::Asc,
            OrderArg::Desc => SortOrder::Desc,
        }
    }
}

fn parse_oid(s: &str) -> Result<Oid, String> {
    Oid::new(s).map_err(|e| e.to_string())
}

fn parse_env_var(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}
