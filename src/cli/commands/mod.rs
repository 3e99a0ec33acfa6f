//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Async Commands
//!
//! Service operations are async. Each handler builds a tokio runtime and
//! blocks on its operation; Ctrl-C fires the operation's cancel token so
//! child processes are stopped and working copies removed before exit.

mod diff;
mod refs;
mod tags;

pub use diff::diff;
pub use refs::{get_ref, update_ref};
pub use tags::{create_tag, delete_tag, list_tags};

use std::future::Future;

use anyhow::Result;

use crate::cli::args::Command;
use crate::cli::Context;
use crate::git::CancelToken;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::GetRef {
            repo,
            name,
            ref_type,
        } => refs::get_ref(ctx, &repo, &name, ref_type),
        Command::UpdateRef {
            repo,
            name,
            ref_type,
            new_value,
            delete,
            old_value,
            actor,
        } => {
            let new_value = if delete { None } else { new_value };
            refs::update_ref(ctx, &repo, &name, ref_type, new_value, old_value, &actor)
        }
        Command::ListTags {
            repo,
            query,
            sort,
            order,
            page,
            page_size,
            include_commit,
        } => tags::list_tags(
            ctx,
            &repo,
            tags::ListOptions {
                query,
                sort: sort.into(),
                order: order.into(),
                page,
                page_size,
                include_commit,
            },
        ),
        Command::CreateTag {
            repo,
            name,
            target,
            message,
            actor,
        } => tags::create_tag(ctx, &repo, &name, &target, &message, &actor),
        Command::DeleteTag { repo, name, actor } => tags::delete_tag(ctx, &repo, &name, &actor),
        Command::Diff {
            repo,
            base,
            head,
            merge_base,
        } => diff::diff(ctx, &repo, &base, &head, merge_base),
    }
}

/// Run `op` to completion on a fresh runtime, cancelling it on Ctrl-C.
fn block_on<F, Fut, T>(op: F) -> Result<T>
where
    F: FnOnce(CancelToken) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let cancel = CancelToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });
        op(cancel).await
    })
}
