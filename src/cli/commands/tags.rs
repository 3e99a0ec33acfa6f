//! list-tags / create-tag / delete-tag commands

use anyhow::{Context as _, Result};

use super::block_on;
use crate::cli::args::ActorArgs;
use crate::cli::Context;
use crate::git::SortOrder;
use crate::service::{
    CreateCommitTagParams, DeleteTagParams, ListCommitTagsParams, ReadParams, TagSortOption,
    WriteParams,
};

/// Listing options taken from the command line.
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub query: String,
    pub sort: TagSortOption,
    pub order: SortOrder,
    pub page: i32,
    pub page_size: i32,
    pub include_commit: bool,
}

fn write_params(repo: &str, actor: &ActorArgs) -> WriteParams {
    let mut write = WriteParams::new(repo, actor.identity());
    write.env_vars.extend(actor.env_vars.iter().cloned());
    write
}

/// Print the tags of a repository as a JSON array.
pub fn list_tags(ctx: &Context, repo: &str, options: ListOptions) -> Result<()> {
    let params = ListCommitTagsParams {
        read: ReadParams::new(repo),
        query: options.query,
        sort: options.sort,
        order: options.order,
        page: options.page,
        page_size: options.page_size,
        include_commit: options.include_commit,
    };
    let request = &params;
    let tags = block_on(|cancel| async move {
        ctx.service.list_commit_tags(request, &cancel).await.map_err(anyhow::Error::from)
    })?;

    let json = serde_json::to_string_pretty(&tags).context("Failed to serialize tags")?;
    println!("{json}");
    Ok(())
}

/// Create a tag and print it as JSON.
pub fn create_tag(
    ctx: &Context,
    repo: &str,
    name: &str,
    target: &str,
    message: &str,
    actor: &ActorArgs,
) -> Result<()> {
    let params = CreateCommitTagParams {
        write: write_params(repo, actor),
        name: name.to_string(),
        target: target.to_string(),
        message: message.to_string(),
        tagger: None,
        tagger_date: None,
    };
    let request = &params;
    let tag = block_on(|cancel| async move {
        ctx.service.create_commit_tag(request, &cancel).await.map_err(anyhow::Error::from)
    })?;

    if !ctx.quiet {
        let json = serde_json::to_string_pretty(&tag).context("Failed to serialize tag")?;
        println!("{json}");
    }
    Ok(())
}

/// Delete a tag.
pub fn delete_tag(ctx: &Context, repo: &str, name: &str, actor: &ActorArgs) -> Result<()> {
    let params = DeleteTagParams {
        write: write_params(repo, actor),
        name: name.to_string(),
    };
    let request = &params;
    block_on(|cancel| async move {
        ctx.service
            .delete_tag(request, &cancel)
            .await
            .map_err(anyhow::Error::from)
    })?;

    if !ctx.quiet {
        println!("Deleted tag {name}");
    }
    Ok(())
}
