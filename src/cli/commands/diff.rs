//! diff command

use anyhow::Result;
use tokio::io::AsyncWriteExt;

use super::block_on;
use crate::cli::Context;
use crate::service::{RawDiffParams, ReadParams};

/// Stream the diff between `base` and `head` to stdout.
pub fn diff(ctx: &Context, repo: &str, base: &str, head: &str, merge_base: bool) -> Result<()> {
    let params = RawDiffParams {
        read: ReadParams::new(repo),
        base_ref: base.to_string(),
        head_ref: head.to_string(),
        merge_base,
    };
    let request = &params;
    block_on(|cancel| async move {
        let mut stdout = tokio::io::stdout();
        ctx.service.raw_diff(request, &mut stdout, &cancel).await?;
        stdout.flush().await?;
        Ok::<(), anyhow::Error>(())
    })
}
