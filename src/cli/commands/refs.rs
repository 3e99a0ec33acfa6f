//! get-ref / update-ref commands

use anyhow::Result;

use super::block_on;
use crate::cli::args::ActorArgs;
use crate::cli::Context;
use crate::core::types::{Oid, RefType};
use crate::service::{GetRefParams, ReadParams, UpdateRefParams, WriteParams};

/// Print the SHA a reference points at.
pub fn get_ref(ctx: &Context, repo: &str, name: &str, ref_type: RefType) -> Result<()> {
    let params = GetRefParams {
        read: ReadParams::new(repo),
        name: name.to_string(),
        ref_type,
    };
    let request = &params;
    let sha = block_on(|_| async move {
        ctx.service.get_ref(request).await.map_err(anyhow::Error::from)
    })?;
    println!("{sha}");
    Ok(())
}

/// Create, move or delete a reference.
pub fn update_ref(
    ctx: &Context,
    repo: &str,
    name: &str,
    ref_type: RefType,
    new_value: Option<Oid>,
    old_value: Option<Oid>,
    actor: &ActorArgs,
) -> Result<()> {
    let mut write = WriteParams::new(repo, actor.identity());
    write.env_vars.extend(actor.env_vars.iter().cloned());
    let params = UpdateRefParams {
        write,
        ref_type,
        name: name.to_string(),
        new_value,
        old_value,
    };

    let request = &params;
    block_on(|cancel| async move {
        ctx.service
            .update_ref(request, &cancel)
            .await
            .map_err(anyhow::Error::from)
    })?;

    if !ctx.quiet {
        match &params.new_value {
            Some(sha) => println!("{name} -> {sha}"),
            None => println!("Deleted {name}"),
        }
    }
    Ok(())
}
