//! service::refs
//!
//! Reading and compare-and-swap updating of single references.
//!
//! # Concurrency
//!
//! Updates are arbitrated by the origin's atomic ref update plus the push
//! lease: when several callers race with the same expected old value,
//! exactly one push lands and the others fail with
//! [`ErrorKind::Conflict`](super::ErrorKind::Conflict). Losers are never
//! retried here; the caller re-reads and decides.

use tracing::debug;

use super::error::Error;
use super::params::{push_environment, ReadParams, WriteParams};
use super::Service;
use crate::core::refpath::ref_path;
use crate::core::types::{Oid, RefName, RefType};
use crate::git::{CancelToken, PushOptions};

/// Parameters of [`Service::get_ref`].
#[derive(Debug, Clone)]
pub struct GetRefParams {
    pub read: ReadParams,
    pub name: String,
    pub ref_type: RefType,
}

impl GetRefParams {
    pub fn validate(&self) -> Result<(), Error> {
        self.read.validate()?;
        if self.name.is_empty() {
            return Err(Error::InvalidArgument("ref name cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Parameters of [`Service::update_ref`].
#[derive(Debug, Clone)]
pub struct UpdateRefParams {
    pub write: WriteParams,
    pub ref_type: RefType,
    pub name: String,
    /// Value to move the ref to; `None` deletes it.
    pub new_value: Option<Oid>,
    /// Value the ref must currently hold; `None` updates unconditionally.
    ///
    /// The zero SHA requires the ref to not exist yet.
    pub old_value: Option<Oid>,
}

impl UpdateRefParams {
    pub fn validate(&self) -> Result<(), Error> {
        self.write.validate()?;
        if self.name.is_empty() {
            return Err(Error::InvalidArgument("ref name cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Push options moving `reference` from `old_value` to `new_value`.
fn ref_update_push(
    reference: &str,
    new_value: Option<&Oid>,
    old_value: Option<&Oid>,
    env: Vec<(String, String)>,
) -> PushOptions {
    let refspec = match new_value {
        // explicit deletion refspec, never an empty source by accident
        None => format!(":{reference}"),
        Some(new) => format!("{new}:{reference}"),
    };
    PushOptions {
        refspec,
        force: old_value.is_none(),
        force_with_lease: old_value.map(|old| format!("{reference}:{old}")),
        env,
        ..Default::default()
    }
}

impl Service {
    /// Current target of a reference.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for an empty name or an undefined ref type
    /// - `NotFound` if the repository or the reference doesn't exist
    pub async fn get_ref(&self, params: &GetRefParams) -> Result<Oid, Error> {
        params.validate()?;
        let reference = ref_path(&params.name, params.ref_type)?;
        let repo_path = self.repo_path(&params.read.repo_uid);

        self.backend
            .get_ref(&repo_path, &reference)
            .await
            .map_err(Error::git("GetRef"))
    }

    /// Create, move or delete a reference.
    ///
    /// The update is staged in a disposable working copy and pushed back to
    /// the repository, guarded by a lease when `old_value` is set.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for bad parameters, or a non-delete update of an
    ///   empty repository
    /// - `Conflict` if the reference doesn't hold `old_value`
    /// - `NotFound` when deleting a reference that doesn't exist
    /// - `Cancelled` if `cancel` fires; the working copy is still removed
    pub async fn update_ref(
        &self,
        params: &UpdateRefParams,
        cancel: &CancelToken,
    ) -> Result<(), Error> {
        const OP: &str = "UpdateRef";

        params.validate()?;
        // the path ends up in a refspec and must be a well-formed ref
        let reference = RefName::new(ref_path(&params.name, params.ref_type)?)?;
        let repo_path = self.repo_path(&params.write.repo_uid);

        let repo = self
            .backend
            .open_repository(&repo_path)
            .await
            .map_err(Error::git(OP))?;
        if repo.is_empty && params.new_value.is_some() {
            return Err(Error::InvalidArgument(
                "branch cannot be created on empty repository".to_string(),
            ));
        }

        let shared = self
            .shared_repo(&params.write.repo_uid, &repo.path)
            .map_err(Error::git(OP))?;
        shared
            .clone_from_remote(None, cancel)
            .await
            .map_err(Error::git(OP))?;

        debug!(
            repo_uid = %params.write.repo_uid,
            reference = %reference,
            new_value = ?params.new_value,
            old_value = ?params.old_value,
            "updating reference"
        );
        let options = ref_update_push(
            reference.as_str(),
            params.new_value.as_ref(),
            params.old_value.as_ref(),
            push_environment(&self.env_prefix, &params.write),
        );
        shared.push(options, cancel).await.map_err(Error::git(OP))?;

        if let Err(e) = shared.close() {
            debug!(error = %e, "failed to remove working copy");
        }
        Ok(())
    }
}
