//! service::tag
//!
//! Listing, creation and deletion of tags that resolve to commits.
//!
//! # Listing
//!
//! A listing is one reference walk over `refs/tags/` followed by at most
//! two batched object reads:
//!
//! 1. the walk yields provisional tags (name, walked SHA, annotated flag),
//!    paginated over the entries that can end up in the result
//! 2. every annotated tag object is read in one call and folded back in
//!    walk order; annotations of anything but a commit are dropped
//! 3. optionally, every resulting commit is read in one call
//!
//! Any failure along the way fails the listing as a whole.

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, trace};

use super::error::Error;
use super::mapping::{
    map_annotated_tag, map_commit, map_signature, to_raw_signature, CommitTag,
};
use super::params::{push_environment, Identity, ReadParams, WriteParams};
use super::Service;
use crate::core::query::walk_patterns;
use crate::core::refpath::TAG_PREFIX;
use crate::core::types::{Oid, RefName};
use crate::git::{
    AnnotatedTag, CancelToken, CreateTagOptions, GitError, ObjectType, ReferenceField,
    SortOrder, WalkEntry, WalkInstruction, WalkOptions, WalkSort,
};
use crate::walk::{paginate, ObjectTypeFilter, WalkError, WalkInstructor};

/// Sort key of a tag listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagSortOption {
    /// By name.
    #[default]
    Default,
    Name,
    /// By creator date.
    Date,
}

impl TagSortOption {
    fn walk_sort(self) -> WalkSort {
        match self {
            TagSortOption::Default => WalkSort::Default,
            TagSortOption::Name => WalkSort::RefName,
            TagSortOption::Date => WalkSort::CreatorDate,
        }
    }
}

/// Parameters of [`Service::list_commit_tags`].
#[derive(Debug, Clone, Default)]
pub struct ListCommitTagsParams {
    pub read: ReadParams,
    /// Free-text name filter; `^` and `$` anchor it.
    pub query: String,
    pub sort: TagSortOption,
    pub order: SortOrder,
    /// 1-based page.
    pub page: i32,
    /// Tags per page; below 1 lists everything.
    pub page_size: i32,
    /// Attach the commit each tag resolves to.
    pub include_commit: bool,
}

/// Parameters of [`Service::create_commit_tag`].
#[derive(Debug, Clone)]
pub struct CreateCommitTagParams {
    pub write: WriteParams,
    pub name: String,
    /// Branch, tag or SHA resolving to the commit to tag.
    pub target: String,
    /// Empty for a lightweight tag.
    pub message: String,
    /// Defaults to the actor.
    pub tagger: Option<Identity>,
    /// Defaults to now.
    pub tagger_date: Option<DateTime<FixedOffset>>,
}

/// Reject names that don't make a well-formed `refs/tags/<name>`.
fn validate_tag_name(name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::InvalidArgument("tag name cannot be empty".to_string()));
    }
    RefName::new(format!("{TAG_PREFIX}{name}"))?;
    Ok(())
}

impl CreateCommitTagParams {
    pub fn validate(&self) -> Result<(), Error> {
        self.write.validate()?;
        validate_tag_name(&self.name)?;
        if self.target.trim().is_empty() {
            return Err(Error::InvalidArgument("target cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Parameters of [`Service::delete_tag`].
#[derive(Debug, Clone)]
pub struct DeleteTagParams {
    pub write: WriteParams,
    pub name: String,
}

impl DeleteTagParams {
    pub fn validate(&self) -> Result<(), Error> {
        self.write.validate()?;
        validate_tag_name(&self.name)
    }
}

const TAG_FIELDS: [ReferenceField; 4] = [
    ReferenceField::RefName,
    ReferenceField::ObjectType,
    ReferenceField::ObjectName,
    ReferenceField::PeeledObjectType,
];

/// Hands out tags that resolve to a commit.
///
/// Annotated tags whose peeled type is known and isn't a commit are skipped
/// here so they never take a page slot.
struct CommitTagFilter {
    types: ObjectTypeFilter,
}

impl CommitTagFilter {
    fn new() -> Self {
        Self {
            types: ObjectTypeFilter::new([ObjectType::Commit, ObjectType::Tag]),
        }
    }
}

impl WalkInstructor for CommitTagFilter {
    fn instruct(&mut self, entry: &WalkEntry) -> Result<WalkInstruction, WalkError> {
        let verdict = self.types.instruct(entry)?;
        if verdict != WalkInstruction::Handle {
            return Ok(verdict);
        }
        let peeled = entry
            .get(&ReferenceField::PeeledObjectType)
            .map(String::as_str)
            .unwrap_or("");
        if !peeled.is_empty() && peeled != ObjectType::Commit.as_str() {
            return Ok(WalkInstruction::Skip);
        }
        Ok(WalkInstruction::Handle)
    }
}

fn entry_field(entry: &WalkEntry, field: ReferenceField) -> Result<&str, GitError> {
    entry
        .get(&field)
        .map(String::as_str)
        .ok_or(GitError::Walk(WalkError::MissingField(field)))
}

/// A tag as walked: the SHA of an annotated tag is still its tag object's.
fn provisional_tag(entry: &WalkEntry) -> Result<CommitTag, GitError> {
    let refname = entry_field(entry, ReferenceField::RefName)?;
    let sha = Oid::new(entry_field(entry, ReferenceField::ObjectName)?)?;
    let is_annotated = entry_field(entry, ReferenceField::ObjectType)? == ObjectType::Tag.as_str();

    Ok(CommitTag {
        name: refname.strip_prefix(TAG_PREFIX).unwrap_or(refname).to_string(),
        sha,
        is_annotated,
        title: String::new(),
        message: String::new(),
        tagger: None,
        commit: None,
    })
}

/// Fold annotations into the walked tags.
///
/// `annotated` holds one record per annotated tag in `tags`, in the same
/// order. Names always stay the ref's.
fn reconcile(tags: Vec<CommitTag>, annotated: Vec<AnnotatedTag>) -> Result<Vec<CommitTag>, Error> {
    let mut annotated = annotated.into_iter();
    let mut result = Vec::with_capacity(tags.len());

    for mut tag in tags {
        if !tag.is_annotated {
            result.push(tag);
            continue;
        }
        let annotation = annotated.next().ok_or_else(|| {
            Error::internal(
                "ListCommitTags",
                format!("missing annotated tag object for '{}'", tag.name),
            )
        })?;
        if annotation.target_type != ObjectType::Commit {
            continue;
        }
        tag.tagger = annotation.tagger.as_ref().map(map_signature).transpose()?;
        tag.sha = annotation.target_sha;
        tag.title = annotation.title;
        tag.message = annotation.message;
        result.push(tag);
    }
    Ok(result)
}

fn tag_exists(name: &str) -> impl FnOnce(GitError) -> Error + '_ {
    move |err| match err {
        GitError::AlreadyExists { .. } => Error::Conflict(format!("tag '{name}' already exists")),
        err => Error::git("CreateCommitTag")(err),
    }
}

impl Service {
    /// Tags resolving to commits, in walk order.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for an empty repository id or a page that
    ///   overflows
    /// - `NotFound` if the repository doesn't exist
    /// - `Internal` for malformed walk entries or unmappable objects; no
    ///   partial result is returned
    pub async fn list_commit_tags(
        &self,
        params: &ListCommitTagsParams,
        cancel: &CancelToken,
    ) -> Result<Vec<CommitTag>, Error> {
        const OP: &str = "ListCommitTags";

        params.read.validate()?;
        let mut instructor = paginate(CommitTagFilter::new(), params.page, params.page_size)
            .map_err(|e| Error::InvalidArgument(format!("invalid pagination details: {e}")))?;
        let repo_path = self.repo_path(&params.read.repo_uid);

        let options = WalkOptions {
            patterns: walk_patterns(TAG_PREFIX, &params.query),
            sort: params.sort.walk_sort(),
            order: params.order,
            fields: TAG_FIELDS.to_vec(),
            max_walk_distance: 0,
        };

        let mut tags = Vec::new();
        let mut handler = |entry: WalkEntry| -> Result<(), GitError> {
            tags.push(provisional_tag(&entry)?);
            Ok(())
        };
        self.backend
            .walk_references(&repo_path, &options, &mut instructor, &mut handler, cancel)
            .await
            .map_err(Error::git(OP))?;
        trace!(count = tags.len(), "walked tags");

        let annotated_shas: Vec<Oid> = tags
            .iter()
            .filter(|tag| tag.is_annotated)
            .map(|tag| tag.sha.clone())
            .collect();
        let annotated = if annotated_shas.is_empty() {
            Vec::new()
        } else {
            self.backend
                .get_annotated_tags(&repo_path, &annotated_shas)
                .await
                .map_err(Error::git(OP))?
        };
        if annotated.len() != annotated_shas.len() {
            return Err(Error::internal(
                OP,
                format!(
                    "expected {} annotated tags, got {}",
                    annotated_shas.len(),
                    annotated.len()
                ),
            ));
        }
        let mut tags = reconcile(tags, annotated)?;

        if params.include_commit && !tags.is_empty() {
            let shas: Vec<Oid> = tags.iter().map(|tag| tag.sha.clone()).collect();
            let commits = self
                .backend
                .get_commits(&repo_path, &shas)
                .await
                .map_err(Error::git(OP))?;
            if commits.len() != tags.len() {
                return Err(Error::internal(
                    OP,
                    format!("expected {} commits, got {}", tags.len(), commits.len()),
                ));
            }
            for (tag, commit) in tags.iter_mut().zip(&commits) {
                tag.commit = Some(map_commit(commit)?);
            }
        }

        Ok(tags)
    }

    /// Tag a commit and publish the tag.
    ///
    /// A non-empty message makes an annotated tag. The returned tag has its
    /// commit attached.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the target doesn't resolve to a commit
    /// - `Conflict` if the tag already exists
    pub async fn create_commit_tag(
        &self,
        params: &CreateCommitTagParams,
        cancel: &CancelToken,
    ) -> Result<CommitTag, Error> {
        const OP: &str = "CreateCommitTag";

        params.validate()?;
        let repo_path = self.repo_path(&params.write.repo_uid);
        let repo = self
            .backend
            .open_repository(&repo_path)
            .await
            .map_err(Error::git(OP))?;

        let shared = self
            .shared_repo(&params.write.repo_uid, &repo.path)
            .map_err(Error::git(OP))?;
        shared
            .clone_from_remote(None, cancel)
            .await
            .map_err(Error::git(OP))?;

        let target = params.target.trim();
        let commit = self
            .backend
            .get_commit(shared.path(), target)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    Error::NotFound(format!("target '{target}' doesn't exist"))
                } else {
                    Error::git(OP)(e)
                }
            })?;

        let tagger = params.tagger.as_ref().unwrap_or(&params.write.actor);
        let when = params.tagger_date.unwrap_or_else(|| Utc::now().into());
        let options = CreateTagOptions {
            message: params.message.clone(),
            tagger: to_raw_signature(tagger, when),
        };
        debug!(
            repo_uid = %params.write.repo_uid,
            tag = %params.name,
            target = %commit.sha,
            annotated = !options.message.is_empty(),
            "creating tag"
        );
        self.backend
            .create_tag(shared.path(), &params.name, &commit.sha, &options)
            .await
            .map_err(tag_exists(&params.name))?;
        shared
            .push_tag(
                &params.name,
                push_environment(&self.env_prefix, &params.write),
                cancel,
            )
            .await
            .map_err(tag_exists(&params.name))?;
        if let Err(e) = shared.close() {
            debug!(error = %e, "failed to remove working copy");
        }

        let mut tag = if options.message.is_empty() {
            CommitTag {
                name: params.name.clone(),
                sha: commit.sha.clone(),
                is_annotated: false,
                title: String::new(),
                message: String::new(),
                tagger: None,
                commit: None,
            }
        } else {
            let annotated = self
                .backend
                .get_annotated_tag(&repo.path, &params.name)
                .await
                .map_err(Error::git(OP))?;
            let mut tag = map_annotated_tag(&annotated)?;
            tag.name = params.name.clone();
            tag
        };

        let commit = self
            .backend
            .get_commit(&repo.path, tag.sha.as_str())
            .await
            .map_err(Error::git(OP))?;
        tag.commit = Some(map_commit(&commit)?);
        Ok(tag)
    }

    /// Delete a tag from the repository.
    ///
    /// # Errors
    ///
    /// `NotFound` if the repository has no such tag.
    pub async fn delete_tag(
        &self,
        params: &DeleteTagParams,
        cancel: &CancelToken,
    ) -> Result<(), Error> {
        const OP: &str = "DeleteTag";

        params.validate()?;
        let repo_path = self.repo_path(&params.write.repo_uid);
        let repo = self
            .backend
            .open_repository(&repo_path)
            .await
            .map_err(Error::git(OP))?;

        let shared = self
            .shared_repo(&params.write.repo_uid, &repo.path)
            .map_err(Error::git(OP))?;
        shared
            .clone_from_remote(None, cancel)
            .await
            .map_err(Error::git(OP))?;

        debug!(repo_uid = %params.write.repo_uid, tag = %params.name, "deleting tag");
        shared
            .push_delete_tag(
                &params.name,
                push_environment(&self.env_prefix, &params.write),
                cancel,
            )
            .await
            .map_err(Error::git(OP))?;
        if let Err(e) = shared.close() {
            debug!(error = %e, "failed to remove working copy");
        }
        Ok(())
    }
}
