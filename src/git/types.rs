//! git::types
//!
//! Value types exchanged with the Git backend.
//!
//! Everything in here is plain data: walk entries and their fields, the
//! instructions a walk instructor can return, raw object records as read
//! from the object database, and the per-operation option bags for walks,
//! pushes and tag creation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::types::Oid;

/// Kind of a git object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Commit,
    Tree,
    Blob,
    Tag,
}

impl ObjectType {
    /// The name git uses for this object type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Commit => "commit",
            ObjectType::Tree => "tree",
            ObjectType::Blob => "blob",
            ObjectType::Tag => "tag",
        }
    }

    pub(crate) fn from_git2(kind: Option<git2::ObjectType>) -> Option<Self> {
        match kind? {
            git2::ObjectType::Commit => Some(ObjectType::Commit),
            git2::ObjectType::Tree => Some(ObjectType::Tree),
            git2::ObjectType::Blob => Some(ObjectType::Blob),
            git2::ObjectType::Tag => Some(ObjectType::Tag),
            git2::ObjectType::Any => None,
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "commit" => Ok(ObjectType::Commit),
            "tree" => Ok(ObjectType::Tree),
            "blob" => Ok(ObjectType::Blob),
            "tag" => Ok(ObjectType::Tag),
            other => Err(format!("unknown object type '{other}'")),
        }
    }
}

/// A field that can be requested for every reference in a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceField {
    /// Full reference name (`refs/tags/v1`)
    RefName,
    /// Type of the object the reference points at
    ObjectType,
    /// SHA of the object the reference points at
    ObjectName,
    /// Type of the object an annotated tag points at; empty otherwise
    PeeledObjectType,
    /// Creator date as unix seconds
    CreatorDate,
}

impl ReferenceField {
    /// The `for-each-ref` format atom producing this field.
    pub fn format_atom(&self) -> &'static str {
        match self {
            ReferenceField::RefName => "%(refname)",
            ReferenceField::ObjectType => "%(objecttype)",
            ReferenceField::ObjectName => "%(objectname)",
            ReferenceField::PeeledObjectType => "%(*objecttype)",
            ReferenceField::CreatorDate => "%(creatordate:unix)",
        }
    }
}

impl std::fmt::Display for ReferenceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReferenceField::RefName => "refname",
            ReferenceField::ObjectType => "objecttype",
            ReferenceField::ObjectName => "objectname",
            ReferenceField::PeeledObjectType => "*objecttype",
            ReferenceField::CreatorDate => "creatordate",
        };
        f.write_str(name)
    }
}

/// One reference produced by a walk.
///
/// Only the requested fields are present.
pub type WalkEntry = HashMap<ReferenceField, String>;

/// Verdict of a walk instructor for a single entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkInstruction {
    /// Deliver the entry to the handler.
    Handle,
    /// Drop the entry and continue.
    Skip,
    /// Drop the entry and end the walk.
    Stop,
}

/// Sort key of a reference walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WalkSort {
    /// Whatever the backend produces (by name for `for-each-ref`).
    #[default]
    Default,
    RefName,
    CreatorDate,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Default,
    Asc,
    Desc,
}

/// Options of a reference walk, minus the instructor.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Glob patterns; empty means every reference.
    pub patterns: Vec<String>,
    pub sort: WalkSort,
    pub order: SortOrder,
    /// Fields to load per entry.
    pub fields: Vec<ReferenceField>,
    /// Maximum number of entries git produces; 0 means unlimited.
    pub max_walk_distance: u32,
}

/// Identity and timestamp as stored in a commit or tag object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSignature {
    pub name: String,
    pub email: String,
    /// Seconds since the unix epoch.
    pub seconds: i64,
    /// Timezone offset in minutes east of UTC.
    pub offset_minutes: i32,
}

/// An annotated tag object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedTag {
    /// SHA of the tag object itself.
    pub sha: Oid,
    /// Name stored in the tag object.
    pub name: String,
    pub target_sha: Oid,
    pub target_type: ObjectType,
    /// First line of the message.
    pub title: String,
    /// Full message without the trailing newline.
    pub message: String,
    pub tagger: Option<RawSignature>,
}

/// A commit object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommit {
    pub sha: Oid,
    /// First line of the message.
    pub title: String,
    pub message: String,
    pub author: RawSignature,
    pub committer: RawSignature,
    pub parent_shas: Vec<Oid>,
}

/// Information about an opened repository.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    pub path: PathBuf,
    /// The repository has no commits on any branch.
    pub is_empty: bool,
}

/// Options for creating a tag.
#[derive(Debug, Clone)]
pub struct CreateTagOptions {
    /// Empty for a lightweight tag.
    pub message: String,
    pub tagger: RawSignature,
}

/// Options of a single push.
///
/// Lives only for the duration of the push it describes.
#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    /// Path or URL of the remote.
    pub remote: String,
    /// Refspec (`src:dst`, or `:dst` for deletion).
    pub refspec: String,
    /// Push unconditionally.
    pub force: bool,
    /// `<ref>:<expected>` precondition; takes precedence over `force`.
    pub force_with_lease: Option<String>,
    /// Extra environment for the push (and the hooks it triggers).
    pub env: Vec<(String, String)>,
}

/// Split a raw message into its title line and the message without the
/// trailing newline.
pub(crate) fn split_message(raw: &str) -> (String, String) {
    let message = raw.trim_end_matches('\n').to_string();
    let title = message.lines().next().unwrap_or("").to_string();
    (title, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_type_parse() {
        for kind in [
            ObjectType::Commit,
            ObjectType::Tree,
            ObjectType::Blob,
            ObjectType::Tag,
        ] {
            assert_eq!(kind.as_str().parse::<ObjectType>().unwrap(), kind);
        }
        assert!("submodule".parse::<ObjectType>().is_err());
    }

    #[test]
    fn object_type_from_git2() {
        assert_eq!(
            ObjectType::from_git2(Some(git2::ObjectType::Tag)),
            Some(ObjectType::Tag)
        );
        assert_eq!(ObjectType::from_git2(Some(git2::ObjectType::Any)), None);
        assert_eq!(ObjectType::from_git2(None), None);
    }

    #[test]
    fn split_message_single_line() {
        let (title, message) = split_message("release\n");
        assert_eq!(title, "release");
        assert_eq!(message, "release");
    }

    #[test]
    fn split_message_multi_line() {
        let (title, message) = split_message("v2.0\n\nBreaking changes.\n");
        assert_eq!(title, "v2.0");
        assert_eq!(message, "v2.0\n\nBreaking changes.");
    }

    #[test]
    fn split_message_empty() {
        assert_eq!(split_message(""), (String::new(), String::new()));
    }
}
