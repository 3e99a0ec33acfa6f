//! service::mapping
//!
//! Service entities and their construction from backend records.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use super::error::Error;
use super::params::Identity;
use crate::core::types::Oid;
use crate::git::{AnnotatedTag, RawCommit, RawSignature};

/// An identity at a point in time, in its original timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub identity: Identity,
    pub when: DateTime<FixedOffset>,
}

/// A commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub sha: Oid,
    pub title: String,
    pub message: String,
    pub author: Signature,
    pub committer: Signature,
    pub parent_shas: Vec<Oid>,
}

/// A tag pointing, directly or through an annotation, at a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitTag {
    /// Name without the `refs/tags/` prefix.
    pub name: String,
    /// The commit the tag resolves to.
    pub sha: Oid,
    pub is_annotated: bool,
    pub title: String,
    pub message: String,
    pub tagger: Option<Signature>,
    pub commit: Option<Commit>,
}

pub(crate) fn map_signature(raw: &RawSignature) -> Result<Signature, Error> {
    let offset = raw
        .offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            Error::internal(
                "signature mapping",
                format!("timezone offset of {} minutes is out of range", raw.offset_minutes),
            )
        })?;
    let when = DateTime::from_timestamp(raw.seconds, 0).ok_or_else(|| {
        Error::internal(
            "signature mapping",
            format!("timestamp {} is out of range", raw.seconds),
        )
    })?;

    Ok(Signature {
        identity: Identity::new(raw.name.as_str(), raw.email.as_str()),
        when: when.with_timezone(&offset),
    })
}

pub(crate) fn to_raw_signature(identity: &Identity, when: DateTime<FixedOffset>) -> RawSignature {
    RawSignature {
        name: identity.name.clone(),
        email: identity.email.clone(),
        seconds: when.timestamp(),
        offset_minutes: when.offset().local_minus_utc() / 60,
    }
}

pub(crate) fn map_commit(raw: &RawCommit) -> Result<Commit, Error> {
    Ok(Commit {
        sha: raw.sha.clone(),
        title: raw.title.clone(),
        message: raw.message.clone(),
        author: map_signature(&raw.author)?,
        committer: map_signature(&raw.committer)?,
        parent_shas: raw.parent_shas.clone(),
    })
}

/// A tag read back from its annotation; the name is the annotation's.
pub(crate) fn map_annotated_tag(tag: &AnnotatedTag) -> Result<CommitTag, Error> {
    Ok(CommitTag {
        name: tag.name.clone(),
        sha: tag.target_sha.clone(),
        is_annotated: true,
        title: tag.title.clone(),
        message: tag.message.clone(),
        tagger: tag.tagger.as_ref().map(map_signature).transpose()?,
        commit: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::ObjectType;
    use chrono::Timelike;

    fn raw(seconds: i64, offset_minutes: i32) -> RawSignature {
        RawSignature {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            seconds,
            offset_minutes,
        }
    }

    #[test]
    fn signature_keeps_offset() {
        let sig = map_signature(&raw(1_700_000_000, -300)).unwrap();
        assert_eq!(sig.when.timestamp(), 1_700_000_000);
        assert_eq!(sig.when.offset().local_minus_utc(), -300 * 60);
        assert_eq!(sig.identity, Identity::new("Ada", "ada@example.com"));
    }

    #[test]
    fn signature_rejects_bad_offset() {
        let err = map_signature(&raw(0, 24 * 60)).unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert!(map_signature(&raw(0, i32::MAX)).is_err());
    }

    #[test]
    fn signature_rejects_bad_timestamp() {
        assert!(map_signature(&raw(i64::MAX, 0)).is_err());
    }

    #[test]
    fn raw_signature_round_trips_offset() {
        let sig = map_signature(&raw(1_700_000_000, 330)).unwrap();
        let back = to_raw_signature(&sig.identity, sig.when);
        assert_eq!(back, raw(1_700_000_000, 330));
        // 2023-11-14T22:13:20Z is 03:43 the next day at +05:30
        assert_eq!((sig.when.hour(), sig.when.minute()), (3, 43));
    }

    #[test]
    fn annotated_tag_maps_target() {
        let tag = AnnotatedTag {
            sha: Oid::new("b".repeat(40)).unwrap(),
            name: "v2".into(),
            target_sha: Oid::new("c".repeat(40)).unwrap(),
            target_type: ObjectType::Commit,
            title: "release".into(),
            message: "release".into(),
            tagger: None,
        };
        let mapped = map_annotated_tag(&tag).unwrap();
        assert_eq!(mapped.sha, tag.target_sha);
        assert!(mapped.is_annotated);
        assert!(mapped.tagger.is_none());
    }
}
