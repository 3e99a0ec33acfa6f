//! core::refpath
//!
//! Resolution of logical reference names into canonical reference paths.
//!
//! The produced strings are a wire format shared with existing repositories
//! and must match byte-for-byte:
//!
//! | type            | path                          |
//! |-----------------|-------------------------------|
//! | `raw`           | `<name>`                      |
//! | `branch`        | `refs/heads/<name>`           |
//! | `tag`           | `refs/tags/<name>`            |
//! | `pullreq-head`  | `refs/pullreq/<name>/head`    |
//! | `pullreq-merge` | `refs/pullreq/<name>/merge`   |

use super::types::{RefType, TypeError};

/// Namespace of branch references.
pub const BRANCH_PREFIX: &str = "refs/heads/";
/// Namespace of tag references.
pub const TAG_PREFIX: &str = "refs/tags/";

const PULLREQ_PREFIX: &str = "refs/pullreq/";
const PULLREQ_HEAD_SUFFIX: &str = "/head";
const PULLREQ_MERGE_SUFFIX: &str = "/merge";

/// Map a (name, type) pair to its canonical reference path.
///
/// # Errors
///
/// Returns [`TypeError::InvalidRefType`] for [`RefType::Undefined`].
///
/// # Example
///
/// ```
/// use refkeep::core::refpath::ref_path;
/// use refkeep::core::types::RefType;
///
/// assert_eq!(ref_path("main", RefType::Branch).unwrap(), "refs/heads/main");
/// assert_eq!(ref_path("7", RefType::PullReqMerge).unwrap(), "refs/pullreq/7/merge");
/// assert!(ref_path("main", RefType::Undefined).is_err());
/// ```
pub fn ref_path(name: &str, ref_type: RefType) -> Result<String, TypeError> {
    match ref_type {
        RefType::Raw => Ok(name.to_string()),
        RefType::Branch => Ok(format!("{BRANCH_PREFIX}{name}")),
        RefType::Tag => Ok(format!("{TAG_PREFIX}{name}")),
        RefType::PullReqHead => Ok(format!("{PULLREQ_PREFIX}{name}{PULLREQ_HEAD_SUFFIX}")),
        RefType::PullReqMerge => Ok(format!("{PULLREQ_PREFIX}{name}{PULLREQ_MERGE_SUFFIX}")),
        RefType::Undefined => Err(TypeError::InvalidRefType(format!(
            "provided reference type '{ref_type}' is invalid"
        ))),
    }
}
