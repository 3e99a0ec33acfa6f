//! service::params
//!
//! Parameter envelopes shared by every operation, and the push environment
//! derived from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::Error;

/// Name and email of a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Parameters of every read operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadParams {
    pub repo_uid: String,
}

impl ReadParams {
    pub fn new(repo_uid: impl Into<String>) -> Self {
        Self {
            repo_uid: repo_uid.into(),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.repo_uid.is_empty() {
            return Err(Error::InvalidArgument(
                "repository id cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters of every write operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteParams {
    pub repo_uid: String,
    /// The principal performing the write.
    pub actor: Identity,
    /// Extra variables handed to the push, and thereby to server hooks.
    pub env_vars: BTreeMap<String, String>,
}

impl WriteParams {
    pub fn new(repo_uid: impl Into<String>, actor: Identity) -> Self {
        Self {
            repo_uid: repo_uid.into(),
            actor,
            env_vars: BTreeMap::new(),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        ReadParams::new(self.repo_uid.as_str()).validate()?;
        if self.actor.name.is_empty() || self.actor.email.is_empty() {
            return Err(Error::InvalidArgument(
                "actor name and email cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Environment for a push performed on behalf of `params`.
///
/// Variables are named `<prefix>_...`; the actor also becomes the git
/// author and committer.
pub(crate) fn push_environment(prefix: &str, params: &WriteParams) -> Vec<(String, String)> {
    let mut env = vec![
        (format!("{prefix}_REPO_UID"), params.repo_uid.clone()),
        (format!("{prefix}_PRINCIPAL_NAME"), params.actor.name.clone()),
        (format!("{prefix}_PRINCIPAL_EMAIL"), params.actor.email.clone()),
        ("GIT_AUTHOR_NAME".to_string(), params.actor.name.clone()),
        ("GIT_AUTHOR_EMAIL".to_string(), params.actor.email.clone()),
        ("GIT_COMMITTER_NAME".to_string(), params.actor.name.clone()),
        ("GIT_COMMITTER_EMAIL".to_string(), params.actor.email.clone()),
    ];
    env.extend(
        params
            .env_vars
            .iter()
            .map(|(key, value)| (format!("{prefix}_{key}"), value.clone())),
    );
    env
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor() -> Identity {
        Identity::new("Ada", "ada@example.com")
    }

    #[test]
    fn read_requires_repo_uid() {
        assert!(ReadParams::new("acme").validate().is_ok());
        assert!(ReadParams::default().validate().is_err());
    }

    #[test]
    fn write_requires_actor() {
        assert!(WriteParams::new("acme", actor()).validate().is_ok());
        assert!(WriteParams::new("", actor()).validate().is_err());
        assert!(WriteParams::new("acme", Identity::new("", "x@example.com"))
            .validate()
            .is_err());
    }

    #[test]
    fn push_environment_names() {
        let mut params = WriteParams::new("acme", actor());
        params.env_vars.insert("REQUEST_ID".into(), "r-1".into());

        let env = push_environment("REFKEEP", &params);
        let get = |key: &str| {
            env.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("REFKEEP_REPO_UID"), Some("acme"));
        assert_eq!(get("REFKEEP_PRINCIPAL_NAME"), Some("Ada"));
        assert_eq!(get("REFKEEP_PRINCIPAL_EMAIL"), Some("ada@example.com"));
        assert_eq!(get("GIT_COMMITTER_EMAIL"), Some("ada@example.com"));
        assert_eq!(get("REFKEEP_REQUEST_ID"), Some("r-1"));
        assert_eq!(get("REQUEST_ID"), None);
    }
}
