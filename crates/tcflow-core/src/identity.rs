//! Resource identity encoding
//!
//! Triggers and build features are keyed by the id TeamCity hands back.
//! SSH keys have no native id, so one is forged from the internal project id
//! scraped from the admin UI and the key name. The separator is part of the
//! persisted state format and must not change.

use std::fmt;

/// Separator between the project internal id and the key name.
pub const SSH_KEY_SEPARATOR: &str = "___ssh_key___";

/// Composite identity of an uploaded SSH key
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SshKeyId {
    /// Internal project id (e.g. `project12`), not the external project id
    pub project_internal_id: String,

    /// Key name as uploaded
    pub name: String,
}

impl SshKeyId {
    pub fn new(project_internal_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            project_internal_id: project_internal_id.into(),
            name: name.into(),
        }
    }

    /// Split a stored identity back into its parts.
    ///
    /// An identity without the separator yields two empty parts instead of an
    /// error, so destroying half-created state stays possible.
    pub fn parse(id: &str) -> Self {
        match id.split_once(SSH_KEY_SEPARATOR) {
            Some((project_internal_id, name)) => Self::new(project_internal_id, name),
            None => Self::default(),
        }
    }

    /// Whether both parts were recovered.
    pub fn is_complete(&self) -> bool {
        !self.project_internal_id.is_empty() && !self.name.is_empty()
    }
}

impl fmt::Display for SshKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.project_internal_id, SSH_KEY_SEPARATOR, self.name
        )
    }
}

impl From<SshKeyId> for String {
    fn from(id: SshKeyId) -> Self {
        id.to_string()
    }
}
