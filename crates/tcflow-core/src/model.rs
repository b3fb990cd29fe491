//! Remote entities as TeamCity represents them
//!
//! These are transient copies fetched per operation. The options payload of
//! each entity is a tagged variant keyed by the entity's `type` discriminator,
//! so an entity can only carry the options its type allows.

use crate::error::ReconcileError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reference to a build configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTypeRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "projectId")]
    pub project_id: String,
}

/// Reference to a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "internalId")]
    pub internal_id: Option<String>,
}

// ============ Triggers ============

/// Build trigger attached to a build configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    /// Server-assigned id, `None` until created
    pub id: Option<String>,
    pub build_type_id: String,
    pub disabled: bool,
    pub options: TriggerOptions,
}

impl Trigger {
    /// New enabled VCS trigger with TeamCity's defaults
    pub fn vcs(build_type_id: impl Into<String>, rules: Vec<String>) -> Self {
        Self {
            id: None,
            build_type_id: build_type_id.into(),
            disabled: false,
            options: TriggerOptions::Vcs(VcsTriggerOptions {
                rules,
                branch_filter: Vec::new(),
                quiet_period: QuietPeriod::DoNotUse,
                queue_optimization: true,
            }),
        }
    }

    /// TeamCity `type` discriminator
    pub fn trigger_type(&self) -> &str {
        match &self.options {
            TriggerOptions::Vcs(_) => VCS_TRIGGER_TYPE,
            TriggerOptions::Other { trigger_type } => trigger_type,
        }
    }
}

pub const VCS_TRIGGER_TYPE: &str = "vcsTrigger";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOptions {
    Vcs(VcsTriggerOptions),
    /// Any trigger type this crate does not manage
    Other { trigger_type: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsTriggerOptions {
    pub rules: Vec<String>,
    pub branch_filter: Vec<String>,
    pub quiet_period: QuietPeriod,
    pub queue_optimization: bool,
}

/// Quiet period setting of a VCS trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuietPeriod {
    DoNotUse,
    UseDefault,
    Custom { seconds: u32 },
}

impl QuietPeriod {
    /// Numeric mode as used by TeamCity's trigger settings
    pub fn code(&self) -> u8 {
        match self {
            QuietPeriod::DoNotUse => 0,
            QuietPeriod::UseDefault => 1,
            QuietPeriod::Custom { .. } => 2,
        }
    }

    /// Value of the `quietPeriodMode` property
    pub fn mode_name(&self) -> &'static str {
        match self {
            QuietPeriod::DoNotUse => "DO_NOT_USE",
            QuietPeriod::UseDefault => "USE_DEFAULT",
            QuietPeriod::Custom { .. } => "USE_CUSTOM",
        }
    }
}

// ============ Build features ============

/// Build feature attached to a build configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFeature {
    pub id: Option<String>,
    pub build_type_id: String,
    pub disabled: bool,
    pub options: FeatureOptions,
}

impl BuildFeature {
    pub fn new(build_type_id: impl Into<String>, options: FeatureOptions) -> Self {
        Self {
            id: None,
            build_type_id: build_type_id.into(),
            disabled: false,
            options,
        }
    }

    /// TeamCity `type` discriminator
    pub fn feature_type(&self) -> &str {
        match &self.options {
            FeatureOptions::PullRequests(_) => PULL_REQUESTS_FEATURE_TYPE,
            FeatureOptions::SshAgent(_) => SSH_AGENT_FEATURE_TYPE,
            FeatureOptions::Other { feature_type } => feature_type,
        }
    }
}

pub const PULL_REQUESTS_FEATURE_TYPE: &str = "pullRequests";
pub const SSH_AGENT_FEATURE_TYPE: &str = "ssh-agent-build-feature";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureOptions {
    PullRequests(PullRequestsOptions),
    SshAgent(SshAgentOptions),
    Other { feature_type: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestsOptions {
    pub provider: PullRequestsProvider,
}

/// Hosting provider of a pull-request feature. Only GitHub is supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestsProvider {
    Github(GithubPullRequests),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubPullRequests {
    pub auth: GithubAuth,
    /// Raw `filterAuthorRole` value; parse with [`AuthorRole::from_str`]
    pub filter_author_role: String,
}

/// Exactly one authentication mode. Secrets read back from the server are
/// blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GithubAuth {
    Token { access_token: String },
    Password { username: String, password: String },
}

impl GithubAuth {
    pub fn auth_type(&self) -> &'static str {
        match self {
            GithubAuth::Token { .. } => "token",
            GithubAuth::Password { .. } => "password",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshAgentOptions {
    /// Name of an SSH key uploaded to the project
    pub ssh_key: String,
}

// ============ Enumerations shared with declared records ============

/// Which pull-request authors trigger builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AuthorRole {
    Member,
    MemberOrCollaborator,
    Everybody,
}

impl AuthorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorRole::Member => "MEMBER",
            AuthorRole::MemberOrCollaborator => "MEMBER_OR_COLLABORATOR",
            AuthorRole::Everybody => "EVERYBODY",
        }
    }
}

impl FromStr for AuthorRole {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MEMBER" => Ok(AuthorRole::Member),
            "MEMBER_OR_COLLABORATOR" => Ok(AuthorRole::MemberOrCollaborator),
            "EVERYBODY" => Ok(AuthorRole::Everybody),
            _ => Err(ReconcileError::InvalidConfig(format!(
                "filter_author_role must be one of MEMBER, MEMBER_OR_COLLABORATOR, EVERYBODY, got '{}'",
                s
            ))),
        }
    }
}

impl TryFrom<String> for AuthorRole {
    type Error = ReconcileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AuthorRole> for String {
    fn from(role: AuthorRole) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for AuthorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_period_codes() {
        assert_eq!(QuietPeriod::DoNotUse.code(), 0);
        assert_eq!(QuietPeriod::UseDefault.code(), 1);
        assert_eq!(QuietPeriod::Custom { seconds: 60 }.code(), 2);
    }

    #[test]
    fn test_vcs_trigger_defaults() {
        let trigger = Trigger::vcs("bt1", vec!["+:*".to_string()]);
        assert_eq!(trigger.trigger_type(), "vcsTrigger");
        assert!(!trigger.disabled);
        match trigger.options {
            TriggerOptions::Vcs(opts) => {
                assert!(opts.branch_filter.is_empty());
                assert_eq!(opts.quiet_period, QuietPeriod::DoNotUse);
                assert!(opts.queue_optimization);
            }
            other => panic!("unexpected options: {:?}", other),
        }
    }

    #[test]
    fn test_author_role_case_insensitive() {
        assert_eq!(
            "member_or_collaborator".parse::<AuthorRole>().unwrap(),
            AuthorRole::MemberOrCollaborator
        );
        assert!("OWNER".parse::<AuthorRole>().is_err());

        let role: AuthorRole = serde_json::from_str("\"everybody\"").unwrap();
        assert_eq!(role, AuthorRole::Everybody);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"EVERYBODY\"");
    }
}
