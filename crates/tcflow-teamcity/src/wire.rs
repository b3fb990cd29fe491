//! JSON representation of triggers and build features
//!
//! TeamCity sends both as a typed envelope with a flat list of string
//! properties. Secure properties (`secure:*`) come back without a value.

use crate::error::{Result, TeamCityError};
use serde::{Deserialize, Serialize};
use tcflow_core::model::{
    BuildFeature, FeatureOptions, GithubAuth, GithubPullRequests, PULL_REQUESTS_FEATURE_TYPE,
    PullRequestsOptions, PullRequestsProvider, QuietPeriod, SSH_AGENT_FEATURE_TYPE,
    SshAgentOptions, Trigger, TriggerOptions, VCS_TRIGGER_TYPE, VcsTriggerOptions,
};

// VCS trigger
const TRIGGER_RULES: &str = "triggerRules";
const BRANCH_FILTER: &str = "branchFilter";
const QUIET_PERIOD_MODE: &str = "quietPeriodMode";
const QUIET_PERIOD: &str = "quietPeriod";
const QUEUE_OPTIMIZATION: &str = "enableQueueOptimization";

// Pull requests
const PROVIDER_TYPE: &str = "providerType";
const AUTHENTICATION_TYPE: &str = "authenticationType";
const ACCESS_TOKEN: &str = "secure:accessToken";
const USERNAME: &str = "username";
const PASSWORD: &str = "secure:password";
const FILTER_AUTHOR_ROLE: &str = "filterAuthorRole";
const GITHUB: &str = "github";

// SSH agent
const SSH_KEY: &str = "teamcitySshKey";

/// Trigger or feature envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub entity_type: String,

    /// Omitted by the server when false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,

    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    #[serde(default)]
    pub property: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,

    #[serde(default)]
    pub value: String,
}

impl Properties {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.property
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    fn push(&mut self, name: &str, value: impl Into<String>) {
        self.property.push(Property {
            name: name.to_string(),
            value: value.into(),
        });
        self.count = Some(self.property.len());
    }

    fn lines(&self, name: &str) -> Vec<String> {
        self.get(name)
            .map(|value| {
                value
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl WireEntity {
    fn new(entity_type: &str, disabled: bool) -> Self {
        Self {
            id: None,
            entity_type: entity_type.to_string(),
            disabled: Some(disabled),
            properties: Properties::default(),
        }
    }
}

// ============ Triggers ============

pub fn encode_trigger(trigger: &Trigger) -> Result<WireEntity> {
    let TriggerOptions::Vcs(opts) = &trigger.options else {
        return Err(TeamCityError::Unsupported(format!(
            "cannot create trigger of type '{}'",
            trigger.trigger_type()
        )));
    };

    let mut wire = WireEntity::new(VCS_TRIGGER_TYPE, trigger.disabled);
    let props = &mut wire.properties;
    if !opts.rules.is_empty() {
        props.push(TRIGGER_RULES, opts.rules.join("\n"));
    }
    if !opts.branch_filter.is_empty() {
        props.push(BRANCH_FILTER, opts.branch_filter.join("\n"));
    }
    props.push(QUIET_PERIOD_MODE, opts.quiet_period.mode_name());
    if let QuietPeriod::Custom { seconds } = opts.quiet_period {
        props.push(QUIET_PERIOD, seconds.to_string());
    }
    props.push(QUEUE_OPTIMIZATION, opts.queue_optimization.to_string());
    Ok(wire)
}

pub fn decode_trigger(build_type_id: &str, wire: WireEntity) -> Trigger {
    let options = if wire.entity_type == VCS_TRIGGER_TYPE {
        let props = &wire.properties;
        let quiet_period = match props.get(QUIET_PERIOD_MODE) {
            Some("USE_DEFAULT") => QuietPeriod::UseDefault,
            Some("USE_CUSTOM") => QuietPeriod::Custom {
                seconds: props
                    .get(QUIET_PERIOD)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_default(),
            },
            _ => QuietPeriod::DoNotUse,
        };
        TriggerOptions::Vcs(VcsTriggerOptions {
            rules: props.lines(TRIGGER_RULES),
            branch_filter: props.lines(BRANCH_FILTER),
            quiet_period,
            queue_optimization: props.get(QUEUE_OPTIMIZATION) == Some("true"),
        })
    } else {
        TriggerOptions::Other {
            trigger_type: wire.entity_type.clone(),
        }
    };

    Trigger {
        id: wire.id,
        build_type_id: build_type_id.to_string(),
        disabled: wire.disabled.unwrap_or(false),
        options,
    }
}

// ============ Build features ============

pub fn encode_feature(feature: &BuildFeature) -> Result<WireEntity> {
    let mut wire = WireEntity::new(feature.feature_type(), feature.disabled);
    let props = &mut wire.properties;

    match &feature.options {
        FeatureOptions::PullRequests(opts) => {
            let PullRequestsProvider::Github(github) = &opts.provider;
            props.push(PROVIDER_TYPE, GITHUB);
            props.push(AUTHENTICATION_TYPE, github.auth.auth_type());
            match &github.auth {
                GithubAuth::Token { access_token } => {
                    props.push(ACCESS_TOKEN, access_token.as_str());
                }
                GithubAuth::Password { username, password } => {
                    props.push(USERNAME, username.as_str());
                    props.push(PASSWORD, password.as_str());
                }
            }
            props.push(FILTER_AUTHOR_ROLE, github.filter_author_role.as_str());
        }
        FeatureOptions::SshAgent(opts) => {
            props.push(SSH_KEY, opts.ssh_key.as_str());
        }
        FeatureOptions::Other { feature_type } => {
            return Err(TeamCityError::Unsupported(format!(
                "cannot create build feature of type '{}'",
                feature_type
            )));
        }
    }
    Ok(wire)
}

pub fn decode_feature(build_type_id: &str, wire: WireEntity) -> Result<BuildFeature> {
    let props = &wire.properties;
    let options = match wire.entity_type.as_str() {
        PULL_REQUESTS_FEATURE_TYPE => {
            FeatureOptions::PullRequests(decode_pull_requests(wire.id.as_deref(), props)?)
        }
        SSH_AGENT_FEATURE_TYPE => FeatureOptions::SshAgent(SshAgentOptions {
            ssh_key: props.get(SSH_KEY).unwrap_or_default().to_string(),
        }),
        other => FeatureOptions::Other {
            feature_type: other.to_string(),
        },
    };

    Ok(BuildFeature {
        id: wire.id,
        build_type_id: build_type_id.to_string(),
        disabled: wire.disabled.unwrap_or(false),
        options,
    })
}

fn decode_pull_requests(id: Option<&str>, props: &Properties) -> Result<PullRequestsOptions> {
    let id = id.unwrap_or("<new>");
    let provider = props.get(PROVIDER_TYPE).unwrap_or_default();
    if provider != GITHUB {
        return Err(TeamCityError::Unsupported(format!(
            "pull request feature {} uses provider '{}'",
            id, provider
        )));
    }

    let secret = |name: &str| props.get(name).unwrap_or_default().to_string();
    let auth = match props.get(AUTHENTICATION_TYPE) {
        Some("token") => GithubAuth::Token {
            access_token: secret(ACCESS_TOKEN),
        },
        Some("password") => GithubAuth::Password {
            username: secret(USERNAME),
            password: secret(PASSWORD),
        },
        other => {
            return Err(TeamCityError::Unsupported(format!(
                "pull request feature {} uses authentication type '{}'",
                id,
                other.unwrap_or_default()
            )));
        }
    };

    Ok(PullRequestsOptions {
        provider: PullRequestsProvider::Github(GithubPullRequests {
            auth,
            filter_author_role: props.get(FILTER_AUTHOR_ROLE).unwrap_or_default().to_string(),
        }),
    })
}
