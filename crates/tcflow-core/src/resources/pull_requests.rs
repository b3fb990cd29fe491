//! `feature_pull_requests`: pull-request integration build feature

use super::{
    Declared, Reconciler, ResourceKind, absent_if_not_found, ensure_build_type, ignore_not_found,
};
use crate::error::{ReconcileError, Result};
use crate::model::{
    AuthorRole, BuildFeature, FeatureOptions, GithubAuth, GithubPullRequests, PullRequestsOptions,
    PullRequestsProvider,
};
use crate::remote::Remote;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Code hosting provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Hosting {
    Github,
}

impl Hosting {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hosting::Github => "github",
        }
    }
}

impl FromStr for Hosting {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("github") {
            Ok(Hosting::Github)
        } else {
            Err(ReconcileError::InvalidConfig(format!(
                "hosting must be 'github', got '{}'",
                s
            )))
        }
    }
}

impl TryFrom<String> for Hosting {
    type Error = ReconcileError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Hosting> for String {
    fn from(hosting: Hosting) -> Self {
        hosting.as_str().to_string()
    }
}

/// How TeamCity authenticates against the hosting provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AuthType {
    Token,
    Password,
}

impl AuthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::Token => "token",
            AuthType::Password => "password",
        }
    }
}

impl FromStr for AuthType {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "token" => Ok(AuthType::Token),
            "password" => Ok(AuthType::Password),
            _ => Err(ReconcileError::InvalidConfig(format!(
                "auth_type must be 'token' or 'password', got '{}'",
                s
            ))),
        }
    }
}

impl TryFrom<String> for AuthType {
    type Error = ReconcileError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AuthType> for String {
    fn from(auth_type: AuthType) -> Self {
        auth_type.as_str().to_string()
    }
}

/// GitHub settings of a pull-request feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GithubBlock {
    pub auth_type: AuthType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Write-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Write-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl GithubBlock {
    pub fn token(access_token: impl Into<String>) -> Self {
        Self {
            auth_type: AuthType::Token,
            username: None,
            password: None,
            access_token: Some(access_token.into()),
        }
    }

    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            auth_type: AuthType::Password,
            username: Some(username.into()),
            password: Some(password.into()),
            access_token: None,
        }
    }

    /// Resolve the block into exactly one authentication mode.
    fn to_auth(&self) -> Result<GithubAuth> {
        match self.auth_type {
            AuthType::Token => {
                if self.username.is_some() || self.password.is_some() {
                    return Err(ReconcileError::InvalidConfig(
                        "github.username and github.password cannot be set when auth_type is token"
                            .to_string(),
                    ));
                }
                Ok(GithubAuth::Token {
                    access_token: required(&self.access_token, "github.access_token")?,
                })
            }
            AuthType::Password => {
                if self.access_token.is_some() {
                    return Err(ReconcileError::InvalidConfig(
                        "github.access_token cannot be set when auth_type is password".to_string(),
                    ));
                }
                Ok(GithubAuth::Password {
                    username: required(&self.username, "github.username")?,
                    password: required(&self.password, "github.password")?,
                })
            }
        }
    }
}

fn required(value: &Option<String>, field: &str) -> Result<String> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ReconcileError::InvalidConfig(format!("{} is required", field))),
    }
}

/// Declared pull-request feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PullRequestsConfig {
    pub build_config_id: String,

    pub hosting: Hosting,

    pub filter_author_role: AuthorRole,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GithubBlock>,
}

impl PullRequestsConfig {
    /// Remote payload for this record
    pub fn to_feature(&self) -> Result<BuildFeature> {
        let provider = match self.hosting {
            Hosting::Github => {
                let github = self.github.as_ref().ok_or_else(|| {
                    ReconcileError::InvalidConfig(
                        "a github block is required when hosting is github".to_string(),
                    )
                })?;
                PullRequestsProvider::Github(GithubPullRequests {
                    auth: github.to_auth()?,
                    filter_author_role: self.filter_author_role.as_str().to_string(),
                })
            }
        };

        Ok(BuildFeature::new(
            &self.build_config_id,
            FeatureOptions::PullRequests(PullRequestsOptions { provider }),
        ))
    }
}

impl Declared for PullRequestsConfig {
    fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if let Some(github) = copy.github.as_mut() {
            github.password = None;
            github.access_token = None;
        }
        copy
    }
}

pub struct PullRequestsReconciler;

#[async_trait]
impl Reconciler for PullRequestsReconciler {
    type Config = PullRequestsConfig;

    fn kind(&self) -> ResourceKind {
        ResourceKind::FeaturePullRequests
    }

    async fn create(&self, remote: &dyn Remote, config: &PullRequestsConfig) -> Result<String> {
        let feature = config.to_feature()?;
        ensure_build_type(remote, &config.build_config_id).await?;

        let id = remote
            .features()
            .create(&config.build_config_id, &feature)
            .await?;

        tracing::info!(
            "Created pull-request feature {} on build configuration {}",
            id,
            config.build_config_id
        );
        Ok(id)
    }

    async fn read(
        &self,
        remote: &dyn Remote,
        id: &str,
        prior: &PullRequestsConfig,
    ) -> Result<Option<PullRequestsConfig>> {
        let fetched = remote.features().get_by_id(&prior.build_config_id, id).await;
        let Some(feature) = absent_if_not_found(fetched)? else {
            return Ok(None);
        };

        let opts = match feature.options {
            FeatureOptions::PullRequests(opts) => opts,
            other => {
                return Err(ReconcileError::UnexpectedEntity(format!(
                    "feature {} is not a pull-request feature: {:?}",
                    id, other
                )));
            }
        };

        let PullRequestsProvider::Github(github) = opts.provider;
        let username = match &github.auth {
            GithubAuth::Password { username, .. } => Some(username.clone()),
            GithubAuth::Token { .. } => None,
        };
        let auth_type = match github.auth {
            GithubAuth::Token { .. } => AuthType::Token,
            GithubAuth::Password { .. } => AuthType::Password,
        };

        Ok(Some(PullRequestsConfig {
            build_config_id: feature.build_type_id,
            hosting: Hosting::Github,
            filter_author_role: github
                .filter_author_role
                .parse()
                .unwrap_or(prior.filter_author_role),
            github: Some(GithubBlock {
                auth_type,
                username,
                password: None,
                access_token: None,
            }),
        }))
    }

    async fn delete(
        &self,
        remote: &dyn Remote,
        id: &str,
        prior: &PullRequestsConfig,
    ) -> Result<()> {
        tracing::debug!("Deleting pull-request feature {}", id);
        ignore_not_found(remote.features().delete(&prior.build_config_id, id).await)
    }
}
