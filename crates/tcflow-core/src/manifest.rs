//! Declared configuration file
//!
//! ```yaml
//! build_trigger_vcs:
//!   main:
//!     build_config_id: MyProject_Build
//!     rules: ["+:*"]
//!
//! ssh_key:
//!   deploy:
//!     project_id: MyProject
//!     name: deploy-key
//!     payload: "{{ env.DEPLOY_KEY }}"
//! ```

use crate::error::{ReconcileError, Result};
use crate::resources::{
    PullRequestsConfig, ResourceKind, SshAgentConfig, SshKeyConfig, VcsTriggerConfig,
};
use crate::state::address;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

static ENV_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*env\.(\w+)\s*\}\}").expect("env placeholder pattern is valid")
});

/// Every declared resource, grouped by kind and keyed by local name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub build_trigger_vcs: BTreeMap<String, VcsTriggerConfig>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub feature_pull_requests: BTreeMap<String, PullRequestsConfig>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub feature_ssh_agent: BTreeMap<String, SshAgentConfig>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ssh_key: BTreeMap<String, SshKeyConfig>,
}

impl Manifest {
    /// Parse a manifest, expanding `{{ env.NAME }}` placeholders in its
    /// string values
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut value: serde_yaml::Value = serde_yaml::from_str(content)?;
        if value.is_null() {
            return Ok(Self::default());
        }

        let mut missing = Vec::new();
        expand_value(&mut value, &mut missing);
        missing_vars_error(missing)?;

        let manifest: Manifest = serde_yaml::from_value(value)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let manifest = Self::from_yaml_str(&content)?;
        tracing::debug!(
            "Loaded {} resources from {}",
            manifest.len(),
            path.display()
        );
        Ok(manifest)
    }

    /// Number of declared resources
    pub fn len(&self) -> usize {
        self.build_trigger_vcs.len()
            + self.feature_pull_requests.len()
            + self.feature_ssh_agent.len()
            + self.ssh_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Addresses of every declared resource
    pub fn addresses(&self) -> Vec<String> {
        let mut all = Vec::with_capacity(self.len());
        all.extend(
            self.build_trigger_vcs
                .keys()
                .map(|name| address(ResourceKind::BuildTriggerVcs, name)),
        );
        all.extend(
            self.feature_pull_requests
                .keys()
                .map(|name| address(ResourceKind::FeaturePullRequests, name)),
        );
        all.extend(
            self.feature_ssh_agent
                .keys()
                .map(|name| address(ResourceKind::FeatureSshAgent, name)),
        );
        all.extend(
            self.ssh_key
                .keys()
                .map(|name| address(ResourceKind::SshKey, name)),
        );
        all
    }

    fn validate(&self) -> Result<()> {
        for name in self.addresses() {
            let local = name.split_once('.').map(|(_, n)| n).unwrap_or_default();
            if local.is_empty() || local.contains('.') {
                return Err(ReconcileError::InvalidConfig(format!(
                    "invalid resource name '{}': names must be non-empty and contain no '.'",
                    name
                )));
            }
        }

        for (name, key) in &self.ssh_key {
            if key.name.is_empty() || key.project_id.is_empty() {
                return Err(ReconcileError::InvalidConfig(format!(
                    "ssh_key.{}: name and project_id must not be empty",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Expand `{{ env.NAME }}` placeholders from the process environment.
///
/// Unset variables are an error rather than being left in place, so a
/// placeholder can never end up on the server as a literal value.
pub fn expand_env(content: &str) -> Result<String> {
    let mut missing = Vec::new();
    let expanded = substitute(content, &mut missing);
    missing_vars_error(missing)?;
    Ok(expanded)
}

/// Substitute placeholders in every string scalar. Values are inserted
/// verbatim, never re-read as YAML.
fn expand_value(value: &mut serde_yaml::Value, missing: &mut Vec<String>) {
    match value {
        serde_yaml::Value::String(s) => {
            if ENV_PATTERN.is_match(s) {
                *s = substitute(s, missing);
            }
        }
        serde_yaml::Value::Sequence(items) => {
            for item in items {
                expand_value(item, missing);
            }
        }
        serde_yaml::Value::Mapping(map) => {
            for (_, item) in map.iter_mut() {
                expand_value(item, missing);
            }
        }
        serde_yaml::Value::Tagged(tagged) => expand_value(&mut tagged.value, missing),
        _ => {}
    }
}

fn substitute(content: &str, missing: &mut Vec<String>) -> String {
    ENV_PATTERN
        .replace_all(content, |caps: &Captures| {
            let name = &caps[1];
            std::env::var(name).unwrap_or_else(|_| {
                missing.push(name.to_string());
                String::new()
            })
        })
        .into_owned()
}

fn missing_vars_error(mut missing: Vec<String>) -> Result<()> {
    if missing.is_empty() {
        return Ok(());
    }
    missing.sort();
    missing.dedup();
    Err(ReconcileError::InvalidConfig(format!(
        "environment variables not set: {}",
        missing.join(", ")
    )))
}
