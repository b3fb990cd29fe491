//! Resource reconcilers
//!
//! One reconciler per resource kind. Each maps a declared record to a remote
//! create, a remote read back to a declared record (or absence), and an
//! identity to a remote delete. There is no update path: every field is
//! force-replace, so a changed record is destroyed and created again.

pub mod pull_requests;
pub mod ssh_agent;
pub mod ssh_key;
pub mod vcs_trigger;

pub use pull_requests::{
    AuthType, GithubBlock, Hosting, PullRequestsConfig, PullRequestsReconciler,
};
pub use ssh_agent::{SshAgentConfig, SshAgentReconciler};
pub use ssh_key::{SshKeyConfig, SshKeyReconciler};
pub use vcs_trigger::{QuietPeriodMode, VcsTriggerConfig, VcsTriggerReconciler};

use crate::error::{ReconcileError, Result};
use crate::remote::Remote;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of a managed resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    BuildTriggerVcs,
    FeaturePullRequests,
    FeatureSshAgent,
    SshKey,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::BuildTriggerVcs,
        ResourceKind::FeaturePullRequests,
        ResourceKind::FeatureSshAgent,
        ResourceKind::SshKey,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::BuildTriggerVcs => "build_trigger_vcs",
            ResourceKind::FeaturePullRequests => "feature_pull_requests",
            ResourceKind::FeatureSshAgent => "feature_ssh_agent",
            ResourceKind::SshKey => "ssh_key",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ReconcileError::InvalidConfig(format!("unknown resource kind: {}", s)))
    }
}

/// A declared configuration record
pub trait Declared:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync
{
    /// Copy with write-only fields cleared.
    ///
    /// Secrets are never read back from the server, so drift is judged on the
    /// redacted form only.
    fn redacted(&self) -> Self {
        self.clone()
    }
}

/// Create/read/delete contract shared by every resource kind
#[async_trait]
pub trait Reconciler: Send + Sync {
    type Config: Declared;

    fn kind(&self) -> ResourceKind;

    /// Create the remote object and return its identity.
    ///
    /// Fails with [`ReconcileError::ParentNotFound`] when the owning entity
    /// does not exist. On failure no identity is assigned.
    async fn create(&self, remote: &dyn Remote, config: &Self::Config) -> Result<String>;

    /// Project the remote object back into a declared record.
    ///
    /// Returns `Ok(None)` when the object was deleted out of band.
    async fn read(
        &self,
        remote: &dyn Remote,
        id: &str,
        prior: &Self::Config,
    ) -> Result<Option<Self::Config>>;

    /// Remove the remote object. A missing object counts as deleted.
    async fn delete(&self, remote: &dyn Remote, id: &str, prior: &Self::Config) -> Result<()>;
}

/// Fail with `ParentNotFound` unless the build configuration exists.
pub(crate) async fn ensure_build_type(remote: &dyn Remote, build_type_id: &str) -> Result<()> {
    match remote.parents().build_type(build_type_id).await {
        Ok(_) => Ok(()),
        Err(ReconcileError::RemoteNotFound(_)) => Err(ReconcileError::ParentNotFound {
            kind: "build configuration",
            id: build_type_id.to_string(),
        }),
        Err(e) => Err(e),
    }
}

pub(crate) fn absent_if_not_found<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ReconcileError::RemoteNotFound(what)) => {
            tracing::debug!("{} no longer exists remotely", what);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

pub(crate) fn ignore_not_found(result: Result<()>) -> Result<()> {
    match result {
        Err(ReconcileError::RemoteNotFound(what)) => {
            tracing::debug!("{} already deleted", what);
            Ok(())
        }
        other => other,
    }
}

/// Use the remote list unless it is empty, in which case keep the prior one.
pub(crate) fn non_empty_or(remote: Vec<String>, prior: &[String]) -> Vec<String> {
    if remote.is_empty() {
        prior.to_vec()
    } else {
        remote
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.as_str().parse::<ResourceKind>().unwrap(), kind);
        }
        assert!("teamcity_project".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_non_empty_or() {
        let prior = vec!["+:*".to_string()];
        assert_eq!(non_empty_or(Vec::new(), &prior), prior);
        assert_eq!(
            non_empty_or(vec!["-:docs/**".to_string()], &prior),
            vec!["-:docs/**".to_string()]
        );
        assert!(non_empty_or(Vec::new(), &[]).is_empty());
    }
}
