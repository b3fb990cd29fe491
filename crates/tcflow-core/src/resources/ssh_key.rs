//! `ssh_key`: SSH key uploaded to a project
//!
//! Driven through the admin UI rather than REST, see [`SshKeyWorkflow`].
//! The identity is forged locally with [`SshKeyId`] because the server has no
//! id for uploaded keys. The server also offers no way to read a key back, so
//! drift on this resource is never detected.
//!
//! [`SshKeyWorkflow`]: crate::remote::SshKeyWorkflow

use super::{Declared, Reconciler, ResourceKind};
use crate::error::{ReconcileError, Result};
use crate::identity::SshKeyId;
use crate::remote::Remote;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Declared SSH key
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SshKeyConfig {
    /// Name to identify this key
    pub name: String,

    /// External id of the owning project
    pub project_id: String,

    /// Private key content. Write-only.
    pub payload: String,
}

impl std::fmt::Debug for SshKeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshKeyConfig")
            .field("name", &self.name)
            .field("project_id", &self.project_id)
            .field("payload", &"<redacted>")
            .finish()
    }
}

impl Declared for SshKeyConfig {
    fn redacted(&self) -> Self {
        Self {
            payload: String::new(),
            ..self.clone()
        }
    }
}

pub struct SshKeyReconciler;

#[async_trait]
impl Reconciler for SshKeyReconciler {
    type Config = SshKeyConfig;

    fn kind(&self) -> ResourceKind {
        ResourceKind::SshKey
    }

    async fn create(&self, remote: &dyn Remote, config: &SshKeyConfig) -> Result<String> {
        let project = match remote.parents().project(&config.project_id).await {
            Ok(project) => project,
            Err(ReconcileError::RemoteNotFound(_)) => {
                return Err(ReconcileError::ParentNotFound {
                    kind: "project",
                    id: config.project_id.clone(),
                });
            }
            Err(e) => return Err(e),
        };

        let project_internal_id = remote
            .ssh_keys()
            .create(&config.project_id, &config.name, config.payload.as_bytes())
            .await?;

        // The scraped id must name the project the key was uploaded to
        if let Some(expected) = project.internal_id.as_deref()
            && expected != project_internal_id
        {
            return Err(ReconcileError::ProtocolViolation(format!(
                "SSH manager page of project {} lists keys of '{}', expected '{}'",
                config.project_id, project_internal_id, expected
            )));
        }

        let id = SshKeyId::new(project_internal_id, &config.name);
        tracing::info!("Uploaded SSH key {} to project {}", id, config.project_id);
        Ok(id.to_string())
    }

    async fn read(
        &self,
        _remote: &dyn Remote,
        _id: &str,
        prior: &SshKeyConfig,
    ) -> Result<Option<SshKeyConfig>> {
        Ok(Some(prior.clone()))
    }

    async fn delete(&self, remote: &dyn Remote, id: &str, _prior: &SshKeyConfig) -> Result<()> {
        let key = SshKeyId::parse(id);
        if !key.is_complete() {
            tracing::warn!("SSH key identity '{}' is incomplete, deleting anyway", id);
        }

        tracing::debug!("Destroying SSH key {}", id);
        remote
            .ssh_keys()
            .delete(&key.project_internal_id, &key.name)
            .await?;
        tracing::info!("Destroyed SSH key {}", id);
        Ok(())
    }
}
