//! `feature_ssh_agent`: SSH agent build feature

use super::{
    Declared, Reconciler, ResourceKind, absent_if_not_found, ensure_build_type, ignore_not_found,
};
use crate::error::{ReconcileError, Result};
use crate::model::{BuildFeature, FeatureOptions, SshAgentOptions};
use crate::remote::Remote;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Declared SSH agent feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SshAgentConfig {
    pub build_config_id: String,

    /// Name of an SSH key uploaded to the owning project
    pub ssh_key: String,
}

impl SshAgentConfig {
    pub fn to_feature(&self) -> BuildFeature {
        BuildFeature::new(
            &self.build_config_id,
            FeatureOptions::SshAgent(SshAgentOptions {
                ssh_key: self.ssh_key.clone(),
            }),
        )
    }
}

impl Declared for SshAgentConfig {}

pub struct SshAgentReconciler;

#[async_trait]
impl Reconciler for SshAgentReconciler {
    type Config = SshAgentConfig;

    fn kind(&self) -> ResourceKind {
        ResourceKind::FeatureSshAgent
    }

    async fn create(&self, remote: &dyn Remote, config: &SshAgentConfig) -> Result<String> {
        ensure_build_type(remote, &config.build_config_id).await?;

        let id = remote
            .features()
            .create(&config.build_config_id, &config.to_feature())
            .await?;

        tracing::info!(
            "Created SSH agent feature {} on build configuration {}",
            id,
            config.build_config_id
        );
        Ok(id)
    }

    async fn read(
        &self,
        remote: &dyn Remote,
        id: &str,
        prior: &SshAgentConfig,
    ) -> Result<Option<SshAgentConfig>> {
        let fetched = remote.features().get_by_id(&prior.build_config_id, id).await;
        let Some(feature) = absent_if_not_found(fetched)? else {
            return Ok(None);
        };

        match feature.options {
            FeatureOptions::SshAgent(opts) => Ok(Some(SshAgentConfig {
                build_config_id: feature.build_type_id,
                ssh_key: opts.ssh_key,
            })),
            other => Err(ReconcileError::UnexpectedEntity(format!(
                "feature {} is not an SSH agent feature: {:?}",
                id, other
            ))),
        }
    }

    async fn delete(&self, remote: &dyn Remote, id: &str, prior: &SshAgentConfig) -> Result<()> {
        tracing::debug!("Deleting SSH agent feature {}", id);
        ignore_not_found(remote.features().delete(&prior.build_config_id, id).await)
    }
}
