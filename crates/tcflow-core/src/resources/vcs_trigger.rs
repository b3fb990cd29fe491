//! `build_trigger_vcs`: VCS trigger on a build configuration

use super::{
    Declared, Reconciler, ResourceKind, absent_if_not_found, ensure_build_type, ignore_not_found,
    non_empty_or,
};
use crate::error::{ReconcileError, Result};
use crate::model::{QuietPeriod, Trigger, TriggerOptions, VcsTriggerOptions};
use crate::remote::Remote;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Quiet period modes that can be declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuietPeriodMode {
    #[default]
    #[serde(rename = "DO_NOT_USE")]
    DoNotUse,
    #[serde(rename = "USE_DEFAULT")]
    UseDefault,
}

impl QuietPeriodMode {
    fn to_remote(self) -> QuietPeriod {
        match self {
            QuietPeriodMode::DoNotUse => QuietPeriod::DoNotUse,
            QuietPeriodMode::UseDefault => QuietPeriod::UseDefault,
        }
    }

    /// `None` for a custom quiet period set outside of tcflow
    fn from_remote(quiet_period: QuietPeriod) -> Option<Self> {
        match quiet_period {
            QuietPeriod::DoNotUse => Some(QuietPeriodMode::DoNotUse),
            QuietPeriod::UseDefault => Some(QuietPeriodMode::UseDefault),
            QuietPeriod::Custom { .. } => None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Declared VCS trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VcsTriggerConfig {
    pub build_config_id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branch_filter: Vec<String>,

    #[serde(default)]
    pub quiet_period_mode: QuietPeriodMode,

    #[serde(default = "default_true")]
    pub queue_optimization: bool,

    #[serde(default)]
    pub disabled: bool,
}

impl VcsTriggerConfig {
    pub fn new(build_config_id: impl Into<String>) -> Self {
        Self {
            build_config_id: build_config_id.into(),
            rules: Vec::new(),
            branch_filter: Vec::new(),
            quiet_period_mode: QuietPeriodMode::default(),
            queue_optimization: true,
            disabled: false,
        }
    }

    /// Remote payload for this record
    pub fn to_trigger(&self) -> Trigger {
        Trigger {
            id: None,
            build_type_id: self.build_config_id.clone(),
            disabled: self.disabled,
            options: TriggerOptions::Vcs(VcsTriggerOptions {
                rules: self.rules.clone(),
                branch_filter: self.branch_filter.clone(),
                quiet_period: self.quiet_period_mode.to_remote(),
                queue_optimization: self.queue_optimization,
            }),
        }
    }
}

impl Declared for VcsTriggerConfig {}

pub struct VcsTriggerReconciler;

#[async_trait]
impl Reconciler for VcsTriggerReconciler {
    type Config = VcsTriggerConfig;

    fn kind(&self) -> ResourceKind {
        ResourceKind::BuildTriggerVcs
    }

    async fn create(&self, remote: &dyn Remote, config: &VcsTriggerConfig) -> Result<String> {
        ensure_build_type(remote, &config.build_config_id).await?;

        let trigger = config.to_trigger();
        let id = remote
            .triggers()
            .create(&config.build_config_id, &trigger)
            .await?;

        tracing::info!(
            "Created VCS trigger {} on build configuration {}",
            id,
            config.build_config_id
        );
        Ok(id)
    }

    async fn read(
        &self,
        remote: &dyn Remote,
        id: &str,
        prior: &VcsTriggerConfig,
    ) -> Result<Option<VcsTriggerConfig>> {
        let fetched = remote.triggers().get_by_id(&prior.build_config_id, id).await;
        let Some(trigger) = absent_if_not_found(fetched)? else {
            return Ok(None);
        };

        let opts = match trigger.options {
            TriggerOptions::Vcs(opts) => opts,
            TriggerOptions::Other { trigger_type } => {
                return Err(ReconcileError::UnexpectedEntity(format!(
                    "invalid trigger type '{}' when reading build_trigger_vcs resource",
                    trigger_type
                )));
            }
        };

        Ok(Some(VcsTriggerConfig {
            build_config_id: trigger.build_type_id,
            rules: non_empty_or(opts.rules, &prior.rules),
            branch_filter: non_empty_or(opts.branch_filter, &prior.branch_filter),
            quiet_period_mode: QuietPeriodMode::from_remote(opts.quiet_period)
                .unwrap_or(prior.quiet_period_mode),
            queue_optimization: opts.queue_optimization,
            disabled: trigger.disabled,
        }))
    }

    async fn delete(&self, remote: &dyn Remote, id: &str, prior: &VcsTriggerConfig) -> Result<()> {
        tracing::debug!("Deleting VCS trigger {}", id);
        ignore_not_found(remote.triggers().delete(&prior.build_config_id, id).await)
    }
}
