//! Plan and apply over every declared resource
//!
//! Resources are handled one at a time, in a fixed order, and the state file
//! is saved after every action that touched the server. There is no
//! parallelism and no retry: a failed action is recorded and the run moves on
//! to the next resource.

use crate::action::{Action, ActionType, ApplyResult, Plan};
use crate::error::{ReconcileError, Result};
use crate::manifest::Manifest;
use crate::remote::Remote;
use crate::resources::{
    Declared, PullRequestsReconciler, Reconciler, ResourceKind, SshAgentReconciler,
    SshKeyReconciler, VcsTriggerReconciler,
};
use crate::state::{GlobalState, ResourceState, StateManager, address, parse_address};
use std::collections::BTreeMap;

/// Order in which kinds are created. Deletes run in reverse.
const CREATE_ORDER: [ResourceKind; 4] = [
    ResourceKind::SshKey,
    ResourceKind::BuildTriggerVcs,
    ResourceKind::FeaturePullRequests,
    ResourceKind::FeatureSshAgent,
];

/// Outcome of reading every stored resource back
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Number of resources read
    pub checked: usize,

    /// Addresses whose remote object is gone; dropped from state
    pub removed: Vec<String>,

    /// Addresses whose remote object no longer matches the applied record
    pub drifted: Vec<String>,
}

/// Drives the reconcilers against one server
pub struct Engine<'a> {
    remote: &'a dyn Remote,
}

impl<'a> Engine<'a> {
    pub fn new(remote: &'a dyn Remote) -> Self {
        Self { remote }
    }

    /// Read every stored resource and drop the ones deleted out of band
    pub async fn refresh(&self, state: &mut GlobalState) -> Result<RefreshReport> {
        let mut report = RefreshReport::default();
        for kind in CREATE_ORDER {
            match kind {
                ResourceKind::BuildTriggerVcs => {
                    self.refresh_kind(&VcsTriggerReconciler, state, &mut report)
                        .await?
                }
                ResourceKind::FeaturePullRequests => {
                    self.refresh_kind(&PullRequestsReconciler, state, &mut report)
                        .await?
                }
                ResourceKind::FeatureSshAgent => {
                    self.refresh_kind(&SshAgentReconciler, state, &mut report)
                        .await?
                }
                ResourceKind::SshKey => {
                    self.refresh_kind(&SshKeyReconciler, state, &mut report)
                        .await?
                }
            }
        }
        Ok(report)
    }

    /// Refresh the state, then compute the actions that bring it to `manifest`
    pub async fn plan(&self, manifest: &Manifest, state: &mut GlobalState) -> Result<Plan> {
        let report = self.refresh(state).await?;

        let mut deletes = Vec::new();
        let mut changes = Vec::new();
        for kind in CREATE_ORDER {
            let actions = match kind {
                ResourceKind::BuildTriggerVcs => {
                    plan_kind(kind, &manifest.build_trigger_vcs, state, &report)?
                }
                ResourceKind::FeaturePullRequests => {
                    plan_kind(kind, &manifest.feature_pull_requests, state, &report)?
                }
                ResourceKind::FeatureSshAgent => {
                    plan_kind(kind, &manifest.feature_ssh_agent, state, &report)?
                }
                ResourceKind::SshKey => plan_kind(kind, &manifest.ssh_key, state, &report)?,
            };
            let (kind_deletes, kind_changes): (Vec<_>, Vec<_>) = actions
                .into_iter()
                .partition(|a| a.action_type == ActionType::Delete);
            deletes.insert(0, kind_deletes);
            changes.extend(kind_changes);
        }

        let mut actions: Vec<Action> = deletes.into_iter().flatten().collect();
        actions.extend(changes);
        Ok(Plan::new(actions))
    }

    /// Execute a plan, saving the state after every change
    pub async fn apply(
        &self,
        plan: &Plan,
        manifest: &Manifest,
        state: &mut GlobalState,
        store: &StateManager,
    ) -> Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();

        for action in &plan.actions {
            if action.action_type == ActionType::NoOp {
                continue;
            }

            tracing::info!("{}: {}", action.address, action.action_type);
            let outcome = match action.kind {
                ResourceKind::BuildTriggerVcs => {
                    self.apply_action(&VcsTriggerReconciler, &manifest.build_trigger_vcs, action, state)
                        .await
                }
                ResourceKind::FeaturePullRequests => {
                    self.apply_action(
                        &PullRequestsReconciler,
                        &manifest.feature_pull_requests,
                        action,
                        state,
                    )
                    .await
                }
                ResourceKind::FeatureSshAgent => {
                    self.apply_action(&SshAgentReconciler, &manifest.feature_ssh_agent, action, state)
                        .await
                }
                ResourceKind::SshKey => {
                    self.apply_action(&SshKeyReconciler, &manifest.ssh_key, action, state)
                        .await
                }
            };

            match outcome {
                Ok(message) => result.add_success(action.address.clone(), message),
                Err(e) => {
                    tracing::error!("{} failed: {}", action.address, e);
                    result.add_failure(action.address.clone(), e.to_string());
                }
            }
            store.save(state).await?;
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    /// Destroy one resource recorded in state
    pub async fn destroy(&self, resource_address: &str, state: &mut GlobalState) -> Result<()> {
        let (kind, _) = parse_address(resource_address)?;
        if state.get_resource(resource_address).is_none() {
            return Err(ReconcileError::InvalidConfig(format!(
                "{} is not in state",
                resource_address
            )));
        }

        match kind {
            ResourceKind::BuildTriggerVcs => {
                self.delete_stored(&VcsTriggerReconciler, resource_address, state)
                    .await
            }
            ResourceKind::FeaturePullRequests => {
                self.delete_stored(&PullRequestsReconciler, resource_address, state)
                    .await
            }
            ResourceKind::FeatureSshAgent => {
                self.delete_stored(&SshAgentReconciler, resource_address, state)
                    .await
            }
            ResourceKind::SshKey => {
                self.delete_stored(&SshKeyReconciler, resource_address, state)
                    .await
            }
        }
    }

    /// Destroy every resource recorded in state
    pub async fn destroy_all(
        &self,
        state: &mut GlobalState,
        store: &StateManager,
    ) -> Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();

        for kind in CREATE_ORDER.into_iter().rev() {
            let addresses: Vec<String> = state
                .by_kind(kind)
                .into_iter()
                .map(|(name, _)| address(kind, name))
                .collect();

            for resource_address in addresses {
                match self.destroy(&resource_address, state).await {
                    Ok(()) => result.add_success(resource_address, "destroyed".to_string()),
                    Err(e) => result.add_failure(resource_address, e.to_string()),
                }
                store.save(state).await?;
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    async fn refresh_kind<R: Reconciler>(
        &self,
        reconciler: &R,
        state: &mut GlobalState,
        report: &mut RefreshReport,
    ) -> Result<()> {
        let kind = reconciler.kind();
        let stored: Vec<(String, ResourceState)> = state
            .by_kind(kind)
            .into_iter()
            .map(|(name, s)| (address(kind, name), s.clone()))
            .collect();

        for (resource_address, resource) in stored {
            let prior: R::Config = resource.config_as()?;
            report.checked += 1;

            match reconciler.read(self.remote, &resource.id, &prior).await? {
                None => {
                    tracing::warn!(
                        "{} ({}) was deleted outside of tcflow, removing from state",
                        resource_address,
                        resource.id
                    );
                    state.remove_resource(&resource_address);
                    report.removed.push(resource_address);
                }
                Some(observed) => {
                    if observed.redacted() != prior.redacted() {
                        tracing::info!("{} has drifted", resource_address);
                        tracing::debug!("applied: {:?}, observed: {:?}", prior.redacted(), observed);
                        report.drifted.push(resource_address);
                    }
                }
            }
        }
        Ok(())
    }

    async fn apply_action<R: Reconciler>(
        &self,
        reconciler: &R,
        declared: &BTreeMap<String, R::Config>,
        action: &Action,
        state: &mut GlobalState,
    ) -> Result<String> {
        let (_, name) = parse_address(&action.address)?;

        match action.action_type {
            ActionType::NoOp => Ok("unchanged".to_string()),
            ActionType::Delete => {
                self.delete_stored(reconciler, &action.address, state)
                    .await?;
                Ok("destroyed".to_string())
            }
            ActionType::Create | ActionType::Replace => {
                let config = declared.get(&name).ok_or_else(|| {
                    ReconcileError::InvalidConfig(format!(
                        "{} is not declared in the manifest",
                        action.address
                    ))
                })?;

                if action.action_type == ActionType::Replace {
                    self.delete_stored(reconciler, &action.address, state)
                        .await?;
                }

                let id = reconciler.create(self.remote, config).await?;
                state.set_resource(
                    action.address.clone(),
                    ResourceState::new(&id, reconciler.kind(), config)?,
                );
                Ok(format!("created with id {}", id))
            }
        }
    }

    async fn delete_stored<R: Reconciler>(
        &self,
        reconciler: &R,
        resource_address: &str,
        state: &mut GlobalState,
    ) -> Result<()> {
        let Some(resource) = state.get_resource(resource_address).cloned() else {
            return Ok(());
        };

        let prior: R::Config = resource.config_as()?;
        reconciler.delete(self.remote, &resource.id, &prior).await?;
        state.remove_resource(resource_address);
        tracing::info!("Destroyed {} ({})", resource_address, resource.id);
        Ok(())
    }
}

fn plan_kind<C: Declared>(
    kind: ResourceKind,
    declared: &BTreeMap<String, C>,
    state: &GlobalState,
    report: &RefreshReport,
) -> Result<Vec<Action>> {
    let mut actions = Vec::new();

    for (name, config) in declared {
        let resource_address = address(kind, name);
        let action = match state.get_resource(&resource_address) {
            None => Action {
                address: resource_address.clone(),
                action_type: ActionType::Create,
                kind,
                resource_id: None,
                description: format!("{} will be created", resource_address),
            },
            Some(stored) => {
                let prior: C = stored.config_as()?;
                let (action_type, description) = if report.drifted.contains(&resource_address) {
                    (
                        ActionType::Replace,
                        format!("{} changed outside of tcflow and will be replaced", resource_address),
                    )
                } else if prior != *config {
                    (
                        ActionType::Replace,
                        format!("{} must be replaced", resource_address),
                    )
                } else {
                    (
                        ActionType::NoOp,
                        format!("{} is up to date", resource_address),
                    )
                };
                Action {
                    address: resource_address.clone(),
                    action_type,
                    kind,
                    resource_id: Some(stored.id.clone()),
                    description,
                }
            }
        };
        actions.push(action);
    }

    for (name, stored) in state.by_kind(kind) {
        if !declared.contains_key(name) {
            let resource_address = address(kind, name);
            actions.push(Action {
                description: format!("{} will be destroyed", resource_address),
                address: resource_address,
                action_type: ActionType::Delete,
                kind,
                resource_id: Some(stored.id.clone()),
            });
        }
    }

    Ok(actions)
}
