use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use tcflow_core::model::{
    BuildFeature, BuildTypeRef, FeatureOptions, GithubAuth, ProjectRef, PullRequestsProvider,
    Trigger,
};
use tcflow_core::{Gateway, ParentLookup, ReconcileError, Remote, Result, SshKeyWorkflow};

/// How the fake admin UI should fail the next SSH key upload
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum SshKeyFailure {
    Rejected(String),
    MissingDeleteMarker,
    /// Upload succeeds but the manager page lists keys of another project
    ForeignKeys(String),
}

#[derive(Default)]
pub struct Server {
    pub build_types: HashSet<String>,
    /// External project id -> internal id
    pub projects: HashMap<String, String>,
    pub triggers: BTreeMap<String, Trigger>,
    pub features: BTreeMap<String, BuildFeature>,
    /// (internal project id, key name) -> payload
    pub ssh_keys: BTreeMap<(String, String), Vec<u8>>,
    pub ssh_key_failure: Option<SshKeyFailure>,
    pub created_triggers: Vec<Trigger>,
    pub created_features: Vec<BuildFeature>,
    pub deleted_ssh_keys: Vec<(String, String)>,
    next_id: u32,
}

/// In-memory TeamCity
#[derive(Default)]
pub struct FakeRemote {
    server: Mutex<Server>,
}

#[allow(dead_code)]
impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_build_type(self, id: &str) -> Self {
        self.server().build_types.insert(id.to_string());
        self
    }

    pub fn with_project(self, id: &str, internal_id: &str) -> Self {
        self.server()
            .projects
            .insert(id.to_string(), internal_id.to_string());
        self
    }

    pub fn server(&self) -> MutexGuard<'_, Server> {
        self.server.lock().unwrap()
    }
}

impl Server {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}_{}", prefix, self.next_id)
    }
}

/// TeamCity never returns secure property values
fn blank_secrets(mut feature: BuildFeature) -> BuildFeature {
    if let FeatureOptions::PullRequests(opts) = &mut feature.options {
        let PullRequestsProvider::Github(github) = &mut opts.provider;
        match &mut github.auth {
            GithubAuth::Token { access_token } => access_token.clear(),
            GithubAuth::Password { password, .. } => password.clear(),
        }
    }
    feature
}

#[async_trait]
impl Gateway<Trigger> for FakeRemote {
    async fn create(&self, build_type_id: &str, entity: &Trigger) -> Result<String> {
        let mut server = self.server();
        if !server.build_types.contains(build_type_id) {
            return Err(ReconcileError::RemoteNotFound(format!(
                "build type {}",
                build_type_id
            )));
        }
        server.created_triggers.push(entity.clone());

        let id = server.next_id("TRIGGER");
        let mut stored = entity.clone();
        stored.id = Some(id.clone());
        stored.build_type_id = build_type_id.to_string();
        server.triggers.insert(id.clone(), stored);
        Ok(id)
    }

    async fn get_by_id(&self, build_type_id: &str, id: &str) -> Result<Trigger> {
        self.server()
            .triggers
            .get(id)
            .filter(|t| t.build_type_id == build_type_id)
            .cloned()
            .ok_or_else(|| ReconcileError::RemoteNotFound(format!("trigger {}", id)))
    }

    async fn delete(&self, build_type_id: &str, id: &str) -> Result<()> {
        let mut server = self.server();
        match server.triggers.get(id) {
            Some(t) if t.build_type_id == build_type_id => {
                server.triggers.remove(id);
                Ok(())
            }
            _ => Err(ReconcileError::RemoteNotFound(format!("trigger {}", id))),
        }
    }
}

#[async_trait]
impl Gateway<BuildFeature> for FakeRemote {
    async fn create(&self, build_type_id: &str, entity: &BuildFeature) -> Result<String> {
        let mut server = self.server();
        if !server.build_types.contains(build_type_id) {
            return Err(ReconcileError::RemoteNotFound(format!(
                "build type {}",
                build_type_id
            )));
        }
        server.created_features.push(entity.clone());

        let id = server.next_id("BUILD_EXT");
        let mut stored = entity.clone();
        stored.id = Some(id.clone());
        stored.build_type_id = build_type_id.to_string();
        server.features.insert(id.clone(), stored);
        Ok(id)
    }

    async fn get_by_id(&self, build_type_id: &str, id: &str) -> Result<BuildFeature> {
        self.server()
            .features
            .get(id)
            .filter(|f| f.build_type_id == build_type_id)
            .cloned()
            .map(blank_secrets)
            .ok_or_else(|| ReconcileError::RemoteNotFound(format!("feature {}", id)))
    }

    async fn delete(&self, build_type_id: &str, id: &str) -> Result<()> {
        let mut server = self.server();
        match server.features.get(id) {
            Some(f) if f.build_type_id == build_type_id => {
                server.features.remove(id);
                Ok(())
            }
            _ => Err(ReconcileError::RemoteNotFound(format!("feature {}", id))),
        }
    }
}

#[async_trait]
impl ParentLookup for FakeRemote {
    async fn build_type(&self, id: &str) -> Result<BuildTypeRef> {
        if self.server().build_types.contains(id) {
            Ok(BuildTypeRef {
                id: id.to_string(),
                name: id.to_string(),
                project_id: String::new(),
            })
        } else {
            Err(ReconcileError::RemoteNotFound(format!("build type {}", id)))
        }
    }

    async fn project(&self, id: &str) -> Result<ProjectRef> {
        match self.server().projects.get(id) {
            Some(internal_id) => Ok(ProjectRef {
                id: id.to_string(),
                name: id.to_string(),
                internal_id: Some(internal_id.clone()),
            }),
            None => Err(ReconcileError::RemoteNotFound(format!("project {}", id))),
        }
    }
}

#[async_trait]
impl SshKeyWorkflow for FakeRemote {
    async fn create(&self, project_id: &str, name: &str, payload: &[u8]) -> Result<String> {
        let mut server = self.server();
        match server.ssh_key_failure.clone() {
            Some(SshKeyFailure::Rejected(message)) => {
                return Err(ReconcileError::RemoteRejected(message));
            }
            Some(SshKeyFailure::MissingDeleteMarker) => {
                return Err(ReconcileError::ProtocolViolation(format!(
                    "no SSH key listed for project {}",
                    project_id
                )));
            }
            Some(SshKeyFailure::ForeignKeys(other)) => return Ok(other),
            None => {}
        }

        let internal_id = server.projects.get(project_id).cloned().unwrap_or_default();
        server
            .ssh_keys
            .insert((internal_id.clone(), name.to_string()), payload.to_vec());
        Ok(internal_id)
    }

    async fn delete(&self, project_internal_id: &str, name: &str) -> Result<()> {
        let mut server = self.server();
        server
            .deleted_ssh_keys
            .push((project_internal_id.to_string(), name.to_string()));
        server
            .ssh_keys
            .remove(&(project_internal_id.to_string(), name.to_string()));
        Ok(())
    }
}

impl Remote for FakeRemote {
    fn parents(&self) -> &dyn ParentLookup {
        self
    }

    fn triggers(&self) -> &dyn Gateway<Trigger> {
        self
    }

    fn features(&self) -> &dyn Gateway<BuildFeature> {
        self
    }

    fn ssh_keys(&self) -> &dyn SshKeyWorkflow {
        self
    }
}
