//! Contracts the reconcilers consume
//!
//! Reconcilers never talk HTTP themselves. They receive a [`Remote`] on every
//! call and go through the seams below, so the REST client, the admin-UI
//! driver and test fakes are interchangeable.

use crate::error::Result;
use crate::model::{BuildFeature, BuildTypeRef, ProjectRef, Trigger};
use async_trait::async_trait;

/// Create/read/delete over one kind of entity owned by a build configuration.
///
/// `get_by_id` and `delete` return [`ReconcileError::RemoteNotFound`] when
/// the entity does not exist.
///
/// [`ReconcileError::RemoteNotFound`]: crate::error::ReconcileError::RemoteNotFound
#[async_trait]
pub trait Gateway<T: Send + Sync>: Send + Sync {
    /// Create the entity and return the id TeamCity assigned
    async fn create(&self, build_type_id: &str, entity: &T) -> Result<String>;

    async fn get_by_id(&self, build_type_id: &str, id: &str) -> Result<T>;

    async fn delete(&self, build_type_id: &str, id: &str) -> Result<()>;
}

/// Lookups used to check that an owning entity exists
#[async_trait]
pub trait ParentLookup: Send + Sync {
    async fn build_type(&self, id: &str) -> Result<BuildTypeRef>;

    async fn project(&self, id: &str) -> Result<ProjectRef>;
}

/// SSH key upload and removal through the admin UI.
///
/// There is no read operation: TeamCity exposes no way to look a key up.
#[async_trait]
pub trait SshKeyWorkflow: Send + Sync {
    /// Upload a key and return the internal id of the project it landed in
    async fn create(&self, project_id: &str, name: &str, payload: &[u8]) -> Result<String>;

    async fn delete(&self, project_internal_id: &str, name: &str) -> Result<()>;
}

/// Everything a reconciler may call on the server
pub trait Remote: Send + Sync {
    fn parents(&self) -> &dyn ParentLookup;

    fn triggers(&self) -> &dyn Gateway<Trigger>;

    fn features(&self) -> &dyn Gateway<BuildFeature>;

    fn ssh_keys(&self) -> &dyn SshKeyWorkflow;
}
