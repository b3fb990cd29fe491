//! Reconciliation error types

use thiserror::Error;

/// Reconciliation errors
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("invalid {kind} '{id}' - {kind} does not exist")]
    ParentNotFound { kind: &'static str, id: String },

    #[error("Remote object not found: {0}")]
    RemoteNotFound(String),

    #[error("Unexpected response from TeamCity: {0}")]
    ProtocolViolation(String),

    #[error("Transport error: {0}")]
    Transport(String),

    /// Message scraped from the admin UI, passed through unmodified.
    #[error("{0}")]
    RemoteRejected(String),

    #[error("Unexpected remote entity: {0}")]
    UnexpectedEntity(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ReconcileError {
    /// Whether the remote side reported the object as absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReconcileError::RemoteNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
