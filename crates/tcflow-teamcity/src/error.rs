//! TeamCity client error types

use tcflow_core::ReconcileError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TeamCityError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("TeamCity returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Error message shown by the admin UI
    #[error("{0}")]
    Rejected(String),

    #[error("unexpected response: {0}")]
    Protocol(String),

    #[error("unsupported entity: {0}")]
    Unsupported(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TeamCityError>;

impl From<TeamCityError> for ReconcileError {
    fn from(err: TeamCityError) -> Self {
        match err {
            TeamCityError::NotFound(what) => ReconcileError::RemoteNotFound(what),
            TeamCityError::Rejected(message) => ReconcileError::RemoteRejected(message),
            TeamCityError::Protocol(message) => ReconcileError::ProtocolViolation(message),
            TeamCityError::Unsupported(message) => ReconcileError::UnexpectedEntity(message),
            TeamCityError::InvalidConfig(message) => ReconcileError::InvalidConfig(message),
            TeamCityError::Json(e) => ReconcileError::Json(e),
            other @ (TeamCityError::Api { .. } | TeamCityError::Http(_)) => {
                ReconcileError::Transport(other.to_string())
            }
        }
    }
}
