//! TeamCity server settings from the environment

use crate::error::{ConfigError, Result};

pub const ADDR_VAR: &str = "TEAMCITY_ADDR";
pub const TOKEN_VAR: &str = "TEAMCITY_TOKEN";
pub const USER_VAR: &str = "TEAMCITY_USER";
pub const PASSWORD_VAR: &str = "TEAMCITY_PASSWORD";

/// How to authenticate against the server
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Token(String),
    Basic { username: String, password: String },
    Anonymous,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Token(_) => f.write_str("Token(<redacted>)"),
            Credentials::Basic { username, .. } => write!(f, "Basic({})", username),
            Credentials::Anonymous => f.write_str("Anonymous"),
        }
    }
}

/// Where the server is and how to log in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub address: String,
    pub credentials: Credentials,
}

impl ServerSettings {
    /// Read settings from `TEAMCITY_*` variables.
    ///
    /// A token takes precedence over a username and password. With neither,
    /// the server is accessed anonymously.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let address = get(ADDR_VAR).ok_or(ConfigError::MissingEnvVar(ADDR_VAR))?;

        let credentials = match (get(TOKEN_VAR), get(USER_VAR), get(PASSWORD_VAR)) {
            (Some(token), _, _) => Credentials::Token(token),
            (None, Some(username), Some(password)) => Credentials::Basic { username, password },
            (None, Some(_), None) => return Err(ConfigError::MissingEnvVar(PASSWORD_VAR)),
            (None, None, Some(_)) => return Err(ConfigError::MissingEnvVar(USER_VAR)),
            (None, None, None) => {
                tracing::debug!("No TeamCity credentials set, using guest access");
                Credentials::Anonymous
            }
        };

        Ok(Self {
            address,
            credentials,
        })
    }
}
