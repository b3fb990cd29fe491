pub mod error;
pub mod settings;

pub use error::*;
pub use settings::{Credentials, ServerSettings};

use std::path::{Path, PathBuf};

/// Environment variable naming a manifest directly
pub const CONFIG_PATH_VAR: &str = "TCFLOW_CONFIG_PATH";

const CANDIDATES: [&str; 3] = ["tcflow.local.yaml", "tcflow.yaml", ".tcflow.yaml"];

/// Global configuration directory (`~/.config/tcflow`)
pub fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("tcflow"))
}

/// Locate the manifest to work on
///
/// Search order:
/// 1. `TCFLOW_CONFIG_PATH`
/// 2. current directory: tcflow.local.yaml, tcflow.yaml, .tcflow.yaml
/// 3. the same names under `./.tcflow/`
/// 4. `~/.config/tcflow/tcflow.yaml`
pub fn find_manifest() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_VAR) {
        let path = PathBuf::from(&config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(
            "{} points at {}, which does not exist",
            CONFIG_PATH_VAR,
            config_path
        );
    }

    let current_dir = std::env::current_dir()?;
    if let Some(path) = first_candidate(&current_dir) {
        return Ok(path);
    }

    let local_dir = current_dir.join(".tcflow");
    if local_dir.is_dir()
        && let Some(path) = first_candidate(&local_dir)
    {
        return Ok(path);
    }

    if let Ok(dir) = config_dir() {
        let global = dir.join("tcflow.yaml");
        if global.exists() {
            return Ok(global);
        }
    }

    Err(ConfigError::ManifestNotFound)
}

fn first_candidate(dir: &Path) -> Option<PathBuf> {
    CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}
