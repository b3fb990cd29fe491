use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration directory not found")]
    ConfigDirNotFound,

    #[error(
        "Manifest not found. Looked in:\n\
        - the current directory: tcflow.local.yaml, tcflow.yaml, .tcflow.yaml\n\
        - the ./.tcflow/ directory\n\
        - ~/.config/tcflow/tcflow.yaml\n\
        Set TCFLOW_CONFIG_PATH to point at a manifest directly"
    )]
    ManifestNotFound,

    #[error("Environment variable {0} is not set")]
    MissingEnvVar(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
