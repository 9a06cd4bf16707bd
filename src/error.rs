// ABOUTME: Application-wide error types for cutover.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::deploy::DeployError;
use crate::pointer::PointerError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("health verification failed for {environment}; traffic was not switched")]
    VerificationFailed { environment: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Pointer(#[from] PointerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
