// ABOUTME: Error types for coordinator operations.
// ABOUTME: One variant per failure class, with a kind() accessor for programmatic handling.

use crate::pointer::PointerError;
use crate::push::PushError;
use crate::types::{DeploymentId, EnvironmentName};

use super::status::DeploymentStatus;

/// Errors returned by the deployment coordinator.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Another session holds the coordinator.
    #[error("a deployment is already in progress{}", holder_suffix(.holder))]
    Concurrency { holder: Option<DeploymentId> },

    /// No session, or the session is not in a status that allows the call.
    #[error("cannot {operation}: {}", status_reason(.status))]
    NoDeploymentInProgress {
        operation: &'static str,
        status: Option<DeploymentStatus>,
    },

    /// Deploy was called without a version.
    #[error("version cannot be empty")]
    InvalidVersion,

    /// The artifact push failed.
    #[error("failed to deploy {version} to {environment}: {source}")]
    Execution {
        environment: EnvironmentName,
        version: String,
        source: PushError,
    },

    /// The pointer write during cutover failed.
    #[error("failed to switch traffic to {environment}: {source}")]
    Switch {
        environment: EnvironmentName,
        source: PointerError,
    },

    /// The post-switch finalize step failed.
    #[error("failed to finalize deployment: {source}")]
    Finalization { source: PushError },

    /// Restoring the pointer failed.
    #[error("rollback to {environment} failed: {source}")]
    Rollback {
        environment: EnvironmentName,
        source: PointerError,
    },

    /// Reading the pointer outside a phase failed.
    #[error("pointer store error: {0}")]
    Pointer(#[from] PointerError),
}

fn holder_suffix(holder: &Option<DeploymentId>) -> String {
    match holder {
        Some(id) => format!(" ({id})"),
        None => String::new(),
    }
}

fn status_reason(status: &Option<DeploymentStatus>) -> String {
    match status {
        Some(status) => format!("deployment is {status}"),
        None => "no deployment in progress".to_string(),
    }
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    Concurrency,
    NoDeploymentInProgress,
    InvalidVersion,
    Execution,
    Switch,
    Finalization,
    Rollback,
    Pointer,
}

impl DeployError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Concurrency { .. } => DeployErrorKind::Concurrency,
            DeployError::NoDeploymentInProgress { .. } => DeployErrorKind::NoDeploymentInProgress,
            DeployError::InvalidVersion => DeployErrorKind::InvalidVersion,
            DeployError::Execution { .. } => DeployErrorKind::Execution,
            DeployError::Switch { .. } => DeployErrorKind::Switch,
            DeployError::Finalization { .. } => DeployErrorKind::Finalization,
            DeployError::Rollback { .. } => DeployErrorKind::Rollback,
            DeployError::Pointer(_) => DeployErrorKind::Pointer,
        }
    }

    pub(crate) fn out_of_order(operation: &'static str, status: Option<DeploymentStatus>) -> Self {
        DeployError::NoDeploymentInProgress { operation, status }
    }
}
