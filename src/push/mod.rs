// ABOUTME: Seam to the external artifact push mechanism.
// ABOUTME: The coordinator only calls it and interprets success or failure.

mod command;

pub use command::CommandPusher;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::types::{DeploymentId, EnvironmentName};

/// What is being pushed where.
#[derive(Debug, Clone)]
pub struct PushTarget {
    pub deployment_id: DeploymentId,
    pub environment: EnvironmentName,
    pub host: String,
    pub version: String,
}

impl PushTarget {
    /// Convert the target to environment variables for child processes.
    pub fn to_env(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert(
            "CUTOVER_DEPLOYMENT_ID".to_string(),
            self.deployment_id.to_string(),
        );
        env.insert(
            "CUTOVER_ENVIRONMENT".to_string(),
            self.environment.to_string(),
        );
        env.insert("CUTOVER_HOST".to_string(), self.host.clone());
        env.insert("CUTOVER_VERSION".to_string(), self.version.clone());
        env
    }
}

/// Ships a version to an environment.
#[async_trait]
pub trait ArtifactPusher: Send + Sync {
    async fn push(&self, target: &PushTarget) -> Result<(), PushError>;

    /// Post-switch cleanup. Nothing to do by default.
    async fn finalize(&self, _target: &PushTarget) -> Result<(), PushError> {
        Ok(())
    }
}

/// Errors from the push mechanism.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("failed to run push command: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("push command exited with {}: {stderr}", describe_exit(.exit_code))]
    CommandFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("{0}")]
    Rejected(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}
