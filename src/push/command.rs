// ABOUTME: Artifact pusher that runs operator-supplied shell commands.
// ABOUTME: Target details are passed to the command through CUTOVER_* env vars.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::config::PushConfig;

use super::{ArtifactPusher, PushError, PushTarget};

/// Runs `sh -c <command>` for pushes and, optionally, for finalization.
#[derive(Debug, Clone)]
pub struct CommandPusher {
    command: String,
    finalize_command: Option<String>,
    env: HashMap<String, String>,
    working_dir: Option<PathBuf>,
}

impl CommandPusher {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            finalize_command: None,
            env: HashMap::new(),
            working_dir: None,
        }
    }

    pub fn from_config(config: &PushConfig) -> Self {
        Self {
            command: config.command.clone(),
            finalize_command: config.finalize_command.clone(),
            env: config.env.clone(),
            working_dir: None,
        }
    }

    pub fn finalize_command(mut self, command: impl Into<String>) -> Self {
        self.finalize_command = Some(command.into());
        self
    }

    /// Directory the commands run in.
    pub fn working_dir(mut self, dir: &Path) -> Self {
        self.working_dir = Some(dir.to_path_buf());
        self
    }

    async fn run(&self, label: &str, command: &str, target: &PushTarget) -> Result<(), PushError> {
        tracing::info!(
            deployment_id = %target.deployment_id,
            environment = %target.environment,
            version = %target.version,
            "Running {} command",
            label
        );

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .envs(&self.env)
            .envs(target.to_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await.map_err(PushError::Spawn)?;

        if output.status.success() {
            tracing::debug!(
                stdout = %String::from_utf8_lossy(&output.stdout).trim(),
                "{} command completed successfully",
                label
            );
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::warn!(
            exit_code = ?output.status.code(),
            "{} command failed",
            label
        );
        Err(PushError::CommandFailed {
            exit_code: output.status.code(),
            stderr,
        })
    }
}

#[async_trait]
impl ArtifactPusher for CommandPusher {
    async fn push(&self, target: &PushTarget) -> Result<(), PushError> {
        self.run("push", &self.command, target).await
    }

    async fn finalize(&self, target: &PushTarget) -> Result<(), PushError> {
        match &self.finalize_command {
            Some(command) => self.run("finalize", command, target).await,
            None => Ok(()),
        }
    }
}
