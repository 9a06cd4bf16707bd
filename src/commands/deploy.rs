// ABOUTME: Deploy command implementation.
// ABOUTME: Runs push, verify, switch and finalize, aborting the session on pre-switch failures.

use super::setup::build_coordinator;
use cutover::config::DeploymentConfig;
use cutover::deploy::{DeployError, DeploymentCoordinator};
use cutover::error::{Error, Result};
use cutover::output::Output;
use std::sync::Arc;

/// Deploy `version` to the inactive environment and cut traffic over to it.
pub async fn deploy(config: DeploymentConfig, version: &str, mut output: Output) -> Result<()> {
    output.start_timer();
    let domain = config.domain.clone();
    let output = Arc::new(output);
    let coordinator = build_coordinator(config, output.clone())?;

    output.progress(&format!("Deploying {version} to {domain}"));

    coordinator.start_deployment().await?;
    let target = coordinator
        .current_deployment()
        .map(|d| d.inactive_env_at_start().to_string())
        .unwrap_or_default();

    if let Err(e) = coordinator.deploy_to_inactive_environment(version).await {
        return Err(abandon(&coordinator, &output, e).await);
    }

    match coordinator.verify_deployment().await {
        Ok(true) => {}
        Ok(false) => {
            // auto_rollback may already have closed the session
            if coordinator.current_deployment().is_some() {
                release(&coordinator, &output).await;
            }
            return Err(Error::VerificationFailed {
                environment: target,
            });
        }
        Err(e) => return Err(abandon(&coordinator, &output, e).await),
    }

    if let Err(e) = coordinator.switch_traffic().await {
        return Err(abandon(&coordinator, &output, e).await);
    }

    if let Err(e) = coordinator.finalize_deployment().await {
        output.warning(&format!(
            "traffic is already on {target}; run `cutover rollback` to move it back"
        ));
        return Err(e.into());
    }

    output.success(&format!("Deployed {version} to {target}"));
    Ok(())
}

/// Roll the session back after `error`, then hand `error` back for reporting.
async fn abandon(coordinator: &DeploymentCoordinator, output: &Output, error: DeployError) -> Error {
    release(coordinator, output).await;
    error.into()
}

async fn release(coordinator: &DeploymentCoordinator, output: &Output) {
    if let Err(e) = coordinator.rollback().await {
        output.warning(&format!("rollback after failed deployment did not complete: {e}"));
    }
}
