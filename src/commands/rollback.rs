// ABOUTME: Rollback command implementation.
// ABOUTME: Flips the environment pointer to the other role.

use super::setup::build_coordinator;
use cutover::config::DeploymentConfig;
use cutover::error::Result;
use cutover::output::Output;
use std::sync::Arc;

/// Point traffic at whichever environment is not active now.
pub async fn rollback(config: DeploymentConfig, mut output: Output) -> Result<()> {
    output.start_timer();
    let output = Arc::new(output);
    let coordinator = build_coordinator(config, output.clone())?;

    let from = coordinator.active_environment().await?;
    output.progress(&format!("Rolling back from {from}"));

    let active = coordinator.manual_rollback().await?;

    output.success(&format!("Rollback complete, {active} is live"));
    Ok(())
}
