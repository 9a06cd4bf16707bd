// ABOUTME: Status command implementation.
// ABOUTME: Reports the active and inactive environments from the pointer store.

use super::setup::open_pointer;
use cutover::config::DeploymentConfig;
use cutover::error::Result;
use cutover::output::{Output, OutputMode};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport<'a> {
    active_environment: &'a str,
    inactive_environment: &'a str,
    active_host: String,
    state_file: String,
}

/// Print which environment is serving traffic.
pub async fn status(config: DeploymentConfig, output: Output) -> Result<()> {
    let pointer = open_pointer(&config);
    let (active, inactive) = pointer.roles_snapshot().await?;

    match output.mode() {
        OutputMode::Json => output.json(&StatusReport {
            active_environment: active.as_str(),
            inactive_environment: inactive.as_str(),
            active_host: config.host_for(&active),
            state_file: config.state_path().display().to_string(),
        }),
        OutputMode::Quiet => println!("{active}"),
        OutputMode::Normal => {
            println!("Active: {active} ({})", config.host_for(&active));
            println!("Inactive: {inactive} ({})", config.host_for(&inactive));
        }
    }
    Ok(())
}
