// ABOUTME: Validated domain types shared across the coordinator.
// ABOUTME: Environment role names and deployment session ids.

mod environment;
mod id;

pub use environment::{EnvironmentName, EnvironmentNameError, EnvironmentPair};
pub use id::DeploymentId;
