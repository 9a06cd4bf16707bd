// ABOUTME: Shared wiring from configuration to pointer store and coordinator.
// ABOUTME: Keeps deploy, status, and rollback building the same collaborators.

use cutover::config::DeploymentConfig;
use cutover::deploy::DeploymentCoordinator;
use cutover::error::Result;
use cutover::events::EventSink;
use cutover::health::{HealthVerifier, HttpProbe};
use cutover::pointer::{EnvironmentPointerStore, FilePointerStore};
use cutover::push::CommandPusher;
use std::sync::Arc;

/// Pointer store backed by the configured state file.
pub fn open_pointer(config: &DeploymentConfig) -> EnvironmentPointerStore {
    let backend = FilePointerStore::new(config.state_path());
    EnvironmentPointerStore::new(Arc::new(backend), config.roles().clone())
}

/// Coordinator with the HTTP probe, the shell pusher, and `sink` for events.
pub fn build_coordinator(
    config: DeploymentConfig,
    sink: Arc<dyn EventSink>,
) -> Result<DeploymentCoordinator> {
    let pointer = open_pointer(&config);
    let mut pusher = CommandPusher::from_config(&config.push);
    if !config.base_dir().as_os_str().is_empty() {
        pusher = pusher.working_dir(config.base_dir());
    }
    let config = Arc::new(config);

    let verifier =
        HealthVerifier::new(config.clone(), Arc::new(HttpProbe::new()?)).with_sink(sink.clone());

    Ok(DeploymentCoordinator::new(config, pointer, verifier, Arc::new(pusher)).with_sink(sink))
}
