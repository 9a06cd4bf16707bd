// ABOUTME: Deployment orchestration for blue-green cutover.
// ABOUTME: Exports the coordinator, the session record and its status machine.

mod coordinator;
mod deployment;
mod error;
mod rollback;
mod session;
mod status;

pub use coordinator::{CoordinatorState, DeploymentCoordinator};
pub use deployment::Deployment;
pub use error::{DeployError, DeployErrorKind};
pub use status::{DeploymentStatus, Phase};
