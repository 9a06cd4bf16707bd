// ABOUTME: Abort, revert and manual rollback for the deployment coordinator.
// ABOUTME: Only a session that actually switched traffic ever writes the pointer back.

use crate::events::EventKind;
use crate::types::EnvironmentName;

use super::coordinator::DeploymentCoordinator;
use super::error::DeployError;
use super::status::{DeploymentStatus, Phase};

/// Statuses from which a session can be dropped without touching the pointer.
const ABORTABLE: [DeploymentStatus; 6] = [
    DeploymentStatus::Created,
    DeploymentStatus::Deployed,
    DeploymentStatus::Failed,
    DeploymentStatus::Verified,
    DeploymentStatus::VerificationFailed,
    DeploymentStatus::SwitchFailed,
];

/// Statuses reached only after this session flipped the pointer.
const REVERTIBLE: [DeploymentStatus; 2] = [
    DeploymentStatus::Switched,
    DeploymentStatus::FinalizationFailed,
];

/// An interrupted switch may or may not have written the pointer, so it is
/// reverted rather than aborted.
const ABORTABLE_AFTER_INTERRUPTED_SWITCH: [DeploymentStatus; 5] = [
    DeploymentStatus::Created,
    DeploymentStatus::Deployed,
    DeploymentStatus::Failed,
    DeploymentStatus::Verified,
    DeploymentStatus::VerificationFailed,
];

const REVERTIBLE_AFTER_INTERRUPTED_SWITCH: [DeploymentStatus; 3] = [
    DeploymentStatus::Switched,
    DeploymentStatus::SwitchFailed,
    DeploymentStatus::FinalizationFailed,
];

impl DeploymentCoordinator {
    /// Roll the session back according to what it has done so far: revert
    /// the pointer if this session may have switched it, otherwise abort.
    pub async fn rollback(&self) -> Result<(), DeployError> {
        let switched = self
            .sessions
            .current()
            .map(|d| d.may_have_switched())
            .ok_or_else(|| DeployError::out_of_order("rollback", None))?;

        if switched {
            self.revert_completed_switch().await
        } else {
            self.abort_pending_deployment().await
        }
    }

    /// End a session that never switched traffic. The pointer is not touched.
    pub async fn abort_pending_deployment(&self) -> Result<(), DeployError> {
        let allowed: &[DeploymentStatus] = if self.switch_was_interrupted() {
            &ABORTABLE_AFTER_INTERRUPTED_SWITCH
        } else {
            &ABORTABLE
        };
        let guard = self.enter(Phase::Abort, allowed, DeploymentStatus::RollingBack, |_| {})?;
        let id = guard.deployment().id();
        let active = guard.deployment().active_env_at_start().clone();

        guard.finish(DeploymentStatus::RolledBack, |_| {})?;
        tracing::info!(deployment_id = %id, %active, "Deployment aborted, traffic untouched");
        Ok(())
    }

    /// Restore the pointer to the role that was active when the session started.
    pub async fn revert_completed_switch(&self) -> Result<(), DeployError> {
        let allowed: &[DeploymentStatus] = if self.switch_was_interrupted() {
            &REVERTIBLE_AFTER_INTERRUPTED_SWITCH
        } else {
            &REVERTIBLE
        };
        let guard = self.enter(Phase::Revert, allowed, DeploymentStatus::RollingBack, |_| {})?;
        let id = guard.deployment().id();
        let from = guard.deployment().inactive_env_at_start().clone();
        let restore = guard.deployment().active_env_at_start().clone();

        match self.pointer.set_active_environment(&restore).await {
            Ok(()) => {
                guard.finish(DeploymentStatus::RolledBack, |_| {})?;
                tracing::info!(deployment_id = %id, %from, to = %restore, "Switch reverted");
                self.emit(Some(id), EventKind::TrafficSwitched { from, to: restore });
                Ok(())
            }
            Err(source) => Err(guard.fail(
                DeploymentStatus::RollbackFailed,
                DeployError::Rollback {
                    environment: restore,
                    source,
                },
            )),
        }
    }

    fn switch_was_interrupted(&self) -> bool {
        self.sessions
            .current()
            .is_some_and(|d| d.switch_interrupted())
    }

    /// Flip the pointer to the other role outside any session.
    ///
    /// Running it twice returns to the original role. Refused while a
    /// session is open, since that session owns the pointer.
    pub async fn manual_rollback(&self) -> Result<EnvironmentName, DeployError> {
        let _reservation = self.sessions.reserve()?;
        let (active, inactive) = self.pointer.roles_snapshot().await?;

        if let Err(source) = self.pointer.set_active_environment(&inactive).await {
            tracing::error!(phase = %Phase::ManualRollback, error = %source, "Manual rollback failed");
            self.emit(
                None,
                EventKind::PhaseFailed {
                    phase: Phase::ManualRollback,
                    error: source.to_string(),
                },
            );
            return Err(DeployError::Rollback {
                environment: inactive,
                source,
            });
        }

        tracing::info!(from = %active, to = %inactive, "Manual rollback complete");
        self.emit(
            None,
            EventKind::ManualRollback {
                from: active,
                to: inactive.clone(),
            },
        );
        Ok(inactive)
    }
}
