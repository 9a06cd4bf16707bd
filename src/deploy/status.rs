// ABOUTME: Deployment status state machine and phase names.
// ABOUTME: Status only moves forward along the edges listed in `can_advance_to`.

use serde::Serialize;
use std::fmt;

/// Where a deployment session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Created,
    Deploying,
    Deployed,
    Failed,
    Verifying,
    Verified,
    VerificationFailed,
    Switching,
    Switched,
    SwitchFailed,
    Finalizing,
    Completed,
    FinalizationFailed,
    RollingBack,
    RolledBack,
    RollbackFailed,
}

impl DeploymentStatus {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: DeploymentStatus) -> bool {
        use DeploymentStatus::*;
        matches!(
            (self, next),
            (Created, Deploying)
                | (Deploying, Deployed | Failed)
                | (Deployed, Verifying)
                | (Verifying, Verified | VerificationFailed)
                | (Verified, Switching)
                | (Switching, Switched | SwitchFailed)
                | (Switched, Finalizing)
                | (Finalizing, Completed | FinalizationFailed)
                | (
                    Created
                        | Deployed
                        | Failed
                        | Verified
                        | VerificationFailed
                        | SwitchFailed
                        | Switched
                        | FinalizationFailed,
                    RollingBack
                )
                | (RollingBack, RolledBack | RollbackFailed)
        )
    }

    /// Terminal statuses end the session and release the coordinator.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DeploymentStatus::Completed
                | DeploymentStatus::RolledBack
                | DeploymentStatus::RollbackFailed
        )
    }

    /// A phase is executing; no other operation may touch the session.
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            DeploymentStatus::Deploying
                | DeploymentStatus::Verifying
                | DeploymentStatus::Switching
                | DeploymentStatus::Finalizing
                | DeploymentStatus::RollingBack
        )
    }

    /// Where an in-flight status lands when its phase stops without finishing.
    pub fn interrupted(self) -> Option<DeploymentStatus> {
        use DeploymentStatus::*;
        match self {
            Deploying => Some(Failed),
            Verifying => Some(VerificationFailed),
            Switching => Some(SwitchFailed),
            Finalizing => Some(FinalizationFailed),
            RollingBack => Some(RollbackFailed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentStatus::Created => "created",
            DeploymentStatus::Deploying => "deploying",
            DeploymentStatus::Deployed => "deployed",
            DeploymentStatus::Failed => "failed",
            DeploymentStatus::Verifying => "verifying",
            DeploymentStatus::Verified => "verified",
            DeploymentStatus::VerificationFailed => "verification_failed",
            DeploymentStatus::Switching => "switching",
            DeploymentStatus::Switched => "switched",
            DeploymentStatus::SwitchFailed => "switch_failed",
            DeploymentStatus::Finalizing => "finalizing",
            DeploymentStatus::Completed => "completed",
            DeploymentStatus::FinalizationFailed => "finalization_failed",
            DeploymentStatus::RollingBack => "rolling_back",
            DeploymentStatus::RolledBack => "rolled_back",
            DeploymentStatus::RollbackFailed => "rollback_failed",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coordinator operations, used to label logs, events and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Start,
    Deploy,
    Verify,
    Switch,
    Finalize,
    Abort,
    Revert,
    ManualRollback,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Start => "start",
            Phase::Deploy => "deploy",
            Phase::Verify => "verify",
            Phase::Switch => "switch",
            Phase::Finalize => "finalize",
            Phase::Abort => "abort",
            Phase::Revert => "revert",
            Phase::ManualRollback => "manual_rollback",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
