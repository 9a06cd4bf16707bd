// ABOUTME: The in-memory deployment session record.
// ABOUTME: Fixes the active/inactive roles at start and tracks status, version and errors.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{DeploymentId, EnvironmentName};

use super::status::DeploymentStatus;

/// One deployment session. At most one exists per coordinator at a time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub(crate) id: DeploymentId,
    pub(crate) version: Option<String>,
    pub(crate) status: DeploymentStatus,
    pub(crate) active_env_at_start: EnvironmentName,
    pub(crate) inactive_env_at_start: EnvironmentName,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) error: Option<String>,
    pub(crate) switched_at: Option<DateTime<Utc>>,
    pub(crate) switch_interrupted: bool,
}

impl Deployment {
    pub(crate) fn new(active: EnvironmentName, inactive: EnvironmentName) -> Self {
        let now = Utc::now();
        Deployment {
            id: DeploymentId::generate(),
            version: None,
            status: DeploymentStatus::Created,
            active_env_at_start: active,
            inactive_env_at_start: inactive,
            created_at: now,
            updated_at: now,
            error: None,
            switched_at: None,
            switch_interrupted: false,
        }
    }

    pub fn id(&self) -> DeploymentId {
        self.id
    }

    /// Version being shipped; set once the push phase starts.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn status(&self) -> DeploymentStatus {
        self.status
    }

    /// Role that was serving traffic when the session started.
    pub fn active_env_at_start(&self) -> &EnvironmentName {
        &self.active_env_at_start
    }

    /// Role receiving the new version.
    pub fn inactive_env_at_start(&self) -> &EnvironmentName {
        &self.inactive_env_at_start
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Last phase error recorded on the session.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// When this session flipped the pointer, if it did.
    pub fn switched_at(&self) -> Option<DateTime<Utc>> {
        self.switched_at
    }

    pub fn has_switched(&self) -> bool {
        self.switched_at.is_some()
    }

    /// The switch phase stopped mid-write, so the pointer may name either role.
    pub fn switch_interrupted(&self) -> bool {
        self.switch_interrupted
    }

    /// Whether rolling back has to write the starting role back to the pointer.
    pub fn may_have_switched(&self) -> bool {
        self.has_switched() || self.switch_interrupted
    }

    /// Move to `next` if the state machine allows it.
    pub(crate) fn advance(&mut self, next: DeploymentStatus) -> bool {
        if !self.status.can_advance_to(next) {
            return false;
        }
        self.status = next;
        self.updated_at = Utc::now();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnvironmentPair;

    fn deployment() -> Deployment {
        let roles = EnvironmentPair::default();
        Deployment::new(roles.blue().clone(), roles.green().clone())
    }

    #[test]
    fn starts_created_without_version() {
        let d = deployment();
        assert_eq!(d.status(), DeploymentStatus::Created);
        assert!(d.version().is_none());
        assert!(!d.has_switched());
        assert_eq!(d.created_at(), d.updated_at());
    }

    #[test]
    fn advance_refuses_illegal_edges() {
        let mut d = deployment();
        assert!(!d.advance(DeploymentStatus::Switching));
        assert_eq!(d.status(), DeploymentStatus::Created);

        assert!(d.advance(DeploymentStatus::Deploying));
        assert_eq!(d.status(), DeploymentStatus::Deploying);
    }
}
