// ABOUTME: In-process session slot that keeps one deployment per coordinator.
// ABOUTME: Status checks and transitions happen under one short-lived mutex.

use parking_lot::Mutex;

use crate::types::DeploymentId;

use super::deployment::Deployment;
use super::error::DeployError;
use super::status::DeploymentStatus;

#[derive(Debug, Default)]
struct Slot {
    current: Option<Deployment>,
    last: Option<Deployment>,
    /// Held while a session is being created or a manual rollback runs.
    reserved: bool,
}

/// Mutual exclusion for deployment sessions.
///
/// This is a plain in-process flag. Two coordinator processes pointed at the
/// same pointer store do not see each other.
#[derive(Debug, Default)]
pub(crate) struct Sessions {
    slot: Mutex<Slot>,
}

impl Sessions {
    /// Claim the coordinator before any await, so concurrent callers fail fast.
    pub(crate) fn reserve(&self) -> Result<Reservation<'_>, DeployError> {
        let mut slot = self.slot.lock();
        if let Some(current) = &slot.current {
            return Err(DeployError::Concurrency {
                holder: Some(current.id),
            });
        }
        if slot.reserved {
            return Err(DeployError::Concurrency { holder: None });
        }
        slot.reserved = true;
        Ok(Reservation { sessions: self })
    }

    pub(crate) fn current(&self) -> Option<Deployment> {
        self.slot.lock().current.clone()
    }

    pub(crate) fn last(&self) -> Option<Deployment> {
        self.slot.lock().last.clone()
    }

    /// Begin an operation: the session must exist and sit in one of `allowed`.
    pub(crate) fn enter(
        &self,
        operation: &'static str,
        allowed: &[DeploymentStatus],
        next: DeploymentStatus,
        update: impl FnOnce(&mut Deployment),
    ) -> Result<(Deployment, DeploymentStatus), DeployError> {
        let mut slot = self.slot.lock();
        let current = slot
            .current
            .as_mut()
            .ok_or_else(|| DeployError::out_of_order(operation, None))?;

        let from = current.status;
        if !allowed.contains(&from) || !current.advance(next) {
            return Err(DeployError::out_of_order(operation, Some(from)));
        }
        update(current);
        Ok((current.clone(), from))
    }

    /// Finish an operation started with `enter`. Terminal statuses release the slot.
    pub(crate) fn advance(
        &self,
        id: DeploymentId,
        next: DeploymentStatus,
        update: impl FnOnce(&mut Deployment),
    ) -> Result<(Deployment, DeploymentStatus), DeployError> {
        const OPERATION: &str = "complete phase";

        let mut slot = self.slot.lock();
        let current = match slot.current.as_mut() {
            Some(current) if current.id == id => current,
            _ => return Err(DeployError::out_of_order(OPERATION, None)),
        };

        let from = current.status;
        if !current.advance(next) {
            return Err(DeployError::out_of_order(OPERATION, Some(from)));
        }
        update(current);
        let snapshot = current.clone();

        if next.is_terminal() {
            slot.last = slot.current.take();
        }
        Ok((snapshot, from))
    }
}

/// A claimed but not yet populated slot. Dropping it frees the slot.
#[derive(Debug)]
pub(crate) struct Reservation<'a> {
    sessions: &'a Sessions,
}

impl Reservation<'_> {
    /// Turn the reservation into a live session.
    pub(crate) fn install(self, deployment: Deployment) {
        self.sessions.slot.lock().current = Some(deployment);
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.sessions.slot.lock().reserved = false;
    }
}
