// ABOUTME: Blue-green deployment coordinator: push, verify, switch, finalize.
// ABOUTME: Owns the session slot and is the only caller of the pointer's write path.

use chrono::Utc;
use std::fmt;
use std::sync::Arc;

use crate::config::DeploymentConfig;
use crate::events::{DeploymentEvent, EventKind, EventSink, TracingSink};
use crate::health::HealthVerifier;
use crate::pointer::EnvironmentPointerStore;
use crate::push::{ArtifactPusher, PushTarget};
use crate::types::{DeploymentId, EnvironmentName};

use super::deployment::Deployment;
use super::error::DeployError;
use super::session::Sessions;
use super::status::{DeploymentStatus, Phase};

/// Whether the coordinator is free to start a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Busy {
        deployment_id: DeploymentId,
        status: DeploymentStatus,
    },
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatorState::Idle => f.write_str("idle"),
            CoordinatorState::Busy { status, .. } => write!(f, "{status}"),
        }
    }
}

/// Sequences a blue-green deployment.
///
/// Callers drive the phases in order:
/// `start_deployment` → `deploy_to_inactive_environment` → `verify_deployment`
/// → `switch_traffic` → `finalize_deployment`. A session that stops short of
/// `finalize_deployment` holds the coordinator until it is rolled back.
/// A phase future dropped before it finishes leaves the session in that
/// phase's failed status, so it can still be rolled back.
pub struct DeploymentCoordinator {
    pub(super) config: Arc<DeploymentConfig>,
    pub(super) pointer: EnvironmentPointerStore,
    verifier: HealthVerifier,
    pusher: Arc<dyn ArtifactPusher>,
    sink: Arc<dyn EventSink>,
    pub(super) sessions: Sessions,
}

impl fmt::Debug for DeploymentCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentCoordinator")
            .field("domain", &self.config.domain)
            .field("state", &self.state())
            .finish()
    }
}

impl DeploymentCoordinator {
    pub fn new(
        config: Arc<DeploymentConfig>,
        pointer: EnvironmentPointerStore,
        verifier: HealthVerifier,
        pusher: Arc<dyn ArtifactPusher>,
    ) -> Self {
        Self {
            config,
            pointer,
            verifier,
            pusher,
            sink: Arc::new(TracingSink),
            sessions: Sessions::default(),
        }
    }

    /// Deliver phase events to `sink` instead of the tracing log.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &DeploymentConfig {
        &self.config
    }

    pub fn state(&self) -> CoordinatorState {
        match self.sessions.current() {
            Some(d) => CoordinatorState::Busy {
                deployment_id: d.id(),
                status: d.status(),
            },
            None => CoordinatorState::Idle,
        }
    }

    /// Snapshot of the session in progress.
    pub fn current_deployment(&self) -> Option<Deployment> {
        self.sessions.current()
    }

    /// Snapshot of the most recently released session.
    pub fn last_deployment(&self) -> Option<Deployment> {
        self.sessions.last()
    }

    /// Role currently serving traffic, bootstrapping the pointer if needed.
    pub async fn active_environment(&self) -> Result<EnvironmentName, DeployError> {
        Ok(self.pointer.active_environment().await?)
    }

    /// Open a session. Fails with `Concurrency` while another one is open.
    pub async fn start_deployment(&self) -> Result<DeploymentId, DeployError> {
        let reservation = self.sessions.reserve()?;
        let (active, inactive) = self.pointer.roles_snapshot().await?;

        let deployment = Deployment::new(active.clone(), inactive.clone());
        let id = deployment.id();
        reservation.install(deployment);

        tracing::info!(
            deployment_id = %id,
            %active,
            %inactive,
            "Deployment session started"
        );
        self.emit(Some(id), EventKind::Created { active, inactive });
        Ok(id)
    }

    /// Push `version` to the inactive environment.
    ///
    /// The inactive environment is not serving traffic, so a failed push
    /// leaves production untouched. The session ends up `failed` and keeps
    /// the coordinator until it is rolled back.
    pub async fn deploy_to_inactive_environment(&self, version: &str) -> Result<(), DeployError> {
        let version = version.trim();
        if version.is_empty() {
            return Err(DeployError::InvalidVersion);
        }

        let guard = self.enter(
            Phase::Deploy,
            &[DeploymentStatus::Created],
            DeploymentStatus::Deploying,
            |d| d.version = Some(version.to_string()),
        )?;
        let target = self.push_target(guard.deployment(), version);

        match self.pusher.push(&target).await {
            Ok(()) => {
                guard.finish(DeploymentStatus::Deployed, |_| {})?;
                Ok(())
            }
            Err(source) => Err(guard.fail(
                DeploymentStatus::Failed,
                DeployError::Execution {
                    environment: target.environment,
                    version: version.to_string(),
                    source,
                },
            )),
        }
    }

    /// Health-check the inactive environment.
    ///
    /// Returns `Ok(false)` when every attempt failed; that is an outcome, not
    /// an error. With `auto_rollback` the session is aborted before returning.
    pub async fn verify_deployment(&self) -> Result<bool, DeployError> {
        let guard = self.enter(
            Phase::Verify,
            &[DeploymentStatus::Deployed],
            DeploymentStatus::Verifying,
            |_| {},
        )?;
        let id = guard.deployment().id();
        let candidate = guard.deployment().inactive_env_at_start().clone();

        if self.verifier.verify(&candidate, Some(id)).await {
            guard.finish(DeploymentStatus::Verified, |_| {})?;
            return Ok(true);
        }

        let message = format!(
            "{} did not report healthy after {} attempt(s)",
            candidate,
            self.config.health.retries.max(1)
        );
        tracing::warn!(deployment_id = %id, environment = %candidate, "{}", message);
        guard.finish(DeploymentStatus::VerificationFailed, move |d| {
            d.error = Some(message)
        })?;

        if self.config.auto_rollback {
            tracing::info!(deployment_id = %id, "Auto-rollback enabled, aborting deployment");
            self.abort_pending_deployment().await?;
        }
        Ok(false)
    }

    /// Wait the switch delay, then point traffic at the new environment.
    pub async fn switch_traffic(&self) -> Result<(), DeployError> {
        let guard = self.enter(
            Phase::Switch,
            &[DeploymentStatus::Verified],
            DeploymentStatus::Switching,
            |_| {},
        )?;
        let id = guard.deployment().id();
        let from = guard.deployment().active_env_at_start().clone();
        let to = guard.deployment().inactive_env_at_start().clone();

        let delay = self.config.switch_delay;
        if !delay.is_zero() {
            tracing::info!(deployment_id = %id, ?delay, "Waiting before cutover");
            tokio::time::sleep(delay).await;
        }

        match self.pointer.set_active_environment(&to).await {
            Ok(()) => {
                guard.finish(DeploymentStatus::Switched, |d| {
                    d.switched_at = Some(Utc::now())
                })?;
                tracing::info!(deployment_id = %id, %from, %to, "Traffic switched");
                self.emit(Some(id), EventKind::TrafficSwitched { from, to });
                Ok(())
            }
            Err(source) => Err(guard.fail(
                DeploymentStatus::SwitchFailed,
                DeployError::Switch {
                    environment: to,
                    source,
                },
            )),
        }
    }

    /// Complete a switched deployment and free the coordinator.
    pub async fn finalize_deployment(&self) -> Result<(), DeployError> {
        let guard = self.enter(
            Phase::Finalize,
            &[DeploymentStatus::Switched],
            DeploymentStatus::Finalizing,
            |_| {},
        )?;
        let version = guard.deployment().version().unwrap_or_default().to_string();
        let target = self.push_target(guard.deployment(), &version);

        match self.pusher.finalize(&target).await {
            Ok(()) => {
                guard.finish(DeploymentStatus::Completed, |_| {})?;
                Ok(())
            }
            Err(source) => Err(guard.fail(
                DeploymentStatus::FinalizationFailed,
                DeployError::Finalization { source },
            )),
        }
    }

    fn push_target(&self, deployment: &Deployment, version: &str) -> PushTarget {
        let environment = deployment.inactive_env_at_start().clone();
        PushTarget {
            deployment_id: deployment.id(),
            host: self.config.host_for(&environment),
            environment,
            version: version.to_string(),
        }
    }

    /// Move the session into `next` for the duration of `phase`.
    ///
    /// The returned guard must be resolved with `finish` or `fail`. If it is
    /// dropped first the session lands in the phase's failed status.
    pub(super) fn enter(
        &self,
        phase: Phase,
        allowed: &[DeploymentStatus],
        next: DeploymentStatus,
        update: impl FnOnce(&mut Deployment),
    ) -> Result<PhaseGuard<'_>, DeployError> {
        let (deployment, from) = self
            .sessions
            .enter(phase.as_str(), allowed, next, update)?;
        tracing::debug!(deployment_id = %deployment.id(), %phase, %from, to = %next, "Phase started");
        self.record_transition(&deployment, from);
        Ok(PhaseGuard {
            coordinator: self,
            deployment,
            phase,
            armed: true,
        })
    }

    fn interrupt(&self, id: DeploymentId, phase: Phase) {
        let Some(status) = self
            .sessions
            .current()
            .filter(|d| d.id() == id)
            .and_then(|d| d.status().interrupted())
        else {
            return;
        };

        let message = format!("{phase} interrupted before it completed");
        tracing::warn!(deployment_id = %id, %phase, %status, "Phase interrupted");

        let recorded = message.clone();
        let outcome = self.advance(id, status, move |d| {
            d.error = Some(recorded);
            d.switch_interrupted |= phase == Phase::Switch;
        });
        if let Err(e) = outcome {
            tracing::warn!(deployment_id = %id, %phase, error = %e, "Could not record interruption");
            return;
        }
        self.emit(
            Some(id),
            EventKind::PhaseFailed {
                phase,
                error: message,
            },
        );
    }

    fn advance(
        &self,
        id: DeploymentId,
        next: DeploymentStatus,
        update: impl FnOnce(&mut Deployment),
    ) -> Result<Deployment, DeployError> {
        let (deployment, from) = self.sessions.advance(id, next, update)?;
        self.record_transition(&deployment, from);
        Ok(deployment)
    }

    /// Record a phase failure on the session and hand the error back.
    fn fail(
        &self,
        id: DeploymentId,
        phase: Phase,
        status: DeploymentStatus,
        error: DeployError,
    ) -> DeployError {
        let message = error.to_string();
        tracing::error!(deployment_id = %id, %phase, error = %message, "Deployment phase failed");

        let recorded = message.clone();
        if let Err(e) = self.advance(id, status, move |d| d.error = Some(recorded)) {
            tracing::warn!(deployment_id = %id, %phase, error = %e, "Could not record phase failure");
        }
        self.emit(
            Some(id),
            EventKind::PhaseFailed {
                phase,
                error: message,
            },
        );
        error
    }

    fn record_transition(&self, deployment: &Deployment, from: DeploymentStatus) {
        let id = deployment.id();
        let status = deployment.status();
        self.emit(Some(id), EventKind::StatusChanged { from, to: status });
        if status.is_terminal() {
            tracing::info!(deployment_id = %id, %status, "Deployment session released");
            self.emit(Some(id), EventKind::Released { status });
        }
    }

    pub(super) fn emit(&self, id: Option<DeploymentId>, kind: EventKind) {
        self.sink.record(&DeploymentEvent::new(id, kind));
    }
}

/// An in-flight phase. Dropping it unresolved records the interruption.
pub(super) struct PhaseGuard<'a> {
    coordinator: &'a DeploymentCoordinator,
    deployment: Deployment,
    phase: Phase,
    armed: bool,
}

impl PhaseGuard<'_> {
    /// Session snapshot taken when the phase started.
    pub(super) fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    pub(super) fn finish(
        mut self,
        next: DeploymentStatus,
        update: impl FnOnce(&mut Deployment),
    ) -> Result<Deployment, DeployError> {
        self.armed = false;
        self.coordinator.advance(self.deployment.id(), next, update)
    }

    pub(super) fn fail(mut self, status: DeploymentStatus, error: DeployError) -> DeployError {
        self.armed = false;
        self.coordinator
            .fail(self.deployment.id(), self.phase, status, error)
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.coordinator.interrupt(self.deployment.id(), self.phase);
        }
    }
}
