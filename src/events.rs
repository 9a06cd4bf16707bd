// ABOUTME: Typed deployment events and the sinks that receive them.
// ABOUTME: Sinks are injected by the caller; nothing subscribes implicitly.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc;

use crate::deploy::{DeploymentStatus, Phase};
use crate::health::HealthCheckAttempt;
use crate::types::{DeploymentId, EnvironmentName};

/// Something the audit/observability pipeline should know about.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentEvent {
    /// Absent for events outside a session (manual rollback, ad-hoc health checks).
    pub deployment_id: Option<DeploymentId>,
    pub at: DateTime<Utc>,
    /// Host the coordinator runs on.
    pub origin: String,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl DeploymentEvent {
    pub fn new(deployment_id: Option<DeploymentId>, kind: EventKind) -> Self {
        Self {
            deployment_id,
            at: Utc::now(),
            origin: origin_host().to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    Created {
        active: EnvironmentName,
        inactive: EnvironmentName,
    },
    StatusChanged {
        from: DeploymentStatus,
        to: DeploymentStatus,
    },
    PhaseFailed {
        phase: Phase,
        error: String,
    },
    HealthCheck {
        environment: EnvironmentName,
        attempt: HealthCheckAttempt,
    },
    TrafficSwitched {
        from: EnvironmentName,
        to: EnvironmentName,
    },
    Released {
        status: DeploymentStatus,
    },
    ManualRollback {
        from: EnvironmentName,
        to: EnvironmentName,
    },
}

fn origin_host() -> &'static str {
    static HOST: OnceLock<String> = OnceLock::new();
    HOST.get_or_init(|| gethostname::gethostname().to_string_lossy().into_owned())
}

/// Receives events. Must not block; called from inside coordinator phases.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &DeploymentEvent);
}

/// Logs every event through `tracing`. The default sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &DeploymentEvent) {
        let deployment_id = event
            .deployment_id
            .map(|id| id.to_string())
            .unwrap_or_default();
        match &event.kind {
            EventKind::PhaseFailed { phase, error } => {
                tracing::error!(%deployment_id, %phase, %error, "Deployment phase failed");
            }
            EventKind::HealthCheck {
                environment,
                attempt,
            } => {
                tracing::debug!(
                    %deployment_id,
                    %environment,
                    attempt = attempt.attempt_number,
                    outcome = ?attempt.outcome,
                    "Health check attempt"
                );
            }
            other => {
                tracing::debug!(%deployment_id, event = ?other, "Deployment event");
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<DeploymentEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DeploymentEvent> {
        self.events.lock().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().iter().map(|e| e.kind.clone()).collect()
    }

    /// Health-check attempts in the order they were reported.
    pub fn health_attempts(&self) -> Vec<HealthCheckAttempt> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match &e.kind {
                EventKind::HealthCheck { attempt, .. } => Some(attempt.clone()),
                _ => None,
            })
            .collect()
    }

    /// Status transitions as `(from, to)` pairs.
    pub fn transitions(&self) -> Vec<(DeploymentStatus, DeploymentStatus)> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::StatusChanged { from, to } => Some((from, to)),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: &DeploymentEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Forwards events to an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<DeploymentEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DeploymentEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn record(&self, event: &DeploymentEvent) {
        if self.sender.send(event.clone()).is_err() {
            tracing::debug!("Event receiver dropped, discarding event");
        }
    }
}

/// Delivers each event to several sinks in order.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutSink {
    fn record(&self, event: &DeploymentEvent) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}
