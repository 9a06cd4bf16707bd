// ABOUTME: Bounded-retry health verification of a candidate environment.
// ABOUTME: Fixed interval between attempts; every attempt is reported as an event.

mod probe;

pub use probe::{HealthProbe, HttpProbe, ProbeError, ProbeResponse};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::DeploymentConfig;
use crate::events::{DeploymentEvent, EventKind, EventSink, TracingSink};
use crate::types::{DeploymentId, EnvironmentName};

/// Result of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// HTTP 200 with `"status": "healthy"`.
    Healthy,
    /// The endpoint answered, but not with a healthy 200.
    Unhealthy,
    /// No usable answer: network error or timeout.
    Error,
}

/// One probe, surfaced only through events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckAttempt {
    pub attempt_number: u32,
    pub timestamp: DateTime<Utc>,
    pub outcome: AttemptOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Deserialize)]
struct HealthBody {
    status: Option<String>,
}

/// Classify a response. Only a 200 whose JSON body has `status == "healthy"` passes.
pub fn evaluate(response: &ProbeResponse) -> (AttemptOutcome, Option<String>) {
    if response.status != 200 {
        return (
            AttemptOutcome::Unhealthy,
            Some(format!("HTTP {}", response.status)),
        );
    }

    match serde_json::from_str::<HealthBody>(&response.body) {
        Ok(HealthBody {
            status: Some(status),
        }) if status == "healthy" => (AttemptOutcome::Healthy, None),
        Ok(HealthBody { status }) => (
            AttemptOutcome::Unhealthy,
            Some(format!(
                "reported status {}",
                status.as_deref().unwrap_or("<missing>")
            )),
        ),
        Err(e) => (
            AttemptOutcome::Unhealthy,
            Some(format!("malformed body: {e}")),
        ),
    }
}

/// Probes a candidate environment until it is healthy or attempts run out.
#[derive(Clone)]
pub struct HealthVerifier {
    config: Arc<DeploymentConfig>,
    probe: Arc<dyn HealthProbe>,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for HealthVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthVerifier")
            .field("health", &self.config.health)
            .finish()
    }
}

impl HealthVerifier {
    pub fn new(config: Arc<DeploymentConfig>, probe: Arc<dyn HealthProbe>) -> Self {
        Self {
            config,
            probe,
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Probe `candidate` outside any deployment session.
    pub async fn run_health_checks(&self, candidate: &EnvironmentName) -> bool {
        self.verify(candidate, None).await
    }

    /// Returns true on the first healthy attempt, false once every attempt
    /// has failed. Timeouts, bad statuses, malformed bodies and network errors
    /// all count as a failed attempt.
    pub async fn verify(
        &self,
        candidate: &EnvironmentName,
        deployment_id: Option<DeploymentId>,
    ) -> bool {
        let settings = &self.config.health;
        let url = self.config.health_url(candidate);
        let attempts = settings.retries.max(1);

        tracing::info!(
            environment = %candidate,
            %url,
            attempts,
            "Verifying environment health"
        );

        for attempt_number in 1..=attempts {
            let (outcome, detail) =
                match tokio::time::timeout(settings.timeout, self.probe.get(&url, settings.timeout))
                    .await
                {
                    Ok(Ok(response)) => evaluate(&response),
                    Ok(Err(e)) => (AttemptOutcome::Error, Some(e.to_string())),
                    Err(_elapsed) => (
                        AttemptOutcome::Error,
                        Some(ProbeError::Timeout(settings.timeout).to_string()),
                    ),
                };

            let attempt = HealthCheckAttempt {
                attempt_number,
                timestamp: Utc::now(),
                outcome,
                detail,
            };
            self.sink.record(&DeploymentEvent::new(
                deployment_id,
                EventKind::HealthCheck {
                    environment: candidate.clone(),
                    attempt: attempt.clone(),
                },
            ));

            if outcome == AttemptOutcome::Healthy {
                tracing::info!(environment = %candidate, attempt_number, "Environment healthy");
                return true;
            }

            tracing::warn!(
                environment = %candidate,
                attempt_number,
                attempts,
                detail = attempt.detail.as_deref().unwrap_or(""),
                "Health check attempt failed"
            );

            if attempt_number < attempts && !settings.interval.is_zero() {
                tokio::time::sleep(settings.interval).await;
            }
        }

        false
    }
}
