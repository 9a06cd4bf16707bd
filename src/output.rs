// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes, and doubles as an event sink.

use serde::Serialize;
use std::time::Instant;

use crate::deploy::DeploymentStatus;
use crate::events::{DeploymentEvent, EventKind, EventSink};
use crate::health::AttemptOutcome;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

impl OutputMode {
    /// JSON wins over quiet when both flags are given.
    pub fn from_flags(quiet: bool, json: bool) -> Self {
        if json {
            OutputMode::Json
        } else if quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

/// Handles CLI output based on the configured mode.
#[derive(Debug)]
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                println!("{message}");
            }
            OutputMode::Json => self.json_line("success", message, false),
        }
    }

    /// Print a warning. Quiet mode still shows warnings.
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Warning: {message}"),
            OutputMode::Json => self.json_line("warning", message, true),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => self.json_line("error", message, true),
        }
    }

    /// Print a serializable value as one JSON line.
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::warn!(error = %e, "Failed to encode JSON output"),
        }
    }

    fn json_line(&self, event: &str, message: &str, stderr: bool) {
        let line = JsonEvent {
            event,
            message,
            duration_secs: self.duration(),
        };
        if let Ok(json) = serde_json::to_string(&line) {
            if stderr {
                eprintln!("{json}");
            } else {
                println!("{json}");
            }
        }
    }
}

impl EventSink for Output {
    fn record(&self, event: &DeploymentEvent) {
        match self.mode {
            OutputMode::Quiet => {}
            OutputMode::Json => self.json(event),
            OutputMode::Normal => {
                if let Some(line) = describe(&event.kind) {
                    println!("{line}");
                }
            }
        }
    }
}

/// Progress line for an event, if it deserves one.
fn describe(kind: &EventKind) -> Option<String> {
    match kind {
        EventKind::Created { active, inactive } => Some(format!(
            "  → {active} is live, deploying to {inactive}"
        )),
        EventKind::StatusChanged { to, .. } => match to {
            DeploymentStatus::Deploying => Some("  → Pushing artifact...".to_string()),
            DeploymentStatus::Verifying => Some("  → Verifying health...".to_string()),
            DeploymentStatus::Switching => Some("  → Switching traffic...".to_string()),
            DeploymentStatus::Finalizing => Some("  → Finalizing...".to_string()),
            DeploymentStatus::RollingBack => Some("  → Rolling back...".to_string()),
            _ => None,
        },
        EventKind::HealthCheck {
            environment,
            attempt,
        } => {
            let mark = match attempt.outcome {
                AttemptOutcome::Healthy => "✓",
                AttemptOutcome::Unhealthy | AttemptOutcome::Error => "✗",
            };
            let detail = attempt
                .detail
                .as_deref()
                .map(|d| format!(": {d}"))
                .unwrap_or_default();
            Some(format!(
                "    {mark} {environment} attempt {}{detail}",
                attempt.attempt_number
            ))
        }
        EventKind::PhaseFailed { phase, error } => Some(format!("  ✗ {phase} failed: {error}")),
        EventKind::TrafficSwitched { from, to } => {
            Some(format!("  ✓ Traffic moved from {from} to {to}"))
        }
        EventKind::ManualRollback { from, to } => {
            Some(format!("  ✓ Traffic moved from {from} to {to}"))
        }
        EventKind::Released { .. } => None,
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnvironmentName;

    fn name(s: &str) -> EnvironmentName {
        EnvironmentName::new(s).unwrap()
    }

    #[test]
    fn json_flag_overrides_quiet() {
        assert_eq!(OutputMode::from_flags(true, true), OutputMode::Json);
        assert_eq!(OutputMode::from_flags(true, false), OutputMode::Quiet);
        assert_eq!(OutputMode::from_flags(false, false), OutputMode::Normal);
    }

    #[test]
    fn release_events_print_nothing() {
        let kind = EventKind::Released {
            status: DeploymentStatus::Completed,
        };
        assert!(describe(&kind).is_none());
    }

    #[test]
    fn switch_line_names_both_roles() {
        let line = describe(&EventKind::TrafficSwitched {
            from: name("blue"),
            to: name("green"),
        })
        .unwrap();
        assert!(line.contains("blue"));
        assert!(line.contains("green"));
    }
}
