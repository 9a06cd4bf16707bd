// ABOUTME: Health verification settings for candidate environments.
// ABOUTME: Probe path, per-attempt timeout, attempt count and the fixed retry interval.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct HealthcheckConfig {
    #[serde(default = "default_scheme")]
    pub scheme: String,

    #[serde(default = "default_path")]
    pub path: String,

    /// Upper bound for a single probe.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Total number of attempts, not additional retries.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Fixed delay between attempts. There is no backoff.
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_path() -> String {
    "/health".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_retries() -> u32 {
    3
}

fn default_interval() -> Duration {
    Duration::from_secs(5)
}

impl HealthcheckConfig {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.scheme != "http" && self.scheme != "https" {
            return Err(format!(
                "health.scheme must be http or https, got '{}'",
                self.scheme
            ));
        }
        if !self.path.starts_with('/') {
            return Err(format!("health.path must start with '/', got '{}'", self.path));
        }
        if self.retries == 0 {
            return Err("health.retries must be at least 1".to_string());
        }
        if self.timeout.is_zero() {
            return Err("health.timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl Default for HealthcheckConfig {
    fn default() -> Self {
        HealthcheckConfig {
            scheme: default_scheme(),
            path: default_path(),
            timeout: default_timeout(),
            retries: default_retries(),
            interval: default_interval(),
        }
    }
}
