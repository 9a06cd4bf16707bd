// ABOUTME: The two environment roles and how their hosts are derived.
// ABOUTME: Rejects configs where both roles share a name.

use serde::Deserialize;

use crate::types::{EnvironmentName, EnvironmentPair};

const DEFAULT_HOST_TEMPLATE: &str = "{environment}.{domain}";

#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawEnvironments")]
pub struct EnvironmentsConfig {
    roles: EnvironmentPair,
    host_template: String,
}

#[derive(Debug, Deserialize)]
struct RawEnvironments {
    #[serde(default = "default_blue")]
    blue: EnvironmentName,
    #[serde(default = "default_green")]
    green: EnvironmentName,
    #[serde(default = "default_host_template")]
    host_template: String,
}

fn default_blue() -> EnvironmentName {
    EnvironmentPair::default().blue().clone()
}

fn default_green() -> EnvironmentName {
    EnvironmentPair::default().green().clone()
}

fn default_host_template() -> String {
    DEFAULT_HOST_TEMPLATE.to_string()
}

impl TryFrom<RawEnvironments> for EnvironmentsConfig {
    type Error = String;

    fn try_from(raw: RawEnvironments) -> Result<Self, Self::Error> {
        let blue = raw.blue.clone();
        let roles = EnvironmentPair::new(raw.blue, raw.green)
            .ok_or_else(|| format!("environment roles must differ, both are '{}'", blue))?;
        if raw.host_template.trim().is_empty() {
            return Err("environments.host_template cannot be empty".to_string());
        }
        Ok(Self {
            roles,
            host_template: raw.host_template,
        })
    }
}

impl EnvironmentsConfig {
    pub fn roles(&self) -> &EnvironmentPair {
        &self.roles
    }

    pub fn host_template(&self) -> &str {
        &self.host_template
    }

    /// Host name serving `environment` under `domain`.
    pub fn host_for(&self, environment: &EnvironmentName, domain: &str) -> String {
        self.host_template
            .replace("{environment}", environment.as_str())
            .replace("{domain}", domain)
    }
}

impl Default for EnvironmentsConfig {
    fn default() -> Self {
        Self {
            roles: EnvironmentPair::default(),
            host_template: default_host_template(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_template_substitutes_role_and_domain() {
        let config = EnvironmentsConfig::default();
        let green = config.roles().green().clone();
        assert_eq!(config.host_for(&green, "shop.example"), "green.shop.example");
    }

    #[test]
    fn template_without_placeholders_is_used_verbatim() {
        let config = EnvironmentsConfig {
            roles: EnvironmentPair::default(),
            host_template: "127.0.0.1:8080".to_string(),
        };
        let blue = config.roles().blue().clone();
        assert_eq!(config.host_for(&blue, "ignored"), "127.0.0.1:8080");
    }
}
