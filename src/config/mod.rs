// ABOUTME: Deployment configuration types and parsing for cutover.yml.
// ABOUTME: Handles YAML parsing, env references, validation and template generation.

mod deserialize;
mod env_value;
mod environments;
mod healthcheck;
mod push;

pub use env_value::{EnvValue, resolve_env_map};
pub use environments::EnvironmentsConfig;
pub use healthcheck::HealthcheckConfig;
pub use push::PushConfig;

use crate::error::{Error, Result};
use crate::types::{EnvironmentName, EnvironmentPair};
use deserialize::deserialize_resolved;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "cutover.yml";
pub const CONFIG_FILENAME_ALT: &str = "cutover.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".cutover/config.yml";

const DEFAULT_STATE_FILE: &str = ".cutover/pointer.json";

/// Immutable settings for one coordinator. Loaded once, never mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentConfig {
    /// Base domain the environment hosts live under.
    #[serde(deserialize_with = "deserialize_resolved")]
    pub domain: String,

    #[serde(default)]
    pub environments: EnvironmentsConfig,

    #[serde(default)]
    pub health: HealthcheckConfig,

    /// Grace period between verification and the pointer write.
    #[serde(default = "default_switch_delay", with = "humantime_serde")]
    pub switch_delay: Duration,

    #[serde(default)]
    pub auto_rollback: bool,

    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    pub push: PushConfig,

    /// Directory the config was loaded from; relative paths resolve against it.
    #[serde(skip)]
    base_dir: PathBuf,
}

fn default_switch_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_state_file() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_FILE)
}

impl DeploymentConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: DeploymentConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        // .cutover/config.yml keeps state relative to the project, not .cutover/
        config.base_dir = match path.parent() {
            Some(dir) if dir.ends_with(".cutover") => {
                dir.parent().map(Path::to_path_buf).unwrap_or_default()
            }
            Some(dir) => dir.to_path_buf(),
            None => PathBuf::new(),
        };
        Ok(config)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    fn validate(&self) -> Result<()> {
        if self.domain.trim().is_empty() {
            return Err(Error::InvalidConfig("domain cannot be empty".to_string()));
        }
        if self.push.command.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "push.command cannot be empty".to_string(),
            ));
        }
        self.health.validate().map_err(Error::InvalidConfig)
    }

    pub fn roles(&self) -> &EnvironmentPair {
        self.environments.roles()
    }

    /// Host serving the given role.
    pub fn host_for(&self, environment: &EnvironmentName) -> String {
        self.environments.host_for(environment, &self.domain)
    }

    /// Health endpoint URL for the given role.
    pub fn health_url(&self, environment: &EnvironmentName) -> String {
        format!(
            "{}://{}{}",
            self.health.scheme,
            self.host_for(environment),
            self.health.path
        )
    }

    /// Directory relative paths resolve against. Empty for configs parsed from a string.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Location of the persisted environment pointer.
    pub fn state_path(&self) -> PathBuf {
        if self.state_file.is_absolute() {
            self.state_file.clone()
        } else {
            self.base_dir.join(&self.state_file)
        }
    }

    pub fn template() -> Self {
        DeploymentConfig {
            domain: "example.com".to_string(),
            environments: EnvironmentsConfig::default(),
            health: HealthcheckConfig::default(),
            switch_delay: default_switch_delay(),
            auto_rollback: false,
            state_file: default_state_file(),
            push: PushConfig {
                command: "./deploy/push.sh".to_string(),
                finalize_command: None,
                env: Default::default(),
            },
            base_dir: PathBuf::new(),
        }
    }
}

pub fn init_config(dir: &Path, domain: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = DeploymentConfig::template();

    if let Some(d) = domain {
        if d.trim().is_empty() {
            return Err(Error::InvalidConfig("domain cannot be empty".to_string()));
        }
        config.domain = d.to_string();
    }

    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &DeploymentConfig) -> String {
    format!(
        r#"domain: {}
environments:
  blue: {}
  green: {}
  host_template: "{}"
health:
  path: {}
  timeout: {}
  retries: {}
  interval: {}
switch_delay: {}
auto_rollback: {}
state_file: {}
push:
  command: {}
"#,
        config.domain,
        config.roles().blue(),
        config.roles().green(),
        config.environments.host_template(),
        config.health.path,
        humantime_serde::re::humantime::format_duration(config.health.timeout),
        config.health.retries,
        humantime_serde::re::humantime::format_duration(config.health.interval),
        humantime_serde::re::humantime::format_duration(config.switch_delay),
        config.auto_rollback,
        config.state_file.display(),
        config.push.command,
    )
}
