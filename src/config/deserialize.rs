// ABOUTME: Custom serde deserializers for config values.
// ABOUTME: Resolves env references at load time so the config never changes afterwards.

use serde::Deserialize;
use std::collections::HashMap;

use super::env_value::{EnvValue, resolve_env_map};

pub fn deserialize_resolved<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = EnvValue::deserialize(deserializer)?;
    value.resolve().map_err(serde::de::Error::custom)
}

pub fn deserialize_resolved_map<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: HashMap<String, EnvValue> = HashMap::deserialize(deserializer)?;
    resolve_env_map(&values).map_err(serde::de::Error::custom)
}
