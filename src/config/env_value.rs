// ABOUTME: Config values given inline or read from the deploy host's environment.
// ABOUTME: Resolved once at load time; an empty variable counts as unset.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;

/// `domain: shop.example.com` or `domain: { env: SHOP_DOMAIN, default: ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        name: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvValue {
    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<String> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve using `lookup` for variable values.
    pub fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
        let (name, default) = match self {
            EnvValue::Literal(value) => return Ok(value.clone()),
            EnvValue::FromEnv { name, default } => (name, default),
        };

        lookup(name)
            .filter(|value| !value.is_empty())
            .or_else(|| default.clone())
            .ok_or_else(|| Error::MissingEnvVar(name.clone()))
    }
}

/// Resolve every value, failing on the first missing variable.
pub fn resolve_env_map(map: &HashMap<String, EnvValue>) -> Result<HashMap<String, String>> {
    let mut resolved = HashMap::with_capacity(map.len());
    for (key, value) in map {
        resolved.insert(key.clone(), value.resolve()?);
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(default: Option<&str>) -> EnvValue {
        EnvValue::FromEnv {
            name: "SHOP_DOMAIN".to_string(),
            default: default.map(str::to_string),
        }
    }

    #[test]
    fn set_variable_wins_over_default() {
        let value = reference(Some("fallback"))
            .resolve_with(|_| Some("shop.example.com".to_string()))
            .unwrap();
        assert_eq!(value, "shop.example.com");
    }

    #[test]
    fn empty_variable_uses_default() {
        let value = reference(Some("fallback"))
            .resolve_with(|_| Some(String::new()))
            .unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn unset_variable_without_default_names_it() {
        let err = reference(None).resolve_with(|_| None).unwrap_err();
        assert!(err.to_string().contains("SHOP_DOMAIN"));
    }

    #[test]
    fn both_yaml_forms_parse() {
        let literal: EnvValue = serde_yaml::from_str("shop.example.com").unwrap();
        assert_eq!(literal, EnvValue::Literal("shop.example.com".to_string()));

        let from_env: EnvValue = serde_yaml::from_str("env: SHOP_DOMAIN").unwrap();
        assert_eq!(from_env, reference(None));
    }
}
