// ABOUTME: Validated environment role names ("blue", "green", ...).
// ABOUTME: Role names are short lowercase slugs that get substituted into host labels.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Longest accepted role name. The name is substituted into a host label,
/// so it leaves room for the rest of the template.
pub const MAX_ROLE_NAME_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvironmentNameError {
    #[error("environment name cannot be empty")]
    Empty,

    #[error("environment name is longer than {} characters", MAX_ROLE_NAME_LEN)]
    TooLong,

    #[error("environment name must start with a lowercase letter, found '{0}'")]
    BadFirstChar(char),

    #[error("environment name cannot end with a hyphen")]
    TrailingHyphen,

    #[error("environment name cannot contain consecutive hyphens")]
    DoubleHyphen,

    #[error("environment name may only contain a-z, 0-9 and '-', found '{0}'")]
    InvalidChar(char),
}

/// Name of one of the two deployment environments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvironmentName(String);

impl EnvironmentName {
    /// Accepts short lowercase slugs such as `blue` or `canary-2`.
    pub fn new(value: &str) -> Result<Self, EnvironmentNameError> {
        let mut chars = value.chars();
        match chars.next() {
            None => return Err(EnvironmentNameError::Empty),
            Some(first) if !first.is_ascii_lowercase() => {
                return Err(EnvironmentNameError::BadFirstChar(first));
            }
            Some(_) => {}
        }
        if value.len() > MAX_ROLE_NAME_LEN {
            return Err(EnvironmentNameError::TooLong);
        }

        let mut previous = ' ';
        for c in chars {
            match c {
                'a'..='z' | '0'..='9' => {}
                '-' if previous == '-' => return Err(EnvironmentNameError::DoubleHyphen),
                '-' => {}
                other => return Err(EnvironmentNameError::InvalidChar(other)),
            }
            previous = c;
        }
        if previous == '-' {
            return Err(EnvironmentNameError::TrailingHyphen);
        }

        Ok(Self(value.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnvironmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<str> for EnvironmentName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EnvironmentName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Serialize for EnvironmentName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EnvironmentName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::new(&value).map_err(serde::de::Error::custom)
    }
}

/// The two configured roles. Every role the coordinator handles is one of
/// these; the inactive role is always derived from the active one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentPair {
    blue: EnvironmentName,
    green: EnvironmentName,
}

impl EnvironmentPair {
    /// Returns `None` when both roles carry the same name.
    pub fn new(blue: EnvironmentName, green: EnvironmentName) -> Option<Self> {
        if blue == green {
            return None;
        }
        Some(Self { blue, green })
    }

    /// The bootstrap role used when no pointer record exists yet.
    pub fn blue(&self) -> &EnvironmentName {
        &self.blue
    }

    pub fn green(&self) -> &EnvironmentName {
        &self.green
    }

    pub fn contains(&self, name: &EnvironmentName) -> bool {
        *name == self.blue || *name == self.green
    }

    /// The complementary role, or `None` if `name` is not one of the pair.
    pub fn other(&self, name: &EnvironmentName) -> Option<&EnvironmentName> {
        if *name == self.blue {
            Some(&self.green)
        } else if *name == self.green {
            Some(&self.blue)
        } else {
            None
        }
    }

    /// Looks up a role by its raw name.
    pub fn find(&self, name: &str) -> Option<&EnvironmentName> {
        [&self.blue, &self.green]
            .into_iter()
            .find(|role| role.as_str() == name)
    }
}

impl Default for EnvironmentPair {
    fn default() -> Self {
        Self {
            blue: EnvironmentName("blue".to_string()),
            green: EnvironmentName("green".to_string()),
        }
    }
}
