// ABOUTME: Settings for the external artifact push mechanism.
// ABOUTME: The push itself is an operator-supplied shell command.

use serde::Deserialize;
use std::collections::HashMap;

use super::deserialize::deserialize_resolved_map;

#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    /// Run with `sh -c`; receives the target environment and version via env.
    pub command: String,

    /// Optional command run while finalizing a switched deployment.
    #[serde(default)]
    pub finalize_command: Option<String>,

    #[serde(default, deserialize_with = "deserialize_resolved_map")]
    pub env: HashMap<String, String>,
}
