// ABOUTME: Persisted pointer naming the environment that serves production traffic.
// ABOUTME: Single write path, bootstrap-on-first-read, inactive role always derived.

mod error;
mod file;
mod memory;

pub use error::{PointerError, PointerErrorKind};
pub use file::FilePointerStore;
pub use memory::MemoryPointerStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::types::{EnvironmentName, EnvironmentPair};

/// The persisted record. Only the active role is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentPointer {
    pub active_environment: String,
}

impl EnvironmentPointer {
    pub fn new(active: impl Into<String>) -> Self {
        Self {
            active_environment: active.into(),
        }
    }
}

/// Raw storage for the pointer record.
///
/// `replace` must be atomic: a concurrent `read` sees either the old record
/// or the new one, never a partial write.
#[async_trait]
pub trait PointerBackend: Send + Sync {
    /// Returns `None` when no record has been written yet.
    async fn read(&self) -> Result<Option<EnvironmentPointer>, PointerError>;

    async fn replace(&self, pointer: &EnvironmentPointer) -> Result<(), PointerError>;
}

/// Role-aware access to the pointer record.
#[derive(Clone)]
pub struct EnvironmentPointerStore {
    backend: Arc<dyn PointerBackend>,
    roles: EnvironmentPair,
}

impl std::fmt::Debug for EnvironmentPointerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentPointerStore")
            .field("roles", &self.roles)
            .finish()
    }
}

impl EnvironmentPointerStore {
    pub fn new(backend: Arc<dyn PointerBackend>, roles: EnvironmentPair) -> Self {
        Self { backend, roles }
    }

    pub fn roles(&self) -> &EnvironmentPair {
        &self.roles
    }

    /// Currently active role. Bootstraps the record with the blue role if
    /// nothing has been persisted yet.
    pub async fn active_environment(&self) -> Result<EnvironmentName, PointerError> {
        match self.backend.read().await? {
            Some(pointer) => self
                .roles
                .find(&pointer.active_environment)
                .cloned()
                .ok_or(PointerError::UnknownEnvironment {
                    name: pointer.active_environment,
                }),
            None => {
                let default = self.roles.blue().clone();
                tracing::info!(active = %default, "Bootstrapping environment pointer");
                self.backend
                    .replace(&EnvironmentPointer::new(default.as_str()))
                    .await?;
                Ok(default)
            }
        }
    }

    /// The role that is not active.
    pub fn inactive_for(&self, active: &EnvironmentName) -> Result<EnvironmentName, PointerError> {
        self.roles
            .other(active)
            .cloned()
            .ok_or_else(|| PointerError::UnknownEnvironment {
                name: active.to_string(),
            })
    }

    /// Reads the pointer and returns `(active, inactive)`.
    pub async fn roles_snapshot(
        &self,
    ) -> Result<(EnvironmentName, EnvironmentName), PointerError> {
        let active = self.active_environment().await?;
        let inactive = self.inactive_for(&active)?;
        Ok((active, inactive))
    }

    /// The only way the pointer changes.
    pub async fn set_active_environment(&self, name: &EnvironmentName) -> Result<(), PointerError> {
        if !self.roles.contains(name) {
            return Err(PointerError::UnknownEnvironment {
                name: name.to_string(),
            });
        }
        self.backend
            .replace(&EnvironmentPointer::new(name.as_str()))
            .await?;
        tracing::info!(active = %name, "Active environment set");
        Ok(())
    }
}
