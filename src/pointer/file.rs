// ABOUTME: JSON-file pointer backend.
// ABOUTME: Every write goes to its own sibling temp file, renamed over the record.

use async_trait::async_trait;
use snafu::ResultExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::error::{CorruptSnafu, EncodeSnafu, PointerError, ReadSnafu, WriteSnafu};
use super::{EnvironmentPointer, PointerBackend};

/// Stores the pointer as `{"activeEnvironment": "..."}` in a single file.
#[derive(Debug, Clone)]
pub struct FilePointerStore {
    path: PathBuf,
}

impl FilePointerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Write `data` to a fresh temp file beside `path`, then rename it over `path`.
///
/// Each call gets its own temp file, so concurrent writers never share one.
fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut staging = NamedTempFile::new_in(dir)?;
    staging.write_all(data)?;
    staging.as_file().sync_all()?;
    staging.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl PointerBackend for FilePointerStore {
    async fn read(&self) -> Result<Option<EnvironmentPointer>, PointerError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context(ReadSnafu { path: &self.path }),
        };

        let pointer =
            serde_json::from_str(&content).context(CorruptSnafu { path: &self.path })?;
        Ok(Some(pointer))
    }

    async fn replace(&self, pointer: &EnvironmentPointer) -> Result<(), PointerError> {
        let json = serde_json::to_vec_pretty(pointer).context(EncodeSnafu)?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &json))
            .await
            .map_err(std::io::Error::other)
            .and_then(|written| written)
            .context(WriteSnafu { path: &self.path })?;

        tracing::debug!(
            path = %self.path.display(),
            active = %pointer.active_environment,
            "Pointer record replaced"
        );
        Ok(())
    }
}
