// ABOUTME: In-memory pointer backend for tests and embedding.
// ABOUTME: Counts writes so callers can assert the pointer was left alone.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::error::PointerError;
use super::{EnvironmentPointer, PointerBackend};

#[derive(Debug, Default)]
pub struct MemoryPointerStore {
    record: Mutex<Option<EnvironmentPointer>>,
    writes: AtomicUsize,
}

impl MemoryPointerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing record, as if a previous deploy had written it.
    pub fn with_active(name: &str) -> Self {
        Self {
            record: Mutex::new(Some(EnvironmentPointer::new(name))),
            writes: AtomicUsize::new(0),
        }
    }

    /// The raw stored record.
    pub fn snapshot(&self) -> Option<EnvironmentPointer> {
        self.record.lock().clone()
    }

    /// Number of successful `replace` calls, including bootstrap writes.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PointerBackend for MemoryPointerStore {
    async fn read(&self) -> Result<Option<EnvironmentPointer>, PointerError> {
        Ok(self.record.lock().clone())
    }

    async fn replace(&self, pointer: &EnvironmentPointer) -> Result<(), PointerError> {
        *self.record.lock() = Some(pointer.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
