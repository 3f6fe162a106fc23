use super::backend::StorageBackend;
use crate::error::{DirError, Result};
use crate::model::{ReadinessMarker, SchemaObject};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// In-memory storage backend for testing.
///
/// Uses `RwLock` so the backend stays `Sync` like the filesystem one; the
/// store shares it between readers.
#[derive(Default)]
pub struct MemBackend {
    initialized: RwLock<bool>,
    records: RwLock<BTreeMap<String, SchemaObject>>,
    marker: RwLock<Option<ReadinessMarker>>,
    simulate_write_error: RwLock<bool>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.write() = simulate;
    }

    /// Test helper to change a stored record behind the store's back.
    pub fn overwrite_record(&self, name: &str, record: SchemaObject) {
        self.records.write().insert(name.to_string(), record);
    }

    fn check_writable(&self) -> Result<()> {
        if *self.simulate_write_error.read() {
            return Err(DirError::Store("Simulated write error".to_string()));
        }
        Ok(())
    }
}

impl StorageBackend for MemBackend {
    fn is_initialized(&self) -> bool {
        *self.initialized.read()
    }

    fn initialize(&self) -> Result<()> {
        *self.initialized.write() = true;
        Ok(())
    }

    fn read_record(&self, name: &str) -> Result<Option<SchemaObject>> {
        Ok(self.records.read().get(name).cloned())
    }

    fn write_record(&self, name: &str, record: &SchemaObject) -> Result<()> {
        self.check_writable()?;
        *self.initialized.write() = true;
        self.records.write().insert(name.to_string(), record.clone());
        Ok(())
    }

    fn delete_records(&self) -> Result<usize> {
        let mut records = self.records.write();
        let count = records.len();
        records.clear();
        Ok(count)
    }

    fn list_names(&self) -> Result<Vec<String>> {
        Ok(self.records.read().keys().cloned().collect())
    }

    fn has_marker(&self) -> bool {
        self.marker.read().is_some()
    }

    fn read_marker(&self) -> Result<Option<ReadinessMarker>> {
        Ok(self.marker.read().clone())
    }

    fn write_marker(&self, marker: &ReadinessMarker) -> Result<()> {
        self.check_writable()?;
        *self.marker.write() = Some(marker.clone());
        Ok(())
    }

    fn delete_marker(&self) -> Result<()> {
        *self.marker.write() = None;
        Ok(())
    }
}
