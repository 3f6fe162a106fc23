use crate::model::SchemaRecord;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Process-lifetime cache of schema records, keyed by canonical name.
///
/// Sits in front of the storage backend so repeated lookups never touch disk.
/// Only positive results are cached.
#[derive(Default)]
pub struct RuntimeCache {
    entries: RwLock<HashMap<String, Arc<SchemaRecord>>>,
}

impl RuntimeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<SchemaRecord>> {
        self.entries.read().get(name).cloned()
    }

    /// Insert a record, keeping an existing entry if another reader won the race.
    pub fn insert(&self, record: SchemaRecord) -> Arc<SchemaRecord> {
        let mut entries = self.entries.write();
        entries
            .entry(record.name.clone())
            .or_insert_with(|| Arc::new(record))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
