use crate::error::Result;
use crate::model::{ReadinessMarker, SchemaObject};

/// Abstract interface for raw schema storage I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while SchemaStore handles the "what" (build, lookup, caching).
///
/// Names passed in are already canonical (lower-cased).
pub trait StorageBackend: Send + Sync {
    // --- Lifecycle ---

    /// Whether the backing storage exists (a build or flush has run before).
    fn is_initialized(&self) -> bool;

    /// Create the backing storage.
    fn initialize(&self) -> Result<()>;

    // --- Records ---

    /// Returns Ok(None) if no record exists under `name`.
    /// Returns Err only on actual I/O or decoding errors.
    fn read_record(&self, name: &str) -> Result<Option<SchemaObject>>;

    /// Write a record.
    /// MUST be atomic (e.g. write to tmp then rename) to avoid partial writes.
    fn write_record(&self, name: &str, record: &SchemaObject) -> Result<()>;

    /// Delete every record, returning how many were removed.
    fn delete_records(&self) -> Result<usize>;

    /// Canonical names of all stored records.
    fn list_names(&self) -> Result<Vec<String>>;

    // --- Readiness marker ---

    fn has_marker(&self) -> bool;

    fn read_marker(&self) -> Result<Option<ReadinessMarker>>;

    fn write_marker(&self, marker: &ReadinessMarker) -> Result<()>;

    fn delete_marker(&self) -> Result<()>;
}
