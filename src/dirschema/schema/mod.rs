//! # Schema Store
//!
//! Two-tier cache of directory schema metadata:
//!
//! 1. **Persistent**: one JSON record per attribute or class name, written by
//!    [`SchemaStore::build`] from a paged walk of the directory's schema
//!    container.
//! 2. **Runtime**: a process-lifetime [`RuntimeCache`] in front of the
//!    persistent tier, so repeated lookups never re-read storage.
//!
//! ## Readiness
//!
//! Individual record writes are atomic but a build as a whole is not. The
//! readiness marker is written after the last record and is the only signal
//! that the store is complete: [`SchemaStore::is_ready`] reports its presence.
//! A failed build leaves whatever records it managed to write, without a
//! marker.
//!
//! ## Caveat: flush vs runtime cache
//!
//! [`SchemaStore::flush`] removes persisted records only. Records already
//! resolved into the runtime cache keep being served until
//! [`SchemaStore::clear_runtime_cache`] is called or the store is dropped.
//!
//! ## Concurrency
//!
//! `build` and `flush` hold an exclusive gate for their whole duration; backend
//! reads in `get` hold it shared. The runtime cache has its own read-favoring
//! lock. Both backends are `Send + Sync`.
//!
//! ## Storage Layout
//!
//! ```text
//! <schema_dir>/
//! ├── .ready.json         # Readiness marker (build timestamp + counts)
//! ├── cn.json             # One record per lower-cased display name
//! ├── member.json
//! └── user.json
//! ```

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;
pub mod runtime;
pub mod store;

pub use backend::StorageBackend;
pub use fs_backend::FsBackend;
pub use mem_backend::MemBackend;
pub use runtime::RuntimeCache;
pub use store::{BuildReport, SchemaStore};

use crate::config::SchemaConfig;

pub type FileSchemaStore = SchemaStore<FsBackend>;

pub type InMemorySchemaStore = SchemaStore<MemBackend>;

impl FileSchemaStore {
    pub fn from_config(config: &SchemaConfig) -> Self {
        SchemaStore::with_backend(FsBackend::from_config(config)).with_page_size(config.page_size)
    }
}

impl Default for InMemorySchemaStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySchemaStore {
    pub fn new() -> Self {
        SchemaStore::with_backend(MemBackend::new())
    }
}
