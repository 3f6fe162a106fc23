//! # dirschema
//!
//! The metadata-cache and value-container core of a directory-service client.
//!
//! ## The Two Pieces
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Attribute (attribute/)                                     │
//! │  - Holds the value(s) of one attribute                      │
//! │  - Enforces single-valued / constructed from the schema     │
//! │  - Tells its owning object about every change               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ lookup(name)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  SchemaStore (schema/)                                      │
//! │  - RuntimeCache: in-memory, process lifetime                │
//! │  - StorageBackend: one record per name + readiness marker   │
//! └─────────────────────────────────────────────────────────────┘
//!                              ▲ build()
//!                              │
//!                 SchemaSource / PagedSearch (directory.rs)
//! ```
//!
//! ## Key Principle: No Directory I/O in Core
//!
//! Connections, filters, paging and referral chasing, value codecs, and the
//! write-back of changed objects all live outside this crate. They are
//! reached through the traits in [`directory`], which keeps the core testable
//! with scripted sources and in-memory storage.
//!
//! ## Module Overview
//!
//! - [`schema`]: Schema store, storage backends, runtime cache
//! - [`attribute`]: The attribute container and its value type
//! - [`directory`]: Collaborator traits and directory entry type
//! - [`model`]: Schema records and their persisted form
//! - [`config`]: Store configuration
//! - [`error`]: Error types

pub mod attribute;
pub mod config;
pub mod directory;
pub mod error;
pub mod model;
pub mod schema;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use attribute::{AttrValue, Attribute, Selector};
pub use error::{DirError, Result};
pub use schema::{FileSchemaStore, InMemorySchemaStore, SchemaStore};
