//! # Collaborator Interfaces
//!
//! The crate does not talk to a directory server itself. Everything it needs
//! from the outside world comes in through the traits defined here:
//!
//! - [`SchemaSource`] / [`PagedSearch`]: root metadata and paged retrieval, used
//!   by [`SchemaStore::build`](crate::schema::SchemaStore::build).
//! - [`SchemaLookup`]: schema resolution by name, used when constructing an
//!   [`Attribute`].
//! - [`ChangeTracker`]: the owning directory object, told about every
//!   user-visible mutation of its attributes.
//! - [`ValueConverter`]: native <-> wire value mapping.

use crate::attribute::{AttrValue, Attribute};
use crate::error::Result;
use crate::model::SchemaRecord;
use std::collections::HashMap;
use std::sync::Arc;

/// A directory object as returned by a search.
///
/// Attribute names are matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub dn: String,
    pub attrs: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attrs: HashMap::new(),
        }
    }

    /// Builder-style attribute setter, mostly for fixtures.
    pub fn with(mut self, attr: &str, values: &[&str]) -> Self {
        self.attrs.insert(
            attr.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    pub fn all(&self, attr: &str) -> &[String] {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(attr))
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn first(&self, attr: &str) -> Option<&str> {
        self.all(attr).first().map(String::as_str)
    }

    pub fn display_name(&self) -> Option<&str> {
        self.first("lDAPDisplayName")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOperation {
    /// Whole subtree below the base
    Search,
    /// Direct children of the base only
    List,
    /// The base object itself
    Read,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub operation: SearchOperation,
    pub base: String,
    pub filter: String,
    pub attributes: Vec<String>,
    pub page_size: u32,
}

/// One step of a paged search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Entries(Vec<DirectoryEntry>),
    /// The task could not continue because the referral hop limit was hit.
    ReferralLimitReached,
}

/// A running paged retrieval task.
pub trait PagedSearch {
    /// Pull the next page. An empty `Entries` page is valid.
    fn next_page(&mut self) -> Page;

    /// True once the server reported no further pages.
    fn is_complete(&self) -> bool;
}

/// The directory connection, as far as schema population is concerned.
pub trait SchemaSource {
    /// Location of the schema container, from the root entry metadata.
    fn schema_naming_context(&self) -> Result<String>;

    /// Start a paged retrieval task.
    fn paged_search(&self, request: SearchRequest) -> Result<Box<dyn PagedSearch + '_>>;
}

/// Schema resolution by (any-case) name.
pub trait SchemaLookup {
    fn lookup(&self, name: &str) -> Result<Option<Arc<SchemaRecord>>>;
}

/// A lookup that never finds anything: every attribute is unconstrained.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSchema;

impl SchemaLookup for NoSchema {
    fn lookup(&self, _name: &str) -> Result<Option<Arc<SchemaRecord>>> {
        Ok(None)
    }
}

/// The directory object that owns a set of attributes.
pub trait ChangeTracker: Send + Sync {
    /// Called after every non-silent mutation of `attribute`.
    fn attribute_changed(&self, attribute: &Attribute);
}

/// Maps values between their wire form and native Rust values.
pub trait ValueConverter {
    fn to_native(&self, attribute: &str, values: Vec<AttrValue>) -> Result<Vec<AttrValue>>;

    fn to_wire(&self, attribute: &str, values: Vec<AttrValue>) -> Result<Vec<AttrValue>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_names_are_case_insensitive() {
        let entry = DirectoryEntry::new("CN=cn,CN=Schema")
            .with("lDAPDisplayName", &["cn"])
            .with("objectClass", &["top", "attributeSchema"]);

        assert_eq!(entry.display_name(), Some("cn"));
        assert_eq!(entry.first("LDAPDISPLAYNAME"), Some("cn"));
        assert_eq!(entry.all("objectclass").len(), 2);
        assert!(entry.all("missing").is_empty());
        assert_eq!(entry.first("missing"), None);
    }

    #[test]
    fn test_no_schema_lookup() {
        assert!(NoSchema.lookup("cn").unwrap().is_none());
    }
}
