//! Fixtures shared by unit tests (and by downstream crates via the
//! `test_utils` feature).

use crate::attribute::{AttrValue, Attribute};
use crate::directory::{
    ChangeTracker, DirectoryEntry, Page, PagedSearch, SchemaLookup, SchemaSource, SearchRequest,
    ValueConverter,
};
use crate::error::Result;
use crate::model::{AttributeSchema, SchemaKind, SchemaRecord, DN_SYNTAX};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// An attributeSchema entry as the directory would return it.
pub fn attribute_entry(name: &str, syntax: &str, single_valued: bool, system_flags: i64) -> DirectoryEntry {
    let flags = system_flags.to_string();
    DirectoryEntry::new(format!("CN={},CN=Schema", name))
        .with("objectClass", &["top", "attributeSchema"])
        .with("lDAPDisplayName", &[name])
        .with("attributeSyntax", &[syntax])
        .with("oMSyntax", &["64"])
        .with("isSingleValued", &[if single_valued { "TRUE" } else { "FALSE" }])
        .with("systemFlags", &[flags.as_str()])
}

/// A classSchema entry as the directory would return it.
pub fn class_entry(name: &str, allowed: &[&str]) -> DirectoryEntry {
    DirectoryEntry::new(format!("CN={},CN=Schema", name))
        .with("objectClass", &["top", "classSchema"])
        .with("lDAPDisplayName", &[name])
        .with("rDNAttID", &["cn"])
        .with("subClassOf", &["top"])
        .with("allowedAttributes", allowed)
        .with("systemOnly", &["FALSE"])
}

struct ScriptedTask {
    pages: VecDeque<Vec<DirectoryEntry>>,
    fail_at: Option<usize>,
    served: usize,
}

impl PagedSearch for ScriptedTask {
    fn next_page(&mut self) -> Page {
        if self.fail_at == Some(self.served) {
            return Page::ReferralLimitReached;
        }
        self.served += 1;
        Page::Entries(self.pages.pop_front().unwrap_or_default())
    }

    fn is_complete(&self) -> bool {
        let failure_pending = self.fail_at.is_some_and(|at| at >= self.served);
        self.pages.is_empty() && !failure_pending
    }
}

/// A directory that serves a fixed set of schema pages.
pub struct ScriptedSource {
    root: String,
    attribute_pages: Vec<Vec<DirectoryEntry>>,
    class_pages: Vec<Vec<DirectoryEntry>>,
    class_fail_at: Option<usize>,
    requests: Mutex<Vec<SearchRequest>>,
}

impl ScriptedSource {
    pub fn new(root: &str) -> Self {
        Self {
            root: root.to_string(),
            attribute_pages: Vec::new(),
            class_pages: Vec::new(),
            class_fail_at: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn attribute_pages(mut self, pages: Vec<Vec<DirectoryEntry>>) -> Self {
        self.attribute_pages = pages;
        self
    }

    pub fn class_pages(mut self, pages: Vec<Vec<DirectoryEntry>>) -> Self {
        self.class_pages = pages;
        self
    }

    /// Make the class task hit the referral limit on its `page`-th call (0-based).
    pub fn fail_class_task_at(mut self, page: usize) -> Self {
        self.class_fail_at = Some(page);
        self
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().clone()
    }
}

impl SchemaSource for ScriptedSource {
    fn schema_naming_context(&self) -> Result<String> {
        Ok(self.root.clone())
    }

    fn paged_search(&self, request: SearchRequest) -> Result<Box<dyn PagedSearch + '_>> {
        let is_class = request.filter.contains("classSchema");
        self.requests.lock().push(request);

        let (pages, fail_at) = if is_class {
            (self.class_pages.clone(), self.class_fail_at)
        } else {
            (self.attribute_pages.clone(), None)
        };
        Ok(Box::new(ScriptedTask {
            pages: pages.into(),
            fail_at,
            served: 0,
        }))
    }
}

/// Owner that records every change notification.
#[derive(Default)]
pub struct RecordingOwner {
    changes: Mutex<Vec<(String, usize)>>,
}

impl RecordingOwner {
    /// Names of the attributes reported, in order.
    pub fn changes(&self) -> Vec<String> {
        self.changes.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    /// Value count of the attribute at the most recent notification.
    pub fn last_count(&self) -> Option<usize> {
        self.changes.lock().last().map(|(_, count)| *count)
    }
}

impl ChangeTracker for RecordingOwner {
    fn attribute_changed(&self, attribute: &Attribute) {
        self.changes
            .lock()
            .push((attribute.name().to_string(), attribute.count()));
    }
}

/// Hand-built schema for attribute tests.
#[derive(Default)]
pub struct StaticLookup {
    records: HashMap<String, Arc<SchemaRecord>>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, schema: AttributeSchema) -> Self {
        let name = name.to_lowercase();
        self.records.insert(
            name.clone(),
            Arc::new(SchemaRecord {
                name,
                kind: SchemaKind::Attribute(schema),
            }),
        );
        self
    }

    pub fn single_valued(self, name: &str) -> Self {
        self.with(
            name,
            AttributeSchema {
                single_valued: true,
                ..plain()
            },
        )
    }

    pub fn constructed(self, name: &str) -> Self {
        self.with(
            name,
            AttributeSchema {
                constructed: true,
                ..plain()
            },
        )
    }

    pub fn dn(self, name: &str) -> Self {
        self.with(
            name,
            AttributeSchema {
                syntax: DN_SYNTAX.to_string(),
                ..plain()
            },
        )
    }
}

fn plain() -> AttributeSchema {
    AttributeSchema {
        syntax: "2.5.5.12".to_string(),
        sub_syntax: Some("64".to_string()),
        single_valued: false,
        constructed: false,
        range_lower: None,
        range_upper: None,
    }
}

impl SchemaLookup for StaticLookup {
    fn lookup(&self, name: &str) -> Result<Option<Arc<SchemaRecord>>> {
        Ok(self.records.get(&name.to_lowercase()).cloned())
    }
}

/// Upper-cases text on the way in, lower-cases it on the way out.
pub struct UppercaseConverter;

impl ValueConverter for UppercaseConverter {
    fn to_native(&self, _attribute: &str, values: Vec<AttrValue>) -> Result<Vec<AttrValue>> {
        Ok(values
            .into_iter()
            .map(|v| match v {
                AttrValue::Text(s) => AttrValue::Text(s.to_uppercase()),
                other => other,
            })
            .collect())
    }

    fn to_wire(&self, _attribute: &str, values: Vec<AttrValue>) -> Result<Vec<AttrValue>> {
        Ok(values
            .into_iter()
            .map(|v| match v {
                AttrValue::Text(s) => AttrValue::Text(s.to_lowercase()),
                other => other,
            })
            .collect())
    }
}
