use super::backend::StorageBackend;
use super::runtime::RuntimeCache;
use crate::config::DEFAULT_PAGE_SIZE;
use crate::directory::{Page, SchemaLookup, SchemaSource, SearchOperation, SearchRequest};
use crate::error::{DirError, Result};
use crate::model::{
    AttributeSchema, ClassSchema, ReadinessMarker, SchemaKind, SchemaObject, SchemaRecord,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

const ATTRIBUTE_FILTER: &str = "(objectClass=attributeSchema)";
const CLASS_FILTER: &str = "(objectClass=classSchema)";

const ATTRIBUTE_FIELDS: &[&str] = &[
    "objectClass",
    "lDAPDisplayName",
    "attributeSyntax",
    "oMSyntax",
    "isSingleValued",
    "rangeLower",
    "rangeUpper",
    "systemFlags",
];

const CLASS_FIELDS: &[&str] = &[
    "objectClass",
    "lDAPDisplayName",
    "rDNAttID",
    "subClassOf",
    "allowedAttributes",
    "systemOnly",
];

/// Outcome of a successful [`SchemaStore::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub attributes: usize,
    pub classes: usize,
    pub skipped: usize,
    pub built_at: DateTime<Utc>,
}

#[derive(Default)]
struct TaskTally {
    written: usize,
    skipped: usize,
}

pub struct SchemaStore<B: StorageBackend> {
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
    runtime: RuntimeCache,
    /// Held exclusively by build/flush, shared by backend reads.
    gate: RwLock<()>,
    page_size: u32,
}

impl<B: StorageBackend> SchemaStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            runtime: RuntimeCache::new(),
            gate: RwLock::new(()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn runtime_cache(&self) -> &RuntimeCache {
        &self.runtime
    }

    /// True iff the readiness marker exists.
    pub fn is_ready(&self) -> bool {
        self.backend.has_marker()
    }

    /// Timestamp of the last completed build, if the store is ready.
    pub fn built_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.backend.read_marker()?.map(|marker| marker.built_at))
    }

    /// Repopulate the store from the directory.
    ///
    /// Existing records are flushed first. Attribute definitions are fetched
    /// and written before class definitions; the readiness marker is written
    /// only after both tasks completed. A referral-limit failure aborts the
    /// build and leaves the records written so far without a marker.
    pub fn build(&self, source: &dyn SchemaSource) -> Result<BuildReport> {
        let _guard = self.gate.write();

        if self.backend.is_initialized() {
            self.flush_locked()?;
        } else {
            self.backend.initialize()?;
        }

        let root = source.schema_naming_context()?;
        info!(root = %root, page_size = self.page_size, "Building schema store");

        let attributes = self.run_task(source, &root, ATTRIBUTE_FILTER, ATTRIBUTE_FIELDS)?;
        let classes = self.run_task(source, &root, CLASS_FILTER, CLASS_FIELDS)?;

        let marker = ReadinessMarker {
            built_at: Utc::now(),
            attributes: attributes.written,
            classes: classes.written,
        };
        self.backend.write_marker(&marker)?;

        info!(
            attributes = marker.attributes,
            classes = marker.classes,
            "Schema store ready"
        );

        Ok(BuildReport {
            attributes: marker.attributes,
            classes: marker.classes,
            skipped: attributes.skipped + classes.skipped,
            built_at: marker.built_at,
        })
    }

    fn run_task(
        &self,
        source: &dyn SchemaSource,
        base: &str,
        filter: &str,
        fields: &[&str],
    ) -> Result<TaskTally> {
        let request = SearchRequest {
            operation: SearchOperation::List,
            base: base.to_string(),
            filter: filter.to_string(),
            attributes: fields.iter().map(|f| f.to_string()).collect(),
            page_size: self.page_size,
        };
        let mut search = source.paged_search(request)?;
        let mut tally = TaskTally::default();

        while !search.is_complete() {
            let entries = match search.next_page() {
                Page::Entries(entries) => entries,
                Page::ReferralLimitReached => {
                    warn!(
                        base,
                        filter,
                        written = tally.written,
                        "Referral limit reached, aborting schema build"
                    );
                    return Err(DirError::ReferralLimit {
                        base: base.to_string(),
                        filter: filter.to_string(),
                    });
                }
            };

            for entry in &entries {
                match SchemaObject::from_entry(entry) {
                    Some(object) => {
                        self.backend.write_record(&object.canonical_name(), &object)?;
                        tally.written += 1;
                    }
                    None => {
                        warn!(dn = %entry.dn, "Skipping schema entry without a display name");
                        tally.skipped += 1;
                    }
                }
            }
            debug!(filter, page = entries.len(), total = tally.written, "Schema page stored");
        }

        Ok(tally)
    }

    /// Delete every persisted record and the readiness marker.
    ///
    /// Records already resident in the runtime cache stay there for the life
    /// of this store; use [`SchemaStore::clear_runtime_cache`] to drop them.
    pub fn flush(&self) -> Result<usize> {
        let _guard = self.gate.write();
        self.flush_locked()
    }

    fn flush_locked(&self) -> Result<usize> {
        self.backend.delete_marker()?;
        let removed = self.backend.delete_records()?;
        debug!(removed, "Schema store flushed");
        Ok(removed)
    }

    pub fn clear_runtime_cache(&self) {
        self.runtime.clear();
    }

    /// Look up a schema record by name (any case).
    ///
    /// The runtime cache is consulted first; misses fall through to the backend
    /// and successful reads are cached. Absent records are not cached.
    pub fn get(&self, name: &str) -> Result<Option<Arc<SchemaRecord>>> {
        let name = name.to_lowercase();
        if let Some(record) = self.runtime.get(&name) {
            trace!(name = %name, "Schema runtime cache hit");
            return Ok(Some(record));
        }

        let object = {
            let _guard = self.gate.read();
            self.backend.read_record(&name)?
        };

        let Some(object) = object else {
            trace!(name = %name, "Schema record not found");
            return Ok(None);
        };

        debug!(name = %name, "Schema record loaded from store");
        let mut record = SchemaRecord::from(&object);
        record.name = name;
        Ok(Some(self.runtime.insert(record)))
    }

    pub fn get_attribute(&self, name: &str) -> Result<Option<AttributeSchema>> {
        Ok(self.get(name)?.and_then(|record| match &record.kind {
            SchemaKind::Attribute(attr) => Some(attr.clone()),
            SchemaKind::Class(_) => None,
        }))
    }

    pub fn get_class(&self, name: &str) -> Result<Option<ClassSchema>> {
        Ok(self.get(name)?.and_then(|record| match &record.kind {
            SchemaKind::Class(class) => Some(class.clone()),
            SchemaKind::Attribute(_) => None,
        }))
    }

    /// Canonical names of all persisted records.
    pub fn names(&self) -> Result<Vec<String>> {
        let _guard = self.gate.read();
        self.backend.list_names()
    }
}

impl<B: StorageBackend> SchemaLookup for SchemaStore<B> {
    fn lookup(&self, name: &str) -> Result<Option<Arc<SchemaRecord>>> {
        self.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{DirectoryEntry, PagedSearch};
    use crate::schema::mem_backend::MemBackend;
    use crate::test_utils::{attribute_entry, class_entry, ScriptedSource};
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn store() -> SchemaStore<MemBackend> {
        SchemaStore::with_backend(MemBackend::new())
    }

    fn source() -> ScriptedSource {
        ScriptedSource::new("CN=Schema,CN=Configuration,DC=example,DC=com")
            .attribute_pages(vec![
                vec![
                    attribute_entry("cn", "2.5.5.12", true, 0),
                    attribute_entry("member", "2.5.5.1", false, 0),
                ],
                vec![attribute_entry("tokenGroups", "2.5.5.17", false, 4)],
            ])
            .class_pages(vec![vec![class_entry("user", &["cn", "member"])]])
    }

    #[test]
    fn test_build_populates_and_marks_ready() {
        let store = store();
        assert!(!store.is_ready());

        let report = store.build(&source()).unwrap();
        assert_eq!(report.attributes, 3);
        assert_eq!(report.classes, 1);
        assert_eq!(report.skipped, 0);
        assert!(store.is_ready());
        assert_eq!(store.built_at().unwrap(), Some(report.built_at));
        assert_eq!(
            store.names().unwrap(),
            vec!["cn", "member", "tokengroups", "user"]
        );
    }

    #[test]
    fn test_build_uses_configured_requests() {
        let store = store().with_page_size(50);
        let source = source();
        store.build(&source).unwrap();

        let requests = source.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].filter, ATTRIBUTE_FILTER);
        assert_eq!(requests[1].filter, CLASS_FILTER);
        assert!(requests.iter().all(|r| r.page_size == 50));
        assert!(requests.iter().all(|r| r.operation == SearchOperation::List));
        assert_eq!(requests[0].base, "CN=Schema,CN=Configuration,DC=example,DC=com");
        assert!(requests[1].attributes.contains(&"subClassOf".to_string()));
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let store = store();
        store.build(&source()).unwrap();

        let record = store.get("TokenGroups").unwrap().unwrap();
        assert_eq!(record.name, "tokengroups");
        assert!(record.as_attribute().unwrap().constructed);
        assert!(store.get_attribute("MEMBER").unwrap().unwrap().resolvable());
        assert!(store.get_class("User").unwrap().unwrap().allows("cn"));
        assert!(store.get_class("cn").unwrap().is_none());
    }

    #[test]
    fn test_missing_record_is_not_cached() {
        let store = store();
        assert!(store.get("nonexistent").unwrap().is_none());
        assert!(store.runtime_cache().is_empty());
    }

    #[test]
    fn test_runtime_cache_shields_backend_changes() {
        let store = store();
        store.build(&source()).unwrap();

        let first = store.get("cn").unwrap().unwrap();
        store.backend().overwrite_record(
            "cn",
            SchemaObject {
                ldapdisplayname: "cn".into(),
                attributesyntax: Some("2.5.5.1".into()),
                issinglevalued: Some("FALSE".into()),
                ..Default::default()
            },
        );
        let second = store.get("cn").unwrap().unwrap();
        assert_eq!(first, second);

        store.clear_runtime_cache();
        let third = store.get("cn").unwrap().unwrap();
        assert!(third.as_attribute().unwrap().resolvable());
    }

    #[test]
    fn test_flush_keeps_runtime_cache() {
        let store = store();
        store.build(&source()).unwrap();
        store.get("cn").unwrap();

        assert_eq!(store.flush().unwrap(), 4);
        assert!(!store.is_ready());
        assert!(store.names().unwrap().is_empty());
        assert!(store.get("cn").unwrap().is_some());
        assert!(store.get("member").unwrap().is_none());
    }

    #[test]
    fn test_rebuild_replaces_records() {
        let store = store();
        store.build(&source()).unwrap();

        let smaller = ScriptedSource::new("CN=Schema")
            .attribute_pages(vec![vec![attribute_entry("sn", "2.5.5.12", true, 0)]])
            .class_pages(vec![]);
        let report = store.build(&smaller).unwrap();

        assert_eq!(report.attributes, 1);
        assert_eq!(report.classes, 0);
        assert_eq!(store.names().unwrap(), vec!["sn"]);
        assert!(store.is_ready());
    }

    #[test]
    fn test_referral_limit_aborts_build() {
        let store = store();
        let failing = source().fail_class_task_at(1);

        let err = store.build(&failing).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, DirError::ReferralLimit { .. }));
        assert!(!store.is_ready());
        assert_eq!(
            store.names().unwrap(),
            vec!["cn", "member", "tokengroups", "user"]
        );
    }

    #[test]
    fn test_referral_limit_on_first_class_page() {
        let store = store();
        let err = store.build(&source().fail_class_task_at(0)).unwrap_err();
        assert!(matches!(err, DirError::ReferralLimit { .. }));
        assert_eq!(store.names().unwrap(), vec!["cn", "member", "tokengroups"]);
    }

    /// Signals once its first page is requested, then takes its time serving it.
    struct SlowSource {
        started: Mutex<Option<mpsc::Sender<()>>>,
    }

    struct SlowTask {
        pages: VecDeque<Vec<DirectoryEntry>>,
        started: Option<mpsc::Sender<()>>,
    }

    impl PagedSearch for SlowTask {
        fn next_page(&mut self) -> Page {
            if let Some(started) = self.started.take() {
                let _ = started.send(());
                thread::sleep(Duration::from_millis(100));
            }
            Page::Entries(self.pages.pop_front().unwrap_or_default())
        }

        fn is_complete(&self) -> bool {
            self.pages.is_empty()
        }
    }

    impl SchemaSource for SlowSource {
        fn schema_naming_context(&self) -> Result<String> {
            Ok("CN=Schema".to_string())
        }

        fn paged_search(&self, request: SearchRequest) -> Result<Box<dyn PagedSearch + '_>> {
            if request.filter == CLASS_FILTER {
                return Ok(Box::new(SlowTask {
                    pages: VecDeque::new(),
                    started: None,
                }));
            }
            Ok(Box::new(SlowTask {
                pages: VecDeque::from(vec![vec![attribute_entry("a1", "2.5.5.12", true, 0)]]),
                started: self.started.lock().take(),
            }))
        }
    }

    #[test]
    fn test_get_waits_for_running_build() {
        let store = store();
        let (started_tx, started_rx) = mpsc::channel();

        thread::scope(|scope| {
            let builder = scope.spawn(|| {
                let source = SlowSource {
                    started: Mutex::new(Some(started_tx)),
                };
                store.build(&source)
            });

            started_rx.recv().unwrap();
            let record = store.get("a1").unwrap();
            assert!(store.is_ready());
            assert_eq!(record.unwrap().name, "a1");

            builder.join().unwrap().unwrap();
        });
    }

    #[test]
    fn test_entries_without_name_are_skipped() {
        let store = store();
        let source = ScriptedSource::new("CN=Schema")
            .attribute_pages(vec![vec![
                attribute_entry("cn", "2.5.5.12", true, 0),
                DirectoryEntry::new("CN=Broken,CN=Schema"),
            ]])
            .class_pages(vec![]);

        let report = store.build(&source).unwrap();
        assert_eq!(report.attributes, 1);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_write_error_leaves_store_not_ready() {
        let store = store();
        store.backend().set_simulate_write_error(true);

        assert!(store.build(&source()).is_err());
        assert!(!store.is_ready());
    }
}
