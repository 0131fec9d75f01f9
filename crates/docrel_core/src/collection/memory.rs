//! In-memory collection for tests and embedded use.

use super::matcher::{compare_values, lookup, Matcher};
use super::Collection;
use crate::config::MemoryStoreConfig;
use crate::context::Context;
use crate::error::{StoreError, StoreResult};
use crate::filter::{Filter, FindOptions, SortOrder};
use crate::record::Record;
use docrel_codec::{from_cbor, to_canonical_cbor, ObjectId, Value};
use parking_lot::RwLock;
use std::marker::PhantomData;
use tracing::trace;

#[derive(Debug, Clone)]
struct StoredDocument {
    id: ObjectId,
    bytes: Vec<u8>,
}

/// A collection that keeps canonical-CBOR documents in memory.
///
/// Documents are kept in insertion order, and reads without a sort return
/// them in that order. Thread-safe; every operation takes the lock once.
///
/// # Example
///
/// ```rust,ignore
/// use docrel_core::{Collection, Context, Filter, FindOptions, MemoryCollection};
///
/// let users: MemoryCollection<User> = MemoryCollection::new("users");
/// let ctx = Context::background();
///
/// let mut ada = User::named("ada");
/// users.create(&ctx, &mut ada)?;
/// assert!(ada.id().is_some());
///
/// let found = users.read(&ctx, &Filter::eq("name", "ada"), &FindOptions::new())?;
/// assert_eq!(found.len(), 1);
/// ```
#[derive(Debug)]
pub struct MemoryCollection<T> {
    name: String,
    config: MemoryStoreConfig,
    documents: RwLock<Vec<StoredDocument>>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> MemoryCollection<T> {
    /// Creates an empty collection with the default configuration.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, MemoryStoreConfig::default())
    }

    /// Creates an empty collection with the given configuration.
    #[must_use]
    pub fn with_config(name: impl Into<String>, config: MemoryStoreConfig) -> Self {
        Self {
            name: name.into(),
            config,
            documents: RwLock::new(Vec::new()),
            _record: PhantomData,
        }
    }

    /// Returns the collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MemoryStoreConfig {
        &self.config
    }

    /// Returns the number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Returns the stored documents in insertion order.
    ///
    /// # Errors
    ///
    /// Returns a codec error if a stored document cannot be decoded.
    pub fn documents(&self) -> StoreResult<Vec<Value>> {
        self.documents
            .read()
            .iter()
            .map(|stored| from_cbor(&stored.bytes).map_err(StoreError::from))
            .collect()
    }

    /// Removes every document.
    pub fn clear(&self) {
        self.documents.write().clear();
    }

    fn ensure_id_field(&self) -> StoreResult<()> {
        match T::descriptor().id_field() {
            Some(_) => Ok(()),
            None => Err(StoreError::MissingIdField {
                type_name: T::descriptor().type_name().to_string(),
            }),
        }
    }

    fn encode(record: &T) -> StoreResult<Vec<u8>> {
        let doc = record.to_document()?;
        Ok(to_canonical_cbor(&doc)?)
    }

    fn decode(bytes: &[u8]) -> StoreResult<T> {
        let doc = from_cbor(bytes)?;
        Ok(T::from_document(&doc)?)
    }
}

impl<T: Record> Collection<T> for MemoryCollection<T> {
    type Error = StoreError;

    fn create(&self, ctx: &Context, record: &mut T) -> StoreResult<()> {
        ctx.check()?;
        self.ensure_id_field()?;

        let id = match record.id().filter(|id| !id.is_zero()) {
            Some(id) => id,
            None => {
                let id = ObjectId::new();
                record.set_id(id);
                id
            }
        };
        let bytes = Self::encode(record)?;

        let mut documents = self.documents.write();
        if self.config.reject_duplicate_ids && documents.iter().any(|d| d.id == id) {
            return Err(StoreError::DuplicateId {
                collection: self.name.clone(),
                id,
            });
        }
        documents.push(StoredDocument { id, bytes });
        trace!(collection = %self.name, %id, "created document");
        Ok(())
    }

    fn read(&self, ctx: &Context, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<T>> {
        ctx.check()?;
        let matcher = Matcher::compile(filter.as_value())?;

        let mut matched = Vec::new();
        for stored in self.documents.read().iter() {
            let doc = from_cbor(&stored.bytes)?;
            if matcher.matches(&doc) {
                matched.push(doc);
            }
        }

        if let Some(sort) = &options.sort {
            let path: Vec<String> = sort.field.split('.').map(str::to_string).collect();
            matched.sort_by(|a, b| {
                let ordering = compare_values(lookup(a, &path), lookup(b, &path));
                match sort.order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
        }

        let limit = options
            .limit
            .or(self.config.default_read_limit)
            .unwrap_or(usize::MAX);

        let records = matched
            .iter()
            .skip(options.skip)
            .take(limit)
            .map(|doc| T::from_document(doc).map_err(StoreError::from))
            .collect::<StoreResult<Vec<T>>>()?;

        trace!(collection = %self.name, returned = records.len(), "read documents");
        Ok(records)
    }

    fn get_by_id(&self, ctx: &Context, id: ObjectId) -> StoreResult<Option<T>> {
        ctx.check()?;
        let documents = self.documents.read();
        match documents.iter().find(|d| d.id == id) {
            Some(stored) => Self::decode(&stored.bytes).map(Some),
            None => Ok(None),
        }
    }

    fn delete_by_id(&self, ctx: &Context, id: ObjectId) -> StoreResult<()> {
        ctx.check()?;
        let mut documents = self.documents.write();
        if let Some(pos) = documents.iter().position(|d| d.id == id) {
            documents.remove(pos);
            trace!(collection = %self.name, %id, "deleted document");
        }
        Ok(())
    }

    fn update(&self, ctx: &Context, record: &T) -> StoreResult<()> {
        ctx.check()?;
        self.ensure_id_field()?;

        let id = record.id().ok_or_else(|| StoreError::MissingId {
            collection: self.name.clone(),
        })?;
        let bytes = Self::encode(record)?;

        let mut documents = self.documents.write();
        let stored = documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| StoreError::NotFound {
                collection: self.name.clone(),
                id,
            })?;
        stored.bytes = bytes;
        trace!(collection = %self.name, %id, "updated document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContextError;
    use crate::record::{sequence_value, DocumentReader, FieldDescriptor, RecordDescriptor};
    use crate::CoreResult;
    use std::sync::OnceLock;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: Option<ObjectId>,
        name: String,
        rank: i64,
        labels: Vec<String>,
    }

    impl Item {
        fn new(name: &str, rank: i64) -> Self {
            Self {
                id: None,
                name: name.into(),
                rank,
                labels: Vec::new(),
            }
        }
    }

    impl Record for Item {
        fn descriptor() -> &'static RecordDescriptor {
            static DESCRIPTOR: OnceLock<RecordDescriptor> = OnceLock::new();
            DESCRIPTOR.get_or_init(|| {
                RecordDescriptor::new("Item")
                    .with_field(FieldDescriptor::new("ID").storage("_id,omitempty"))
                    .with_field(FieldDescriptor::new("Name").storage("name"))
                    .with_field(FieldDescriptor::new("Rank").storage("rank"))
                    .with_field(FieldDescriptor::new("Labels").storage("labels").sequence())
            })
        }

        fn field(&self, name: &str) -> Option<Value> {
            match name {
                "ID" => Some(self.id.into()),
                "Name" => Some(self.name.as_str().into()),
                "Rank" => Some(self.rank.into()),
                "Labels" => Some(sequence_value(self.labels.iter())),
                _ => None,
            }
        }

        fn from_document(doc: &Value) -> CoreResult<Self> {
            let reader = DocumentReader::new(Self::descriptor(), doc)?;
            Ok(Self {
                id: reader.optional_object_id("_id")?,
                name: reader.text("name")?,
                rank: reader.integer("rank")?,
                labels: reader.texts("labels")?,
            })
        }

        fn set_id(&mut self, id: ObjectId) {
            self.id = Some(id);
        }
    }

    fn seeded() -> MemoryCollection<Item> {
        let items = MemoryCollection::new("items");
        let ctx = Context::background();
        for (name, rank) in [("c", 3), ("a", 1), ("b", 2)] {
            items.create(&ctx, &mut Item::new(name, rank)).unwrap();
        }
        items
    }

    fn names(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn create_assigns_id() {
        let items = MemoryCollection::new("items");
        let mut item = Item::new("x", 0);
        items.create(&Context::background(), &mut item).unwrap();

        let id = item.id.unwrap();
        let found = items.get_by_id(&Context::background(), id).unwrap().unwrap();
        assert_eq!(found, item);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn create_keeps_existing_id_and_rejects_duplicates() {
        let items = MemoryCollection::new("items");
        let ctx = Context::background();
        let id = ObjectId::new();

        let mut first = Item::new("x", 0);
        first.id = Some(id);
        items.create(&ctx, &mut first).unwrap();
        assert_eq!(first.id, Some(id));

        let mut second = Item::new("y", 0);
        second.id = Some(id);
        let err = items.create(&ctx, &mut second).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));
    }

    #[test]
    fn duplicates_allowed_when_configured() {
        let items = MemoryCollection::with_config(
            "items",
            MemoryStoreConfig::new().reject_duplicate_ids(false),
        );
        let ctx = Context::background();
        let id = ObjectId::new();
        for _ in 0..2 {
            let mut item = Item::new("x", 0);
            item.id = Some(id);
            items.create(&ctx, &mut item).unwrap();
        }
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn read_preserves_insertion_order() {
        let items = seeded();
        let all = items
            .read(&Context::background(), &Filter::new(), &FindOptions::new())
            .unwrap();
        assert_eq!(names(&all), vec!["c", "a", "b"]);
    }

    #[test]
    fn read_with_sort_skip_limit() {
        let items = seeded();
        let ctx = Context::background();

        let asc = items
            .read(&ctx, &Filter::new(), &FindOptions::new().sort_asc("rank"))
            .unwrap();
        assert_eq!(names(&asc), vec!["a", "b", "c"]);

        let page = items
            .read(&ctx, &Filter::new(), &FindOptions::new().sort_desc("name").skip(1).limit(1))
            .unwrap();
        assert_eq!(names(&page), vec!["b"]);
    }

    #[test]
    fn default_read_limit_applies() {
        let items = MemoryCollection::with_config(
            "items",
            MemoryStoreConfig::new().default_read_limit(Some(2)),
        );
        let ctx = Context::background();
        for name in ["a", "b", "c"] {
            items.create(&ctx, &mut Item::new(name, 0)).unwrap();
        }

        let all = items.read(&ctx, &Filter::new(), &FindOptions::new()).unwrap();
        assert_eq!(all.len(), 2);
        let explicit = items.read(&ctx, &Filter::new(), &FindOptions::new().limit(3)).unwrap();
        assert_eq!(explicit.len(), 3);
    }

    #[test]
    fn read_filters_on_sequences() {
        let items = MemoryCollection::new("items");
        let ctx = Context::background();
        let mut tagged = Item::new("tagged", 0);
        tagged.labels = vec!["red".into(), "blue".into()];
        items.create(&ctx, &mut tagged).unwrap();
        items.create(&ctx, &mut Item::new("plain", 0)).unwrap();

        let found = items.read(&ctx, &Filter::eq("labels", "blue"), &FindOptions::new()).unwrap();
        assert_eq!(names(&found), vec!["tagged"]);
    }

    #[test]
    fn invalid_filter_is_rejected() {
        let items = seeded();
        let filter = Filter::eq("rank", Value::document([("$gt", Value::Integer(1))]));
        let err = items
            .read(&Context::background(), &filter, &FindOptions::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidFilter { .. }));
    }

    #[test]
    fn update_overwrites_document() {
        let items = MemoryCollection::new("items");
        let ctx = Context::background();
        let mut item = Item::new("before", 1);
        items.create(&ctx, &mut item).unwrap();

        item.name = "after".into();
        items.update(&ctx, &item).unwrap();

        let found = items.get_by_id(&ctx, item.id.unwrap()).unwrap().unwrap();
        assert_eq!(found.name, "after");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn update_requires_existing_id() {
        let items: MemoryCollection<Item> = MemoryCollection::new("items");
        let ctx = Context::background();

        let err = items.update(&ctx, &Item::new("x", 0)).unwrap_err();
        assert!(matches!(err, StoreError::MissingId { .. }));

        let mut ghost = Item::new("ghost", 0);
        ghost.id = Some(ObjectId::new());
        let err = items.update(&ctx, &ghost).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn delete_by_id_is_idempotent() {
        let items = seeded();
        let ctx = Context::background();
        let first = items.read(&ctx, &Filter::eq("name", "a"), &FindOptions::new()).unwrap();
        let id = first[0].id.unwrap();

        items.delete_by_id(&ctx, id).unwrap();
        items.delete_by_id(&ctx, id).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.get_by_id(&ctx, id).unwrap().is_none());
    }

    #[test]
    fn cancelled_context_stops_operations() {
        let items = seeded();
        let (ctx, handle) = Context::background().with_cancel();
        handle.cancel();

        let err = items.read(&ctx, &Filter::new(), &FindOptions::new()).unwrap_err();
        assert!(matches!(err, StoreError::Context(ContextError::Cancelled)));
        let err = items.create(&ctx, &mut Item::new("late", 0)).unwrap_err();
        assert!(matches!(err, StoreError::Context(ContextError::Cancelled)));
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn stored_documents_are_canonical() {
        let items = seeded();
        let docs = items.documents().unwrap();
        assert_eq!(docs.len(), 3);
        assert!(docs[0].get("_id").and_then(Value::as_object_id).is_some());
        assert_eq!(docs[0].get("name"), Some(&Value::from("c")));
    }
}
