//! Metadata-driven joins.
//!
//! A join fills an association field on a batch of source records with
//! records of a joined type. The association is declared on the field as
//! `"Left,Right"`: values of the source's `Left` field are matched against
//! the joined type's `Right` field. Either side may be scalar or sequence.
//!
//! All source records are served by a single `$in` read:
//!
//! 1. resolve the association from record metadata, rejecting bad
//!    declarations before any I/O
//! 2. collect left-key values from every source record
//! 3. read the joined records whose right key is among them
//! 4. index the fetched records by right-key value
//! 5. hand each source record its matches

mod index;
mod keys;

use crate::collection::Collection;
use crate::context::Context;
use crate::error::{CoreError, CoreResult};
use crate::filter::{Filter, FindOptions};
use crate::record::{Associate, Association, Cardinality, Record};
use crate::resolver::AssociationSpec;
use index::MatchIndex;
use std::sync::Arc;
use tracing::{debug, debug_span};

/// Joins records from `joined` onto the association field `field` of every
/// record in `sources`, returning every fetched joined record.
///
/// A scalar association field receives the first match, taking the
/// record's keys in order and, per key, records in fetch order. A sequence
/// association field is replaced by all matches in that order, or by an
/// empty vector. Records without keys are left untouched, and a scalar
/// field with no match keeps its previous value.
///
/// # Errors
///
/// Metadata problems are reported before the collection is read, checked
/// in this order:
///
/// - `InvalidArgument` if `field` is empty
/// - `MissingField` if the association field or either key field is unknown
/// - `MissingAssociationTag` if the field declares no valid association
/// - `MissingStorageTag` if the right key has no storage name
/// - `InvalidArgument` if `S` does not accept `J` records on `field`
///
/// A failed read is returned as `Storage` with the collection's error as
/// the source, and no source record is modified.
pub fn join<S, J, C>(ctx: &Context, sources: &mut [S], field: &str, joined: &C) -> CoreResult<Vec<Arc<J>>>
where
    S: Associate<J>,
    J: Record,
    C: Collection<J> + ?Sized,
{
    let assoc = prepare::<S, J>(field)?;

    let span = debug_span!(
        "join",
        source = S::descriptor().type_name(),
        joined = J::descriptor().type_name(),
        field = %assoc.field,
    );
    let _enter = span.enter();

    let per_record = keys::collect(sources, &assoc.left)?;
    let distinct = keys::distinct(&per_record);
    if distinct.is_empty() {
        debug!(sources = sources.len(), "no keys, skipping fetch");
        return Ok(Vec::new());
    }
    debug!(sources = sources.len(), keys = distinct.len(), "fetching joined records");

    let filter = Filter::is_in(assoc.right_storage.clone(), distinct);
    let fetched: Vec<Arc<J>> = joined
        .read(ctx, &filter, &FindOptions::default())
        .map_err(CoreError::storage)?
        .into_iter()
        .map(Arc::new)
        .collect();

    let index = MatchIndex::build(&fetched, &assoc.right)?;
    debug!(fetched = fetched.len(), buckets = index.bucket_count(), "indexed joined records");

    for (record, keys) in sources.iter_mut().zip(&per_record) {
        if keys.is_empty() {
            continue;
        }
        match assoc.target {
            Cardinality::Scalar => {
                if let Some(first) = index.first(keys) {
                    record.associate(&assoc.field, Association::One(first))?;
                }
            }
            Cardinality::Sequence => {
                record.associate(&assoc.field, Association::Many(index.all(keys)))?;
            }
        }
    }

    Ok(fetched)
}

/// Joins onto a single record. See [`join`].
///
/// # Errors
///
/// Same as [`join`].
pub fn join_one<S, J, C>(ctx: &Context, source: &mut S, field: &str, joined: &C) -> CoreResult<Vec<Arc<J>>>
where
    S: Associate<J>,
    J: Record,
    C: Collection<J> + ?Sized,
{
    join(ctx, std::slice::from_mut(source), field, joined)
}

/// Resolves and validates the association without touching any record.
fn prepare<S, J>(field: &str) -> CoreResult<AssociationSpec>
where
    S: Associate<J>,
    J: Record,
{
    if field.is_empty() {
        return Err(CoreError::invalid_argument("association field name is empty"));
    }
    let assoc = AssociationSpec::resolve::<S, J>(field)?;
    if !S::accepts(field) {
        return Err(CoreError::invalid_argument(format!(
            "{}.{} does not hold {} records",
            S::descriptor().type_name(),
            field,
            J::descriptor().type_name()
        )));
    }
    Ok(assoc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{sequence_value, DocumentReader, FieldDescriptor, RecordDescriptor};
    use docrel_codec::{ObjectId, Value};
    use std::cell::Cell;
    use std::sync::OnceLock;

    #[derive(Debug, Clone, PartialEq)]
    struct Tag {
        id: i64,
        label: String,
    }

    impl Record for Tag {
        fn descriptor() -> &'static RecordDescriptor {
            static DESCRIPTOR: OnceLock<RecordDescriptor> = OnceLock::new();
            DESCRIPTOR.get_or_init(|| {
                RecordDescriptor::new("Tag")
                    .with_field(FieldDescriptor::new("ID").storage("tag_id"))
                    .with_field(FieldDescriptor::new("Label").storage("label"))
            })
        }

        fn field(&self, name: &str) -> Option<Value> {
            match name {
                "ID" => Some(self.id.into()),
                "Label" => Some(self.label.as_str().into()),
                _ => None,
            }
        }

        fn from_document(doc: &Value) -> CoreResult<Self> {
            let reader = DocumentReader::new(Self::descriptor(), doc)?;
            Ok(Self {
                id: reader.integer("tag_id")?,
                label: reader.text("label")?,
            })
        }

        fn set_id(&mut self, _id: ObjectId) {}
    }

    #[derive(Debug, Default)]
    struct Doc {
        tag_ids: Vec<i64>,
        primary: Option<i64>,
        tags: Vec<Arc<Tag>>,
        main: Option<Arc<Tag>>,
    }

    impl Record for Doc {
        fn descriptor() -> &'static RecordDescriptor {
            static DESCRIPTOR: OnceLock<RecordDescriptor> = OnceLock::new();
            DESCRIPTOR.get_or_init(|| {
                RecordDescriptor::new("Doc")
                    .with_field(FieldDescriptor::new("TagIDs").storage("tag_ids").sequence())
                    .with_field(FieldDescriptor::new("Primary").storage("primary"))
                    .with_field(FieldDescriptor::new("Tags").association("TagIDs,ID").sequence())
                    .with_field(FieldDescriptor::new("Main").association("Primary:ID"))
                    .with_field(FieldDescriptor::new("Broken").association("Primary"))
                    .with_field(FieldDescriptor::new("Strict").association("Primary,ID"))
            })
        }

        fn field(&self, name: &str) -> Option<Value> {
            match name {
                "TagIDs" => Some(sequence_value(self.tag_ids.iter().copied())),
                "Primary" => Some(self.primary.into()),
                _ => None,
            }
        }

        fn from_document(_doc: &Value) -> CoreResult<Self> {
            Ok(Self::default())
        }

        fn set_id(&mut self, _id: ObjectId) {}
    }

    impl Associate<Tag> for Doc {
        fn accepts(field: &str) -> bool {
            matches!(field, "Tags" | "Main" | "Broken" | "Strict")
        }

        fn associate(&mut self, field: &str, matched: Association<Tag>) -> CoreResult<()> {
            match (field, matched) {
                ("Tags", matched) => self.tags = matched.into_vec(),
                ("Main", Association::One(tag)) => self.main = Some(tag),
                ("Strict", Association::One(tag)) if tag.label != "rejected" => self.main = Some(tag),
                (other, _) => return Err(CoreError::invalid_argument(format!("no slot {other}"))),
            }
            Ok(())
        }
    }

    struct Fixed {
        tags: Vec<Tag>,
        reads: Cell<usize>,
    }

    impl Collection<Tag> for Fixed {
        type Error = std::io::Error;

        fn create(&self, _ctx: &Context, _record: &mut Tag) -> Result<(), Self::Error> {
            Ok(())
        }

        fn read(&self, _ctx: &Context, _filter: &Filter, _options: &FindOptions) -> Result<Vec<Tag>, Self::Error> {
            self.reads.set(self.reads.get() + 1);
            Ok(self.tags.clone())
        }

        fn get_by_id(&self, _ctx: &Context, _id: ObjectId) -> Result<Option<Tag>, Self::Error> {
            Ok(None)
        }

        fn delete_by_id(&self, _ctx: &Context, _id: ObjectId) -> Result<(), Self::Error> {
            Ok(())
        }

        fn update(&self, _ctx: &Context, _record: &Tag) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    fn tag(id: i64, label: &str) -> Tag {
        Tag {
            id,
            label: label.into(),
        }
    }

    fn fixed(tags: Vec<Tag>) -> Fixed {
        Fixed {
            tags,
            reads: Cell::new(0),
        }
    }

    #[test]
    fn sequence_join_keeps_key_order() {
        let store = fixed(vec![tag(1, "a"), tag(2, "b"), tag(3, "c")]);
        let mut docs = vec![Doc {
            tag_ids: vec![3, 1],
            ..Doc::default()
        }];

        let fetched = join(&Context::background(), &mut docs, "Tags", &store).unwrap();

        assert_eq!(fetched.len(), 3);
        assert_eq!(store.reads.get(), 1);
        let labels: Vec<_> = docs[0].tags.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["c", "a"]);
    }

    #[test]
    fn scalar_join_takes_first_fetched() {
        let store = fixed(vec![tag(1, "first"), tag(1, "second")]);
        let mut docs = vec![Doc {
            primary: Some(1),
            ..Doc::default()
        }];

        join(&Context::background(), &mut docs, "Main", &store).unwrap();
        assert_eq!(docs[0].main.as_ref().unwrap().label, "first");
    }

    #[test]
    fn no_keys_means_no_read() {
        let store = fixed(vec![tag(1, "a")]);
        let mut docs = vec![Doc::default(), Doc::default()];

        let fetched = join(&Context::background(), &mut docs, "Main", &store).unwrap();
        assert!(fetched.is_empty());
        assert_eq!(store.reads.get(), 0);
    }

    #[test]
    fn metadata_errors_precede_read() {
        let store = fixed(vec![tag(1, "a")]);
        let mut docs = vec![Doc {
            primary: Some(1),
            ..Doc::default()
        }];
        let ctx = Context::background();

        let err = join(&ctx, &mut docs, "", &store).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument { .. }));

        let err = join(&ctx, &mut docs, "Unknown", &store).unwrap_err();
        assert!(matches!(err, CoreError::MissingField { .. }));

        let err = join(&ctx, &mut docs, "Broken", &store).unwrap_err();
        assert!(matches!(err, CoreError::MissingAssociationTag { .. }));

        assert_eq!(store.reads.get(), 0);
        assert!(docs[0].main.is_none());
    }

    #[test]
    fn associate_error_stops_the_apply_pass() {
        let store = fixed(vec![tag(1, "kept"), tag(2, "rejected"), tag(3, "unreached")]);
        let mut docs: Vec<Doc> = [1, 2, 3]
            .into_iter()
            .map(|n| Doc {
                primary: Some(n),
                ..Doc::default()
            })
            .collect();

        let err = join(&Context::background(), &mut docs, "Strict", &store).unwrap_err();

        assert!(matches!(err, CoreError::InvalidArgument { .. }));
        assert_eq!(store.reads.get(), 1);
        assert_eq!(docs[0].main.as_ref().unwrap().label, "kept");
        assert!(docs[1].main.is_none());
        assert!(docs[2].main.is_none());
    }

    #[test]
    fn join_one_delegates() {
        let store = fixed(vec![tag(7, "x")]);
        let mut doc = Doc {
            primary: Some(7),
            ..Doc::default()
        };

        join_one(&Context::background(), &mut doc, "Main", &store).unwrap();
        assert_eq!(doc.main.unwrap().id, 7);
    }
}
