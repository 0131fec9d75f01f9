//! Typed records and their document form.
//!
//! A record type implements [`Record`] to expose its static
//! [`RecordDescriptor`] and read fields by name, and [`Associate`] for each
//! joined type it can hold.

mod descriptor;
mod reader;

pub use descriptor::{Cardinality, FieldDescriptor, RecordDescriptor, ID_STORAGE_NAME};
pub use reader::DocumentReader;

use crate::error::{CoreError, CoreResult};
use docrel_codec::{ObjectId, Value};
use std::sync::Arc;

/// A typed record stored as a document.
///
/// # Example
///
/// ```rust
/// use docrel_codec::{ObjectId, Value};
/// use docrel_core::{CoreResult, DocumentReader, FieldDescriptor, Record, RecordDescriptor};
/// use std::sync::OnceLock;
///
/// struct Tag {
///     id: Option<ObjectId>,
///     label: String,
/// }
///
/// impl Record for Tag {
///     fn descriptor() -> &'static RecordDescriptor {
///         static DESCRIPTOR: OnceLock<RecordDescriptor> = OnceLock::new();
///         DESCRIPTOR.get_or_init(|| {
///             RecordDescriptor::new("Tag")
///                 .with_field(FieldDescriptor::new("ID").storage("_id"))
///                 .with_field(FieldDescriptor::new("Label").storage("label"))
///         })
///     }
///
///     fn field(&self, name: &str) -> Option<Value> {
///         match name {
///             "ID" => Some(self.id.into()),
///             "Label" => Some(self.label.as_str().into()),
///             _ => None,
///         }
///     }
///
///     fn from_document(doc: &Value) -> CoreResult<Self> {
///         let reader = DocumentReader::new(Self::descriptor(), doc)?;
///         Ok(Self {
///             id: reader.optional_object_id("_id")?,
///             label: reader.text("label")?,
///         })
///     }
///
///     fn set_id(&mut self, id: ObjectId) {
///         self.id = Some(id);
///     }
/// }
///
/// let tag = Tag { id: None, label: "rust".into() };
/// let doc = tag.to_document().unwrap();
/// assert_eq!(doc.get("label"), Some(&Value::from("rust")));
/// ```
pub trait Record: Sized + 'static {
    /// Returns the type's field metadata.
    fn descriptor() -> &'static RecordDescriptor;

    /// Reads a field by its declared name.
    ///
    /// Sequence fields are returned as `Value::Array` and absent optional
    /// values as `Value::Null`. Returns `None` for unknown names.
    fn field(&self, name: &str) -> Option<Value>;

    /// Builds a record from its stored document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if the document does not fit the type.
    fn from_document(doc: &Value) -> CoreResult<Self>;

    /// Assigns the record identifier.
    fn set_id(&mut self, id: ObjectId);

    /// Returns the record identifier, read from the field stored as `_id`.
    fn id(&self) -> Option<ObjectId> {
        let field = Self::descriptor().id_field()?;
        self.field(field.name())?.as_object_id()
    }

    /// Builds the stored document from every field with a storage name.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` if a declared field cannot be read.
    fn to_document(&self) -> CoreResult<Value> {
        let descriptor = Self::descriptor();
        let mut doc = Value::empty_map();
        for field in descriptor.fields() {
            let Some(storage) = field.storage_name() else {
                continue;
            };
            let value = self
                .field(field.name())
                .ok_or_else(|| CoreError::missing_field(descriptor.type_name(), field.name()))?;
            doc.insert(storage, value);
        }
        Ok(doc)
    }
}

/// Matches delivered to an association field.
#[derive(Debug)]
pub enum Association<J> {
    /// The first match for a scalar association field.
    One(Arc<J>),
    /// Every match, in key order, for a sequence association field.
    Many(Vec<Arc<J>>),
}

impl<J> Association<J> {
    /// Returns the number of matched records.
    pub fn len(&self) -> usize {
        match self {
            Association::One(_) => 1,
            Association::Many(items) => items.len(),
        }
    }

    /// Returns true if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts into a vector of matches.
    pub fn into_vec(self) -> Vec<Arc<J>> {
        match self {
            Association::One(item) => vec![item],
            Association::Many(items) => items,
        }
    }
}

/// A record that can hold joined records of type `J`.
pub trait Associate<J: Record>: Record {
    /// Returns true if `field` is an association field holding `J`.
    fn accepts(field: &str) -> bool;

    /// Stores matches on the named association field, replacing what was
    /// there.
    ///
    /// Must succeed for every field that [`accepts`](Self::accepts)
    /// approves. A join stops at the first error, and records earlier in
    /// the batch keep the matches already stored on them.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a field this type does not own.
    fn associate(&mut self, field: &str, matched: Association<J>) -> CoreResult<()>;
}

/// Collects a sequence of values into a `Value::Array`.
pub fn sequence_value<T, I>(items: I) -> Value
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    Value::Array(items.into_iter().map(Into::into).collect())
}
