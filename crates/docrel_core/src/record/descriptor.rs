//! Static field metadata published by record types.

use crate::error::{CoreError, CoreResult};
use crate::resolver::parse_association_tag;
use std::collections::HashSet;

/// Storage name reserved for a record's identifier.
pub const ID_STORAGE_NAME: &str = "_id";

/// Whether a field holds one value or a sequence of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// A single (possibly absent) value.
    Scalar,
    /// An ordered sequence of values.
    Sequence,
}

impl Cardinality {
    /// Returns true for [`Cardinality::Sequence`].
    pub fn is_sequence(self) -> bool {
        matches!(self, Cardinality::Sequence)
    }
}

/// Metadata for one field of a record type.
///
/// ```rust
/// use docrel_core::{Cardinality, FieldDescriptor};
///
/// let field = FieldDescriptor::new("Tags").storage("tag_ids,omitempty").sequence();
/// assert_eq!(field.storage_name(), Some("tag_ids"));
/// assert_eq!(field.cardinality(), Cardinality::Sequence);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: &'static str,
    storage: Option<&'static str>,
    association: Option<&'static str>,
    cardinality: Cardinality,
}

impl FieldDescriptor {
    /// Creates a scalar field with no storage name and no association.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            storage: None,
            association: None,
            cardinality: Cardinality::Scalar,
        }
    }

    /// Declares the storage tag. Only the text before the first comma is
    /// the storage name; `"-"` marks a field that is never stored.
    #[must_use]
    pub const fn storage(mut self, tag: &'static str) -> Self {
        self.storage = Some(tag);
        self
    }

    /// Declares an association tag of the form `"Left,Right"` or
    /// `"Left:Right"`. The tag is validated when a join resolves it.
    #[must_use]
    pub const fn association(mut self, tag: &'static str) -> Self {
        self.association = Some(tag);
        self
    }

    /// Marks the field as sequence-valued.
    #[must_use]
    pub const fn sequence(mut self) -> Self {
        self.cardinality = Cardinality::Sequence;
        self
    }

    /// Returns the field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the raw storage tag, if declared.
    pub fn storage_tag(&self) -> Option<&'static str> {
        self.storage
    }

    /// Returns the storage name, or `None` if the field is not stored.
    pub fn storage_name(&self) -> Option<&'static str> {
        let tag = self.storage?;
        let name = tag.split(',').next().unwrap_or_default().trim();
        match name {
            "" | "-" => None,
            name => Some(name),
        }
    }

    /// Returns the raw association tag, if declared.
    pub fn association_tag(&self) -> Option<&'static str> {
        self.association
    }

    /// Returns the field cardinality.
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Returns true if the field is sequence-valued.
    pub fn is_sequence(&self) -> bool {
        self.cardinality.is_sequence()
    }
}

/// Metadata for a record type: its name and ordered fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDescriptor {
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
}

impl RecordDescriptor {
    /// Creates an empty descriptor.
    #[must_use]
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            fields: Vec::new(),
        }
    }

    /// Appends a field.
    #[must_use]
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Returns the record type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the field stored as `_id`, if any.
    pub fn id_field(&self) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| f.storage_name() == Some(ID_STORAGE_NAME))
    }

    /// Checks the descriptor for internal consistency.
    ///
    /// Field names and storage names must be unique, every association tag
    /// must name exactly two keys, and its left key must be a field of this
    /// type. The right key belongs to the joined type and is checked at
    /// join time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for duplicates, `MissingAssociationTag` for
    /// a malformed tag and `MissingField` for an unknown left key.
    pub fn validate(&self) -> CoreResult<()> {
        let mut names = HashSet::new();
        let mut storage_names = HashSet::new();

        for field in &self.fields {
            if !names.insert(field.name) {
                return Err(CoreError::invalid_argument(format!(
                    "record type {} declares field {} twice",
                    self.type_name, field.name
                )));
            }
            if let Some(storage) = field.storage_name() {
                if !storage_names.insert(storage) {
                    return Err(CoreError::invalid_argument(format!(
                        "record type {} stores two fields as {}",
                        self.type_name, storage
                    )));
                }
            }
        }

        for field in &self.fields {
            if let Some(tag) = field.association {
                let keys = parse_association_tag(self.type_name, field.name, tag)?;
                if self.get(&keys.left).is_none() {
                    return Err(CoreError::missing_field(self.type_name, keys.left));
                }
            }
        }

        Ok(())
    }
}
