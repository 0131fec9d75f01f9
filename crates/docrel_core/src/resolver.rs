//! Field metadata resolution.
//!
//! Turns a record descriptor and a field name into a [`FieldInfo`], checking
//! the declarations a caller needs. Results for a record type are cached
//! process-wide, keyed by `TypeId` and field name.

use crate::error::{CoreError, CoreResult};
use crate::record::{Cardinality, Record, RecordDescriptor};
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::trace;

/// The two key fields named by an association tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssociationKeys {
    /// Field on the source record holding the key value(s).
    pub left: String,
    /// Field on the joined record matched against the left key.
    pub right: String,
}

/// Resolved metadata for one field of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    name: String,
    storage_name: Option<String>,
    cardinality: Cardinality,
    association: Option<Result<AssociationKeys, String>>,
}

impl FieldInfo {
    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the storage name, if the field is stored.
    pub fn storage_name(&self) -> Option<&str> {
        self.storage_name.as_deref()
    }

    /// Returns the field cardinality.
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Returns the parsed association keys, if the field declares a
    /// well-formed association.
    pub fn association(&self) -> Option<&AssociationKeys> {
        self.association.as_ref()?.as_ref().ok()
    }
}

/// Declarations a caller needs a field to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Require {
    /// The field must have a storage name.
    pub storage_name: bool,
    /// The field must declare a two-key association.
    pub association: bool,
}

impl Require {
    /// The field only has to exist.
    pub const NOTHING: Self = Self {
        storage_name: false,
        association: false,
    };

    /// The field must have a storage name.
    pub const STORAGE_NAME: Self = Self {
        storage_name: true,
        association: false,
    };

    /// The field must declare an association.
    pub const ASSOCIATION: Self = Self {
        storage_name: false,
        association: true,
    };
}

/// Parses an association tag into its left and right keys.
///
/// Keys are separated by `,` or `:` and trimmed. Exactly two non-empty keys
/// are required.
///
/// # Errors
///
/// Returns `MissingAssociationTag` naming the type and field otherwise.
pub fn parse_association_tag(
    type_name: &str,
    field: &str,
    tag: &str,
) -> CoreResult<AssociationKeys> {
    let keys: Vec<&str> = tag.split([',', ':']).map(str::trim).collect();
    match keys.as_slice() {
        [left, right] if !left.is_empty() && !right.is_empty() => Ok(AssociationKeys {
            left: (*left).to_string(),
            right: (*right).to_string(),
        }),
        [_, _] => Err(CoreError::missing_association_tag(
            type_name,
            field,
            format!("empty key in {tag:?}"),
        )),
        _ => Err(CoreError::missing_association_tag(
            type_name,
            field,
            format!("expected two keys in {tag:?}, found {}", keys.len()),
        )),
    }
}

fn describe(descriptor: &RecordDescriptor, field: &str) -> CoreResult<FieldInfo> {
    let found = descriptor
        .get(field)
        .ok_or_else(|| CoreError::missing_field(descriptor.type_name(), field))?;

    let association = found.association_tag().map(|tag| {
        parse_association_tag(descriptor.type_name(), field, tag).map_err(|e| match e {
            CoreError::MissingAssociationTag { reason, .. } => reason,
            other => other.to_string(),
        })
    });

    Ok(FieldInfo {
        name: found.name().to_string(),
        storage_name: found.storage_name().map(str::to_string),
        cardinality: found.cardinality(),
        association,
    })
}

fn check(type_name: &str, info: &FieldInfo, require: Require) -> CoreResult<()> {
    if require.storage_name && info.storage_name.is_none() {
        return Err(CoreError::missing_storage_tag(type_name, &info.name));
    }
    if require.association {
        match &info.association {
            None => {
                return Err(CoreError::missing_association_tag(
                    type_name,
                    &info.name,
                    "no association declared",
                ))
            }
            Some(Err(reason)) => {
                return Err(CoreError::missing_association_tag(
                    type_name,
                    &info.name,
                    reason.clone(),
                ))
            }
            Some(Ok(_)) => {}
        }
    }
    Ok(())
}

/// Resolves a field of `descriptor`, checking the declarations in `require`.
///
/// # Errors
///
/// - `MissingField` if the descriptor has no such field
/// - `MissingStorageTag` if a storage name is required and none is declared
/// - `MissingAssociationTag` if an association is required and the field
///   declares none, or declares a malformed one
pub fn resolve(descriptor: &RecordDescriptor, field: &str, require: Require) -> CoreResult<FieldInfo> {
    let info = describe(descriptor, field)?;
    check(descriptor.type_name(), &info, require)?;
    Ok(info)
}

type FieldCache = RwLock<HashMap<TypeId, HashMap<String, Arc<FieldInfo>>>>;

fn cache() -> &'static FieldCache {
    static CACHE: OnceLock<FieldCache> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Resolves a field of record type `T`, reusing cached metadata.
///
/// # Errors
///
/// Same as [`resolve`]. Unknown fields are not cached.
pub fn resolve_cached<T: Record>(field: &str, require: Require) -> CoreResult<Arc<FieldInfo>> {
    let descriptor = T::descriptor();
    let type_id = TypeId::of::<T>();

    let cached = cache()
        .read()
        .get(&type_id)
        .and_then(|fields| fields.get(field))
        .cloned();

    let info = match cached {
        Some(info) => info,
        None => {
            let info = Arc::new(describe(descriptor, field)?);
            trace!(record = descriptor.type_name(), field, "caching field metadata");
            cache()
                .write()
                .entry(type_id)
                .or_default()
                .entry(field.to_string())
                .or_insert(info)
                .clone()
        }
    };

    check(descriptor.type_name(), &info, require)?;
    Ok(info)
}

/// A validated association between a source type and a joined type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationSpec {
    /// The association field on the source type.
    pub field: String,
    /// Key field on the source type.
    pub left: String,
    /// Key field on the joined type.
    pub right: String,
    /// Storage name of the right key, used in the fetch filter.
    pub right_storage: String,
    /// Cardinality of the association field.
    pub target: Cardinality,
}

impl AssociationSpec {
    /// Resolves the association `field` of `S` against joined type `J`.
    ///
    /// Checks, in order: the association field and its tag, the left key on
    /// `S`, and the right key on `J` with its storage name.
    ///
    /// # Errors
    ///
    /// Returns the first resolution error encountered.
    pub fn resolve<S: Record, J: Record>(field: &str) -> CoreResult<Self> {
        let association = resolve_cached::<S>(field, Require::ASSOCIATION)?;
        let keys = association
            .association()
            .ok_or_else(|| {
                CoreError::missing_association_tag(
                    S::descriptor().type_name(),
                    field,
                    "no association declared",
                )
            })?
            .clone();

        resolve_cached::<S>(&keys.left, Require::NOTHING)?;
        let right = resolve_cached::<J>(&keys.right, Require::STORAGE_NAME)?;
        let right_storage = right
            .storage_name()
            .ok_or_else(|| CoreError::missing_storage_tag(J::descriptor().type_name(), &keys.right))?
            .to_string();

        Ok(Self {
            field: association.name().to_string(),
            left: keys.left,
            right: keys.right,
            right_storage,
            target: association.cardinality(),
        })
    }
}
