//! Error types for docrel core.

use docrel_codec::{CodecError, ObjectId};
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Boxed error produced by a [`Collection`](crate::Collection) implementation.
pub type BoxedStorageError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by record metadata resolution, the join engine and
/// document conversion.
///
/// Every metadata variant is detected before any storage I/O happens.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A caller-supplied argument cannot be used.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Why the argument was rejected.
        message: String,
    },

    /// A named field does not exist on a record type.
    #[error("record type {type_name} has no field {field}")]
    MissingField {
        /// The record type searched.
        type_name: String,
        /// The field name that was not found.
        field: String,
    },

    /// A field used in a store filter has no storage name.
    #[error("field {type_name}.{field} has no storage name")]
    MissingStorageTag {
        /// The record type.
        type_name: String,
        /// The field lacking a storage name.
        field: String,
    },

    /// An association field lacks a well-formed two-key declaration.
    #[error("field {type_name}.{field} has no valid association tag: {reason}")]
    MissingAssociationTag {
        /// The record type.
        type_name: String,
        /// The association field.
        field: String,
        /// What is wrong with the declaration.
        reason: String,
    },

    /// The storage collaborator failed. The original error is kept as the
    /// source and is reachable through `downcast_ref`.
    #[error("storage error: {0}")]
    Storage(#[source] BoxedStorageError),

    /// Codec error while converting a document.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A stored document does not have the shape its record type expects.
    #[error("invalid document for {type_name}: {message}")]
    InvalidFormat {
        /// The record type being decoded.
        type_name: String,
        /// Description of the format issue.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            type_name: type_name.into(),
            field: field.into(),
        }
    }

    /// Creates a missing storage tag error.
    pub fn missing_storage_tag(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingStorageTag {
            type_name: type_name.into(),
            field: field.into(),
        }
    }

    /// Creates a missing association tag error.
    pub fn missing_association_tag(
        type_name: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MissingAssociationTag {
            type_name: type_name.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Wraps a storage collaborator error without altering it.
    pub fn storage<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage(Box::new(error))
    }

    /// Creates an invalid format error.
    pub fn invalid_format(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Returns true for errors detected from record metadata alone.
    pub fn is_metadata_error(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidArgument { .. }
                | CoreError::MissingField { .. }
                | CoreError::MissingStorageTag { .. }
                | CoreError::MissingAssociationTag { .. }
        )
    }

    /// Returns the storage collaborator's error, if this is a storage error
    /// of type `E`.
    pub fn storage_source<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            CoreError::Storage(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Why a [`Context`](crate::Context) no longer permits work.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// The context was cancelled through its handle.
    #[error("operation cancelled")]
    Cancelled,

    /// The context's deadline has passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Result type for the in-memory store.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by [`MemoryCollection`](crate::MemoryCollection).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The caller's context stopped the operation.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The record type declares no field stored as `_id`.
    #[error("record type {type_name} has no identifier field")]
    MissingIdField {
        /// The record type.
        type_name: String,
    },

    /// The record has no identifier value.
    #[error("record in collection {collection} has no identifier")]
    MissingId {
        /// The collection name.
        collection: String,
    },

    /// A document with this identifier already exists.
    #[error("duplicate identifier {id} in collection {collection}")]
    DuplicateId {
        /// The collection name.
        collection: String,
        /// The conflicting identifier.
        id: ObjectId,
    },

    /// No document with this identifier exists.
    #[error("document {id} not found in collection {collection}")]
    NotFound {
        /// The collection name.
        collection: String,
        /// The identifier searched.
        id: ObjectId,
    },

    /// The filter uses an unsupported shape or operator.
    #[error("invalid filter: {message}")]
    InvalidFilter {
        /// Description of the problem.
        message: String,
    },

    /// Encoding or decoding a stored document failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Converting between a record and its document failed.
    #[error("record conversion failed: {0}")]
    Record(#[from] CoreError),
}

impl StoreError {
    /// Creates an invalid filter error.
    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Self::InvalidFilter {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_keeps_source() {
        let err = CoreError::storage(StoreError::Context(ContextError::Cancelled));

        let source = err.storage_source::<StoreError>().unwrap();
        assert!(matches!(source, StoreError::Context(ContextError::Cancelled)));
        assert_eq!(err.to_string(), "storage error: operation cancelled");
        assert!(!err.is_metadata_error());
    }

    #[test]
    fn metadata_errors_are_classified() {
        assert!(CoreError::missing_field("User", "Name").is_metadata_error());
        assert!(CoreError::missing_storage_tag("User", "Name").is_metadata_error());
        assert!(CoreError::missing_association_tag("User", "Posts", "absent").is_metadata_error());
        assert!(CoreError::invalid_argument("empty").is_metadata_error());
        assert!(!CoreError::invalid_format("User", "expected map").is_metadata_error());
    }

    #[test]
    fn messages_name_type_and_field() {
        let err = CoreError::missing_association_tag("Post", "Author", "expected two keys");
        assert_eq!(
            err.to_string(),
            "field Post.Author has no valid association tag: expected two keys"
        );
    }
}
