//! # docrel core
//!
//! Typed record collections over a schemaless document store, with
//! relational associations resolved by a generic join engine.
//!
//! ## Overview
//!
//! - [`Record`] types publish a static [`RecordDescriptor`] naming each
//!   field, its storage name, its cardinality and, for association fields,
//!   the `"Left,Right"` key pair.
//! - [`Collection`] is the storage interface; [`MemoryCollection`] is an
//!   in-memory implementation.
//! - [`join`] fills an association field on a batch of records with a
//!   single `$in` read against the joined collection.
//! - [`coerce_identifiers`] rewrites hex identifier strings in a filter into
//!   typed [`ObjectId`](docrel_codec::ObjectId) values.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docrel_core::{join, Collection, Context, MemoryCollection};
//!
//! let ctx = Context::background();
//! let users: MemoryCollection<User> = MemoryCollection::new("users");
//! let mut posts: Vec<Post> = load_posts()?;
//!
//! // Post declares `Author` with association "AuthorID,ID".
//! let authors = join(&ctx, &mut posts, "Author", &users)?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod coerce;
mod collection;
mod config;
mod context;
mod error;
mod filter;
mod join;
mod record;
mod resolver;

pub use coerce::{coerce_identifiers, CoercionIssue, CoercionReport, IdentifierCoercer};
pub use collection::{Collection, MemoryCollection};
pub use config::{CoercionConfig, MemoryStoreConfig};
pub use context::{CancelHandle, Context};
pub use error::{
    BoxedStorageError, ContextError, CoreError, CoreResult, StoreError, StoreResult,
};
pub use filter::{Filter, FindOptions, Sort, SortOrder};
pub use join::{join, join_one};
pub use record::{
    sequence_value, Associate, Association, Cardinality, DocumentReader, FieldDescriptor,
    Record, RecordDescriptor, ID_STORAGE_NAME,
};
pub use resolver::{
    parse_association_tag, resolve, resolve_cached, AssociationKeys, AssociationSpec, FieldInfo,
    Require,
};

pub use docrel_codec::{ObjectId, Value};
