//! # docrel codec
//!
//! The schemaless document model shared by every docrel crate.
//!
//! - [`Value`]: a dynamic document value (maps, arrays, text, integers,
//!   bytes, booleans, null and typed [`ObjectId`]s). Both stored documents
//!   and query filters are `Value`s.
//! - [`ObjectId`]: the 12-byte document identifier with its 24-character
//!   hexadecimal text form.
//! - Canonical CBOR encoding, used as the storage representation of
//!   documents. Identical documents always produce identical bytes.
//!
//! ## Usage
//!
//! ```
//! use docrel_codec::{from_cbor, to_canonical_cbor, ObjectId, Value};
//!
//! let doc = Value::document([
//!     ("_id", Value::ObjectId(ObjectId::new())),
//!     ("name", Value::from("Alice")),
//! ]);
//! let bytes = to_canonical_cbor(&doc).unwrap();
//! assert_eq!(from_cbor(&bytes).unwrap(), doc);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod object_id;
mod value;

pub use decoder::{from_cbor, CanonicalDecoder};
pub use encoder::{to_canonical_cbor, CanonicalEncoder};
pub use error::{CodecError, CodecResult};
pub use object_id::{ObjectId, OBJECT_ID_HEX_LEN, OBJECT_ID_LEN};
pub use value::Value;
