//! # docrel testkit
//!
//! Test utilities for docrel.
//!
//! This crate provides:
//! - Sample record types (users, posts, tags) covering every association
//!   shape, plus a seeded in-memory blog
//! - Collection wrappers that count reads or fail on demand
//! - Property-based test generators using proptest
//! - JSON to document conversion for writing filters in tests
//! - A tracing subscriber for test output
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docrel_testkit::prelude::*;
//!
//! #[test]
//! fn posts_get_authors() {
//!     let blog = Blog::seed();
//!     let mut posts = blog.all_posts();
//!     join(&Context::background(), &mut posts, "Author", &blog.users).unwrap();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod collections;
pub mod fixtures;
pub mod generators;
pub mod json;
pub mod records;
pub mod tracing_support;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::collections::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::json::*;
    pub use crate::records::*;
    pub use crate::tracing_support::*;
    pub use docrel_core::{join, join_one, Collection, Context, Filter, FindOptions};
}

pub use collections::*;
pub use fixtures::*;
pub use generators::*;
pub use json::*;
pub use records::*;
pub use tracing_support::*;
