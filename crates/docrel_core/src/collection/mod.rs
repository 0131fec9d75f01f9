//! The typed collection interface and an in-memory implementation.

mod matcher;
mod memory;

pub use memory::MemoryCollection;

use crate::context::Context;
use crate::filter::{Filter, FindOptions};
use crate::record::Record;
use docrel_codec::ObjectId;

/// A store of records of type `T`.
///
/// All operations take a [`Context`]; implementations decide how they
/// honour its cancellation and deadline.
pub trait Collection<T: Record> {
    /// Error produced by the store.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Inserts `record`. If it has no identifier, one is generated and
    /// written back to the record.
    fn create(&self, ctx: &Context, record: &mut T) -> Result<(), Self::Error>;

    /// Returns the records matching `filter`, shaped by `options`.
    fn read(&self, ctx: &Context, filter: &Filter, options: &FindOptions) -> Result<Vec<T>, Self::Error>;

    /// Returns the record with identifier `id`, if it exists.
    fn get_by_id(&self, ctx: &Context, id: ObjectId) -> Result<Option<T>, Self::Error>;

    /// Removes the record with identifier `id`. Removing a missing record
    /// is not an error.
    fn delete_by_id(&self, ctx: &Context, id: ObjectId) -> Result<(), Self::Error>;

    /// Overwrites the stored document of `record` in full.
    /// Concurrent updates are last-writer-wins.
    fn update(&self, ctx: &Context, record: &T) -> Result<(), Self::Error>;
}

impl<T: Record, C: Collection<T> + ?Sized> Collection<T> for &C {
    type Error = C::Error;

    fn create(&self, ctx: &Context, record: &mut T) -> Result<(), Self::Error> {
        (**self).create(ctx, record)
    }

    fn read(&self, ctx: &Context, filter: &Filter, options: &FindOptions) -> Result<Vec<T>, Self::Error> {
        (**self).read(ctx, filter, options)
    }

    fn get_by_id(&self, ctx: &Context, id: ObjectId) -> Result<Option<T>, Self::Error> {
        (**self).get_by_id(ctx, id)
    }

    fn delete_by_id(&self, ctx: &Context, id: ObjectId) -> Result<(), Self::Error> {
        (**self).delete_by_id(ctx, id)
    }

    fn update(&self, ctx: &Context, record: &T) -> Result<(), Self::Error> {
        (**self).update(ctx, record)
    }
}
