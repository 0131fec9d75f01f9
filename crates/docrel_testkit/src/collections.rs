//! Collection wrappers for observing and breaking the storage interface.

use docrel_core::{Collection, Context, Filter, FindOptions, ObjectId, Record};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use thiserror::Error;

/// Wraps a collection and records every read.
#[derive(Debug)]
pub struct CountingCollection<C> {
    inner: C,
    reads: AtomicUsize,
    filters: Mutex<Vec<Filter>>,
}

impl<C> CountingCollection<C> {
    /// Wraps `inner`.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
            filters: Mutex::new(Vec::new()),
        }
    }

    /// Returns the wrapped collection.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Number of reads issued so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Filters passed to each read, in order.
    pub fn filters(&self) -> Vec<Filter> {
        self.filters.lock().clone()
    }

    /// The most recent read filter.
    pub fn last_filter(&self) -> Option<Filter> {
        self.filters.lock().last().cloned()
    }

    /// Forgets recorded reads.
    pub fn reset(&self) {
        self.reads.store(0, Ordering::SeqCst);
        self.filters.lock().clear();
    }
}

impl<T: Record, C: Collection<T>> Collection<T> for CountingCollection<C> {
    type Error = C::Error;

    fn create(&self, ctx: &Context, record: &mut T) -> Result<(), Self::Error> {
        self.inner.create(ctx, record)
    }

    fn read(&self, ctx: &Context, filter: &Filter, options: &FindOptions) -> Result<Vec<T>, Self::Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.filters.lock().push(filter.clone());
        self.inner.read(ctx, filter, options)
    }

    fn get_by_id(&self, ctx: &Context, id: ObjectId) -> Result<Option<T>, Self::Error> {
        self.inner.get_by_id(ctx, id)
    }

    fn delete_by_id(&self, ctx: &Context, id: ObjectId) -> Result<(), Self::Error> {
        self.inner.delete_by_id(ctx, id)
    }

    fn update(&self, ctx: &Context, record: &T) -> Result<(), Self::Error> {
        self.inner.update(ctx, record)
    }
}

/// Error returned by [`FailingCollection`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InjectedError {
    /// The store is unavailable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A collection whose reads fail while failure is switched on.
///
/// Writes and lookups are delegated to the wrapped collection.
#[derive(Debug)]
pub struct FailingCollection<C> {
    inner: C,
    fail_reads: AtomicBool,
    attempts: AtomicUsize,
}

impl<C> FailingCollection<C> {
    /// Wraps `inner` with read failure switched on.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(true),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Switches read failure on or off.
    pub fn set_failing(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }

    /// Number of reads attempted, failed or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

/// Error type of [`FailingCollection`]: either injected or from the
/// wrapped store.
#[derive(Debug, Error)]
pub enum FailingError<E: std::error::Error + 'static> {
    /// Failure injected by the wrapper.
    #[error(transparent)]
    Injected(#[from] InjectedError),
    /// Failure from the wrapped collection.
    #[error(transparent)]
    Inner(E),
}

impl<T: Record, C: Collection<T>> Collection<T> for FailingCollection<C> {
    type Error = FailingError<C::Error>;

    fn create(&self, ctx: &Context, record: &mut T) -> Result<(), Self::Error> {
        self.inner.create(ctx, record).map_err(FailingError::Inner)
    }

    fn read(&self, ctx: &Context, filter: &Filter, options: &FindOptions) -> Result<Vec<T>, Self::Error> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(InjectedError::Unavailable("injected read failure".to_string()).into());
        }
        self.inner.read(ctx, filter, options).map_err(FailingError::Inner)
    }

    fn get_by_id(&self, ctx: &Context, id: ObjectId) -> Result<Option<T>, Self::Error> {
        self.inner.get_by_id(ctx, id).map_err(FailingError::Inner)
    }

    fn delete_by_id(&self, ctx: &Context, id: ObjectId) -> Result<(), Self::Error> {
        self.inner.delete_by_id(ctx, id).map_err(FailingError::Inner)
    }

    fn update(&self, ctx: &Context, record: &T) -> Result<(), Self::Error> {
        self.inner.update(ctx, record).map_err(FailingError::Inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Tag;
    use docrel_core::MemoryCollection;

    #[test]
    fn counting_records_reads() {
        let tags = CountingCollection::new(MemoryCollection::<Tag>::new("tags"));
        let ctx = Context::background();
        tags.create(&ctx, &mut Tag::labelled("rust")).unwrap();

        let found: Vec<Tag> = tags.read(&ctx, &Filter::eq("label", "rust"), &FindOptions::new()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(tags.read_count(), 1);
        assert_eq!(tags.last_filter(), Some(Filter::eq("label", "rust")));

        tags.reset();
        assert_eq!(tags.read_count(), 0);
        assert!(tags.filters().is_empty());
    }

    #[test]
    fn failing_read_can_be_switched_off() {
        let tags = FailingCollection::new(MemoryCollection::<Tag>::new("tags"));
        let ctx = Context::background();

        let err = Collection::<Tag>::read(&tags, &ctx, &Filter::new(), &FindOptions::new()).unwrap_err();
        assert!(matches!(err, FailingError::Injected(_)));

        tags.set_failing(false);
        let found: Vec<Tag> = tags.read(&ctx, &Filter::new(), &FindOptions::new()).unwrap();
        assert!(found.is_empty());
        assert_eq!(tags.attempts(), 2);
    }
}
