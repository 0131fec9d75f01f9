//! Call context carrying cancellation and deadline.
//!
//! A [`Context`] is handed to every [`Collection`](crate::Collection)
//! operation. The join engine passes it through unchanged; stores decide
//! when to call [`Context::check`].

use crate::error::ContextError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cancellation and deadline scope for a store operation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Option<Arc<AtomicBool>>,
}

/// Handle that cancels every context derived from the one it was created with.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl Context {
    /// Returns a context that is never cancelled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Derives a context that expires at `deadline`.
    ///
    /// An earlier deadline already on `self` is kept.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing <= deadline => existing,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
            cancelled: self.cancelled.clone(),
        }
    }

    /// Derives a context that expires after `timeout`.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.clone(),
        }
    }

    /// Derives a cancellable context and the handle that cancels it.
    ///
    /// Cancelling the parent still cancels the child: the child shares the
    /// parent's flag if it has one.
    #[must_use]
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let flag = self
            .cancelled
            .clone()
            .unwrap_or_else(|| Arc::new(AtomicBool::new(false)));
        let ctx = Self {
            deadline: self.deadline,
            cancelled: Some(Arc::clone(&flag)),
        };
        (ctx, CancelHandle { flag })
    }

    /// Returns the deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true once the context has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    /// Returns an error if the context is cancelled or past its deadline.
    pub fn check(&self) -> Result<(), ContextError> {
        if self.is_cancelled() {
            return Err(ContextError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(ContextError::DeadlineExceeded);
            }
        }
        Ok(())
    }
}

impl CancelHandle {
    /// Cancels the associated contexts.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns true if `cancel` has been called.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_never_expires() {
        let ctx = Context::background();
        assert!(ctx.check().is_ok());
        assert!(!ctx.is_cancelled());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn cancel_handle_cancels_context() {
        let (ctx, handle) = Context::background().with_cancel();
        let copy = ctx.clone();
        assert!(ctx.check().is_ok());

        handle.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(ctx.check(), Err(ContextError::Cancelled));
        assert_eq!(copy.check(), Err(ContextError::Cancelled));
    }

    #[test]
    fn child_sees_parent_cancellation() {
        let (parent, handle) = Context::background().with_cancel();
        let child = parent.with_timeout(Duration::from_secs(60));
        let (grandchild, _) = child.with_cancel();

        handle.cancel();
        assert!(child.is_cancelled());
        assert!(grandchild.is_cancelled());
    }

    #[test]
    fn past_deadline_is_exceeded() {
        let ctx = Context::background().with_deadline(Instant::now());
        assert_eq!(ctx.check(), Err(ContextError::DeadlineExceeded));
    }

    #[test]
    fn earlier_deadline_wins() {
        let soon = Instant::now() + Duration::from_secs(1);
        let later = soon + Duration::from_secs(60);

        let ctx = Context::background().with_deadline(soon).with_deadline(later);
        assert_eq!(ctx.deadline(), Some(soon));
    }
}
