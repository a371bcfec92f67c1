//! Single-resolution promises.
//!
//! A [`Promise`] is the producer handle of a completion cell, an [`Awaiter`]
//! is a consumer handle of the same cell. Resolving the promise stores the
//! value exactly once and synchronously runs everything waiting on it:
//! callbacks registered with [`Awaiter::on_completed`] and computations
//! suspended on `awaiter.await`.
//!
//! ```
//! use settle::pair;
//!
//! let (promise, awaiter) = pair();
//! promise.resolve(1);
//! promise.resolve(2); // no-op: a promise resolves at most once
//! assert_eq!(awaiter.get_result(), Some(1));
//! ```

use core::fmt;
use std::sync::Arc;

mod awaiter;
mod cell;
pub(crate) mod dispatch;

pub use awaiter::{Awaiter, Subscription};

use cell::Shared;

/// Create a pending promise together with an awaiter for it.
pub fn pair<T>() -> (Promise<T>, Awaiter<T>) {
    let promise = Promise::new();
    let awaiter = promise.awaiter();
    (promise, awaiter)
}

/// The producer half of a promise.
///
/// Resolving is the only way to complete the underlying cell. Dropping a
/// promise that was never resolved abandons it: its awaiters can never
/// complete, and everything registered on them is released without running.
pub struct Promise<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Promise<T> {
    /// Create a new pending promise.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::new()),
        }
    }

    /// Get an awaiter for this promise.
    pub fn awaiter(&self) -> Awaiter<T> {
        Awaiter::new(self.shared.clone())
    }

    /// Resolve the promise with `value`.
    ///
    /// Every waiter runs in the order it was registered. Resolving an
    /// already resolved promise does nothing.
    ///
    /// Waiters run before this method returns, unless the call is itself
    /// made from a waiter nested 64 resolutions deep on this thread. Such a
    /// call stores the value, so the promise reads as completed right away,
    /// but queues its waiters; they run before the outermost `resolve` on
    /// the thread returns.
    ///
    /// # Panics
    ///
    /// If a waiter panics, the remaining waiters still run and the first
    /// panic is resumed afterwards.
    pub fn resolve(&self, value: T) {
        if self.shared.complete(value).is_err() {
            tracing::trace!("promise already resolved, ignoring value");
        }
    }

    /// Resolve the promise with `value`, or hand `value` back if the promise
    /// was already resolved.
    pub fn try_resolve(&self, value: T) -> Result<(), T> {
        self.shared.complete(value)
    }

    /// Returns `true` once the promise has been resolved.
    pub fn is_completed(&self) -> bool {
        self.shared.status() == cell::Status::Completed
    }

    #[cfg(test)]
    pub(crate) fn waiters(&self) -> usize {
        self.shared.waiters()
    }
}

impl Promise<()> {
    /// Resolve a value-less promise.
    pub fn complete(&self) {
        self.resolve(());
    }
}

impl<T> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("status", &self.shared.status())
            .finish()
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        self.shared.abandon();
    }
}
