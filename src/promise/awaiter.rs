use super::cell::{Continuation, Shared, Status};

use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use std::sync::{Arc, Weak};

/// The consumer half of a promise.
///
/// An `Awaiter` observes the completion cell owned by a [`Promise`]. It can
/// be queried, can register callbacks with [`on_completed`], and can be
/// `.await`ed: awaiting suspends the surrounding computation until the
/// promise resolves, then yields a clone of the value.
///
/// Awaiters are cheap to clone and any number of them may wait on the same
/// promise. Every waiter is resumed, in the order it registered.
///
/// [`Promise`]: super::Promise
/// [`on_completed`]: Awaiter::on_completed
///
/// # Examples
///
/// ```
/// use settle::Promise;
///
/// let promise = Promise::new();
/// let awaiter = promise.awaiter();
/// assert!(!awaiter.is_completed());
///
/// promise.resolve("hello");
/// assert!(awaiter.is_completed());
/// assert_eq!(awaiter.get_result(), Some("hello"));
/// ```
#[must_use = "awaiters do nothing unless you `.await` them or register a callback"]
pub struct Awaiter<T> {
    shared: Arc<Shared<T>>,
    /// Waker registration made when this awaiter was polled as a future.
    key: Option<u64>,
}

impl<T> Awaiter<T> {
    pub(crate) fn new(shared: Arc<Shared<T>>) -> Self {
        Self { shared, key: None }
    }

    /// Create an awaiter which is already completed with `value`.
    pub fn resolved(value: T) -> Self {
        Self::new(Arc::new(Shared::resolved(value)))
    }

    /// Returns `true` once the promise has been resolved.
    pub fn is_completed(&self) -> bool {
        self.shared.status() == Status::Completed
    }

    /// Returns `true` if the promise was dropped before it was resolved.
    ///
    /// An abandoned awaiter will never complete.
    pub fn is_abandoned(&self) -> bool {
        self.shared.status() == Status::Abandoned
    }

    /// Run `continuation` once the promise resolves.
    ///
    /// If the promise is already resolved, `continuation` runs right away,
    /// before this method returns, at any nesting depth. Otherwise it runs
    /// synchronously when the promise is resolved, as described on
    /// [`resolve`][super::Promise::resolve]. It never runs if
    /// the promise is abandoned or the returned [`Subscription`] is
    /// cancelled first.
    ///
    /// # Examples
    ///
    /// ```
    /// use settle::pair;
    /// use std::sync::atomic::{AtomicBool, Ordering};
    /// use std::sync::Arc;
    ///
    /// let (promise, awaiter) = pair::<u8>();
    /// let fired = Arc::new(AtomicBool::new(false));
    /// let flag = fired.clone();
    /// awaiter.on_completed(move || flag.store(true, Ordering::SeqCst));
    ///
    /// promise.resolve(1);
    /// assert!(fired.load(Ordering::SeqCst));
    /// ```
    pub fn on_completed<F>(&self, continuation: F) -> Subscription<T>
    where
        F: FnOnce() + Send + 'static,
    {
        let key = self
            .shared
            .subscribe(Continuation::Callback(Box::new(continuation)));
        Subscription {
            shared: Arc::downgrade(&self.shared),
            key,
        }
    }

    /// The resolved value, or `None` while the promise is pending.
    ///
    /// Every call after resolution returns the same value.
    pub fn get_result(&self) -> Option<T>
    where
        T: Clone,
    {
        self.shared.result()
    }
}

impl<T> Clone for Awaiter<T> {
    fn clone(&self) -> Self {
        Self::new(self.shared.clone())
    }
}

impl<T> fmt::Debug for Awaiter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Awaiter")
            .field("status", &self.shared.status())
            .finish()
    }
}

impl<T> Future for Awaiter<T>
where
    T: Clone,
{
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        this.shared.poll_result(&mut this.key, cx.waker())
    }
}

/// Deregister the waker of a computation that stopped waiting.
impl<T> Drop for Awaiter<T> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.shared.unsubscribe(key);
        }
    }
}

/// A continuation registered with [`Awaiter::on_completed`].
///
/// Dropping a subscription leaves the continuation registered. Call
/// [`cancel`][Subscription::cancel] to remove it.
pub struct Subscription<T> {
    shared: Weak<Shared<T>>,
    key: Option<u64>,
}

impl<T> Subscription<T> {
    /// Remove the continuation if it has not run yet.
    ///
    /// Returns `true` if the continuation was removed and will never run.
    pub fn cancel(self) -> bool {
        let removed = match (self.key, self.shared.upgrade()) {
            (Some(key), Some(shared)) => shared.unsubscribe(key),
            _ => false,
        };
        if removed {
            tracing::debug!("continuation cancelled before its promise resolved");
        }
        removed
    }

    /// Returns `true` if the continuation is still waiting to run.
    pub fn is_pending(&self) -> bool {
        self.key.is_some()
            && self
                .shared
                .upgrade()
                .map_or(false, |shared| shared.status() == Status::Pending)
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("pending", &self.is_pending())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::promise::pair;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::Context;

    use futures::task::noop_waker;

    #[test]
    fn smoke() {
        futures_lite::future::block_on(async {
            let (promise, awaiter) = pair();
            promise.resolve("hello");
            assert_eq!(awaiter.await, "hello");
        });
    }

    #[test]
    fn late_subscription_runs_immediately() {
        let (promise, awaiter) = pair();
        promise.resolve(5);
        let count = Arc::new(AtomicUsize::new(0));
        let hits = count.clone();
        let subscription = awaiter.on_completed(move || {
            hits.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!subscription.is_pending());
        assert!(!subscription.cancel());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancelled_subscription_never_fires() {
        let (promise, awaiter) = pair::<u8>();
        let count = Arc::new(AtomicUsize::new(0));
        let hits = count.clone();
        let subscription = awaiter.on_completed(move || {
            hits.fetch_add(1, Ordering::SeqCst);
        });
        assert!(subscription.is_pending());
        assert!(subscription.cancel());
        promise.resolve(1);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn repoll_keeps_one_registration() {
        let (promise, mut awaiter) = pair::<u8>();
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        assert!(Pin::new(&mut awaiter).poll(&mut cx).is_pending());
        assert!(Pin::new(&mut awaiter).poll(&mut cx).is_pending());
        assert_eq!(format!("{:?}", promise.shared), "Shared { status: Pending, waiters: 1 }");

        drop(awaiter);
        assert_eq!(format!("{:?}", promise.shared), "Shared { status: Pending, waiters: 0 }");
    }

    #[test]
    fn debug() {
        let awaiter = Awaiter::resolved(1);
        assert_eq!(format!("{:?}", awaiter), "Awaiter { status: Completed }");
        let (promise, awaiter) = pair::<u8>();
        drop(promise);
        assert_eq!(format!("{:?}", awaiter), "Awaiter { status: Abandoned }");
    }
}
