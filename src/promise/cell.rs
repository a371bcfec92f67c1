//! The completion cell shared by a [`Promise`][super::Promise] and its
//! [`Awaiter`][super::Awaiter]s.
//!
//! The cell owns the eventual result and the ordered list of continuations
//! waiting on it. Every continuation is handed to [`dispatch`] or dropped
//! only after the cell lock has been released: a continuation may own the
//! last reference to a suspended computation, and dropping that computation
//! can re-enter the cell (an awaiter deregistering itself).

use core::fmt;
use core::mem;
use core::task::{Poll, Waker};
use std::sync::Mutex;

use smallvec::SmallVec;

use super::dispatch;
use crate::utils::lock;

/// Something waiting for a cell to complete.
pub(crate) enum Continuation {
    /// A one-shot callback registered through `on_completed`.
    Callback(Box<dyn FnOnce() + Send>),
    /// The waker of a computation suspended on the cell.
    Waker(Waker),
}

impl Continuation {
    pub(crate) fn invoke(self) {
        match self {
            Continuation::Callback(callback) => callback(),
            Continuation::Waker(waker) => waker.wake(),
        }
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Continuation::Callback(_) => f.write_str("Callback"),
            Continuation::Waker(waker) => f.debug_tuple("Waker").field(waker).finish(),
        }
    }
}

/// The lifecycle of a cell. `Completed` and `Abandoned` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    /// Waiting for the producer.
    Pending,
    /// Resolved; the result is stored.
    Completed,
    /// The producer was dropped without resolving.
    Abandoned,
}

/// Registered continuations. Almost every cell has exactly one waiter.
type Waiters = SmallVec<[(u64, Continuation); 1]>;

struct State<T> {
    status: Status,
    result: Option<T>,
    next_key: u64,
    waiters: Waiters,
}

/// A single-resolution completion cell.
pub(crate) struct Shared<T> {
    state: Mutex<State<T>>,
}

impl<T> Shared<T> {
    pub(crate) fn new() -> Self {
        Self::with_state(Status::Pending, None)
    }

    pub(crate) fn resolved(value: T) -> Self {
        Self::with_state(Status::Completed, Some(value))
    }

    fn with_state(status: Status, result: Option<T>) -> Self {
        Self {
            state: Mutex::new(State {
                status,
                result,
                next_key: 0,
                waiters: SmallVec::new(),
            }),
        }
    }

    pub(crate) fn status(&self) -> Status {
        lock(&self.state).status
    }

    /// Store `value` and run every waiter, in registration order.
    ///
    /// Hands the value back if the cell is no longer pending.
    pub(crate) fn complete(&self, value: T) -> Result<(), T> {
        let waiters = {
            let mut state = lock(&self.state);
            if state.status != Status::Pending {
                return Err(value);
            }
            state.result = Some(value);
            state.status = Status::Completed;
            mem::take(&mut state.waiters)
        };
        tracing::trace!(waiters = waiters.len(), "promise resolved");
        dispatch::run(waiters.into_iter().map(|(_, waiter)| waiter));
        Ok(())
    }

    /// Mark a pending cell as abandoned and release its waiters uninvoked.
    pub(crate) fn abandon(&self) {
        let waiters = {
            let mut state = lock(&self.state);
            if state.status != Status::Pending {
                return;
            }
            state.status = Status::Abandoned;
            mem::take(&mut state.waiters)
        };
        if !waiters.is_empty() {
            tracing::debug!(
                waiters = waiters.len(),
                "promise dropped before resolving, releasing its waiters"
            );
        }
        drop(waiters);
    }

    /// Register a continuation.
    ///
    /// Returns the registration key while the cell is pending. On a completed
    /// cell the continuation runs right away, on the caller's stack; on an
    /// abandoned one it can never run and is dropped. Both return `None`.
    pub(crate) fn subscribe(&self, continuation: Continuation) -> Option<u64> {
        let mut state = lock(&self.state);
        let status = state.status;
        match status {
            Status::Pending => {
                let key = state.next_key;
                state.next_key += 1;
                state.waiters.push((key, continuation));
                return Some(key);
            }
            Status::Completed => {
                // Never deferred: a late subscriber runs before `subscribe`
                // returns, whatever the dispatch depth.
                drop(state);
                continuation.invoke();
            }
            Status::Abandoned => {
                drop(state);
                drop(continuation);
            }
        }
        None
    }

    #[cfg(test)]
    pub(crate) fn waiters(&self) -> usize {
        lock(&self.state).waiters.len()
    }

    /// Remove a registered continuation before it fires.
    ///
    /// Returns `false` if it already fired or was released.
    pub(crate) fn unsubscribe(&self, key: u64) -> bool {
        let removed = {
            let mut state = lock(&self.state);
            let index = state.waiters.iter().position(|(k, _)| *k == key);
            index.map(|index| state.waiters.remove(index))
        };
        removed.is_some()
    }

    pub(crate) fn result(&self) -> Option<T>
    where
        T: Clone,
    {
        lock(&self.state).result.clone()
    }

    /// Poll the cell on behalf of one awaiter.
    ///
    /// `key` is the awaiter's registration. It is created on the first
    /// pending poll and its waker is refreshed on later ones, under the same
    /// lock that `complete` takes, so a wake-up can't slip in between the
    /// check and the registration.
    pub(crate) fn poll_result(&self, key: &mut Option<u64>, waker: &Waker) -> Poll<T>
    where
        T: Clone,
    {
        let mut state = lock(&self.state);
        let status = state.status;
        match status {
            Status::Completed => {
                *key = None;
                match state.result.clone() {
                    Some(value) => Poll::Ready(value),
                    None => unreachable!("a completed cell always holds its result"),
                }
            }
            Status::Abandoned => Poll::Pending,
            Status::Pending => {
                let registered = key.and_then(|key| {
                    state
                        .waiters
                        .iter_mut()
                        .find(|(k, _)| *k == key)
                        .map(|(_, continuation)| continuation)
                });
                let stale = match registered {
                    Some(Continuation::Waker(current)) if current.will_wake(waker) => None,
                    Some(slot) => Some(mem::replace(slot, Continuation::Waker(waker.clone()))),
                    None => {
                        let next = state.next_key;
                        state.next_key += 1;
                        state
                            .waiters
                            .push((next, Continuation::Waker(waker.clone())));
                        *key = Some(next);
                        None
                    }
                };
                drop(state);
                drop(stale);
                Poll::Pending
            }
        }
    }
}

impl<T> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("Shared")
            .field("status", &state.status)
            .field("waiters", &state.waiters.len())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, Continuation) {
        let count = Arc::new(AtomicUsize::new(0));
        let hits = count.clone();
        let continuation = Continuation::Callback(Box::new(move || {
            hits.fetch_add(1, Ordering::SeqCst);
        }));
        (count, continuation)
    }

    #[test]
    fn complete_runs_waiters_once() {
        let cell = Shared::new();
        let (count, continuation) = counter();
        assert!(cell.subscribe(continuation).is_some());
        assert_eq!(cell.complete(1), Ok(()));
        assert_eq!(cell.complete(2), Err(2));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(cell.result(), Some(1));
    }

    #[test]
    fn unsubscribe_before_completion() {
        let cell = Shared::new();
        let (count, continuation) = counter();
        let key = cell.subscribe(continuation).unwrap();
        assert!(cell.unsubscribe(key));
        assert!(!cell.unsubscribe(key));
        cell.complete(()).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn abandoned_cell_drops_waiters() {
        let cell = Shared::<u8>::new();
        let (count, continuation) = counter();
        cell.subscribe(continuation);
        cell.abandon();
        assert_eq!(cell.status(), Status::Abandoned);
        assert_eq!(cell.complete(1), Err(1));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        let (count, continuation) = counter();
        assert_eq!(cell.subscribe(continuation), None);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn debug() {
        let cell = Shared::resolved("hello");
        assert_eq!(
            format!("{:?}", cell),
            "Shared { status: Completed, waiters: 0 }"
        );
    }
}
