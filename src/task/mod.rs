//! Chaining `async` computations onto promises.
//!
//! [`spawn`] turns a future into a computation that is driven entirely by
//! the promises it awaits. It runs synchronously until its first suspension,
//! and from then on each `resolve` of an awaited promise resumes it inline,
//! inside the resolving call. When it finishes, its output resolves the
//! awaiter `spawn` returned. There is no executor: whatever resolves the
//! promises (a [`Driver`][crate::driver::Driver], another thread, a test)
//! drives the computation.
//!
//! # Panics
//!
//! A computation that panics is finished: it is never polled again, its
//! output awaiter is abandoned, and the panic propagates to whoever polled
//! it, either the caller of `spawn` or the caller of the `resolve` that
//! resumed it.
//!
//! # Examples
//!
//! ```
//! use settle::{pair, spawn};
//!
//! let (first, a) = pair::<u32>();
//! let (second, b) = pair::<u32>();
//! let sum = spawn(async move { a.await + b.await });
//!
//! first.resolve(1);
//! assert!(!sum.is_completed());
//! second.resolve(2);
//! assert_eq!(sum.get_result(), Some(3));
//! ```

use core::future::Future;
use core::pin::Pin;
use core::task::{ready, Context, Poll, Waker};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::task::Wake;

use pin_project::pin_project;

use crate::promise::{self, Awaiter, Promise};
use crate::utils::lock;

mod state;

use state::AtomicTaskState;

/// Start a computation chained onto the promises it awaits.
///
/// The computation is polled right away, before `spawn` returns. The
/// returned awaiter resolves with its output.
pub fn spawn<F>(future: F) -> Awaiter<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let (promise, awaiter) = promise::pair();
    let task = Arc::new(Task::new(Chained {
        future,
        promise: Some(promise),
    }));
    task.run();
    awaiter
}

/// Resolves the computation's promise once its future completes.
#[pin_project]
struct Chained<F>
where
    F: Future,
{
    #[pin]
    future: F,
    promise: Option<Promise<F::Output>>,
}

impl<F> Future for Chained<F>
where
    F: Future,
{
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let value = ready!(this.future.poll(cx));
        if let Some(promise) = this.promise.take() {
            promise.resolve(value);
        }
        Poll::Ready(())
    }
}

type Computation = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A spawned computation. Its wakers poll it in place.
struct Task {
    state: AtomicTaskState,
    future: Mutex<Option<Computation>>,
}

impl Task {
    fn new<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            state: AtomicTaskState::new(),
            future: Mutex::new(Some(Box::pin(future))),
        }
    }

    /// Poll the computation until it suspends or finishes.
    ///
    /// Only one caller polls at a time. A wake-up that arrives while the
    /// computation runs, from its own call stack or from another thread, makes
    /// the current runner poll again instead of recursing.
    fn run(self: &Arc<Self>) {
        if !self.state.begin() {
            return;
        }
        let waker = Waker::from(self.clone());
        let mut cx = Context::from_waker(&waker);
        loop {
            let polled = {
                let mut slot = lock(&self.future);
                match slot.as_mut() {
                    Some(future) => {
                        panic::catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(&mut cx)))
                    }
                    None => Ok(Poll::Ready(())),
                }
            };
            match polled {
                Ok(Poll::Pending) => {
                    if self.state.suspend() {
                        return;
                    }
                    tracing::trace!("task woken while running, polling again");
                }
                Ok(Poll::Ready(())) => {
                    self.finish();
                    return;
                }
                Err(payload) => {
                    tracing::error!("spawned computation panicked, abandoning its promise");
                    self.finish();
                    panic::resume_unwind(payload);
                }
            }
        }
    }

    fn finish(&self) {
        self.state.finish();
        let future = lock(&self.future).take();
        drop(future);
    }
}

impl Wake for Task {
    fn wake(self: Arc<Self>) {
        self.run();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.run();
    }
}
