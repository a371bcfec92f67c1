//! Synchronous continuation dispatch.
//!
//! Continuations run in the resolving call stack. A continuation that
//! resumes a computation which resolves another promise nests one dispatch
//! inside another, so long chains would grow the stack without bound. Past
//! [`MAX_DEPTH`] nested dispatches on a thread, continuations are queued
//! instead, and the outermost dispatch drains the queue before it returns.
//! The outermost `resolve` therefore still returns only once every waiter
//! reachable from it has run.

use core::cell::{Cell, RefCell};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

use super::cell::Continuation;

/// Nested dispatches allowed on one thread before queueing kicks in.
pub(crate) const MAX_DEPTH: usize = 64;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
    static DEFERRED: RefCell<VecDeque<Continuation>> = const { RefCell::new(VecDeque::new()) };
}

/// Invoke `continuations` in order.
///
/// Every continuation runs even if an earlier one panics; the first panic is
/// resumed once they are done.
pub(crate) fn run<I>(continuations: I)
where
    I: IntoIterator<Item = Continuation>,
{
    let depth = DEPTH.with(Cell::get);
    if depth >= MAX_DEPTH {
        DEFERRED.with(|queue| queue.borrow_mut().extend(continuations));
        tracing::trace!(depth, "deferring continuations to the outermost dispatch");
        return;
    }

    let mut panicked = None;
    {
        let _depth = DepthGuard::enter();
        for continuation in continuations {
            invoke(continuation, &mut panicked);
        }
        if depth == 0 {
            while let Some(continuation) = DEFERRED.with(|queue| queue.borrow_mut().pop_front()) {
                invoke(continuation, &mut panicked);
            }
        }
    }

    if let Some(payload) = panicked {
        panic::resume_unwind(payload);
    }
}

fn invoke(continuation: Continuation, panicked: &mut Option<Box<dyn Any + Send>>) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| continuation.invoke())) {
        tracing::debug!("continuation panicked, resuming once all waiters ran");
        if panicked.is_none() {
            *panicked = Some(payload);
        }
    }
}

/// Current nesting depth of dispatches on this thread.
#[cfg(test)]
pub(crate) fn depth() -> usize {
    DEPTH.with(Cell::get)
}

struct DepthGuard;

impl DepthGuard {
    fn enter() -> Self {
        DEPTH.with(|depth| depth.set(depth.get() + 1));
        DepthGuard
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get() - 1));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::combinator::All;
    use crate::promise::{pair, Awaiter};

    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    fn record(log: &Arc<Mutex<Vec<usize>>>, id: usize) -> Continuation {
        let log = log.clone();
        Continuation::Callback(Box::new(move || log.lock().unwrap().push(id)))
    }

    #[test]
    fn runs_in_order() {
        let log = Arc::new(Mutex::new(vec![]));
        run((0..3).map(|id| record(&log, id)));
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(depth(), 0);
    }

    #[test]
    fn panic_does_not_skip_later_continuations() {
        let log = Arc::new(Mutex::new(vec![]));
        let boom = Continuation::Callback(Box::new(|| panic!("boom")));
        let continuations = vec![record(&log, 0), boom, record(&log, 1)];
        let res = panic::catch_unwind(AssertUnwindSafe(|| run(continuations)));
        assert!(res.is_err());
        assert_eq!(*log.lock().unwrap(), vec![0, 1]);
        assert_eq!(depth(), 0);
    }

    fn nest(log: Arc<Mutex<Vec<usize>>>, remaining: usize) -> Continuation {
        Continuation::Callback(Box::new(move || {
            log.lock().unwrap().push(depth());
            if remaining > 0 {
                run(Some(nest(log, remaining - 1)));
            }
        }))
    }

    #[test]
    fn nesting_is_bounded() {
        let log = Arc::new(Mutex::new(vec![]));
        run(Some(nest(log.clone(), MAX_DEPTH * 3)));
        let depths = log.lock().unwrap();
        assert_eq!(depths.len(), MAX_DEPTH * 3 + 1);
        assert!(depths.iter().all(|depth| *depth <= MAX_DEPTH));
        assert_eq!(depth(), 0);
    }

    fn innermost(remaining: usize, body: Box<dyn FnOnce() + Send>) -> Continuation {
        Continuation::Callback(Box::new(move || {
            if remaining == 0 {
                body();
            } else {
                run(Some(innermost(remaining - 1, body)));
            }
        }))
    }

    #[derive(Debug, Default)]
    struct Observed {
        depth: usize,
        late_subscription_ran: bool,
        all_of_resolved: Option<Vec<u8>>,
        resolved_value: Option<u8>,
    }

    #[test]
    fn guarantees_hold_at_max_depth() {
        let observed = Arc::new(Mutex::new(Observed::default()));
        let waiter_ran = Arc::new(AtomicBool::new(false));

        let out = observed.clone();
        let ran = waiter_ran.clone();
        run(Some(innermost(
            MAX_DEPTH - 1,
            Box::new(move || {
                let late = Arc::new(AtomicBool::new(false));
                let flag = late.clone();
                let _ = Awaiter::resolved(1u8).on_completed(move || flag.store(true, Ordering::SeqCst));
                let late_subscription_ran = late.load(Ordering::SeqCst);

                let all_of_resolved = vec![Awaiter::resolved(7u8)].all().get_result();

                let (promise, awaiter) = pair::<u8>();
                let _ = awaiter.on_completed(move || ran.store(true, Ordering::SeqCst));
                promise.resolve(3);

                *out.lock().unwrap() = Observed {
                    depth: depth(),
                    late_subscription_ran,
                    all_of_resolved,
                    resolved_value: awaiter.get_result(),
                };
            }),
        )));

        let observed = observed.lock().unwrap();
        assert_eq!(observed.depth, MAX_DEPTH);
        assert!(observed.late_subscription_ran);
        assert_eq!(observed.all_of_resolved, Some(vec![7]));
        assert_eq!(observed.resolved_value, Some(3));
        // Queued by the nested resolve, drained by the outermost dispatch.
        assert!(waiter_ran.load(Ordering::SeqCst));
        assert_eq!(depth(), 0);
    }
}
