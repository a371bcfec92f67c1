//! A step driver for time-sliced work.
//!
//! A [`Driver`] owns units of work that make progress one [`Tick`] at a
//! time. The host calls [`Driver::tick`] from its loop; every unit is
//! advanced once per tick, and the promise handed out for a unit is resolved
//! as soon as the unit finishes. Computations awaiting that promise resume
//! right there, inside the tick.
//!
//! Waiting on the clock is just another unit: see [`Driver::wait_for`],
//! [`Driver::wait_ticks`] and [`Driver::wait_until`].
//!
//! ```
//! use settle::driver::Driver;
//! use std::time::Duration;
//!
//! let driver = Driver::new();
//! let timer = driver.clone();
//! let done = settle::spawn(async move {
//!     timer.wait_for(Duration::from_millis(50)).await;
//!     timer.now()
//! });
//!
//! driver.tick(Duration::from_millis(20));
//! driver.tick(Duration::from_millis(20));
//! assert!(!done.is_completed());
//! driver.tick(Duration::from_millis(20));
//! assert_eq!(done.get_result(), Some(Duration::from_millis(60)));
//! ```

use crate::promise::{self, Awaiter, Promise};
use crate::utils::lock;
use crate::{Error, Result};

use core::fmt;
use core::task::Poll;
use core::time::Duration;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use slab::Slab;

mod config;
mod step;
mod wait;

pub use config::Config;
pub use step::{step_fn, Step, StepFn, Tick};
pub use wait::{WaitFor, WaitTicks, WaitUntil};

/// Identifies a unit scheduled on a [`Driver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitId {
    key: usize,
    seq: u64,
}

/// A step together with the promise it resolves.
trait Unit: Send {
    fn advance(&mut self, tick: &Tick) -> Poll<()>;
}

struct Work<S: Step> {
    step: S,
    promise: Promise<S::Output>,
}

impl<S> Unit for Work<S>
where
    S: Step + Send,
    S::Output: Send,
{
    fn advance(&mut self, tick: &Tick) -> Poll<()> {
        match self.step.step(tick) {
            Poll::Ready(output) => {
                self.promise.resolve(output);
                Poll::Ready(())
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

struct Slot {
    /// Scheduling order, also tells reused slab keys apart.
    seq: u64,
    /// `None` while the unit is being advanced.
    unit: Option<Box<dyn Unit>>,
    /// Set when the unit is cancelled while being advanced.
    cancelled: bool,
}

struct Units {
    slab: Slab<Slot>,
    next_seq: u64,
}

struct Clock {
    now: Duration,
    ticks: u64,
}

struct Shared {
    config: Config,
    units: Mutex<Units>,
    clock: Mutex<Clock>,
}

/// Advances units of work over time and resolves their promises.
///
/// A `Driver` is a handle: clones share the same units and clock, so it can
/// be handed to every computation that needs to wait on time.
#[derive(Clone)]
pub struct Driver {
    shared: Arc<Shared>,
}

impl Driver {
    /// Create a driver with the default [`Config`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a driver with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                units: Mutex::new(Units {
                    slab: Slab::new(),
                    next_seq: 0,
                }),
                clock: Mutex::new(Clock {
                    now: Duration::ZERO,
                    ticks: 0,
                }),
            }),
        }
    }

    /// The configuration of this driver.
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Time elapsed on the driver clock.
    pub fn now(&self) -> Duration {
        lock(&self.shared.clock).now
    }

    /// Number of ticks performed so far.
    pub fn ticks(&self) -> u64 {
        lock(&self.shared.clock).ticks
    }

    /// Number of units that have not finished yet.
    pub fn pending(&self) -> usize {
        lock(&self.shared.units).slab.len()
    }

    /// Schedule `step`, returning its id and an awaiter for its output.
    ///
    /// The step is first advanced on the next tick.
    pub fn schedule<S>(&self, step: S) -> (UnitId, Awaiter<S::Output>)
    where
        S: Step + Send + 'static,
        S::Output: Send + 'static,
    {
        let (promise, awaiter) = promise::pair();
        let unit: Box<dyn Unit> = Box::new(Work { step, promise });
        let mut units = lock(&self.shared.units);
        let seq = units.next_seq;
        units.next_seq += 1;
        let key = units.slab.insert(Slot {
            seq,
            unit: Some(unit),
            cancelled: false,
        });
        tracing::trace!(key, seq, "unit scheduled");
        (UnitId { key, seq }, awaiter)
    }

    /// Schedule `step` and return an awaiter for its output.
    pub fn start<S>(&self, step: S) -> Awaiter<S::Output>
    where
        S: Step + Send + 'static,
        S::Output: Send + 'static,
    {
        self.schedule(step).1
    }

    /// Remove a unit before it finishes.
    ///
    /// The unit and its promise are dropped, so its awaiters become
    /// abandoned. Returns `false` if the unit already finished or was
    /// cancelled.
    pub fn cancel(&self, id: UnitId) -> bool {
        let removed = {
            let mut units = lock(&self.shared.units);
            let slot = match units.slab.get_mut(id.key) {
                Some(slot) if slot.seq == id.seq && !slot.cancelled => slot,
                _ => return false,
            };
            if slot.unit.is_none() {
                // Being advanced right now; released once its step returns.
                slot.cancelled = true;
                None
            } else {
                units.slab.try_remove(id.key)
            }
        };
        tracing::debug!(key = id.key, seq = id.seq, "unit cancelled");
        drop(removed);
        true
    }

    /// An awaiter that resolves on the next tick.
    pub fn next_tick(&self) -> Awaiter<()> {
        self.start(WaitTicks::new(1))
    }

    /// An awaiter that resolves on the `n`-th tick from now.
    ///
    /// Waiting for zero ticks resolves immediately.
    pub fn wait_ticks(&self, n: u64) -> Awaiter<()> {
        if n == 0 {
            return Awaiter::resolved(());
        }
        self.start(WaitTicks::new(n))
    }

    /// An awaiter that resolves on the first tick at which `duration` has
    /// elapsed on the driver clock, counting from now.
    pub fn wait_for(&self, duration: Duration) -> Awaiter<()> {
        let deadline = self.now().saturating_add(duration);
        self.start(WaitFor::until(deadline))
    }

    /// An awaiter that resolves on the first tick `predicate` returns `true`.
    ///
    /// The predicate is checked once per tick, starting with the next one.
    pub fn wait_until<F>(&self, predicate: F) -> Awaiter<()>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        self.start(WaitUntil::new(predicate))
    }

    /// Advance the clock by `delta`, then every unit once.
    ///
    /// Units run in the order they were scheduled. Units scheduled while
    /// this tick is in progress are first advanced on the next tick. Returns
    /// how many units finished.
    ///
    /// # Panics
    ///
    /// If a step panics, the unit is removed, its awaiters become abandoned,
    /// and the panic is resumed. Units after it are not advanced on this
    /// tick.
    pub fn tick(&self, delta: Duration) -> usize {
        let tick = {
            let mut clock = lock(&self.shared.clock);
            clock.now = clock.now.saturating_add(delta);
            clock.ticks += 1;
            Tick::new(clock.ticks, clock.now, delta)
        };

        let mut due: Vec<(usize, u64)> = {
            let units = lock(&self.shared.units);
            units.slab.iter().map(|(key, slot)| (key, slot.seq)).collect()
        };
        due.sort_unstable_by_key(|&(_, seq)| seq);

        let mut completed = 0;
        for (key, seq) in due {
            let Some(mut unit) = self.take(key, seq) else {
                continue;
            };
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| unit.advance(&tick)));
            let finished = !matches!(outcome, Ok(Poll::Pending));
            drop(self.restore(key, unit, finished));
            match outcome {
                Ok(Poll::Ready(())) => completed += 1,
                Ok(Poll::Pending) => {}
                Err(payload) => {
                    tracing::error!(key, seq, "step panicked, removing its unit");
                    panic::resume_unwind(payload);
                }
            }
        }
        tracing::trace!(index = tick.index(), completed, "tick finished");
        completed
    }

    /// Advance the clock by the configured fixed delta.
    pub fn tick_fixed(&self) -> usize {
        self.tick(self.shared.config.fixed_delta())
    }

    /// Tick with the fixed delta until `awaiter` completes, and return its
    /// value.
    ///
    /// # Errors
    ///
    /// - [`Error::Abandoned`] if the awaiter's promise is dropped.
    /// - [`Error::Stalled`] if no units are left but the awaiter is pending.
    /// - [`Error::TickLimit`] after [`Config::max_ticks`] ticks.
    pub fn run_until<T>(&self, awaiter: &Awaiter<T>) -> Result<T>
    where
        T: Clone,
    {
        let mut ticks = 0;
        loop {
            if let Some(value) = awaiter.get_result() {
                return Ok(value);
            }
            if awaiter.is_abandoned() {
                return Err(Error::Abandoned);
            }
            if self.pending() == 0 {
                tracing::warn!(ticks, "no units left to advance, awaiter still pending");
                return Err(Error::Stalled { ticks });
            }
            if ticks >= self.shared.config.max_ticks() {
                tracing::warn!(ticks, "tick limit reached, awaiter still pending");
                return Err(Error::TickLimit { ticks });
            }
            self.tick_fixed();
            ticks += 1;
        }
    }

    /// Take a due unit out of its slot so it can be advanced unlocked.
    fn take(&self, key: usize, seq: u64) -> Option<Box<dyn Unit>> {
        let mut units = lock(&self.shared.units);
        match units.slab.get_mut(key) {
            Some(slot) if slot.seq == seq => slot.unit.take(),
            _ => None,
        }
    }

    /// Put an advanced unit back, or hand it out for dropping once it is
    /// finished or was cancelled meanwhile.
    fn restore(&self, key: usize, unit: Box<dyn Unit>, finished: bool) -> Option<Box<dyn Unit>> {
        let mut units = lock(&self.shared.units);
        let keep = !finished && units.slab.get(key).map_or(false, |slot| !slot.cancelled);
        if !keep {
            units.slab.try_remove(key);
            return Some(unit);
        }
        if let Some(slot) = units.slab.get_mut(key) {
            slot.unit = Some(unit);
        }
        None
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("now", &self.now())
            .field("ticks", &self.ticks())
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::promise::pair;

    use std::sync::atomic::{AtomicBool, Ordering};

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn next_tick() {
        let driver = Driver::new();
        let next = driver.next_tick();
        assert!(!next.is_completed());
        assert_eq!(driver.tick(ms(1)), 1);
        assert!(next.is_completed());
        assert_eq!(driver.pending(), 0);
    }

    #[test]
    fn wait_ticks() {
        let driver = Driver::new();
        assert!(driver.wait_ticks(0).is_completed());
        let wait = driver.wait_ticks(3);
        driver.tick(ms(1));
        driver.tick(ms(1));
        assert!(!wait.is_completed());
        driver.tick(ms(1));
        assert!(wait.is_completed());
    }

    #[test]
    fn wait_for_counts_from_call_time() {
        let driver = Driver::new();
        driver.tick(ms(100));
        let wait = driver.wait_for(ms(30));
        driver.tick(ms(20));
        assert!(!wait.is_completed());
        driver.tick(ms(20));
        assert!(wait.is_completed());
        assert_eq!(driver.now(), ms(140));
    }

    #[test]
    fn wait_until_checks_from_next_tick() {
        let driver = Driver::new();
        let flag = Arc::new(AtomicBool::new(true));
        let seen = flag.clone();
        let wait = driver.wait_until(move || seen.load(Ordering::SeqCst));
        assert!(!wait.is_completed());
        driver.tick(ms(1));
        assert!(wait.is_completed());
    }

    #[test]
    fn units_run_in_scheduling_order() {
        let driver = Driver::new();
        let order = Arc::new(Mutex::new(vec![]));
        for id in 0..4 {
            let order = order.clone();
            let _ = driver.start(step_fn(move |_| {
                order.lock().unwrap().push(id);
                Poll::Ready(())
            }));
        }
        assert_eq!(driver.tick(ms(1)), 4);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn scheduled_during_tick_runs_next_tick() {
        let driver = Driver::new();
        let inner = driver.clone();
        let later = Arc::new(Mutex::new(None));
        let slot = later.clone();
        let _ = driver.start(step_fn(move |_| {
            *slot.lock().unwrap() = Some(inner.next_tick());
            Poll::Ready(())
        }));
        assert_eq!(driver.tick(ms(1)), 1);
        let next = later.lock().unwrap().take().unwrap();
        assert!(!next.is_completed());
        assert_eq!(driver.tick(ms(1)), 1);
        assert!(next.is_completed());
    }

    #[test]
    fn cancel() {
        let driver = Driver::new();
        let (id, wait) = driver.schedule(WaitTicks::new(2));
        assert!(driver.cancel(id));
        assert!(!driver.cancel(id));
        assert!(wait.is_abandoned());
        assert_eq!(driver.pending(), 0);
    }

    #[test]
    fn cancel_while_advancing() {
        let driver = Driver::new();
        let handle = driver.clone();
        let id = Arc::new(Mutex::new(None::<UnitId>));
        let own = id.clone();
        let (unit, wait) = driver.schedule(step_fn(move |_| {
            if let Some(id) = *own.lock().unwrap() {
                assert!(handle.cancel(id));
            }
            Poll::<()>::Pending
        }));
        *id.lock().unwrap() = Some(unit);
        assert_eq!(driver.tick(ms(1)), 0);
        assert!(wait.is_abandoned());
        assert_eq!(driver.pending(), 0);
    }

    #[test]
    fn run_until() {
        let driver = Driver::with_config(Config::new().with_fixed_delta(ms(10)));
        let wait = driver.wait_for(ms(35));
        assert_eq!(driver.run_until(&wait), Ok(()));
        assert_eq!(driver.ticks(), 4);
    }

    #[test]
    fn run_until_errors() {
        let driver = Driver::with_config(Config::new().with_max_ticks(3));

        let (promise, awaiter) = pair::<u8>();
        assert_eq!(driver.run_until(&awaiter), Err(Error::Stalled { ticks: 0 }));

        let _forever = driver.wait_until(|| false);
        assert_eq!(driver.run_until(&awaiter), Err(Error::TickLimit { ticks: 3 }));

        drop(promise);
        assert_eq!(driver.run_until(&awaiter), Err(Error::Abandoned));
    }

    #[test]
    #[should_panic(expected = "step failed")]
    fn panicking_step() {
        let driver = Driver::new();
        let _ = driver.start(step_fn(|_| -> Poll<()> { panic!("step failed") }));
        driver.tick(ms(1));
    }

    #[test]
    fn panicking_step_is_removed() {
        let driver = Driver::new();
        let failing = driver.start(step_fn(|_| -> Poll<()> { panic!("step failed") }));
        let result = panic::catch_unwind(AssertUnwindSafe(|| driver.tick(ms(1))));
        assert!(result.is_err());
        assert!(failing.is_abandoned());
        assert_eq!(driver.pending(), 0);
    }

    #[test]
    fn debug() {
        let driver = Driver::new();
        let _ = driver.next_tick();
        assert_eq!(
            format!("{:?}", driver),
            "Driver { now: 0ns, ticks: 0, pending: 1 }"
        );
    }
}
