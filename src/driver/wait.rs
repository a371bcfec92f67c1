//! Steps that wait for time to pass.

use super::{Step, Tick};

use core::fmt;
use core::task::Poll;
use core::time::Duration;

/// Finishes on the `n`-th tick it is advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTicks {
    remaining: u64,
}

impl WaitTicks {
    /// Wait for `n` ticks. Zero behaves like one.
    pub fn new(n: u64) -> Self {
        Self { remaining: n }
    }
}

impl Step for WaitTicks {
    type Output = ();

    fn step(&mut self, _: &Tick) -> Poll<()> {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

/// Finishes on the first tick whose clock reached a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitFor {
    deadline: Duration,
}

impl WaitFor {
    /// Wait until the driver clock reads at least `deadline`.
    pub fn until(deadline: Duration) -> Self {
        Self { deadline }
    }
}

impl Step for WaitFor {
    type Output = ();

    fn step(&mut self, tick: &Tick) -> Poll<()> {
        if tick.now() >= self.deadline {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

/// Finishes on the first tick its predicate returns `true`.
pub struct WaitUntil<F> {
    predicate: F,
}

impl<F> WaitUntil<F>
where
    F: FnMut() -> bool,
{
    /// Check `predicate` once per tick.
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F> Step for WaitUntil<F>
where
    F: FnMut() -> bool,
{
    type Output = ();

    fn step(&mut self, _: &Tick) -> Poll<()> {
        if (self.predicate)() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

impl<F> fmt::Debug for WaitUntil<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitUntil").finish()
    }
}
