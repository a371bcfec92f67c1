use core::fmt;
use core::task::Poll;
use core::time::Duration;

/// The driver clock, as seen by a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    index: u64,
    now: Duration,
    delta: Duration,
}

impl Tick {
    pub(crate) fn new(index: u64, now: Duration, delta: Duration) -> Self {
        Self { index, now, delta }
    }

    /// How many ticks the driver performed, this one included.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Time elapsed on the driver clock: the sum of all deltas so far.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Time the clock advanced by on this tick.
    pub fn delta(&self) -> Duration {
        self.delta
    }
}

/// A unit of time-sliced work.
///
/// A step is advanced once per tick until it returns `Poll::Ready`. The
/// driver then resolves the promise handed out for it with the output.
pub trait Step {
    /// The value the step finishes with.
    type Output;

    /// Advance the step by one tick.
    fn step(&mut self, tick: &Tick) -> Poll<Self::Output>;
}

/// Create a step from a closure.
///
/// # Examples
///
/// ```
/// use settle::driver::{step_fn, Driver};
/// use std::task::Poll;
///
/// let driver = Driver::new();
/// let mut frames = 0;
/// let done = driver.start(step_fn(move |_| {
///     frames += 1;
///     if frames == 3 { Poll::Ready(frames) } else { Poll::Pending }
/// }));
/// assert_eq!(driver.run_until(&done), Ok(3));
/// ```
pub fn step_fn<T, F>(f: F) -> StepFn<F>
where
    F: FnMut(&Tick) -> Poll<T>,
{
    StepFn { f }
}

/// A step created by [`step_fn`].
pub struct StepFn<F> {
    f: F,
}

impl<T, F> Step for StepFn<F>
where
    F: FnMut(&Tick) -> Poll<T>,
{
    type Output = T;

    fn step(&mut self, tick: &Tick) -> Poll<T> {
        (self.f)(tick)
    }
}

impl<F> fmt::Debug for StepFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepFn").finish()
    }
}
