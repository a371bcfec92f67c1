use core::time::Duration;

/// The delta [`Driver::tick_fixed`][super::Driver::tick_fixed] advances the
/// clock by: one frame at 60 frames per second.
const DEFAULT_FIXED_DELTA: Duration = Duration::from_nanos(16_666_667);

/// Upper bound on the ticks a single
/// [`Driver::run_until`][super::Driver::run_until] call performs.
const DEFAULT_MAX_TICKS: u64 = 100_000;

/// Settings of a [`Driver`][super::Driver].
///
/// # Examples
///
/// ```
/// use settle::driver::Config;
/// use std::time::Duration;
///
/// let config = Config::new()
///     .with_fixed_delta(Duration::from_millis(20))
///     .with_max_ticks(500);
/// assert_eq!(config.fixed_delta(), Duration::from_millis(20));
/// assert_eq!(config.max_ticks(), 500);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    fixed_delta: Duration,
    max_ticks: u64,
}

impl Config {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delta used by `tick_fixed` and `run_until`.
    pub fn with_fixed_delta(mut self, delta: Duration) -> Self {
        self.fixed_delta = delta;
        self
    }

    /// Set how many ticks `run_until` performs before giving up.
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// The delta used by `tick_fixed` and `run_until`.
    pub fn fixed_delta(&self) -> Duration {
        self.fixed_delta
    }

    /// How many ticks `run_until` performs before giving up.
    pub fn max_ticks(&self) -> u64 {
        self.max_ticks
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fixed_delta: DEFAULT_FIXED_DELTA,
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config, Config::new());
        assert_eq!(config.max_ticks(), 100_000);
        let per_second = config.fixed_delta() * 60;
        assert!(per_second >= Duration::from_secs(1));
        assert!(per_second < Duration::from_millis(1001));
    }
}
