/// The error type for the fallible operations of this crate.
///
/// Resolution itself never fails: resolving a promise twice is a silent
/// no-op. These errors come from combinator preconditions and from driving
/// an awaiter to completion with a [`Driver`][crate::driver::Driver].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A race was requested over zero awaiters, which can never resolve.
    #[error("race requires at least one awaiter")]
    EmptyRace,

    /// The awaiter is still pending, but nothing is scheduled that could
    /// resolve it.
    #[error("awaiter is still pending after {ticks} ticks and no units are scheduled")]
    Stalled {
        /// Number of ticks driven before stalling.
        ticks: u64,
    },

    /// The awaiter did not complete within the configured tick budget.
    #[error("awaiter did not complete within {ticks} ticks")]
    TickLimit {
        /// Number of ticks driven.
        ticks: u64,
    },

    /// The promise was dropped before it was resolved.
    #[error("the promise was dropped before it was resolved")]
    Abandoned,
}

/// A specialized [`Result`][std::result::Result] type for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
