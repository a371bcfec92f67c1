use crate::promise::Awaiter;

pub(crate) mod array;
pub(crate) mod tuple;
pub(crate) mod vec;

/// Wait for all awaiters to complete.
///
/// Combines multiple awaiters into one that resolves with all of their
/// values once every one of them has resolved.
pub trait All {
    /// The resulting output type.
    type Output;

    /// Waits for every awaiter to complete.
    ///
    /// The values are in input order, whatever order the inputs resolve in.
    /// An empty input resolves immediately.
    ///
    /// If an input is abandoned, the combined awaiter can never complete;
    /// once the other inputs have resolved it becomes abandoned too.
    ///
    /// # Examples
    ///
    /// ```
    /// use settle::prelude::*;
    /// use settle::{pair, Awaiter};
    ///
    /// let (promise, pending) = pair::<&str>();
    /// let all = (Awaiter::resolved(1u8), pending).all();
    /// assert!(!all.is_completed());
    ///
    /// promise.resolve("hello");
    /// assert_eq!(all.get_result(), Some((1, "hello")));
    /// ```
    fn all(self) -> Awaiter<Self::Output>;
}
