use crate::promise::Awaiter;

pub(crate) mod array;
pub(crate) mod vec;

/// Wait for all awaiters to complete successfully, or abort early on error.
pub trait TryAll {
    /// The resulting output type.
    type Output;

    /// The error type of the awaiters.
    type Error;

    /// Waits for every awaiter to resolve with `Ok`.
    ///
    /// Resolves with the `Ok` values in input order once all of them
    /// succeeded, or with the first `Err` to arrive. After an error the
    /// remaining inputs are no longer listened to. An empty input resolves
    /// immediately with `Ok`.
    ///
    /// # Examples
    ///
    /// ```
    /// use settle::prelude::*;
    /// use settle::pair;
    ///
    /// let (p0, a0) = pair::<Result<u8, &str>>();
    /// let (p1, a1) = pair();
    /// let all = vec![a0, a1].try_all();
    ///
    /// p1.resolve(Err("oh no"));
    /// assert_eq!(all.get_result(), Some(Err("oh no")));
    ///
    /// p0.resolve(Ok(1));
    /// assert_eq!(all.get_result(), Some(Err("oh no")));
    /// ```
    fn try_all(self) -> Awaiter<Result<Self::Output, Self::Error>>;
}
