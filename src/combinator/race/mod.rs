use crate::promise::Awaiter;
use crate::{Error, Result};

pub(crate) mod array;
pub(crate) mod tuple;
pub(crate) mod vec;

/// Wait for the first awaiter to complete.
///
/// Combines multiple awaiters into one that resolves with the value of
/// whichever input resolves first.
pub trait Race {
    /// The resulting output type.
    type Output;

    /// Wait for the first awaiter to complete.
    ///
    /// Only the first value is observed; later ones are ignored and the
    /// combinator stops listening to the other inputs. The work behind those
    /// inputs is not cancelled.
    ///
    /// All awaiters must resolve to the same type.
    ///
    /// # Panics
    ///
    /// Racing zero awaiters can never resolve, so it panics. Use
    /// [`try_race`] to get an error instead.
    ///
    /// # Examples
    ///
    /// ```
    /// use settle::prelude::*;
    /// use settle::pair;
    ///
    /// let (p0, a0) = pair();
    /// let (p1, a1) = pair();
    /// let winner = (a0, a1).race();
    ///
    /// p1.resolve("b");
    /// p0.resolve("a");
    /// assert_eq!(winner.get_result(), Some("b"));
    /// ```
    fn race(self) -> Awaiter<Self::Output>;
}

/// Wait for the first of `awaiters` to complete.
///
/// Like [`Race::race`], but returns [`Error::EmptyRace`] instead of
/// panicking when there are no awaiters.
///
/// # Examples
///
/// ```
/// use settle::{try_race, Awaiter, Error};
///
/// let winner = try_race(vec![Awaiter::resolved(1)]).unwrap();
/// assert_eq!(winner.get_result(), Some(1));
///
/// let none: Vec<Awaiter<u8>> = vec![];
/// assert_eq!(try_race(none).unwrap_err(), Error::EmptyRace);
/// ```
pub fn try_race<T, I>(awaiters: I) -> Result<Awaiter<T>>
where
    T: Clone + Send + 'static,
    I: IntoIterator<Item = Awaiter<T>>,
{
    let awaiters: Vec<_> = awaiters.into_iter().collect();
    if awaiters.is_empty() {
        return Err(Error::EmptyRace);
    }
    Ok(vec::race_first(awaiters))
}
