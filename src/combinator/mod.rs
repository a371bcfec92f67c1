//! Composing awaiters.
//!
//! The combinators turn several awaiters into one. They are built only on
//! the public [`Awaiter`][crate::Awaiter] API: each input gets a
//! continuation through `on_completed`, and the combinator owns and resolves
//! an aggregate promise of its own.
//!
//! | Name     | Return signature        | When does it resolve?                           |
//! | ---      | ---                     | ---                                             |
//! | `All`    | `Vec<T>` / `(T1, T2)`   | Once every input resolved                       |
//! | `Race`   | `T`                     | With the first input to resolve                 |
//! | `TryAll` | `Result<Vec<T>, E>`     | Once every input is `Ok`, or on the first `Err` |
//!
//! The traits are implemented for `Vec`s and arrays of awaiters; `All` and
//! `Race` also for tuples.
//!
//! ```
//! use settle::prelude::*;
//! use settle::pair;
//!
//! let (p0, a0) = pair();
//! let (p1, a1) = pair();
//! let (p2, a2) = pair();
//! let all = [a0, a1, a2].all();
//!
//! p2.resolve(2);
//! p0.resolve(0);
//! assert!(!all.is_completed());
//! p1.resolve(1);
//! assert_eq!(all.get_result(), Some([0, 1, 2]));
//! ```

pub use all::All;
pub use race::{try_race, Race};
pub use try_all::TryAll;

pub(crate) mod all;
pub(crate) mod race;
pub(crate) mod try_all;
