//! Single-resolution promises and continuation chaining.
//!
//! This library lets sequential-looking `async` code await values produced
//! by work that is driven from the outside, such as a host loop that runs one
//! step per frame. There is no executor: a computation started with
//! [`spawn`] runs until it awaits a pending promise, and it is resumed
//! synchronously, inside the call that resolves that promise.
//!
//! - [`Promise`] and [`Awaiter`]: the producer and consumer halves of a
//!   completion cell that resolves at most once.
//! - [`spawn`]: chain an `async` computation onto the promises it awaits.
//! - [`combinator`]: compose awaiters with [`All`][combinator::All],
//!   [`Race`][combinator::Race] and [`TryAll`][combinator::TryAll].
//! - `driver`: advance time-sliced units of work tick by tick, and wait on
//!   the clock (requires the `driver` feature, enabled by default).
//!
//! # Examples
//!
//! Wait for several promises at once:
//! ```rust
//! use settle::prelude::*;
//! use settle::{pair, spawn};
//!
//! let (p0, a0) = pair::<u32>();
//! let (p1, a1) = pair::<u32>();
//! let sum = spawn(async move {
//!     let values = vec![a0, a1].all().await;
//!     values.iter().sum::<u32>()
//! });
//!
//! p1.resolve(2);
//! p0.resolve(1);
//! assert_eq!(sum.get_result(), Some(3));
//! ```
//!
//! Wait on a driver's clock:
//! ```rust
//! # #[cfg(feature = "driver")] {
//! use settle::driver::Driver;
//! use std::time::Duration;
//!
//! let driver = Driver::new();
//! let wait = driver.wait_for(Duration::from_millis(100));
//! assert_eq!(driver.run_until(&wait), Ok(()));
//! assert!(driver.now() >= Duration::from_millis(100));
//! # }
//! ```

#![deny(missing_debug_implementations, nonstandard_style)]
#![warn(missing_docs, unreachable_pub)]
#![allow(non_snake_case)]

mod error;
mod utils;

/// The settle prelude.
pub mod prelude {
    pub use super::combinator::All as _;
    pub use super::combinator::Race as _;
    pub use super::combinator::TryAll as _;
}

pub mod combinator;
#[cfg(feature = "driver")]
pub mod driver;
pub mod promise;
pub mod task;

pub use combinator::try_race;
pub use error::{Error, Result};
pub use promise::{pair, Awaiter, Promise, Subscription};
pub use task::spawn;
