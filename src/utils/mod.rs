//! Utilities to implement the different parts of this crate.

mod tuple;

pub(crate) use tuple::tuple_len;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the guard if a previous holder panicked.
///
/// None of the state guarded in this crate is left half-updated across user
/// code, so a poisoned lock is still consistent.
#[inline]
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
