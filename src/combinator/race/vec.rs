use super::Race as RaceTrait;
use crate::promise::{self, Awaiter, Promise, Subscription};
use crate::utils::lock;

use std::mem;
use std::sync::{Arc, Mutex};

/// First-wins latch shared by the continuations of a race.
struct Latch<T> {
    /// Taken by the winner.
    promise: Option<Promise<T>>,
    /// Subscriptions of the inputs still being listened to.
    losers: Vec<Subscription<T>>,
}

/// Resolve with the value of whichever awaiter resolves first.
///
/// `awaiters` must not be empty.
pub(crate) fn race_first<T>(awaiters: Vec<Awaiter<T>>) -> Awaiter<T>
where
    T: Clone + Send + 'static,
{
    debug_assert!(!awaiters.is_empty());
    let (promise, output) = promise::pair();
    let latch = Arc::new(Mutex::new(Latch {
        promise: Some(promise),
        losers: Vec::with_capacity(awaiters.len()),
    }));

    for awaiter in awaiters {
        let source = awaiter.clone();
        let winner = latch.clone();
        let subscription = awaiter.on_completed(move || {
            let (promise, losers) = {
                let mut latch = lock(&winner);
                let Some(promise) = latch.promise.take() else {
                    return;
                };
                (promise, mem::take(&mut latch.losers))
            };
            for loser in losers {
                loser.cancel();
            }
            if let Some(value) = source.get_result() {
                promise.resolve(value);
            }
        });

        let mut state = lock(&latch);
        if state.promise.is_some() {
            state.losers.push(subscription);
        } else {
            // A winner is already decided, stop listening right away.
            drop(state);
            subscription.cancel();
        }
    }
    output
}

impl<T> RaceTrait for Vec<Awaiter<T>>
where
    T: Clone + Send + 'static,
{
    type Output = T;

    fn race(self) -> Awaiter<Self::Output> {
        assert!(!self.is_empty(), "race requires at least one awaiter");
        race_first(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::promise::pair;

    #[test]
    fn smoke() {
        futures_lite::future::block_on(async {
            let (p0, a0) = pair();
            let (p1, a1) = pair();
            let race = vec![a0, a1].race();
            p1.resolve("world");
            p0.resolve("hello");
            assert_eq!(race.await, "world");
        });
    }

    #[test]
    fn already_resolved_input_wins() {
        let (_promise, pending) = pair();
        let race = vec![pending, Awaiter::resolved(7), Awaiter::resolved(8)].race();
        assert_eq!(race.get_result(), Some(7));
    }

    #[test]
    fn losers_are_unsubscribed() {
        let (p0, a0) = pair::<u8>();
        let (p1, a1) = pair::<u8>();
        let race = vec![a0, a1].race();
        p0.resolve(0);
        assert_eq!(race.get_result(), Some(0));
        assert_eq!(p1.waiters(), 0);
    }

    #[test]
    fn all_inputs_abandoned() {
        let (p0, a0) = pair::<u8>();
        let (p1, a1) = pair::<u8>();
        let race = vec![a0, a1].race();
        drop(p0);
        assert!(!race.is_abandoned());
        drop(p1);
        assert!(race.is_abandoned());
    }

    #[test]
    #[should_panic(expected = "race requires at least one awaiter")]
    fn empty() {
        let _ = Vec::<Awaiter<u8>>::new().race();
    }
}
