use super::TryAll as TryAllTrait;
use crate::promise::{self, Awaiter, Promise, Subscription};
use crate::utils::lock;

use std::mem;
use std::sync::{Arc, Mutex};

type Finish<T, O> = Box<dyn FnOnce(Vec<T>) -> O + Send>;

/// Shared state of a `try_all` in flight.
struct Collect<T, E, O> {
    pending: usize,
    items: Vec<Option<T>>,
    /// Taken by whichever input settles the output.
    promise: Option<Promise<Result<O, E>>>,
    finish: Option<Finish<T, O>>,
    subscriptions: Vec<Subscription<Result<T, E>>>,
}

/// What an arriving input decided.
enum Outcome<T, E, O> {
    Pending,
    Done(Promise<Result<O, E>>, Finish<T, O>, Vec<T>),
    Failed(Promise<Result<O, E>>, Vec<Subscription<Result<T, E>>>, E),
}

impl<T, E, O> Collect<T, E, O> {
    fn arrive(&mut self, index: usize, result: Result<T, E>) -> Outcome<T, E, O> {
        if self.promise.is_none() {
            return Outcome::Pending;
        }
        match result {
            Ok(value) => {
                self.items[index] = Some(value);
                self.pending -= 1;
                if self.pending > 0 {
                    return Outcome::Pending;
                }
                match (self.promise.take(), self.finish.take()) {
                    (Some(promise), Some(finish)) => {
                        let items = mem::take(&mut self.items).into_iter().flatten().collect();
                        Outcome::Done(promise, finish, items)
                    }
                    _ => Outcome::Pending,
                }
            }
            Err(err) => match self.promise.take() {
                Some(promise) => {
                    Outcome::Failed(promise, mem::take(&mut self.subscriptions), err)
                }
                None => Outcome::Pending,
            },
        }
    }
}

/// Wait for every awaiter to succeed, then hand the ordered values to
/// `finish`. The first error settles the output instead.
pub(crate) fn try_all_indexed<T, E, O, F>(
    awaiters: Vec<Awaiter<Result<T, E>>>,
    finish: F,
) -> Awaiter<Result<O, E>>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
    O: Send + 'static,
    F: FnOnce(Vec<T>) -> O + Send + 'static,
{
    let (promise, output) = promise::pair();
    if awaiters.is_empty() {
        promise.resolve(Ok(finish(Vec::new())));
        return output;
    }

    let collect = Arc::new(Mutex::new(Collect {
        pending: awaiters.len(),
        items: std::iter::repeat_with(|| None).take(awaiters.len()).collect(),
        promise: Some(promise),
        finish: Some(Box::new(finish) as Finish<T, O>),
        subscriptions: Vec::with_capacity(awaiters.len()),
    }));

    for (index, awaiter) in awaiters.into_iter().enumerate() {
        let source = awaiter.clone();
        let state = collect.clone();
        let subscription = awaiter.on_completed(move || {
            let Some(result) = source.get_result() else {
                return;
            };
            let outcome = lock(&state).arrive(index, result);
            match outcome {
                Outcome::Pending => {}
                Outcome::Done(promise, finish, items) => promise.resolve(Ok(finish(items))),
                Outcome::Failed(promise, subscriptions, err) => {
                    for subscription in subscriptions {
                        subscription.cancel();
                    }
                    promise.resolve(Err(err));
                }
            }
        });

        let mut state = lock(&collect);
        if state.promise.is_some() {
            state.subscriptions.push(subscription);
        } else {
            drop(state);
            subscription.cancel();
        }
    }
    output
}

impl<T, E> TryAllTrait for Vec<Awaiter<Result<T, E>>>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    type Output = Vec<T>;
    type Error = E;

    fn try_all(self) -> Awaiter<Result<Self::Output, Self::Error>> {
        try_all_indexed(self, |items| items)
    }
}
