use super::All as AllTrait;
use crate::promise::{self, Awaiter};
use crate::utils::lock;

use std::mem;
use std::sync::{Arc, Mutex};

/// Index-addressed storage for the values of an `all`.
struct Slots<T> {
    pending: usize,
    items: Vec<Option<T>>,
    finish: Option<Box<dyn FnOnce(Vec<T>) + Send>>,
}

impl<T> Slots<T> {
    /// Store the value for `index`. Returns the finishing step and the
    /// values once the last slot is filled.
    #[allow(clippy::type_complexity)]
    fn fill(&mut self, index: usize, value: T) -> Option<(Box<dyn FnOnce(Vec<T>) + Send>, Vec<T>)> {
        debug_assert!(self.items[index].is_none(), "slot filled twice");
        self.items[index] = Some(value);
        self.pending -= 1;
        if self.pending > 0 {
            return None;
        }
        let finish = self.finish.take()?;
        let items: Vec<T> = mem::take(&mut self.items).into_iter().flatten().collect();
        Some((finish, items))
    }
}

/// Wait for every awaiter, then hand the ordered values to `finish`.
pub(crate) fn all_indexed<T, O, F>(awaiters: Vec<Awaiter<T>>, finish: F) -> Awaiter<O>
where
    T: Clone + Send + 'static,
    O: Send + 'static,
    F: FnOnce(Vec<T>) -> O + Send + 'static,
{
    let (promise, output) = promise::pair();
    if awaiters.is_empty() {
        promise.resolve(finish(Vec::new()));
        return output;
    }

    let slots = Arc::new(Mutex::new(Slots {
        pending: awaiters.len(),
        items: std::iter::repeat_with(|| None).take(awaiters.len()).collect(),
        finish: Some(Box::new(move |items| promise.resolve(finish(items)))),
    }));

    for (index, awaiter) in awaiters.into_iter().enumerate() {
        let slots = slots.clone();
        let source = awaiter.clone();
        let _ = awaiter.on_completed(move || {
            let Some(value) = source.get_result() else {
                return;
            };
            let done = lock(&slots).fill(index, value);
            if let Some((finish, items)) = done {
                finish(items);
            }
        });
    }
    output
}

impl<T> AllTrait for Vec<Awaiter<T>>
where
    T: Clone + Send + 'static,
{
    type Output = Vec<T>;

    fn all(self) -> Awaiter<Self::Output> {
        all_indexed(self, |items| items)
    }
}
