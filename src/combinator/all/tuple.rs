use super::All as AllTrait;
use crate::promise::{self, Awaiter};
use crate::utils::{self, lock};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Runs a finishing step once every input has arrived.
struct Countdown {
    remaining: AtomicUsize,
    finish: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Countdown {
    fn new(count: usize, finish: impl FnOnce() + Send + 'static) -> Arc<Self> {
        Arc::new(Self {
            remaining: AtomicUsize::new(count),
            finish: Mutex::new(Some(Box::new(finish))),
        })
    }

    fn arrive(&self) {
        if self.remaining.fetch_sub(1, Ordering::AcqRel) != 1 {
            return;
        }
        let finish = lock(&self.finish).take();
        if let Some(finish) = finish {
            finish();
        }
    }
}

macro_rules! impl_all_tuple {
    ($($T:ident)+) => {
        impl<$($T),+> AllTrait for ($(Awaiter<$T>,)+)
        where $(
            $T: Clone + Send + 'static,
        )+ {
            type Output = ($($T,)+);

            #[allow(non_snake_case)]
            fn all(self) -> Awaiter<Self::Output> {
                let (promise, output) = promise::pair();
                let ($($T,)+) = self;
                let sources = ($($T.clone(),)+);
                let countdown = Countdown::new(utils::tuple_len!($($T,)+), move || {
                    let ($($T,)+) = sources;
                    if let ($(Some($T),)+) = ($($T.get_result(),)+) {
                        promise.resolve(($($T,)+));
                    }
                });
                $(
                    let arrival = countdown.clone();
                    let _ = $T.on_completed(move || arrival.arrive());
                )+
                output
            }
        }
    };
}

impl_all_tuple! { A }
impl_all_tuple! { A B }
impl_all_tuple! { A B C }
impl_all_tuple! { A B C D }
impl_all_tuple! { A B C D E }
impl_all_tuple! { A B C D E F }
impl_all_tuple! { A B C D E F G }
impl_all_tuple! { A B C D E F G H }
impl_all_tuple! { A B C D E F G H I }
impl_all_tuple! { A B C D E F G H I J }
impl_all_tuple! { A B C D E F G H I J K }
impl_all_tuple! { A B C D E F G H I J K L }
