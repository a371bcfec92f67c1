use super::vec::race_first;
use super::Race as RaceTrait;
use crate::promise::Awaiter;

/// Every element of a raced tuple is an `Awaiter<T>` of the same `T`.
macro_rules! awaiter_of {
    ($F:ident) => {
        Awaiter<T>
    };
}

macro_rules! impl_race_tuple {
    ($($F:ident)+) => {
        impl<T> RaceTrait for ($(awaiter_of!($F),)+)
        where
            T: Clone + Send + 'static,
        {
            type Output = T;

            #[allow(non_snake_case)]
            fn race(self) -> Awaiter<Self::Output> {
                let ($($F,)+) = self;
                race_first(vec![$($F),+])
            }
        }
    };
}

impl_race_tuple! { A }
impl_race_tuple! { A B }
impl_race_tuple! { A B C }
impl_race_tuple! { A B C D }
impl_race_tuple! { A B C D E }
impl_race_tuple! { A B C D E F }
impl_race_tuple! { A B C D E F G }
impl_race_tuple! { A B C D E F G H }
impl_race_tuple! { A B C D E F G H I }
impl_race_tuple! { A B C D E F G H I J }
impl_race_tuple! { A B C D E F G H I J K }
impl_race_tuple! { A B C D E F G H I J K L }
