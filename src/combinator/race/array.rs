use super::vec::race_first;
use super::Race as RaceTrait;
use crate::promise::Awaiter;

impl<T, const N: usize> RaceTrait for [Awaiter<T>; N]
where
    T: Clone + Send + 'static,
{
    type Output = T;

    fn race(self) -> Awaiter<Self::Output> {
        assert!(N > 0, "race requires at least one awaiter");
        race_first(Vec::from(self))
    }
}
