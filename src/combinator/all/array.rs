use super::vec::all_indexed;
use super::All as AllTrait;
use crate::promise::Awaiter;

impl<T, const N: usize> AllTrait for [Awaiter<T>; N]
where
    T: Clone + Send + 'static,
{
    type Output = [T; N];

    fn all(self) -> Awaiter<Self::Output> {
        all_indexed(Vec::from(self), |items| match <[T; N]>::try_from(items) {
            Ok(items) => items,
            Err(_) => unreachable!("every slot is filled before finishing"),
        })
    }
}
