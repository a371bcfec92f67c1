use super::vec::try_all_indexed;
use super::TryAll as TryAllTrait;
use crate::promise::Awaiter;

impl<T, E, const N: usize> TryAllTrait for [Awaiter<Result<T, E>>; N]
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    type Output = [T; N];
    type Error = E;

    fn try_all(self) -> Awaiter<Result<Self::Output, Self::Error>> {
        try_all_indexed(Vec::from(self), |items| match <[T; N]>::try_from(items) {
            Ok(items) => items,
            Err(_) => unreachable!("every slot is filled before finishing"),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::promise::pair;

    #[test]
    fn all_ok() {
        let (p0, a0) = pair::<Result<char, ()>>();
        let (p1, a1) = pair();
        let all = [a0, a1].try_all();
        p1.resolve(Ok('b'));
        assert!(!all.is_completed());
        p0.resolve(Ok('a'));
        assert_eq!(all.get_result(), Some(Ok(['a', 'b'])));
    }

    #[test]
    fn one_err() {
        let all = [Awaiter::resolved(Ok(1)), Awaiter::resolved(Err("nope"))].try_all();
        assert_eq!(all.get_result(), Some(Err("nope")));
    }
}
