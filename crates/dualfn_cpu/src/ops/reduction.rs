//! Reductions run sequentially so repeated calls give bit-identical results.

use crate::utils::Element;

pub fn sum<T: Element>(input: &[T]) -> T {
    input.iter().fold(T::default(), |acc, &x| acc + x)
}

/// Index of the first maximum, or `None` for an empty buffer.
pub fn argmax<T: Element>(input: &[T]) -> Option<usize> {
    let mut iter = input.iter().enumerate();
    let (mut best_idx, mut best) = iter.next().map(|(i, &x)| (i, x))?;
    for (i, &x) in iter {
        if x > best {
            best = x;
            best_idx = i;
        }
    }
    Some(best_idx)
}

pub fn max<T: Element>(input: &[T]) -> Option<T> {
    argmax(input).map(|i| input[i])
}
