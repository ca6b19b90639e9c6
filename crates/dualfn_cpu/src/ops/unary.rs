use crate::utils::should_parallelize;
use rayon::prelude::*;

/// Writes `func(input[i])` into `output[i]`.
///
/// `input` and `output` must have the same length.
pub fn map<T, F>(input: &[T], output: &mut [T], func: F)
where
    T: Copy + Send + Sync,
    F: Fn(T) -> T + Send + Sync,
{
    debug_assert_eq!(input.len(), output.len());

    if should_parallelize(output.len()) {
        output
            .par_iter_mut()
            .zip(input.par_iter())
            .for_each(|(out_val, &x)| *out_val = func(x));
    } else {
        output.iter_mut().zip(input).for_each(|(out_val, &x)| *out_val = func(x));
    }
}

/// In-place variant of [`map`].
pub fn map_inplace<T, F>(data: &mut [T], func: F)
where
    T: Copy + Send + Sync,
    F: Fn(T) -> T + Send + Sync,
{
    if should_parallelize(data.len()) {
        data.par_iter_mut().for_each(|x| *x = func(*x));
    } else {
        data.iter_mut().for_each(|x| *x = func(*x));
    }
}
