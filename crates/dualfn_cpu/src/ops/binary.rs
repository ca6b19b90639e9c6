use crate::utils::should_parallelize;
use rayon::prelude::*;

/// Writes `func(lhs[i], rhs[i])` into `output[i]`.
///
/// All three buffers must have the same length; callers validate shapes
/// before reaching the kernel.
pub fn zip_map<T, F>(lhs: &[T], rhs: &[T], output: &mut [T], func: F)
where
    T: Copy + Send + Sync,
    F: Fn(T, T) -> T + Send + Sync,
{
    debug_assert_eq!(lhs.len(), rhs.len());
    debug_assert_eq!(lhs.len(), output.len());

    if should_parallelize(output.len()) {
        output
            .par_iter_mut()
            .zip(lhs.par_iter().zip(rhs.par_iter()))
            .for_each(|(out_val, (&a, &b))| *out_val = func(a, b));
    } else {
        output
            .iter_mut()
            .zip(lhs.iter().zip(rhs))
            .for_each(|(out_val, (&a, &b))| *out_val = func(a, b));
    }
}

/// In-place variant of [`zip_map`]: `acc[i] = func(acc[i], rhs[i])`.
pub fn zip_map_inplace<T, F>(acc: &mut [T], rhs: &[T], func: F)
where
    T: Copy + Send + Sync,
    F: Fn(T, T) -> T + Send + Sync,
{
    debug_assert_eq!(acc.len(), rhs.len());

    if should_parallelize(acc.len()) {
        acc.par_iter_mut()
            .zip(rhs.par_iter())
            .for_each(|(a, &b)| *a = func(*a, b));
    } else {
        acc.iter_mut().zip(rhs).for_each(|(a, &b)| *a = func(*a, b));
    }
}

/// Writes `func(a[i], b[i], c[i])` into `output[i]`.
pub fn zip3_map<T, F>(a: &[T], b: &[T], c: &[T], output: &mut [T], func: F)
where
    T: Copy + Send + Sync,
    F: Fn(T, T, T) -> T + Send + Sync,
{
    debug_assert_eq!(a.len(), output.len());
    debug_assert_eq!(b.len(), output.len());
    debug_assert_eq!(c.len(), output.len());

    if should_parallelize(output.len()) {
        output
            .par_iter_mut()
            .zip(a.par_iter().zip(b.par_iter().zip(c.par_iter())))
            .for_each(|(out_val, (&x, (&y, &z)))| *out_val = func(x, y, z));
    } else {
        output
            .iter_mut()
            .zip(a.iter().zip(b.iter().zip(c)))
            .for_each(|(out_val, (&x, (&y, &z)))| *out_val = func(x, y, z));
    }
}
