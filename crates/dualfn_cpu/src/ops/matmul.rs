use crate::utils::{should_parallelize, Element};
use rayon::prelude::*;

#[inline]
fn for_each_row<T, F>(c: &mut [T], n: usize, work: usize, row_fn: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    if n == 0 {
        return;
    }
    if should_parallelize(work) {
        c.par_chunks_mut(n).enumerate().for_each(|(i, c_row)| row_fn(i, c_row));
    } else {
        c.chunks_mut(n).enumerate().for_each(|(i, c_row)| row_fn(i, c_row));
    }
}

/// `c (m×n) = a (m×k) · b (k×n)`.
pub fn matmul<T: Element>(m: usize, k: usize, n: usize, a: &[T], b: &[T], c: &mut [T]) {
    debug_assert_eq!(a.len(), m * k);
    debug_assert_eq!(b.len(), k * n);
    debug_assert_eq!(c.len(), m * n);

    for_each_row(c, n, m * n * k, |i, c_row| {
        c_row.iter_mut().for_each(|v| *v = T::default());
        let a_row = &a[i * k..(i + 1) * k];
        for (p, &a_ip) in a_row.iter().enumerate() {
            let b_row = &b[p * n..(p + 1) * n];
            for (c_ij, &b_pj) in c_row.iter_mut().zip(b_row) {
                *c_ij = *c_ij + a_ip * b_pj;
            }
        }
    });
}

/// `c (m×n) = aᵀ · b` where `a` is stored as `k×m` and `b` as `k×n`.
pub fn matmul_tn<T: Element>(m: usize, k: usize, n: usize, a: &[T], b: &[T], c: &mut [T]) {
    debug_assert_eq!(a.len(), k * m);
    debug_assert_eq!(b.len(), k * n);
    debug_assert_eq!(c.len(), m * n);

    for_each_row(c, n, m * n * k, |i, c_row| {
        c_row.iter_mut().for_each(|v| *v = T::default());
        for p in 0..k {
            let a_pi = a[p * m + i];
            let b_row = &b[p * n..(p + 1) * n];
            for (c_ij, &b_pj) in c_row.iter_mut().zip(b_row) {
                *c_ij = *c_ij + a_pi * b_pj;
            }
        }
    });
}

/// `c (m×n) = a · bᵀ` where `a` is stored as `m×k` and `b` as `n×k`.
pub fn matmul_nt<T: Element>(m: usize, k: usize, n: usize, a: &[T], b: &[T], c: &mut [T]) {
    debug_assert_eq!(a.len(), m * k);
    debug_assert_eq!(b.len(), n * k);
    debug_assert_eq!(c.len(), m * n);

    for_each_row(c, n, m * n * k, |i, c_row| {
        let a_row = &a[i * k..(i + 1) * k];
        for (j, c_ij) in c_row.iter_mut().enumerate() {
            let b_row = &b[j * k..(j + 1) * k];
            *c_ij = a_row
                .iter()
                .zip(b_row)
                .fold(T::default(), |acc, (&x, &y)| acc + x * y);
        }
    });
}

/// Writes the `cols×rows` transpose of the `rows×cols` buffer `input`.
pub fn transpose<T: Copy + Send + Sync>(rows: usize, cols: usize, input: &[T], output: &mut [T]) {
    debug_assert_eq!(input.len(), rows * cols);
    debug_assert_eq!(output.len(), rows * cols);

    if rows == 0 {
        return;
    }
    if should_parallelize(output.len()) {
        output.par_chunks_mut(rows).enumerate().for_each(|(j, out_row)| {
            for (i, v) in out_row.iter_mut().enumerate() {
                *v = input[i * cols + j];
            }
        });
    } else {
        output.chunks_mut(rows).enumerate().for_each(|(j, out_row)| {
            for (i, v) in out_row.iter_mut().enumerate() {
                *v = input[i * cols + j];
            }
        });
    }
}
