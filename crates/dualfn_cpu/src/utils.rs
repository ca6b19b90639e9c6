use std::ops::{Add, Mul};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

static PARALLEL_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_PARALLEL_THRESHOLD);

pub fn parallel_threshold() -> usize {
    PARALLEL_THRESHOLD.load(Ordering::Relaxed)
}

pub fn set_parallel_threshold(threshold: usize) {
    PARALLEL_THRESHOLD.store(threshold, Ordering::Relaxed);
}

#[inline]
pub fn should_parallelize(num_els: usize) -> bool {
    num_els >= parallel_threshold()
}

/// Arithmetic needed by the accumulating kernels. `Default` supplies zero.
pub trait Element: Copy + Send + Sync + Default + PartialOrd + Add<Output = Self> + Mul<Output = Self> {}

impl<T> Element for T where T: Copy + Send + Sync + Default + PartialOrd + Add<Output = T> + Mul<Output = T> {}
