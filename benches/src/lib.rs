//! Shared inputs for the criterion benchmarks.

use dualfn_core::{Dense, Float};
use dualfn_fn::{OperandRef, Variable};
use std::sync::Arc;

// Constants for benchmark data sizes
pub const SIZES: [(usize, &str); 3] = [(16, "small"), (128, "medium"), (512, "large")];

/// A deterministic `rows × cols` matrix with values in `[-1, 1)`.
pub fn matrix<T: Float>(rows: usize, cols: usize) -> Dense<T> {
    Dense::from_fn(rows, cols, |i, j| T::cast((((i * 31 + j * 17) % 200) as f64) / 100.0 - 1.0))
}

pub fn operand<T: Float>(rows: usize, cols: usize) -> OperandRef<T> {
    Arc::new(Variable::new(matrix(rows, cols), true))
}

/// Applies the `sequential` feature: benches built with it run every
/// gradient branch on the calling thread.
pub fn configure() {
    dualfn_core::config::set_fork_join(!cfg!(feature = "sequential"));
}
