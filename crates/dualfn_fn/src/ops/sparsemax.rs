//! Euclidean projection onto the probability simplex.

use crate::{
    function::{check_gy, Cached, Function},
    operand::OperandRef,
};
use dualfn_core::{error::Result, Dense, Float};
use std::cmp::Ordering;

/// Threshold `τ` such that `Σ max(0, x_i - τ) = 1`.
///
/// With `z` sorted in decreasing order, `k` is the largest index (from 1)
/// for which `1 + k·z_k > Σ_{j≤k} z_j`, and `τ = (Σ_{j≤k} z_j - 1) / k`.
pub fn sparsemax_threshold<T: Float>(x: &Dense<T>) -> T {
    let mut z = x.data().to_vec();
    z.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));

    let mut cumsum = T::zero();
    let mut support_sum = T::zero();
    let mut support = 0usize;
    for (i, &v) in z.iter().enumerate() {
        cumsum = cumsum + v;
        let k = T::cast((i + 1) as f64);
        if T::one() + k * v > cumsum {
            support = i + 1;
            support_sum = cumsum;
        }
    }

    if support == 0 {
        return T::zero();
    }
    (support_sum - T::one()) / T::cast(support as f64)
}

/// `y = max(0, x - τ)`: like softmax, but able to put exact zeros on
/// low-scoring entries.
pub struct SparseMax<T: Float> {
    x: OperandRef<T>,
    cache: Cached<Dense<T>>,
}

impl<T: Float> SparseMax<T> {
    pub fn new(x: OperandRef<T>) -> Self {
        Self { x, cache: Cached::new() }
    }
}

impl<T: Float> Function<T> for SparseMax<T> {
    fn name(&self) -> &'static str {
        "SparseMax"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let x = self.x.value();
        let tau = sparsemax_threshold(&x);
        let y = x.map(move |v| (v - tau).max(T::zero()));
        self.cache.store(y.clone());
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "SparseMax").entered();
        let y = self.cache.get("SparseMax")?;
        check_gy("SparseMax", gy, y.shape())?;
        if self.x.requires_grad() {
            let (count, total) = y
                .data()
                .iter()
                .zip(gy.data())
                .filter(|(&yi, _)| yi != T::zero())
                .fold((0usize, T::zero()), |(n, s), (_, &g)| (n + 1, s + g));
            let mean = if count > 0 { total / T::cast(count as f64) } else { T::zero() };
            let gx = y.zip_map("SparseMax", gy, move |yi, g| if yi != T::zero() { g - mean } else { T::zero() })?;
            self.x.acc_grad(gx)?;
        }
        self.cache.consume();
        Ok(())
    }
}

/// Sparsemax loss: `y = x - (½ Σ_{x_j > τ} (x_j² - τ²) + ½)`.
pub struct SparseMaxLoss<T: Float> {
    x: OperandRef<T>,
    cache: Cached<T>,
}

impl<T: Float> SparseMaxLoss<T> {
    pub fn new(x: OperandRef<T>) -> Self {
        Self { x, cache: Cached::new() }
    }
}

impl<T: Float> Function<T> for SparseMaxLoss<T> {
    fn name(&self) -> &'static str {
        "SparseMaxLoss"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let x = self.x.value();
        let tau = sparsemax_threshold(&x);
        let half = T::cast(0.5);
        let reg = x
            .data()
            .iter()
            .filter(|&&v| v > tau)
            .fold(T::zero(), |acc, &v| acc + v * v - tau * tau);
        let shift = half * reg + half;
        let y = x.map(move |v| v - shift);
        self.cache.store(tau);
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "SparseMaxLoss").entered();
        let tau = *self.cache.get("SparseMaxLoss")?;
        let x = self.x.value();
        check_gy("SparseMaxLoss", gy, x.shape())?;
        if self.x.requires_grad() {
            let total = gy.sum();
            let gx = x.zip_map("SparseMaxLoss", gy, move |v, g| g - (v - tau).max(T::zero()) * total)?;
            self.x.acc_grad(gx)?;
        }
        self.cache.consume();
        Ok(())
    }
}
