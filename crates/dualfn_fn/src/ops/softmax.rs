//! Softmax over all elements of the input.

use crate::{
    function::{check_gy, Cached, Function},
    operand::OperandRef,
};
use dualfn_core::{error::Result, Dense, Float};

/// Shifted exponentials and their sum; the shift by the maximum keeps
/// `exp` from overflowing.
fn shifted_exp<T: Float>(x: &Dense<T>) -> (Dense<T>, T, T) {
    let max = x.max().unwrap_or_else(T::zero);
    let e = x.map(move |v| (v - max).exp());
    let sum = e.sum();
    (e, max, sum)
}

fn softmax<T: Float>(x: &Dense<T>) -> Dense<T> {
    let (mut e, _, sum) = shifted_exp(x);
    e.map_inplace(move |v| v / sum);
    e
}

/// `y_i = e^(x_i) / Σ_j e^(x_j)`.
pub struct Softmax<T: Float> {
    x: OperandRef<T>,
    cache: Cached<Dense<T>>,
}

impl<T: Float> Softmax<T> {
    pub fn new(x: OperandRef<T>) -> Self {
        Self { x, cache: Cached::new() }
    }
}

impl<T: Float> Function<T> for Softmax<T> {
    fn name(&self) -> &'static str {
        "Softmax"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let y = softmax(&self.x.value());
        self.cache.store(y.clone());
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "Softmax").entered();
        let y = self.cache.get("Softmax")?;
        check_gy("Softmax", gy, y.shape())?;
        if self.x.requires_grad() {
            // J·gy with J = diag(y) - y·yᵀ, without building J
            let dot = y.dot(gy)?;
            let gx = y.zip_map("Softmax", gy, move |yi, gi| yi * (gi - dot))?;
            self.x.acc_grad(gx)?;
        }
        self.cache.consume();
        Ok(())
    }
}

/// `y = x - ln Σ e^x`.
pub struct LogSoftmax<T: Float> {
    x: OperandRef<T>,
    cache: Cached<Dense<T>>,
}

impl<T: Float> LogSoftmax<T> {
    pub fn new(x: OperandRef<T>) -> Self {
        Self { x, cache: Cached::new() }
    }
}

impl<T: Float> Function<T> for LogSoftmax<T> {
    fn name(&self) -> &'static str {
        "LogSoftmax"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let x = self.x.value();
        let (mut e, max, sum) = shifted_exp(&x);
        let log_sum = max + sum.ln();
        let y = x.map(move |v| v - log_sum);
        e.map_inplace(move |v| v / sum);
        self.cache.store(e);
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "LogSoftmax").entered();
        let softmax = self.cache.get("LogSoftmax")?;
        check_gy("LogSoftmax", gy, softmax.shape())?;
        if self.x.requires_grad() {
            let total = gy.sum();
            let gx = gy.zip_map("LogSoftmax", softmax, move |g, s| g - s * total)?;
            self.x.acc_grad(gx)?;
        }
        self.cache.consume();
        Ok(())
    }
}
