//! Reductions to a scalar, and the running sum.

use crate::{
    function::{check_gy, check_scalar_gy, Cached, Function},
    operand::OperandRef,
};
use dualfn_core::{
    error::{Error, Result},
    Dense, Float,
};

/// `y = Σ x`.
pub struct ReduceSum<T: Float> {
    x: OperandRef<T>,
    cache: Cached<()>,
}

impl<T: Float> ReduceSum<T> {
    pub fn new(x: OperandRef<T>) -> Self {
        Self { x, cache: Cached::new() }
    }
}

impl<T: Float> Function<T> for ReduceSum<T> {
    fn name(&self) -> &'static str {
        "ReduceSum"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let y = Dense::scalar(self.x.value().sum());
        self.cache.store(());
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "ReduceSum").entered();
        self.cache.get("ReduceSum")?;
        let g = check_scalar_gy("ReduceSum", gy)?;
        if self.x.requires_grad() {
            let x = self.x.value();
            self.x.acc_grad(Dense::full(x.rows(), x.cols(), g))?;
        }
        self.cache.consume();
        Ok(())
    }
}

/// `y = Σ x / n`.
pub struct ReduceMean<T: Float> {
    x: OperandRef<T>,
    cache: Cached<()>,
}

impl<T: Float> ReduceMean<T> {
    pub fn new(x: OperandRef<T>) -> Self {
        Self { x, cache: Cached::new() }
    }
}

impl<T: Float> Function<T> for ReduceMean<T> {
    fn name(&self) -> &'static str {
        "ReduceMean"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let x = self.x.value();
        if x.size() == 0 {
            return Err(Error::invalid_shape("ReduceMean", "mean of an empty matrix"));
        }
        let y = Dense::scalar(x.sum() / T::cast(x.size() as f64));
        self.cache.store(());
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "ReduceMean").entered();
        self.cache.get("ReduceMean")?;
        let g = check_scalar_gy("ReduceMean", gy)?;
        if self.x.requires_grad() {
            let x = self.x.value();
            let share = g / T::cast(x.size() as f64);
            self.x.acc_grad(Dense::full(x.rows(), x.cols(), share))?;
        }
        self.cache.consume();
        Ok(())
    }
}

/// Largest element of `x`. The gradient goes to the first position holding it.
pub struct ReduceMax<T: Float> {
    x: OperandRef<T>,
    cache: Cached<usize>,
}

impl<T: Float> ReduceMax<T> {
    pub fn new(x: OperandRef<T>) -> Self {
        Self { x, cache: Cached::new() }
    }
}

impl<T: Float> Function<T> for ReduceMax<T> {
    fn name(&self) -> &'static str {
        "ReduceMax"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let x = self.x.value();
        let index = x
            .argmax()
            .ok_or_else(|| Error::invalid_shape("ReduceMax", "max of an empty matrix"))?;
        let y = Dense::scalar(x.at_flat(index)?);
        self.cache.store(index);
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "ReduceMax").entered();
        let index = *self.cache.get("ReduceMax")?;
        let g = check_scalar_gy("ReduceMax", gy)?;
        if self.x.requires_grad() {
            let x = self.x.value();
            let mut gx = Dense::zeros_like(&x);
            gx.data_mut()[index] = g;
            self.x.acc_grad(gx)?;
        }
        self.cache.consume();
        Ok(())
    }
}

/// Largest of several scalar operands. Only the first operand attaining the
/// maximum receives a gradient.
pub struct ScalarMax<T: Float> {
    xs: Vec<OperandRef<T>>,
    cache: Cached<usize>,
}

impl<T: Float> ScalarMax<T> {
    pub fn new(xs: Vec<OperandRef<T>>) -> Self {
        Self { xs, cache: Cached::new() }
    }
}

impl<T: Float> Function<T> for ScalarMax<T> {
    fn name(&self) -> &'static str {
        "ScalarMax"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        self.xs.clone()
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let mut best: Option<(usize, T)> = None;
        for (i, x) in self.xs.iter().enumerate() {
            let value = x.value();
            value.check_scalar("ScalarMax")?;
            let v = value.scalar_value()?;
            match best {
                Some((_, current)) if v <= current => {}
                _ => best = Some((i, v)),
            }
        }
        let (index, max) = best.ok_or_else(|| Error::invalid_shape("ScalarMax", "no operands"))?;
        self.cache.store(index);
        Ok(Dense::scalar(max))
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "ScalarMax").entered();
        let index = *self.cache.get("ScalarMax")?;
        let g = check_scalar_gy("ScalarMax", gy)?;
        if let Some(x) = self.xs.get(index) {
            if x.requires_grad() {
                x.acc_grad(Dense::scalar(g))?;
            }
        }
        self.cache.consume();
        Ok(())
    }
}

/// Running sum over the row-major buffer, `y_i = Σ_{j≤i} x_j`.
pub struct CumSum<T: Float> {
    x: OperandRef<T>,
    cache: Cached<()>,
}

impl<T: Float> CumSum<T> {
    pub fn new(x: OperandRef<T>) -> Self {
        Self { x, cache: Cached::new() }
    }
}

impl<T: Float> Function<T> for CumSum<T> {
    fn name(&self) -> &'static str {
        "CumSum"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let mut y = self.x.value();
        let mut acc = T::zero();
        for v in y.data_mut() {
            acc = acc + *v;
            *v = acc;
        }
        self.cache.store(());
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "CumSum").entered();
        self.cache.get("CumSum")?;
        check_gy("CumSum", gy, self.x.value().shape())?;
        if self.x.requires_grad() {
            // dx_i = Σ_{j≥i} gy_j
            let mut gx = gy.clone();
            let mut acc = T::zero();
            for v in gx.data_mut().iter_mut().rev() {
                acc = acc + *v;
                *v = acc;
            }
            self.x.acc_grad(gx)?;
        }
        self.cache.consume();
        Ok(())
    }
}
