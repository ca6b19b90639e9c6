//! Matrix products and transposition.

use crate::{
    function::{check_gy, check_scalar_gy, Cached, Function},
    operand::OperandRef,
};
use dualfn_core::{
    config,
    error::{Error, Result},
    Dense, Float, Shape,
};
use rayon::prelude::*;

type GradPair<T> = (Option<Dense<T>>, Option<Dense<T>>);

/// Gradients of `y = a · b` for upstream `gy`, each branch only when requested.
fn mul_grads<T: Float>(a: &Dense<T>, b: &Dense<T>, gy: &Dense<T>, grad_a: bool, grad_b: bool) -> Result<GradPair<T>> {
    let (ga, gb) = config::join(
        || grad_a.then(|| gy.mul_nt(b)).transpose(),
        || grad_b.then(|| a.mul_t(gy)).transpose(),
    );
    Ok((ga?, gb?))
}

fn accumulate<T: Float>(x: &OperandRef<T>, gx: Option<Dense<T>>) -> Result<()> {
    match gx {
        Some(gx) => x.acc_grad(gx),
        None => Ok(()),
    }
}

/// Matrix product `y = x1 · x2`.
pub struct Mul<T: Float> {
    x1: OperandRef<T>,
    x2: OperandRef<T>,
    cache: Cached<()>,
}

impl<T: Float> Mul<T> {
    pub fn new(x1: OperandRef<T>, x2: OperandRef<T>) -> Self {
        Self {
            x1,
            x2,
            cache: Cached::new(),
        }
    }
}

impl<T: Float> Function<T> for Mul<T> {
    fn name(&self) -> &'static str {
        "Mul"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x1.clone(), self.x2.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        let _span = tracing::trace_span!("forward", op = "Mul").entered();
        self.cache.reset();
        let (x1, x2) = (self.x1.value(), self.x2.value());
        if x1.cols() != x2.rows() {
            return Err(Error::shape_mismatch("Mul", Shape::new(x1.cols(), x2.cols()), x2.shape()));
        }
        let y = x1.mul(&x2)?;
        self.cache.store(());
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "Mul").entered();
        self.cache.get("Mul")?;

        let (x1, x2) = (self.x1.value(), self.x2.value());
        check_gy("Mul", gy, Shape::new(x1.rows(), x2.cols()))?;

        let (gx1, gx2) = mul_grads(&x1, &x2, gy, self.x1.requires_grad(), self.x2.requires_grad())?;
        accumulate(&self.x1, gx1)?;
        accumulate(&self.x2, gx2)?;

        self.cache.consume();
        Ok(())
    }
}

/// `y = x1ᵀ · x2`.
pub struct MulT<T: Float> {
    x1: OperandRef<T>,
    x2: OperandRef<T>,
    cache: Cached<()>,
}

impl<T: Float> MulT<T> {
    pub fn new(x1: OperandRef<T>, x2: OperandRef<T>) -> Self {
        Self {
            x1,
            x2,
            cache: Cached::new(),
        }
    }
}

impl<T: Float> Function<T> for MulT<T> {
    fn name(&self) -> &'static str {
        "MulT"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x1.clone(), self.x2.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        let _span = tracing::trace_span!("forward", op = "MulT").entered();
        self.cache.reset();
        let (x1, x2) = (self.x1.value(), self.x2.value());
        if x1.rows() != x2.rows() {
            return Err(Error::shape_mismatch("MulT", Shape::new(x1.rows(), x2.cols()), x2.shape()));
        }
        let y = x1.mul_t(&x2)?;
        self.cache.store(());
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "MulT").entered();
        self.cache.get("MulT")?;

        let (x1, x2) = (self.x1.value(), self.x2.value());
        check_gy("MulT", gy, Shape::new(x1.cols(), x2.cols()))?;

        // dx1 = x2 · gyᵀ, dx2 = x1 · gy
        let (gx1, gx2) = config::join(
            || self.x1.requires_grad().then(|| x2.mul_nt(gy)).transpose(),
            || self.x2.requires_grad().then(|| x1.mul(gy)).transpose(),
        );
        let (gx1, gx2) = (gx1?, gx2?);
        accumulate(&self.x1, gx1)?;
        accumulate(&self.x2, gx2)?;

        self.cache.consume();
        Ok(())
    }
}

/// `y = b + w1·x1 + w2·x2 + …`.
pub struct Affine<T: Float> {
    bias: OperandRef<T>,
    pairs: Vec<(OperandRef<T>, OperandRef<T>)>,
    cache: Cached<()>,
}

impl<T: Float> Affine<T> {
    /// `rest` is a flat `[w2, x2, w3, x3, …]` list. A pair with either side
    /// missing is dropped; a list of odd length is rejected.
    pub fn new(
        bias: OperandRef<T>,
        w1: OperandRef<T>,
        x1: OperandRef<T>,
        rest: Vec<Option<OperandRef<T>>>,
    ) -> Result<Self> {
        if rest.len() % 2 != 0 {
            return Err(Error::domain(
                "Affine",
                format!("weight/input list must come in pairs, got {} items", rest.len()),
            ));
        }

        let mut pairs = vec![(w1, x1)];
        let mut rest = rest.into_iter();
        while let (Some(w), Some(x)) = (rest.next(), rest.next()) {
            if let (Some(w), Some(x)) = (w, x) {
                pairs.push((w, x));
            }
        }

        Ok(Self {
            bias,
            pairs,
            cache: Cached::new(),
        })
    }
}

impl<T: Float> Function<T> for Affine<T> {
    fn name(&self) -> &'static str {
        "Affine"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        let mut operands = vec![self.bias.clone()];
        for (w, x) in &self.pairs {
            operands.push(w.clone());
            operands.push(x.clone());
        }
        operands
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        let _span = tracing::trace_span!("forward", op = "Affine", pairs = self.pairs.len()).entered();
        self.cache.reset();
        let mut y = self.bias.value();
        for (w, x) in &self.pairs {
            let (w, x) = (w.value(), x.value());
            if w.cols() != x.rows() {
                return Err(Error::shape_mismatch("Affine", Shape::new(w.cols(), x.cols()), x.shape()));
            }
            y.zip_map_inplace("Affine", &w.mul(&x)?, |acc, v| acc + v)?;
        }
        self.cache.store(());
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "Affine", pairs = self.pairs.len()).entered();
        self.cache.get("Affine")?;
        check_gy("Affine", gy, self.bias.value().shape())?;

        let pair_grads = |(w, x): &(OperandRef<T>, OperandRef<T>)| -> Result<GradPair<T>> {
            let (wv, xv) = (w.value(), x.value());
            check_gy("Affine", gy, Shape::new(wv.rows(), xv.cols()))?;
            mul_grads(&wv, &xv, gy, w.requires_grad(), x.requires_grad())
        };
        let grads: Vec<GradPair<T>> = if config::fork_join_enabled() {
            self.pairs.par_iter().map(pair_grads).collect::<Result<_>>()?
        } else {
            self.pairs.iter().map(pair_grads).collect::<Result<_>>()?
        };

        if self.bias.requires_grad() {
            self.bias.acc_grad(gy.clone())?;
        }
        for ((w, x), (gw, gx)) in self.pairs.iter().zip(grads) {
            accumulate(w, gw)?;
            accumulate(x, gx)?;
        }

        self.cache.consume();
        Ok(())
    }
}

/// Inner product of two vectors, or the Frobenius product of two matrices.
pub struct Dot<T: Float> {
    x1: OperandRef<T>,
    x2: OperandRef<T>,
    cache: Cached<()>,
}

impl<T: Float> Dot<T> {
    pub fn new(x1: OperandRef<T>, x2: OperandRef<T>) -> Self {
        Self {
            x1,
            x2,
            cache: Cached::new(),
        }
    }
}

impl<T: Float> Function<T> for Dot<T> {
    fn name(&self) -> &'static str {
        "Dot"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x1.clone(), self.x2.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let (x1, x2) = (self.x1.value(), self.x2.value());
        // equal shapes, or a row and a column vector of the same length
        let vectors = x1.is_vector() && x2.is_vector() && x1.size() == x2.size();
        if !x1.same_shape(&x2) && !vectors {
            return Err(Error::shape_mismatch("Dot", x1.shape(), x2.shape()));
        }
        let y = Dense::scalar(x1.dot(&x2)?);
        self.cache.store(());
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "Dot").entered();
        self.cache.get("Dot")?;
        let g = check_scalar_gy("Dot", gy)?;

        let (x1, x2) = (self.x1.value(), self.x2.value());
        // a row vector may be dotted with a column vector, so reshape each
        // gradient to its own operand
        let gx1 = if self.x1.requires_grad() {
            Some(x2.reshape(x1.rows(), x1.cols())?.prod_scalar(g))
        } else {
            None
        };
        let gx2 = if self.x2.requires_grad() {
            Some(x1.reshape(x2.rows(), x2.cols())?.prod_scalar(g))
        } else {
            None
        };
        accumulate(&self.x1, gx1)?;
        accumulate(&self.x2, gx2)?;

        self.cache.consume();
        Ok(())
    }
}

pub struct Transpose<T: Float> {
    x: OperandRef<T>,
    cache: Cached<Shape>,
}

impl<T: Float> Transpose<T> {
    pub fn new(x: OperandRef<T>) -> Self {
        Self { x, cache: Cached::new() }
    }
}

impl<T: Float> Function<T> for Transpose<T> {
    fn name(&self) -> &'static str {
        "Transpose"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let x = self.x.value();
        self.cache.store(x.shape());
        Ok(x.transpose())
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "Transpose").entered();
        let shape = *self.cache.get("Transpose")?;
        check_gy("Transpose", gy, shape.transposed())?;
        if self.x.requires_grad() {
            self.x.acc_grad(gy.transpose())?;
        }
        self.cache.consume();
        Ok(())
    }
}
