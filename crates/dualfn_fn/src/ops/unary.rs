//! Elementwise activations.
//!
//! Every activation is a [`Unary`] function parameterized by a zero-sized
//! kind that supplies the per-element formula and its derivative. Kinds with
//! scalar parameters (`alpha`, `beta`, …) read them from `1×1` operands at
//! each pass; a parameter that has a derivative receives
//! `Σ ∂f/∂param ⊙ gy` when it requires a gradient.

use crate::{
    function::{check_gy, Cached, Function},
    math,
    operand::OperandRef,
};
use dualfn_core::{
    error::{Error, Result},
    Dense, Float,
};
use std::marker::PhantomData;

/// Per-element formula of a [`Unary`] function.
///
/// `params` holds the current values of the scalar parameter operands in
/// constructor order.
pub trait Activation<T: Float>: 'static {
    const NAME: &'static str;

    fn apply(x: T, params: &[T]) -> T;

    fn deriv(x: T, params: &[T]) -> T;

    /// `∂f/∂params[index]`, or `None` for a parameter that is read-only.
    fn param_deriv(_index: usize) -> Option<fn(T, &[T]) -> T> {
        None
    }

    fn check_domain(_x: &Dense<T>) -> Result<()> {
        Ok(())
    }

    /// Rejects parameter values the formula is undefined for.
    fn check_params(_params: &[T]) -> Result<()> {
        Ok(())
    }
}

/// `y = f(x)` elementwise, `dx = f'(x) ⊙ gy`.
pub struct Unary<T: Float, K> {
    x: OperandRef<T>,
    params: Vec<OperandRef<T>>,
    cache: Cached<()>,
    _kind: PhantomData<fn() -> K>,
}

impl<T: Float, K: Activation<T>> Unary<T, K> {
    fn with_params(x: OperandRef<T>, params: Vec<OperandRef<T>>) -> Self {
        Self {
            x,
            params,
            cache: Cached::new(),
            _kind: PhantomData,
        }
    }

    fn param_values(&self) -> Result<Vec<T>> {
        let params = self
            .params
            .iter()
            .map(|p| {
                let value = p.value();
                value.check_scalar(K::NAME)?;
                value.scalar_value()
            })
            .collect::<Result<Vec<T>>>()?;
        K::check_params(&params)?;
        Ok(params)
    }
}

impl<T: Float, K: Activation<T>> Function<T> for Unary<T, K> {
    fn name(&self) -> &'static str {
        K::NAME
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        let mut operands = vec![self.x.clone()];
        operands.extend(self.params.iter().cloned());
        operands
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let x = self.x.value();
        K::check_domain(&x)?;
        let params = self.param_values()?;
        let y = x.map(move |v| K::apply(v, &params));
        self.cache.store(());
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = K::NAME).entered();
        self.cache.get(K::NAME)?;

        let x = self.x.value();
        check_gy(K::NAME, gy, x.shape())?;
        let params = self.param_values()?;

        let gx = if self.x.requires_grad() {
            Some(x.zip_map(K::NAME, gy, |v, g| K::deriv(v, &params) * g)?)
        } else {
            None
        };

        let mut gparams = Vec::with_capacity(self.params.len());
        for (index, param) in self.params.iter().enumerate() {
            if !param.requires_grad() {
                continue;
            }
            if let Some(deriv) = K::param_deriv(index) {
                let terms = x.zip_map(K::NAME, gy, |v, g| deriv(v, &params) * g)?;
                gparams.push((param, Dense::scalar(terms.sum())));
            }
        }

        if let Some(gx) = gx {
            self.x.acc_grad(gx)?;
        }
        for (param, g) in gparams {
            param.acc_grad(g)?;
        }

        self.cache.consume();
        Ok(())
    }
}

macro_rules! activation {
    (
        $(#[$meta:meta])*
        $name:ident,
        apply: |$x:ident| $apply:expr,
        deriv: |$dx:ident| $deriv:expr $(,)?
    ) => {
        paste::paste! {
            #[doc = concat!("Kind of [`", stringify!($name), "`].")]
            #[derive(Debug, Clone, Copy)]
            pub struct [<$name Kind>];

            impl<T: Float> Activation<T> for [<$name Kind>] {
                const NAME: &'static str = stringify!($name);

                fn apply($x: T, _: &[T]) -> T {
                    $apply
                }

                fn deriv($dx: T, _: &[T]) -> T {
                    $deriv
                }
            }

            $(#[$meta])*
            pub type $name<T> = Unary<T, [<$name Kind>]>;

            impl<T: Float> $name<T> {
                pub fn new(x: OperandRef<T>) -> Self {
                    Self::with_params(x, Vec::new())
                }
            }
        }
    };
}

activation!(
    /// Logistic function `1 / (1 + e^-x)`.
    Sigmoid,
    apply: |x| math::sigmoid(x),
    deriv: |x| math::sigmoid_deriv(x),
);

activation!(Tanh, apply: |x| x.tanh(), deriv: |x| math::tanh_deriv(x));

activation!(Tan, apply: |x| x.tan(), deriv: |x| math::tan_deriv(x));

activation!(
    /// `max(0, x)`; the derivative at zero is taken as zero.
    ReLU,
    apply: |x| math::relu(x),
    deriv: |x| math::relu_deriv(x),
);

activation!(
    /// Piecewise linear sigmoid, `0.2x + 0.5` clamped to `[0, 1]`.
    HardSigmoid,
    apply: |x| math::hard_sigmoid(x),
    deriv: |x| math::hard_sigmoid_deriv(x),
);

activation!(
    HardTanh,
    apply: |x| math::hard_tanh(x),
    deriv: |x| math::hard_tanh_deriv(x),
);

activation!(
    /// `x / (1 + |x|)`.
    Softsign,
    apply: |x| math::softsign(x),
    deriv: |x| math::softsign_deriv(x),
);

activation!(
    /// `x · tanh(ln(1 + e^x))`.
    Mish,
    apply: |x| math::mish(x),
    deriv: |x| math::mish_deriv(x),
);

activation!(
    /// Gaussian error linear unit, tanh approximation.
    GELU,
    apply: |x| math::gelu(x),
    deriv: |x| math::gelu_deriv(x),
);

activation!(
    /// `x · sigmoid(x)`.
    Swish,
    apply: |x| math::swish(x),
    deriv: |x| math::swish_deriv(x),
);

activation!(Abs, apply: |x| x.abs(), deriv: |x| math::abs_deriv(x));

activation!(Sin, apply: |x| x.sin(), deriv: |x| x.cos());

activation!(Cos, apply: |x| x.cos(), deriv: |x| -x.sin());

activation!(Neg, apply: |x| -x, deriv: |_x| -T::one());

activation!(Reciprocal, apply: |x| x.recip(), deriv: |x| math::reciprocal_deriv(x));

activation!(Exp, apply: |x| x.exp(), deriv: |x| x.exp());

activation!(Sqrt, apply: |x| x.sqrt(), deriv: |x| math::sqrt_deriv(x));

activation!(Identity, apply: |x| x, deriv: |_x| T::one());

activation!(Square, apply: |x| x * x, deriv: |x| x + x);

/// Natural logarithm. Negative inputs are rejected in forward; at exactly
/// zero the derivative is [`math::LOG_ZERO_DERIV`].
pub type Log<T> = Unary<T, LogKind>;

#[derive(Debug, Clone, Copy)]
pub struct LogKind;

impl<T: Float> Activation<T> for LogKind {
    const NAME: &'static str = "Log";

    fn apply(x: T, _: &[T]) -> T {
        x.ln()
    }

    fn deriv(x: T, _: &[T]) -> T {
        math::log_deriv(x)
    }

    fn check_domain(x: &Dense<T>) -> Result<()> {
        match x.data().iter().position(|&v| v < T::zero()) {
            Some(i) => {
                let err = Error::domain("Log", format!("negative input {} at index {}", x.data()[i], i));
                tracing::debug!(%err, "rejecting forward");
                Err(err)
            }
            None => Ok(()),
        }
    }
}

impl<T: Float> Log<T> {
    pub fn new(x: OperandRef<T>) -> Self {
        Self::with_params(x, Vec::new())
    }
}

// parameterized kinds

/// `x` for `x ≥ 0`, `alpha · x` otherwise. `alpha` may require a gradient.
pub type LeakyReLU<T> = Unary<T, LeakyReLUKind>;

#[derive(Debug, Clone, Copy)]
pub struct LeakyReLUKind;

impl<T: Float> Activation<T> for LeakyReLUKind {
    const NAME: &'static str = "LeakyReLU";

    fn apply(x: T, p: &[T]) -> T {
        math::leaky_relu(x, p[0])
    }

    fn deriv(x: T, p: &[T]) -> T {
        math::leaky_relu_deriv(x, p[0])
    }

    fn param_deriv(index: usize) -> Option<fn(T, &[T]) -> T> {
        match index {
            0 => Some(|x, p| math::leaky_relu_deriv_alpha(x, p[0])),
            _ => None,
        }
    }
}

impl<T: Float> LeakyReLU<T> {
    pub fn new(x: OperandRef<T>, alpha: OperandRef<T>) -> Self {
        Self::with_params(x, vec![alpha])
    }
}

/// Exponential linear unit. `alpha` may require a gradient.
pub type ELU<T> = Unary<T, ELUKind>;

#[derive(Debug, Clone, Copy)]
pub struct ELUKind;

impl<T: Float> Activation<T> for ELUKind {
    const NAME: &'static str = "ELU";

    fn apply(x: T, p: &[T]) -> T {
        math::elu(x, p[0])
    }

    fn deriv(x: T, p: &[T]) -> T {
        math::elu_deriv(x, p[0])
    }

    fn param_deriv(index: usize) -> Option<fn(T, &[T]) -> T> {
        match index {
            0 => Some(|x, p| math::elu_deriv_alpha(x, p[0])),
            _ => None,
        }
    }
}

impl<T: Float> ELU<T> {
    pub fn new(x: OperandRef<T>, alpha: OperandRef<T>) -> Self {
        Self::with_params(x, vec![alpha])
    }
}

fn nonzero<T: Float>(op: &'static str, name: &str, value: T) -> Result<()> {
    if value == T::zero() || value.is_nan() {
        let err = Error::configuration(op, format!("{} must be a non-zero number, got {}", name, value.as_f64()));
        tracing::debug!(%err, "rejecting parameter");
        return Err(err);
    }
    Ok(())
}

/// Continuously differentiable ELU. `alpha` must be non-zero.
pub type CELU<T> = Unary<T, CELUKind>;

#[derive(Debug, Clone, Copy)]
pub struct CELUKind;

impl<T: Float> Activation<T> for CELUKind {
    const NAME: &'static str = "CELU";

    fn apply(x: T, p: &[T]) -> T {
        math::celu(x, p[0])
    }

    fn deriv(x: T, p: &[T]) -> T {
        math::celu_deriv(x, p[0])
    }

    fn check_params(p: &[T]) -> Result<()> {
        nonzero("CELU", "alpha", p[0])
    }
}

impl<T: Float> CELU<T> {
    pub fn new(x: OperandRef<T>, alpha: OperandRef<T>) -> Self {
        Self::with_params(x, vec![alpha])
    }
}

pub type SELU<T> = Unary<T, SELUKind>;

#[derive(Debug, Clone, Copy)]
pub struct SELUKind;

impl<T: Float> Activation<T> for SELUKind {
    const NAME: &'static str = "SELU";

    fn apply(x: T, p: &[T]) -> T {
        math::selu(x, p[0], p[1])
    }

    fn deriv(x: T, p: &[T]) -> T {
        math::selu_deriv(x, p[0], p[1])
    }
}

impl<T: Float> SELU<T> {
    pub fn new(x: OperandRef<T>, alpha: OperandRef<T>, scale: OperandRef<T>) -> Self {
        Self::with_params(x, vec![alpha, scale])
    }
}

/// `ln(1 + e^(βx)) / β`, linear once `βx` exceeds `threshold`. `beta` must be non-zero.
pub type Softplus<T> = Unary<T, SoftplusKind>;

#[derive(Debug, Clone, Copy)]
pub struct SoftplusKind;

impl<T: Float> Activation<T> for SoftplusKind {
    const NAME: &'static str = "Softplus";

    fn apply(x: T, p: &[T]) -> T {
        math::softplus(x, p[0], p[1])
    }

    fn deriv(x: T, p: &[T]) -> T {
        math::softplus_deriv(x, p[0], p[1])
    }

    fn check_params(p: &[T]) -> Result<()> {
        nonzero("Softplus", "beta", p[0])
    }
}

impl<T: Float> Softplus<T> {
    pub fn new(x: OperandRef<T>, beta: OperandRef<T>, threshold: OperandRef<T>) -> Self {
        Self::with_params(x, vec![beta, threshold])
    }
}

pub type SoftShrink<T> = Unary<T, SoftShrinkKind>;

#[derive(Debug, Clone, Copy)]
pub struct SoftShrinkKind;

impl<T: Float> Activation<T> for SoftShrinkKind {
    const NAME: &'static str = "SoftShrink";

    fn apply(x: T, p: &[T]) -> T {
        math::soft_shrink(x, p[0])
    }

    fn deriv(x: T, p: &[T]) -> T {
        math::soft_shrink_deriv(x, p[0])
    }
}

impl<T: Float> SoftShrink<T> {
    pub fn new(x: OperandRef<T>, lambda: OperandRef<T>) -> Self {
        Self::with_params(x, vec![lambda])
    }
}

/// `x` above `threshold`, the constant `k` elsewhere. `k` may require a gradient.
pub type Threshold<T> = Unary<T, ThresholdKind>;

#[derive(Debug, Clone, Copy)]
pub struct ThresholdKind;

impl<T: Float> Activation<T> for ThresholdKind {
    const NAME: &'static str = "Threshold";

    fn apply(x: T, p: &[T]) -> T {
        math::threshold(x, p[0], p[1])
    }

    fn deriv(x: T, p: &[T]) -> T {
        math::threshold_deriv(x, p[0], p[1])
    }

    fn param_deriv(index: usize) -> Option<fn(T, &[T]) -> T> {
        match index {
            1 => Some(|x, p| math::threshold_deriv_k(x, p[0], p[1])),
            _ => None,
        }
    }
}

impl<T: Float> Threshold<T> {
    pub fn new(x: OperandRef<T>, threshold: OperandRef<T>, k: OperandRef<T>) -> Self {
        Self::with_params(x, vec![threshold, k])
    }
}

/// `x · sigmoid(βx)`. `beta` may require a gradient.
pub type SwishB<T> = Unary<T, SwishBKind>;

#[derive(Debug, Clone, Copy)]
pub struct SwishBKind;

impl<T: Float> Activation<T> for SwishBKind {
    const NAME: &'static str = "SwishB";

    fn apply(x: T, p: &[T]) -> T {
        math::swish_b(x, p[0])
    }

    fn deriv(x: T, p: &[T]) -> T {
        math::swish_b_deriv(x, p[0])
    }

    fn param_deriv(index: usize) -> Option<fn(T, &[T]) -> T> {
        match index {
            0 => Some(|x, p| math::swish_b_deriv_beta(x, p[0])),
            _ => None,
        }
    }
}

impl<T: Float> SwishB<T> {
    pub fn new(x: OperandRef<T>, beta: OperandRef<T>) -> Self {
        Self::with_params(x, vec![beta])
    }
}

/// `y = x^power` for a fixed exponent.
pub struct Pow<T: Float> {
    x: OperandRef<T>,
    power: T,
    cache: Cached<()>,
}

impl<T: Float> Pow<T> {
    pub fn new(x: OperandRef<T>, power: T) -> Self {
        Self {
            x,
            power,
            cache: Cached::new(),
        }
    }
}

impl<T: Float> Function<T> for Pow<T> {
    fn name(&self) -> &'static str {
        "Pow"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let y = self.x.value().pow(self.power);
        self.cache.store(());
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "Pow").entered();
        self.cache.get("Pow")?;

        let x = self.x.value();
        check_gy("Pow", gy, x.shape())?;
        if self.x.requires_grad() {
            let p = self.power;
            self.x.acc_grad(x.zip_map("Pow", gy, move |v, g| p * v.powf(p - T::one()) * g)?)?;
        }

        self.cache.consume();
        Ok(())
    }
}
