//! Scalar activation formulas and their derivatives.
//!
//! Functions named `*_deriv` return `df/dx`; `*_deriv_<param>` return the
//! derivative with respect to that scalar parameter.

#![allow(clippy::excessive_precision)]

use dualfn_core::Float;

/// Derivative of `ln` used at exactly zero instead of `+∞`.
pub const LOG_ZERO_DERIV: f64 = 1.0 / 1.0e-8;

#[inline]
fn c<T: Float>(x: f64) -> T {
    T::cast(x)
}

pub fn sigmoid<T: Float>(x: T) -> T {
    T::one() / (T::one() + (-x).exp())
}

pub fn sigmoid_deriv<T: Float>(x: T) -> T {
    let s = sigmoid(x);
    s * (T::one() - s)
}

pub fn tanh_deriv<T: Float>(x: T) -> T {
    let t = x.tanh();
    T::one() - t * t
}

pub fn tan_deriv<T: Float>(x: T) -> T {
    let cos = x.cos();
    T::one() / (cos * cos)
}

pub fn relu<T: Float>(x: T) -> T {
    x.max(T::zero())
}

pub fn relu_deriv<T: Float>(x: T) -> T {
    if x > T::zero() {
        T::one()
    } else {
        T::zero()
    }
}

pub fn leaky_relu<T: Float>(x: T, alpha: T) -> T {
    if x >= T::zero() {
        x
    } else {
        alpha * x
    }
}

pub fn leaky_relu_deriv<T: Float>(x: T, alpha: T) -> T {
    if x >= T::zero() {
        T::one()
    } else {
        alpha
    }
}

pub fn leaky_relu_deriv_alpha<T: Float>(x: T, _alpha: T) -> T {
    if x >= T::zero() {
        T::zero()
    } else {
        x
    }
}

pub fn elu<T: Float>(x: T, alpha: T) -> T {
    if x > T::zero() {
        x
    } else {
        alpha * (x.exp() - T::one())
    }
}

pub fn elu_deriv<T: Float>(x: T, alpha: T) -> T {
    if x > T::zero() {
        T::one()
    } else {
        alpha * x.exp()
    }
}

pub fn elu_deriv_alpha<T: Float>(x: T, _alpha: T) -> T {
    if x > T::zero() {
        T::zero()
    } else {
        x.exp() - T::one()
    }
}

pub fn celu<T: Float>(x: T, alpha: T) -> T {
    if x > T::zero() {
        x
    } else {
        alpha * ((x / alpha).exp() - T::one())
    }
}

pub fn celu_deriv<T: Float>(x: T, alpha: T) -> T {
    if x > T::zero() {
        T::one()
    } else {
        (x / alpha).exp()
    }
}

pub fn selu<T: Float>(x: T, alpha: T, scale: T) -> T {
    if x > T::zero() {
        scale * x
    } else {
        scale * alpha * (x.exp() - T::one())
    }
}

pub fn selu_deriv<T: Float>(x: T, alpha: T, scale: T) -> T {
    if x > T::zero() {
        scale
    } else {
        scale * alpha * x.exp()
    }
}

/// `ln(1 + e^(βx)) / β`, linear above `threshold` for stability.
pub fn softplus<T: Float>(x: T, beta: T, threshold: T) -> T {
    if x * beta > threshold {
        x
    } else {
        (T::one() + (beta * x).exp()).ln() / beta
    }
}

pub fn softplus_deriv<T: Float>(x: T, beta: T, threshold: T) -> T {
    if x * beta > threshold {
        T::one()
    } else {
        sigmoid(beta * x)
    }
}

pub fn soft_shrink<T: Float>(x: T, lambda: T) -> T {
    if x > lambda {
        x - lambda
    } else if x < -lambda {
        x + lambda
    } else {
        T::zero()
    }
}

pub fn soft_shrink_deriv<T: Float>(x: T, lambda: T) -> T {
    if x > lambda || x < -lambda {
        T::one()
    } else {
        T::zero()
    }
}

pub fn threshold<T: Float>(x: T, threshold: T, k: T) -> T {
    if x > threshold {
        x
    } else {
        k
    }
}

pub fn threshold_deriv<T: Float>(x: T, threshold: T, _k: T) -> T {
    if x > threshold {
        T::one()
    } else {
        T::zero()
    }
}

pub fn threshold_deriv_k<T: Float>(x: T, threshold: T, _k: T) -> T {
    if x > threshold {
        T::zero()
    } else {
        T::one()
    }
}

pub fn hard_sigmoid<T: Float>(x: T) -> T {
    if x > c(2.5) {
        T::one()
    } else if x < c(-2.5) {
        T::zero()
    } else {
        c::<T>(0.2) * x + c(0.5)
    }
}

pub fn hard_sigmoid_deriv<T: Float>(x: T) -> T {
    if x < c(2.5) && x > c(-2.5) {
        c(0.2)
    } else {
        T::zero()
    }
}

pub fn hard_tanh<T: Float>(x: T) -> T {
    x.max(-T::one()).min(T::one())
}

pub fn hard_tanh_deriv<T: Float>(x: T) -> T {
    if x < T::one() && x > -T::one() {
        T::one()
    } else {
        T::zero()
    }
}

pub fn softsign<T: Float>(x: T) -> T {
    x / (T::one() + x.abs())
}

pub fn softsign_deriv<T: Float>(x: T) -> T {
    let d = T::one() + x.abs();
    T::one() / (d * d)
}

pub fn mish<T: Float>(x: T) -> T {
    x * softplus(x, T::one(), c(20.0)).tanh()
}

/// `tanh(sp) + x·σ(x)·(1 - tanh²(sp))` with `sp = softplus(x)`; finite for any finite `x`.
pub fn mish_deriv<T: Float>(x: T) -> T {
    let t = softplus(x, T::one(), c(20.0)).tanh();
    t + x * sigmoid(x) * (T::one() - t * t)
}

const GELU_K: f64 = 0.7978845608028654;
const GELU_A: f64 = 0.044715;

/// Tanh approximation of GELU.
pub fn gelu<T: Float>(x: T) -> T {
    let inner = c::<T>(GELU_K) * (x + c::<T>(GELU_A) * x.powi(3));
    c::<T>(0.5) * x * (T::one() + inner.tanh())
}

pub fn gelu_deriv<T: Float>(x: T) -> T {
    let u = c::<T>(GELU_K) * (x + c::<T>(GELU_A) * x.powi(3));
    let du = c::<T>(GELU_K) * (T::one() + c::<T>(3.0 * GELU_A) * x * x);
    let t = u.tanh();
    c::<T>(0.5) * (T::one() + t) + c::<T>(0.5) * x * (T::one() - t * t) * du
}

pub fn swish<T: Float>(x: T) -> T {
    x * sigmoid(x)
}

pub fn swish_deriv<T: Float>(x: T) -> T {
    swish_b_deriv(x, T::one())
}

pub fn swish_b<T: Float>(x: T, beta: T) -> T {
    x * sigmoid(beta * x)
}

pub fn swish_b_deriv<T: Float>(x: T, beta: T) -> T {
    let s = sigmoid(beta * x);
    s + beta * x * s * (T::one() - s)
}

pub fn swish_b_deriv_beta<T: Float>(x: T, beta: T) -> T {
    let s = sigmoid(beta * x);
    x * x * s * (T::one() - s)
}

pub fn abs_deriv<T: Float>(x: T) -> T {
    if x > T::zero() {
        T::one()
    } else if x < T::zero() {
        -T::one()
    } else {
        T::zero()
    }
}

pub fn reciprocal_deriv<T: Float>(x: T) -> T {
    -T::one() / (x * x)
}

/// `1/x`, with a large finite value at `x == 0`. Callers reject `x < 0`.
pub fn log_deriv<T: Float>(x: T) -> T {
    if x == T::zero() {
        c(LOG_ZERO_DERIV)
    } else {
        T::one() / x
    }
}

pub fn sqrt_deriv<T: Float>(x: T) -> T {
    c::<T>(0.5) / x.sqrt()
}
