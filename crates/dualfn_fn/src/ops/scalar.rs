//! Functions of a tensor operand `x1` and a `1×1` scalar operand `x2`.
//!
//! The scalar is broadcast over `x1` in forward; its gradient is always a
//! full reduction of the upstream gradient.

use crate::{
    function::{check_gy, Cached, Function},
    operand::OperandRef,
};
use dualfn_core::{error::Result, Dense, Float};

fn scalar_of<T: Float>(op: &'static str, x: &OperandRef<T>) -> Result<T> {
    let value = x.value();
    value.check_scalar(op)?;
    value.scalar_value()
}

fn broadcast<T: Float>(x: &Dense<T>, s: T, func: impl Fn(T, T) -> T + Send + Sync) -> Dense<T> {
    x.map(move |a| func(a, s))
}

fn tensor_grad<T: Float>(
    op: &'static str,
    x: &Dense<T>,
    gy: &Dense<T>,
    s: T,
    func: impl Fn(T, T, T) -> T + Send + Sync,
) -> Result<Dense<T>> {
    x.zip_map(op, gy, move |a, g| func(a, s, g))
}

fn scalar_grad<T: Float>(
    op: &'static str,
    x: &Dense<T>,
    gy: &Dense<T>,
    s: T,
    func: impl Fn(T, T, T) -> T + Send + Sync,
) -> Result<Dense<T>> {
    Ok(Dense::scalar(tensor_grad(op, x, gy, s, func)?.sum()))
}

macro_rules! scalar_binary {
    (
        $(#[$meta:meta])*
        $name:ident,
        forward: $forward:expr,
        dx1: $dx1:expr,
        dx2: $dx2:expr $(,)?
    ) => {
        $(#[$meta])*
        pub struct $name<T: Float> {
            x1: OperandRef<T>,
            x2: OperandRef<T>,
            cache: Cached<()>,
        }

        impl<T: Float> $name<T> {
            /// `x2` must evaluate to a `1×1` scalar.
            pub fn new(x1: OperandRef<T>, x2: OperandRef<T>) -> Self {
                Self {
                    x1,
                    x2,
                    cache: Cached::new(),
                }
            }
        }

        impl<T: Float> Function<T> for $name<T> {
            fn name(&self) -> &'static str {
                stringify!($name)
            }

            fn operands(&self) -> Vec<OperandRef<T>> {
                vec![self.x1.clone(), self.x2.clone()]
            }

            fn forward(&mut self) -> Result<Dense<T>> {
                let _span = tracing::trace_span!("forward", op = stringify!($name)).entered();
                self.cache.reset();
                let s = scalar_of(stringify!($name), &self.x2)?;
                let y = broadcast(&self.x1.value(), s, $forward);
                self.cache.store(());
                Ok(y)
            }

            fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
                let _span = tracing::trace_span!("backward", op = stringify!($name)).entered();
                self.cache.get(stringify!($name))?;

                let x1 = self.x1.value();
                let s = scalar_of(stringify!($name), &self.x2)?;
                check_gy(stringify!($name), gy, x1.shape())?;

                let gx1 = if self.x1.requires_grad() {
                    Some(tensor_grad(stringify!($name), &x1, gy, s, $dx1)?)
                } else {
                    None
                };
                let gx2 = if self.x2.requires_grad() {
                    Some(scalar_grad(stringify!($name), &x1, gy, s, $dx2)?)
                } else {
                    None
                };
                if let Some(gx1) = gx1 {
                    self.x1.acc_grad(gx1)?;
                }
                if let Some(gx2) = gx2 {
                    self.x2.acc_grad(gx2)?;
                }

                self.cache.consume();
                Ok(())
            }
        }
    };
}

scalar_binary!(
    /// `y = x1 + s`.
    AddScalar,
    forward: |a, s| a + s,
    dx1: |_, _, g| g,
    dx2: |_, _, g| g,
);

scalar_binary!(
    /// `y = x1 - s`.
    SubScalar,
    forward: |a, s| a - s,
    dx1: |_, _, g| g,
    dx2: |_, _, g: T| -g,
);

scalar_binary!(
    /// `y = s - x1`.
    ReverseSubScalar,
    forward: |a, s| s - a,
    dx1: |_, _, g: T| -g,
    dx2: |_, _, g| g,
);

scalar_binary!(
    /// `y = x1 * s`.
    ProdScalar,
    forward: |a, s| a * s,
    dx1: |_, s, g| s * g,
    dx2: |a, _, g| a * g,
);

scalar_binary!(
    /// `y = x1 / s`.
    DivScalar,
    forward: |a, s| a / s,
    dx1: |_, s, g| g / s,
    dx2: |a: T, s: T, g: T| -(a * g) / (s * s),
);
