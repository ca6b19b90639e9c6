//! Elementwise binary functions over two same-shaped operands.

use crate::{
    function::{check_gy, Cached, Function},
    operand::OperandRef,
};
use dualfn_core::{error::Result, Dense, Float};

macro_rules! elementwise_binary {
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
                let y = self.x1.value().zip_map(stringify!($name), &self.x2.value(), $forward)?;
                self.cache.store(());
                Ok(y)
            }

            fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
                let _span = tracing::trace_span!("backward", op = stringify!($name)).entered();
                self.cache.get(stringify!($name))?;

                let (x1, x2) = (self.x1.value(), self.x2.value());
                check_gy(stringify!($name), gy, x1.shape())?;
                check_gy(stringify!($name), gy, x2.shape())?;

                let gx1 = if self.x1.requires_grad() {
                    Some(x1.zip3_map(stringify!($name), &x2, gy, $dx1)?)
                } else {
                    None
                };
                let gx2 = if self.x2.requires_grad() {
                    Some(x1.zip3_map(stringify!($name), &x2, gy, $dx2)?)
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

elementwise_binary!(
    /// `y = x1 + x2`.
    Add,
    forward: |a, b| a + b,
    dx1: |_, _, gy| gy,
    dx2: |_, _, gy| gy,
);

elementwise_binary!(
    /// `y = x1 - x2`.
    Sub,
    forward: |a, b| a - b,
    dx1: |_, _, gy| gy,
    dx2: |_, _, gy: T| -gy,
);

elementwise_binary!(
    /// Elementwise product `y = x1 ⊙ x2`.
    Prod,
    forward: |a, b| a * b,
    dx1: |_, b, gy| b * gy,
    dx2: |a, _, gy| a * gy,
);

elementwise_binary!(
    /// Elementwise quotient `y = x1 / x2`.
    Div,
    forward: |a, b| a / b,
    dx1: |_, b, gy| gy / b,
    dx2: |a: T, b: T, gy: T| -(a * gy) / (b * b),
);

elementwise_binary!(
    /// Elementwise maximum. The gradient goes to the strictly larger side;
    /// on ties neither operand receives it.
    Max,
    forward: |a: T, b: T| if a > b { a } else { b },
    dx1: |a: T, b: T, gy: T| if a > b { gy } else { T::zero() },
    dx2: |a: T, b: T, gy: T| if b > a { gy } else { T::zero() },
);

elementwise_binary!(
    /// Elementwise minimum. The gradient goes to the strictly smaller side;
    /// on ties neither operand receives it.
    Min,
    forward: |a: T, b: T| if a < b { a } else { b },
    dx1: |a: T, b: T, gy: T| if a < b { gy } else { T::zero() },
    dx2: |a: T, b: T, gy: T| if b < a { gy } else { T::zero() },
);
