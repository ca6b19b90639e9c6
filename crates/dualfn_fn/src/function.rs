use crate::operand::OperandRef;
use dualfn_core::{
    error::{Error, Result},
    Dense, Float,
};

/// A differentiable function node.
///
/// The graph driver calls [`forward`](Function::forward) once, then at most
/// one [`backward`](Function::backward) with the gradient of the output.
/// Gradients for the operands are delivered through
/// [`Operand::acc_grad`](crate::Operand::acc_grad); operands that do not
/// require a gradient are never touched.
pub trait Function<T: Float>: Send {
    fn name(&self) -> &'static str;

    /// The operands this function reads, in argument order.
    fn operands(&self) -> Vec<OperandRef<T>>;

    fn forward(&mut self) -> Result<Dense<T>>;

    fn backward(&mut self, gy: &Dense<T>) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Created,
    Forwarded,
    Backwarded,
}

/// Per-instance lifecycle plus whatever `forward` leaves for `backward`.
///
/// `store` moves to [`Stage::Forwarded`]; `get` only succeeds while
/// forwarded; `consume` drops the state and moves to [`Stage::Backwarded`].
/// A later `store` re-arms the instance for the next pass.
/// Every `forward` starts with `reset`, so a pass that fails before `store`
/// leaves nothing for `backward` to pick up.
#[derive(Debug)]
pub struct Cached<S> {
    stage: Stage,
    value: Option<S>,
}

impl<S> Default for Cached<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Cached<S> {
    pub fn new() -> Self {
        Self {
            stage: Stage::Created,
            value: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn store(&mut self, value: S) {
        self.value = Some(value);
        self.stage = Stage::Forwarded;
    }

    /// Drops any state from an earlier pass and returns to [`Stage::Created`].
    pub fn reset(&mut self) {
        self.value = None;
        self.stage = Stage::Created;
    }

    pub fn get(&self, op: &'static str) -> Result<&S> {
        match (self.stage, self.value.as_ref()) {
            (Stage::Forwarded, Some(value)) => Ok(value),
            _ => {
                let err = Error::MissingCachedState { op };
                tracing::debug!(%err, stage = ?self.stage, "rejecting backward");
                Err(err)
            }
        }
    }

    pub fn consume(&mut self) {
        self.value = None;
        self.stage = Stage::Backwarded;
    }
}

/// Fails with `ShapeMismatch` unless the upstream gradient has `expected` shape.
pub(crate) fn check_gy<T: Float>(op: &'static str, gy: &Dense<T>, expected: dualfn_core::Shape) -> Result<()> {
    if gy.shape() == expected {
        Ok(())
    } else {
        let err = Error::shape_mismatch(op, expected, gy.shape());
        tracing::debug!(%err, "rejecting upstream gradient");
        Err(err)
    }
}

/// Fails unless the upstream gradient is a `1×1` scalar.
pub(crate) fn check_scalar_gy<T: Float>(op: &'static str, gy: &Dense<T>) -> Result<T> {
    check_gy(op, gy, dualfn_core::Shape::SCALAR)?;
    gy.scalar_value()
}
