use dualfn_core::{
    error::{Error, Result},
    Dense, Float,
};
use std::sync::{Arc, Mutex};

/// A value a [`Function`](crate::Function) reads from and sends gradients to.
///
/// The operand owns gradient aggregation: several functions may hold the same
/// operand and each adds its contribution through [`Operand::acc_grad`],
/// possibly from different threads at once.
pub trait Operand<T: Float>: Send + Sync {
    fn value(&self) -> Dense<T>;

    /// Adds `gx` to the accumulated gradient, initializing it if empty.
    fn acc_grad(&self, gx: Dense<T>) -> Result<()>;

    fn requires_grad(&self) -> bool;
}

pub type OperandRef<T> = Arc<dyn Operand<T>>;

/// Reference operand: a fixed value plus a mutex-guarded gradient.
#[derive(Debug)]
pub struct Variable<T> {
    value: Dense<T>,
    grad: Mutex<Option<Dense<T>>>,
    requires_grad: bool,
}

impl<T: Float> Variable<T> {
    pub fn new(value: Dense<T>, requires_grad: bool) -> Self {
        Self {
            value,
            grad: Mutex::new(None),
            requires_grad,
        }
    }

    /// A value that never receives gradients.
    pub fn constant(value: Dense<T>) -> Self {
        Self::new(value, false)
    }

    pub fn scalar(value: T, requires_grad: bool) -> Self {
        Self::new(Dense::scalar(value), requires_grad)
    }

    pub fn into_ref(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn grad(&self) -> Result<Option<Dense<T>>> {
        Ok(self.grad.lock().map_err(|_| Error::GradLocked)?.clone())
    }

    pub fn zero_grad(&self) -> Result<()> {
        *self.grad.lock().map_err(|_| Error::GradLocked)? = None;
        Ok(())
    }
}

impl<T: Float> Operand<T> for Variable<T> {
    fn value(&self) -> Dense<T> {
        self.value.clone()
    }

    fn acc_grad(&self, gx: Dense<T>) -> Result<()> {
        self.value.check_same_shape("Variable::acc_grad", &gx)?;
        let mut grad = self.grad.lock().map_err(|_| Error::GradLocked)?;
        match grad.as_mut() {
            Some(acc) => acc.add_inplace(&gx)?,
            None => *grad = Some(gx),
        }
        Ok(())
    }

    fn requires_grad(&self) -> bool {
        self.requires_grad
    }
}
