//! Differentiable functions over [`Dense`](dualfn_core::Dense) matrices.
//!
//! Each operator implements [`Function`]: `forward` computes its value from
//! the current operand values, `backward` turns the gradient of that value
//! into gradients for the operands and hands them to
//! [`Operand::acc_grad`].

pub mod function;
pub mod math;
pub mod operand;
pub mod ops;

pub use function::{Cached, Function, Stage};
pub use operand::{Operand, OperandRef, Variable};
