pub use crate::core::{
    config::{fork_join_enabled, parallel_threshold, set_fork_join, set_parallel_threshold},
    DType, Dense, Error, Float, Result, Shape,
};
pub use crate::func::{Function, Operand, OperandRef, Variable};
