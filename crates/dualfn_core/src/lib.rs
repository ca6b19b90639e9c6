pub mod config;
pub mod dense;
pub mod dtype;
pub mod error;
pub mod shape;

pub use dualfn_cpu as cpu;

pub use dense::Dense;
pub use dtype::{DType, Float};
pub use error::{Error, Result};
pub use shape::Shape;
