//! Slice kernels backing `dualfn_core::Dense`.
//!
//! Every kernel works on plain row-major buffers. Buffers at or above the
//! configured parallel threshold are processed with rayon.

pub mod ops;
pub mod utils;

pub use rayon::join;
