pub mod prelude;

pub use dualfn_core as core;
pub use dualfn_cpu as cpu;
pub use dualfn_fn as func;

pub use dualfn_fn::ops;
