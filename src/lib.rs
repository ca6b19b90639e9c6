pub use dualfn_internal::*;
