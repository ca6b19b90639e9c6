//! Process-wide runtime knobs.
//!
//! Both settings are process-global: kernels and gradient branches read them
//! from rayon worker threads.

use std::sync::atomic::{AtomicBool, Ordering};

pub use dualfn_cpu::utils::{parallel_threshold, set_parallel_threshold, DEFAULT_PARALLEL_THRESHOLD};

static FORK_JOIN: AtomicBool = AtomicBool::new(true);

/// Whether operators with independent gradient branches (`Mul`, `MulT`,
/// `Affine`) compute them concurrently.
pub fn fork_join_enabled() -> bool {
    FORK_JOIN.load(Ordering::Relaxed)
}

pub fn set_fork_join(enabled: bool) {
    FORK_JOIN.store(enabled, Ordering::Relaxed);
}

/// Runs `a` and `b`, concurrently when fork-join is enabled, and returns
/// once both have completed.
pub fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    if fork_join_enabled() {
        dualfn_cpu::join(a, b)
    } else {
        (a(), b())
    }
}
