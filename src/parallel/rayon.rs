//! Rayon-backed batch execution (feature-gated).
//!
//! Same contract as [`run_batches`](super::run_batches): every batch is
//! processed exactly once with per-worker scratch state, and the first error
//! is returned after all workers stop.

use rayon::prelude::*;

use crate::parallel::WorkPlan;
use crate::util::{DepthError, DepthResult};

/// Processes batches on the rayon pool.
///
/// `plan.threads == 0` runs on the global pool; any other value builds a
/// dedicated pool of that size for the duration of the call.
pub fn run_batches_par<B, S, I, F>(plan: &WorkPlan, batches: Vec<B>, init: I, work: F) -> DepthResult<()>
where
    B: Send,
    S: Send,
    I: Fn() -> DepthResult<S> + Sync + Send,
    F: Fn(&mut S, usize, B) -> DepthResult<()> + Sync + Send,
{
    let run = move || {
        batches.into_par_iter().enumerate().try_for_each_init(
            || init(),
            |scratch, (idx, batch)| {
                let scratch = scratch.as_mut().map_err(|err| err.clone())?;
                work(scratch, idx, batch)
            },
        )
    };

    if plan.threads == 0 {
        return run();
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(plan.threads)
        .build()
        .map_err(|_| DepthError::NotSupported("rayon thread pool could not be created"))?;
    pool.install(run)
}
