//! Bounded fan-out of per-repository work.

use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::error::{Error, Result};

/// Worker pool width when neither the configuration nor the command line sets one.
pub const DEFAULT_WORKERS: usize = 8;

/// Runs `op` on every entry using `workers` threads.
///
/// Results come back in input order; completion order is unspecified. Each
/// call is isolated: an error or a panic inside `op` becomes that entry's
/// result and never affects the others.
///
/// # Errors
///
/// Returns [`Error::Pool`] only if the thread pool cannot be created.
pub fn run_batch<T, R, F>(entries: &[T], workers: usize, op: F) -> Result<Vec<Result<R>>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Result<R> + Sync,
{
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("gitward-worker-{i}"))
        .build()
        .map_err(|e| Error::Pool(e.to_string()))?;

    Ok(pool.install(|| entries.par_iter().map(|entry| isolate(|| op(entry))).collect()))
}

fn isolate<R>(op: impl FnOnce() -> Result<R>) -> Result<R> {
    catch_unwind(AssertUnwindSafe(op)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(Error::Panicked(message))
    })
}
