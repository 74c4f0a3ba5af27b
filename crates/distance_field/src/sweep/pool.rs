//! Fixed worker pool handing out one-slab work units.
//!
//! A pass broadcasts one job per pool thread; each job pulls slab
//! indices off a shared cursor until the pass is exhausted, so slabs
//! never need to be sized to match the thread count. The broadcast
//! returning is the barrier between passes. A panic inside one slab
//! abandons that slab only; the worker reports it and moves on.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crossbeam_channel::unbounded;
use web_time::Instant;

use crate::error::{FieldError, Result};

/// What one pass left behind.
#[derive(Debug, Default)]
pub(crate) struct PassOutcome {
  /// Slab indices whose worker panicked. Their cells keep whatever the
  /// previous pass wrote.
  pub(crate) abandoned: Vec<usize>,
  /// The deadline expired before every slab was claimed.
  pub(crate) timed_out: bool,
}

/// Dedicated thread pool for the sweep phase of one build.
pub(crate) struct SweepPool {
  pool: rayon::ThreadPool,
}

impl SweepPool {
  pub(crate) fn new(thread_count: usize) -> Result<Self> {
    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(thread_count)
      .thread_name(|i| format!("sweep-{i}"))
      .build()
      .map_err(|e| FieldError::WorkerPool(e.to_string()))?;
    Ok(Self { pool })
  }

  /// Runs one pass over `slab_count` slabs. `make_scratch` runs once
  /// per worker thread; `work` must only write cells of its own slab.
  pub(crate) fn run_pass<S, M, F>(
    &self,
    slab_count: usize,
    deadline: Option<Instant>,
    make_scratch: M,
    work: F,
  ) -> PassOutcome
  where
    M: Fn() -> S + Sync,
    F: Fn(usize, &mut S) + Sync,
  {
    let cursor = AtomicUsize::new(0);
    let timed_out = AtomicBool::new(false);
    let (abandoned_tx, abandoned_rx) = unbounded();

    self.pool.broadcast(|_| {
      let mut scratch = make_scratch();
      loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
          timed_out.store(true, Ordering::Relaxed);
          break;
        }
        let slab = cursor.fetch_add(1, Ordering::Relaxed);
        if slab >= slab_count {
          break;
        }
        if catch_unwind(AssertUnwindSafe(|| work(slab, &mut scratch))).is_err() {
          let _ = abandoned_tx.send(slab);
        }
      }
    });

    let mut abandoned: Vec<usize> = abandoned_rx.try_iter().collect();
    abandoned.sort_unstable();
    PassOutcome {
      abandoned,
      timed_out: timed_out.load(Ordering::Relaxed),
    }
  }
}
