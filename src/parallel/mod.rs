//! Scanline work distribution.
//!
//! Output buffers are split into disjoint batches of whole rows. Workers claim
//! batch indices from a shared atomic cursor and process them with private
//! scratch state, so results do not depend on the number of workers or on
//! the order in which batches are claimed.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;

use crate::util::{DepthError, DepthResult};

#[cfg(feature = "rayon")]
pub mod rayon;

/// Rows per batch when more than one worker is active.
pub const DEFAULT_BATCH_ROWS: usize = 4;

/// Execution backend for the row-parallel stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    /// Scoped OS threads fed by [`BatchCursor`].
    #[default]
    Threads,
    /// The rayon pool (requires the `rayon` feature).
    Rayon,
}

/// Worker count and batch granularity for one stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkPlan {
    threads: usize,
    batch_rows: usize,
}

impl WorkPlan {
    /// Creates a plan; `threads == 0` uses the available parallelism.
    pub fn new(threads: usize, batch_rows: usize) -> DepthResult<Self> {
        if batch_rows == 0 {
            return Err(DepthError::InvalidBatchSize);
        }
        Ok(Self {
            threads,
            batch_rows,
        })
    }

    /// Single worker, the whole range as one batch.
    pub fn serial() -> Self {
        Self {
            threads: 1,
            batch_rows: DEFAULT_BATCH_ROWS,
        }
    }

    /// Number of workers including the calling thread.
    pub fn worker_count(&self) -> usize {
        if self.threads == 0 {
            thread::available_parallelism().map_or(1, |n| n.get())
        } else {
            self.threads
        }
    }

    /// Rows per claimed batch for a stage covering `total_rows`.
    pub fn rows_per_batch(&self, total_rows: usize) -> usize {
        if self.worker_count() == 1 {
            total_rows.max(1)
        } else {
            self.batch_rows
        }
    }
}

impl Default for WorkPlan {
    fn default() -> Self {
        Self {
            threads: 0,
            batch_rows: DEFAULT_BATCH_ROWS,
        }
    }
}

/// Shared cursor handing out batch indices in increasing order.
pub struct BatchCursor {
    next: AtomicUsize,
    len: usize,
    cancelled: AtomicBool,
}

impl BatchCursor {
    /// Creates a cursor over `len` batches.
    pub fn new(len: usize) -> Self {
        Self {
            next: AtomicUsize::new(0),
            len,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Claims the next unprocessed batch, or `None` once exhausted or cancelled.
    pub fn claim(&self) -> Option<usize> {
        if self.is_cancelled() {
            return None;
        }
        let idx = self.next.fetch_add(1, Ordering::Relaxed);
        (idx < self.len).then_some(idx)
    }

    /// Stops further claims; batches already claimed still finish.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns `true` after [`BatchCursor::cancel`].
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Runs `work` over every batch using `plan.worker_count()` workers.
///
/// Each worker first builds its scratch state with `init`. The calling thread
/// is one of the workers. The first error cancels the remaining claims and is
/// returned once every worker has stopped. A panic in any worker, the calling
/// thread included, is caught and reported as [`DepthError::WorkerPanicked`].
pub fn run_batches<B, S, I, F>(plan: &WorkPlan, batches: Vec<B>, init: I, work: F) -> DepthResult<()>
where
    B: Send,
    I: Fn() -> DepthResult<S> + Sync,
    F: Fn(&mut S, usize, B) -> DepthResult<()> + Sync,
{
    if batches.is_empty() {
        return Ok(());
    }
    let workers = plan.worker_count().min(batches.len()).max(1);
    let cursor = BatchCursor::new(batches.len());
    let slots: Vec<Mutex<Option<B>>> = batches
        .into_iter()
        .map(|batch| Mutex::new(Some(batch)))
        .collect();

    let worker = || -> DepthResult<()> {
        let result = (|| -> DepthResult<()> {
            let mut scratch = init()?;
            while let Some(idx) = cursor.claim() {
                let batch = slots[idx]
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                if let Some(batch) = batch {
                    work(&mut scratch, idx, batch)?;
                }
            }
            Ok(())
        })();
        if result.is_err() {
            cursor.cancel();
        }
        result
    };

    let caught = || {
        catch_unwind(AssertUnwindSafe(&worker)).unwrap_or_else(|_| {
            cursor.cancel();
            Err(DepthError::WorkerPanicked)
        })
    };

    if workers == 1 {
        return caught();
    }

    thread::scope(|scope| {
        let handles: Vec<_> = (1..workers).map(|_| scope.spawn(&worker)).collect();
        let mut outcome = caught();
        for handle in handles {
            let joined = handle.join().unwrap_or_else(|_| {
                cursor.cancel();
                Err(DepthError::WorkerPanicked)
            });
            if outcome.is_ok() {
                outcome = joined;
            }
        }
        outcome
    })
}

/// Backend plus work plan used by every row-parallel stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Execution {
    /// Where batches run.
    pub backend: Backend,
    /// Worker count and batch size.
    pub plan: WorkPlan,
}

impl Execution {
    /// One worker on the calling thread.
    pub fn serial() -> Self {
        Self {
            backend: Backend::Threads,
            plan: WorkPlan::serial(),
        }
    }

    /// Rows per batch for a stage covering `total_rows`.
    pub fn rows_per_batch(&self, total_rows: usize) -> usize {
        self.plan.rows_per_batch(total_rows)
    }

    /// Runs `work` over `batches` on the selected backend.
    pub(crate) fn run<B, S, I, F>(&self, batches: Vec<B>, init: I, work: F) -> DepthResult<()>
    where
        B: Send,
        S: Send,
        I: Fn() -> DepthResult<S> + Sync + Send,
        F: Fn(&mut S, usize, B) -> DepthResult<()> + Sync + Send,
    {
        match self.backend {
            Backend::Threads => run_batches(&self.plan, batches, init, work),
            #[cfg(feature = "rayon")]
            Backend::Rayon => self::rayon::run_batches_par(&self.plan, batches, init, work),
            #[cfg(not(feature = "rayon"))]
            Backend::Rayon => Err(DepthError::NotSupported(
                "rayon backend requires the `rayon` feature",
            )),
        }
    }
}

/// Splits a row-major buffer into batches of `rows_per_batch` whole rows.
pub(crate) fn row_batches<T>(buf: &mut [T], row_len: usize, rows_per_batch: usize) -> Vec<&mut [T]> {
    buf.chunks_mut(row_len * rows_per_batch.max(1)).collect()
}

#[cfg(test)]
mod tests {
    use super::{row_batches, run_batches, BatchCursor, WorkPlan};
    use crate::util::DepthError;

    #[test]
    fn cursor_hands_out_each_batch_once() {
        let cursor = BatchCursor::new(3);
        assert_eq!(cursor.claim(), Some(0));
        assert_eq!(cursor.claim(), Some(1));
        assert_eq!(cursor.claim(), Some(2));
        assert_eq!(cursor.claim(), None);
    }

    #[test]
    fn cancelled_cursor_stops_claims() {
        let cursor = BatchCursor::new(5);
        cursor.claim();
        cursor.cancel();
        assert!(cursor.is_cancelled());
        assert_eq!(cursor.claim(), None);
    }

    #[test]
    fn single_worker_takes_whole_range() {
        let plan = WorkPlan::new(1, 3).unwrap();
        assert_eq!(plan.rows_per_batch(17), 17);
        let plan = WorkPlan::new(4, 3).unwrap();
        assert_eq!(plan.rows_per_batch(17), 3);
        assert_eq!(WorkPlan::new(2, 0), Err(DepthError::InvalidBatchSize));
    }

    #[test]
    fn every_row_is_written_exactly_once() {
        let width = 5;
        let height = 23;
        for threads in [1, 2, 7] {
            let plan = WorkPlan::new(threads, 2).unwrap();
            let rows = plan.rows_per_batch(height);
            let mut out = vec![0u32; width * height];
            let batches = row_batches(&mut out, width, rows);
            run_batches(
                &plan,
                batches,
                || Ok(()),
                |_, idx, batch: &mut [u32]| {
                    for (r, row) in batch.chunks_mut(width).enumerate() {
                        let y = idx * rows + r;
                        for v in row.iter_mut() {
                            *v += y as u32 + 1;
                        }
                    }
                    Ok(())
                },
            )
            .unwrap();
            for y in 0..height {
                assert!(out[y * width..(y + 1) * width]
                    .iter()
                    .all(|&v| v == y as u32 + 1));
            }
        }
    }

    #[test]
    fn scratch_failure_is_reported_once() {
        let plan = WorkPlan::new(4, 1).unwrap();
        let mut out = vec![0u8; 64];
        let batches = row_batches(&mut out, 4, 1);
        let err = run_batches(
            &plan,
            batches,
            || -> Result<(), DepthError> {
                Err(DepthError::AllocationFailed {
                    bytes: 1,
                    context: "scratch",
                })
            },
            |_, _, _batch: &mut [u8]| Ok(()),
        )
        .err()
        .unwrap();
        assert_eq!(
            err,
            DepthError::AllocationFailed {
                bytes: 1,
                context: "scratch"
            }
        );
        assert!(out.iter().all(|&v| v == 0));
    }

    fn panic_at_batch(threads: usize, bad: usize) -> Result<(), DepthError> {
        let plan = WorkPlan::new(threads, 1).unwrap();
        let mut out = vec![0u8; 12];
        let batches: Vec<&mut [u8]> = out.chunks_mut(1).collect();
        run_batches(
            &plan,
            batches,
            || Ok(()),
            move |_, idx, batch: &mut [u8]| {
                if idx == bad {
                    panic!("batch {idx} failed");
                }
                batch[0] = 1;
                Ok(())
            },
        )
    }

    #[test]
    fn panic_on_single_worker_is_reported() {
        assert_eq!(panic_at_batch(1, 4), Err(DepthError::WorkerPanicked));
    }

    #[test]
    fn panic_on_any_worker_is_reported() {
        // Batch 0 is claimed first, usually by the calling thread.
        for bad in [0, 5, 11] {
            assert_eq!(panic_at_batch(3, bad), Err(DepthError::WorkerPanicked));
        }
    }

    #[test]
    fn work_error_cancels_remaining_batches() {
        let plan = WorkPlan::new(1, 1).unwrap();
        let mut out = vec![0u8; 10];
        let batches: Vec<&mut [u8]> = out.chunks_mut(1).collect();
        let err = run_batches(
            &plan,
            batches,
            || Ok(()),
            |_, idx, batch: &mut [u8]| {
                if idx == 3 {
                    return Err(DepthError::NotSupported("batch three"));
                }
                batch[0] = 1;
                Ok(())
            },
        )
        .err()
        .unwrap();
        assert_eq!(err, DepthError::NotSupported("batch three"));
        assert_eq!(&out[..3], &[1, 1, 1]);
        assert!(out[3..].iter().all(|&v| v == 0));
    }
}
