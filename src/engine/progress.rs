//! Progress reporting: an opt-in counter-style indicator fed by the dedup workers.
//!
//! Workers call [`Progress::tick`] once per record processed (not just distinct ones).
//! Updates to the underlying bar are batched so a contended progress bar never stalls a
//! worker on the hot path — only every `PROGRESS_UPDATE_BATCH_SIZE`th tick attempts the
//! (non-blocking) bar update.

use crate::utils::config::ProgressConsts;
use kdam::{Bar, BarExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A progress indicator, or a no-op when the run isn't verbose.
pub enum Progress {
    Enabled { bar: Mutex<Bar>, counter: AtomicUsize },
    Disabled,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            return Progress::Disabled;
        }
        let bar = kdam::tqdm!(total = 0, desc = "deduping", unit = " records");
        Progress::Enabled { bar: Mutex::new(bar), counter: AtomicUsize::new(0) }
    }

    /// Record that one more input record was processed. Cheap when disabled (a branch) and
    /// cheap when enabled (an atomic increment plus an occasional non-blocking bar update).
    pub fn tick(&self) {
        let (bar, counter) = match self {
            Progress::Disabled => return,
            Progress::Enabled { bar, counter } => (bar, counter),
        };
        let prev = counter.fetch_add(1, Ordering::Relaxed);
        if (prev + 1).is_multiple_of(ProgressConsts::PROGRESS_UPDATE_BATCH_SIZE) {
            if let Ok(mut bar) = bar.try_lock() {
                let _ = bar.update(ProgressConsts::PROGRESS_UPDATE_BATCH_SIZE);
            }
        }
    }

    /// Flush whatever ticks haven't yet been folded into the bar (the remainder of the
    /// last partial batch). Call once after all workers have joined.
    pub fn finish(&self) {
        let (bar, counter) = match self {
            Progress::Disabled => return,
            Progress::Enabled { bar, counter } => (bar, counter),
        };
        let total = counter.load(Ordering::Relaxed);
        let remainder = total % ProgressConsts::PROGRESS_UPDATE_BATCH_SIZE;
        if let Ok(mut bar) = bar.lock() {
            if remainder > 0 {
                let _ = bar.update(remainder);
            }
            let _ = bar.refresh();
        }
    }
}
