//! Progress reporting for long-running batch and epoch loops.
//!
//! Sinks are purely observational: the algorithms call
//! [`ProgressSink::report`] and never depend on what the sink does with it.

use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// Receives `(current, total, label)` updates from batch and epoch loops.
///
/// Implementations must be cheap and thread-safe; the parallel parse reports
/// from worker threads.
pub trait ProgressSink: Send + Sync {
    fn report(&self, current: usize, total: usize, label: &str);
}

/// Sink that discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _current: usize, _total: usize, _label: &str) {}
}

/// Sink that logs through `tracing` every time another tenth of the work
/// completes.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, current: usize, total: usize, label: &str) {
        if crosses_decile(current, total) {
            info!(
                "{} {} / {} ({:.1}%)",
                label,
                current,
                total,
                percent_complete(current, total)
            );
        }
    }
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize, &str) + Send + Sync,
{
    fn report(&self, current: usize, total: usize, label: &str) {
        self(current, total, label)
    }
}

/// Returns the completion percentage (0.0 to 100.0); an empty batch is complete.
pub fn percent_complete(current: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        (current as f64 / total as f64) * 100.0
    }
}

fn crosses_decile(current: usize, total: usize) -> bool {
    if total == 0 || current >= total {
        return true;
    }
    let decile = |n: usize| n * 10 / total;
    current == 1 || decile(current) != decile(current.saturating_sub(1))
}

/// Shared completion counter for parallel work.
///
/// Each worker calls [`tick`](Self::tick) when its unit completes; the
/// counter forwards the new count to the sink.
pub struct ProgressCounter<'a> {
    completed: AtomicUsize,
    total: usize,
    label: &'a str,
    sink: &'a dyn ProgressSink,
}

impl<'a> ProgressCounter<'a> {
    pub fn new(total: usize, label: &'a str, sink: &'a dyn ProgressSink) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
            label,
            sink,
        }
    }

    /// Marks one unit complete and returns the new count.
    pub fn tick(&self) -> usize {
        let current = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        self.sink.report(current, self.total, self.label);
        current
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }
}
