//! Per-stage timing collection.
//!
//! A [`StageMetrics`] instance is created by the caller and passed into each
//! stage of a run, so concurrent runs never share timing state. Stages are
//! keyed by name and accumulate call count, total and maximum duration.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::debug;

/// Accumulated timings of one named stage.
#[derive(Debug, Clone, Default)]
struct StageData {
    count: u64,
    total: Duration,
    max: Duration,
}

impl StageData {
    fn record(&mut self, elapsed: Duration) {
        self.count += 1;
        self.total += elapsed;
        self.max = self.max.max(elapsed);
    }
}

/// Point-in-time view of one stage's timings.
#[derive(Debug, Clone, PartialEq)]
pub struct StageTiming {
    pub stage: String,
    pub count: u64,
    pub total_ms: f64,
    pub max_ms: f64,
}

impl StageTiming {
    /// Average duration per call in milliseconds.
    pub fn avg_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ms / self.count as f64
        }
    }
}

/// Thread-safe collector of stage timings.
#[derive(Debug, Default)]
pub struct StageMetrics {
    stages: RwLock<HashMap<String, StageData>>,
}

impl StageMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed call of `stage`.
    pub fn record(&self, stage: &str, elapsed: Duration) {
        // A poisoned lock only means another recorder panicked; the counters
        // themselves are still consistent.
        let mut stages = self
            .stages
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        stages.entry(stage.to_string()).or_default().record(elapsed);
    }

    /// Runs `f`, recording its wall time under `stage`.
    pub fn time<T>(&self, stage: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        self.record(stage, start.elapsed());
        result
    }

    /// Snapshot of all stages, longest total time first.
    pub fn snapshot(&self) -> Vec<StageTiming> {
        let stages = self
            .stages
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut timings: Vec<StageTiming> = stages
            .iter()
            .map(|(stage, data)| StageTiming {
                stage: stage.clone(),
                count: data.count,
                total_ms: data.total.as_secs_f64() * 1000.0,
                max_ms: data.max.as_secs_f64() * 1000.0,
            })
            .collect();
        timings.sort_by(|a, b| {
            b.total_ms
                .partial_cmp(&a.total_ms)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.stage.cmp(&b.stage))
        });
        timings
    }

    /// Logs every stage at debug level.
    pub fn log_summary(&self) {
        for timing in self.snapshot() {
            debug!(
                "Stage {}: {} calls, {:.3}ms max, {:.3}ms avg, {:.3}ms total",
                timing.stage,
                timing.count,
                timing.max_ms,
                timing.avg_ms(),
                timing.total_ms
            );
        }
    }

    pub fn clear(&self) {
        self.stages
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}
