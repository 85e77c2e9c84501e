//! Opt-in wall-clock timing for pipeline stages.
//!
//! Samples are kept per thread and only recorded while timing is enabled
//! (`--timing` or `NEURITE_TIMING=1`). The report aggregates samples by stage
//! name in first-seen order so it reads like the pipeline itself.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde_json::json;

/// Aggregated time spent in one named stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTiming {
    pub name: String,
    pub total: Duration,
    pub count: usize,
}

/// Stage timings in first-recorded order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimingReport {
    pub stages: Vec<StageTiming>,
}

thread_local! {
    static SAMPLES: RefCell<Vec<(String, Duration)>> = const { RefCell::new(Vec::new()) };
}

static TIMING_ENABLED: AtomicBool = AtomicBool::new(false);

/// Returns true when `NEURITE_TIMING` is set to `1`, `true`, `yes` or `on`.
#[must_use]
pub fn timing_enabled_from_env() -> bool {
    std::env::var("NEURITE_TIMING").ok().is_some_and(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

/// Enable or disable timing collection.
pub fn set_timing_enabled(enabled: bool) {
    TIMING_ENABLED.store(enabled, Ordering::Relaxed);
    if !enabled {
        clear_timings();
    }
}

#[must_use]
pub fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::Relaxed)
}

/// Clears all recorded samples for the current thread.
pub fn clear_timings() {
    SAMPLES.with(|samples| samples.borrow_mut().clear());
}

/// Run `f`, recording its duration under `name` when timing is enabled.
pub fn timed<R>(name: &str, f: impl FnOnce() -> R) -> R {
    if !is_timing_enabled() {
        return f();
    }

    let started = Instant::now();
    let result = f();
    let elapsed = started.elapsed();
    SAMPLES.with(|samples| samples.borrow_mut().push((name.to_string(), elapsed)));
    result
}

/// Drain this thread's samples into a report.
#[must_use]
pub fn collect_report() -> TimingReport {
    let samples = SAMPLES.with(|samples| std::mem::take(&mut *samples.borrow_mut()));

    let mut stages: Vec<StageTiming> = Vec::new();
    for (name, elapsed) in samples {
        if let Some(stage) = stages.iter_mut().find(|stage| stage.name == name) {
            stage.total += elapsed;
            stage.count += 1;
        } else {
            stages.push(StageTiming {
                name,
                total: elapsed,
                count: 1,
            });
        }
    }

    TimingReport { stages }
}

impl TimingReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let stages = self
            .stages
            .iter()
            .map(|stage| {
                json!({
                    "name": stage.name,
                    "count": stage.count,
                    "total_us": stage.total.as_micros(),
                })
            })
            .collect::<Vec<_>>();

        json!({ "stages": stages })
    }

    /// Plain table for stderr.
    #[must_use]
    pub fn display_table(&self) -> String {
        if self.stages.is_empty() {
            return "No timing samples recorded.".to_string();
        }

        let width = self
            .stages
            .iter()
            .map(|stage| stage.name.len())
            .max()
            .unwrap_or(5)
            .max(5);

        let mut out = format!("{:<width$}  {:>5}  {:>10}\n", "stage", "count", "total_us");
        for stage in &self.stages {
            out.push_str(&format!(
                "{:<width$}  {:>5}  {:>10}\n",
                stage.name,
                stage.count,
                stage.total.as_micros()
            ));
        }
        out
    }
}
