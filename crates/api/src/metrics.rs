use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use workflow::{Error, RunOutcome, StepName, StepRecord, StepStatus};

const STEPS: [StepName; 5] = [
    StepName::Ingest,
    StepName::Predict,
    StepName::Allocate,
    StepName::PersistConfirm,
    StepName::Report,
];

#[derive(Default)]
struct StepTiming {
    runs: AtomicUsize,
    total_time_us: AtomicU64,
}

pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,
    pipeline_runs: AtomicUsize,
    failed_runs: AtomicUsize,

    // Timing (in microseconds)
    total_request_time_us: AtomicU64,
    total_pipeline_time_us: AtomicU64,
    steps: [StepTiming; 5],
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_requests: AtomicUsize::new(0),
            successful_requests: AtomicUsize::new(0),
            failed_requests: AtomicUsize::new(0),
            pipeline_runs: AtomicUsize::new(0),
            failed_runs: AtomicUsize::new(0),
            total_request_time_us: AtomicU64::new(0),
            total_pipeline_time_us: AtomicU64::new(0),
            steps: Default::default(),
        })
    }

    pub fn record_request(&self, success: bool, duration: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_request_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_run(&self, outcome: &RunOutcome, duration: Duration) {
        self.pipeline_runs.fetch_add(1, Ordering::Relaxed);
        self.total_pipeline_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.record_steps(&outcome.steps);
    }

    /// Counts the run as failed and keeps the timings of the steps that ran.
    pub fn record_failed_run(&self, err: &Error, duration: Duration) {
        self.pipeline_runs.fetch_add(1, Ordering::Relaxed);
        self.failed_runs.fetch_add(1, Ordering::Relaxed);
        self.total_pipeline_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.record_steps(err.step_records());
    }

    fn record_steps(&self, records: &[StepRecord]) {
        // Pending steps never started.
        for step in records.iter().filter(|s| s.status != StepStatus::Pending) {
            let timing = &self.steps[step_index(step.name)];
            timing.runs.fetch_add(1, Ordering::Relaxed);
            timing
                .total_time_us
                .fetch_add(step.duration_us, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let avg_step_time_ms = STEPS
            .iter()
            .map(|&step| {
                let timing = &self.steps[step_index(step)];
                (
                    step.as_str(),
                    avg_time_ms(&timing.total_time_us, timing.runs.load(Ordering::Relaxed)),
                )
            })
            .collect();

        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            pipeline_runs: self.pipeline_runs.load(Ordering::Relaxed),
            failed_runs: self.failed_runs.load(Ordering::Relaxed),
            avg_request_time_ms: avg_time_ms(
                &self.total_request_time_us,
                self.total_requests.load(Ordering::Relaxed),
            ),
            avg_pipeline_time_ms: avg_time_ms(
                &self.total_pipeline_time_us,
                self.pipeline_runs.load(Ordering::Relaxed),
            ),
            avg_step_time_ms,
        }
    }
}

fn step_index(step: StepName) -> usize {
    STEPS.iter().position(|&s| s == step).unwrap_or(0)
}

fn avg_time_ms(total_us: &AtomicU64, count: usize) -> f64 {
    let total = total_us.load(Ordering::Relaxed) as f64;
    if count > 0 {
        total / count as f64 / 1000.0 // Convert to ms
    } else {
        0.0
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub pipeline_runs: usize,
    pub failed_runs: usize,
    pub avg_request_time_ms: f64,
    pub avg_pipeline_time_ms: f64,
    pub avg_step_time_ms: BTreeMap<&'static str, f64>,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
