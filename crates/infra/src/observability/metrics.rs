//! Scheduler metrics: counters and tick timing.
//!
//! ## Design
//! - **VecDeque ring buffer** for O(1) eviction of tick-duration samples
//! - **Poison-safe locking** with explicit match pattern (no .expect())
//! - **SeqCst ordering** for counters that feed derived metrics

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::observability::{MetricsError, MetricsResult};

/// Maximum number of tick-duration samples retained.
const TICK_SAMPLE_CAPACITY: usize = 1000;

/// Metrics for scheduler life-cycle events and job invocations.
///
/// All record methods return `MetricsResult<()>` for future extensibility
/// but currently always succeed.
#[derive(Debug)]
pub struct SchedulerMetrics {
    /// Jobs registered over the scheduler's lifetime
    pub jobs_registered: AtomicUsize,
    /// Jobs cancelled through `stop_job`
    pub jobs_cancelled: AtomicUsize,
    /// Total job invocations
    pub ticks: AtomicUsize,
    /// Invocations that reported a transient failure
    pub transient_failures: AtomicUsize,
    /// Invocations that reported a permanent failure
    pub permanent_failures: AtomicUsize,
    /// Individual tick durations in milliseconds (ring buffer)
    tick_times: Mutex<VecDeque<u64>>,
}

impl Default for SchedulerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerMetrics {
    /// Create a new metrics instance with all counters at zero.
    pub fn new() -> Self {
        Self {
            jobs_registered: AtomicUsize::new(0),
            jobs_cancelled: AtomicUsize::new(0),
            ticks: AtomicUsize::new(0),
            transient_failures: AtomicUsize::new(0),
            permanent_failures: AtomicUsize::new(0),
            tick_times: Mutex::new(VecDeque::with_capacity(TICK_SAMPLE_CAPACITY)),
        }
    }

    /// Record a job registration.
    pub fn record_job_registered(&self) -> MetricsResult<()> {
        self.jobs_registered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Record a job cancellation requested through `stop_job`.
    pub fn record_job_cancelled(&self) -> MetricsResult<()> {
        self.jobs_cancelled.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Record one job invocation.
    pub fn record_tick(&self) -> MetricsResult<()> {
        self.ticks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Record a transient job failure.
    pub fn record_transient_failure(&self) -> MetricsResult<()> {
        self.transient_failures.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Record a permanent job failure.
    pub fn record_permanent_failure(&self) -> MetricsResult<()> {
        self.permanent_failures.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Store one tick duration sample.
    ///
    /// Maintains a ring buffer of the last [`TICK_SAMPLE_CAPACITY`] samples.
    pub fn record_tick_duration(&self, duration: Duration) -> MetricsResult<()> {
        let ms = duration.as_millis() as u64;
        let mut samples = self.lock_samples();
        if samples.len() >= TICK_SAMPLE_CAPACITY {
            samples.pop_front();
        }
        samples.push_back(ms);
        Ok(())
    }

    /// Average tick duration in milliseconds.
    pub fn average_tick_ms(&self) -> MetricsResult<f64> {
        let samples = self.lock_samples();
        if samples.is_empty() {
            return Err(MetricsError::EmptyData { metric: "average" });
        }
        let total: u64 = samples.iter().sum();
        Ok(total as f64 / samples.len() as f64)
    }

    /// P95 tick duration in milliseconds.
    pub fn p95_tick_ms(&self) -> MetricsResult<u64> {
        let samples = self.lock_samples();
        if samples.is_empty() {
            return Err(MetricsError::EmptyData { metric: "P95" });
        }
        let mut sorted: Vec<u64> = samples.iter().copied().collect();
        sorted.sort_unstable();
        let rank = ((sorted.len() as f64) * 0.95).ceil() as usize;
        Ok(sorted[rank.saturating_sub(1)])
    }

    fn lock_samples(&self) -> std::sync::MutexGuard<'_, VecDeque<u64>> {
        match self.tick_times.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Tick time mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}
