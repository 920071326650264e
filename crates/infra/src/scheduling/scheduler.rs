//! Scheduler facade: job registration, cancellation, and shutdown.
//!
//! Wraps a [`TriggerEngine`] with the job life-cycle machinery: each job
//! gets a fresh cancellation token and a watcher task; the tick callback
//! classifies the job's outcome and, on permanent failure, fires the token
//! so the watcher deregisters the job.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use tickflow_core::from_fn;
//! use tickflow_domain::JobOutcome;
//! use tickflow_infra::scheduling::Scheduler;
//!
//! # async fn example() -> tickflow_infra::scheduling::SchedulerResult<()> {
//! let scheduler = Scheduler::new();
//! let id = scheduler.start_job_every(
//!     Duration::from_secs(30),
//!     std::sync::Arc::new(from_fn(|| async { JobOutcome::Success })),
//! )?;
//!
//! // ... application runs ...
//! scheduler.stop_job(&id.to_string())?;
//! scheduler.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tickflow_core::{PeriodicJob, TickCallback, TriggerEngine};
use tickflow_domain::{JobId, JobOutcome};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::observability::{MetricsResult, SchedulerMetrics};
use crate::scheduling::error::{SchedulerError, SchedulerResult};
use crate::scheduling::registry::ActiveJobs;
use crate::scheduling::tick_engine::TickEngine;

/// In-process periodic job scheduler.
///
/// Created once and destroyed via [`Scheduler::shutdown`]. The engine
/// handle doubles as the shutdown guard: once taken, the scheduler accepts
/// no new jobs and further shutdowns are no-ops.
pub struct Scheduler {
    engine: Mutex<Option<Arc<dyn TriggerEngine>>>,
    registry: Arc<ActiveJobs>,
    metrics: Arc<SchedulerMetrics>,
}

impl Scheduler {
    /// Create a scheduler backed by a [`TickEngine`] and start it
    /// immediately.
    pub fn new() -> Arc<Self> {
        Self::with_engine(Arc::new(TickEngine::new()), None)
    }

    /// Like [`Scheduler::new`], additionally linking the scheduler's
    /// lifetime to `parent`: when the token fires, [`Scheduler::shutdown`]
    /// runs exactly once. No other side effects.
    pub fn with_parent(parent: CancellationToken) -> Arc<Self> {
        Self::with_engine(Arc::new(TickEngine::new()), Some(parent))
    }

    /// Create a scheduler over an injected engine, starting it immediately.
    pub fn with_engine(
        engine: Arc<dyn TriggerEngine>,
        parent: Option<CancellationToken>,
    ) -> Arc<Self> {
        engine.start();

        let scheduler = Arc::new(Self {
            engine: Mutex::new(Some(engine)),
            registry: Arc::new(ActiveJobs::new()),
            metrics: Arc::new(SchedulerMetrics::new()),
        });

        if let Some(parent) = parent {
            let target = Arc::clone(&scheduler);
            tokio::spawn(async move {
                parent.cancelled().await;
                if let Err(err) = target.shutdown().await {
                    warn!(error = %err, "shutdown triggered by parent cancellation failed");
                }
            });
        }

        scheduler
    }

    /// Schedule `job` to run every `every`, returning the identifier used
    /// to stop it.
    ///
    /// The first invocation fires after one full interval, not immediately.
    /// When the job reports a permanent failure it is unscheduled and never
    /// runs again under this identifier.
    ///
    /// # Errors
    ///
    /// Defensive only: a zero interval or a scheduler that has already shut
    /// down. Registration itself always succeeds.
    pub fn start_job_every(
        &self,
        every: Duration,
        job: Arc<dyn PeriodicJob>,
    ) -> SchedulerResult<JobId> {
        if every.is_zero() {
            return Err(SchedulerError::InvalidInterval);
        }
        let engine = self.engine.lock().clone().ok_or(SchedulerError::NotRunning)?;

        let token = CancellationToken::new();
        let id = engine.schedule(every, self.classified_tick(job, token.clone()));
        self.registry.register(id, token.clone());
        log_metric(self.metrics.record_job_registered(), "scheduler.job.registered");

        // Watcher: parks until the token fires (stop_job, permanent failure,
        // or shutdown), then deregisters the job.
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            token.cancelled().await;
            debug!(job_id = %id, "job cancelled, removing it from the schedule");
            engine.remove(id);
            registry.remove(id);
        });

        Ok(id)
    }

    /// Stop the job from being run in the future.
    ///
    /// Parses the textual identifier and cancels the matching token, if
    /// any. Stopping an already-stopped or never-issued job is a no-op; a
    /// currently executing invocation is not interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidJobId`] when `job_id` is not a
    /// numeric identifier.
    pub fn stop_job(&self, job_id: &str) -> SchedulerResult<()> {
        let id: JobId = job_id.parse()?;
        if self.registry.cancel(id) {
            log_metric(self.metrics.record_job_cancelled(), "scheduler.job.cancelled");
        }
        Ok(())
    }

    /// Stop the trigger engine and wait for it to drain; afterwards no
    /// further ticks fire and no invocation is in flight.
    ///
    /// Idempotent: shutting down an already shut down scheduler is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::DrainFailed`] when the engine fails to
    /// drain cleanly. Cancellation-class drain results count as success.
    pub async fn shutdown(&self) -> SchedulerResult<()> {
        let engine = self.engine.lock().take();
        let Some(engine) = engine else {
            return Ok(());
        };

        debug!("stopping scheduler");
        let drained = engine.stop().wait().await;

        let cancelled = self.registry.cancel_all();
        if cancelled > 0 {
            debug!(jobs = cancelled, "cancelled remaining active jobs");
        }

        match drained {
            Ok(()) => Ok(()),
            Err(err) if err.is_cancellation() => Ok(()),
            Err(err) => Err(SchedulerError::DrainFailed { source: err }),
        }
    }

    /// Snapshot of the currently registered job identifiers.
    pub fn active_jobs(&self) -> Vec<JobId> {
        self.registry.ids()
    }

    /// Scheduler counters and tick timing.
    pub fn metrics(&self) -> &SchedulerMetrics {
        &self.metrics
    }

    /// Wrap `job` in the outcome-classifying tick callback.
    ///
    /// Success and transient failures leave the job scheduled; a permanent
    /// failure fires the job's token, which terminates it.
    fn classified_tick(&self, job: Arc<dyn PeriodicJob>, cancel: CancellationToken) -> TickCallback {
        let metrics = Arc::clone(&self.metrics);
        Arc::new(move || {
            let job = Arc::clone(&job);
            let cancel = cancel.clone();
            let metrics = Arc::clone(&metrics);
            Box::pin(async move {
                let started = Instant::now();
                log_metric(metrics.record_tick(), "scheduler.job.tick");

                match job.run().await {
                    JobOutcome::Success => {}
                    JobOutcome::Transient(err) => {
                        log_metric(
                            metrics.record_transient_failure(),
                            "scheduler.job.transient_failure",
                        );
                        error!(error = %err, "job returned an error, it will be rescheduled");
                    }
                    JobOutcome::Permanent(err) => {
                        log_metric(
                            metrics.record_permanent_failure(),
                            "scheduler.job.permanent_failure",
                        );
                        error!(error = %err, "job returned a permanent error, it will be stopped");
                        cancel.cancel();
                    }
                }

                log_metric(
                    metrics.record_tick_duration(started.elapsed()),
                    "scheduler.job.duration",
                );
            })
        })
    }
}

fn log_metric(result: MetricsResult<()>, metric: &'static str) {
    if let Err(err) = result {
        warn!(metric = metric, error = ?err, "Failed to record scheduler metric");
    }
}

/// Best-effort cleanup when dropped without an explicit shutdown.
impl Drop for Scheduler {
    fn drop(&mut self) {
        if self.engine.lock().is_some() {
            warn!("Scheduler dropped while running; cancelling active jobs");
            self.registry.cancel_all();
        }
    }
}
