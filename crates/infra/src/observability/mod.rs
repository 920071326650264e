//! Observability infrastructure for scheduler metrics and logging.
//!
//! Lifecycle events and job failures are logged through `tracing`; this
//! module adds thread-safe counters and tick-duration aggregates.
//!
//! All record methods return `MetricsResult<()>` for future extensibility
//! (quotas, cardinality limits), but currently always succeed.

pub mod metrics;

pub use metrics::SchedulerMetrics;

/// Metrics error type
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Empty data set - cannot calculate aggregate metric
    #[error("Empty data: cannot calculate {metric}")]
    EmptyData {
        /// Metric name that failed (e.g., "average", "P95")
        metric: &'static str,
    },
}

/// Result type for metrics operations
pub type MetricsResult<T> = Result<T, MetricsError>;
