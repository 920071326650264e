//! Scheduler error types

use thiserror::Error;
use tickflow_core::EngineError;
use tickflow_domain::{ParseJobIdError, TickflowError};

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Scheduler has been shut down
    #[error("Scheduler not running")]
    NotRunning,

    /// Job interval must be greater than zero
    #[error("Job interval must be greater than zero")]
    InvalidInterval,

    /// Malformed job identifier passed to `stop_job`
    #[error("Invalid job id: {source}")]
    InvalidJobId {
        #[from]
        source: ParseJobIdError,
    },

    /// Trigger engine failed to drain cleanly during shutdown
    #[error("Trigger engine failed to drain: {source}")]
    DrainFailed {
        #[from]
        source: EngineError,
    },
}

impl From<SchedulerError> for TickflowError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::NotRunning
            | SchedulerError::InvalidInterval
            | SchedulerError::InvalidJobId { .. } => Self::InvalidInput(err.to_string()),
            SchedulerError::DrainFailed { .. } => Self::Internal(err.to_string()),
        }
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
