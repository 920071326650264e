//! Domain data types for job scheduling.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed error payload carried by job outcomes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Opaque handle identifying one scheduled job for its lifetime.
///
/// Identifiers are assigned by the trigger engine (starting at 1) and
/// round-trip through their decimal textual form, which is the shape callers
/// pass back to `stop_job`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    /// Wrap a raw engine-assigned identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric identifier.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = ParseJobIdError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(Self)
            .map_err(|source| ParseJobIdError { given: s.to_string(), source })
    }
}

/// A job identifier string that does not parse to a numeric id.
#[derive(Debug, Error)]
#[error("failed to convert job id {given:?} to a numeric id")]
pub struct ParseJobIdError {
    /// The string handed to the parser.
    pub given: String,
    /// Underlying integer parse failure.
    #[source]
    pub source: ParseIntError,
}

/// Marks an underlying error as terminal for the job that returns it.
///
/// Displays the wrapped error's message unchanged.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct PermanentError {
    #[source]
    source: BoxError,
}

impl PermanentError {
    /// Wrap `err`, marking the outcome terminal.
    pub fn new(err: impl Into<BoxError>) -> Self {
        Self { source: err.into() }
    }

    /// Unwrap the underlying error.
    pub fn into_inner(self) -> BoxError {
        self.source
    }
}

/// Tagged result of one job invocation.
///
/// The variant, not the error's content, decides whether the job stays
/// scheduled: `Transient` is retried on the next natural tick, `Permanent`
/// unschedules the job.
#[derive(Debug)]
pub enum JobOutcome {
    /// The invocation completed; the job stays scheduled.
    Success,
    /// Recoverable failure; the job is retried on the next tick.
    Transient(BoxError),
    /// Terminal failure; the job receives no further ticks.
    Permanent(BoxError),
}

impl JobOutcome {
    /// Recoverable failure outcome.
    pub fn transient(err: impl Into<BoxError>) -> Self {
        Self::Transient(err.into())
    }

    /// Terminal failure outcome.
    pub fn permanent(err: impl Into<BoxError>) -> Self {
        Self::Permanent(err.into())
    }

    /// Map a plain `Result` to an outcome, treating any error as transient.
    pub fn from_result<E>(result: std::result::Result<(), E>) -> Self
    where
        E: Into<BoxError>,
    {
        match result {
            Ok(()) => Self::Success,
            Err(err) => Self::Transient(err.into()),
        }
    }

    /// True for [`JobOutcome::Success`].
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// True for [`JobOutcome::Transient`].
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// True for [`JobOutcome::Permanent`].
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }
}

impl From<PermanentError> for JobOutcome {
    fn from(err: PermanentError) -> Self {
        Self::Permanent(err.into_inner())
    }
}
