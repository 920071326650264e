//! Periodic job abstraction.

use std::future::Future;

use async_trait::async_trait;
use tickflow_domain::JobOutcome;

/// A unit of periodic work.
///
/// The job reports its result as a [`JobOutcome`] value; it must not panic
/// and must not block indefinitely (a blocked invocation delays the next
/// tick and can hold up shutdown).
#[async_trait]
pub trait PeriodicJob: Send + Sync {
    /// Execute one invocation.
    async fn run(&self) -> JobOutcome;
}

/// [`PeriodicJob`] backed by a plain async closure.
pub struct FnJob<F> {
    f: F,
}

/// Adapt an async closure into a [`PeriodicJob`].
pub fn from_fn<F, Fut>(f: F) -> FnJob<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = JobOutcome> + Send + 'static,
{
    FnJob { f }
}

#[async_trait]
impl<F, Fut> PeriodicJob for FnJob<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = JobOutcome> + Send + 'static,
{
    async fn run(&self) -> JobOutcome {
        (self.f)().await
    }
}
