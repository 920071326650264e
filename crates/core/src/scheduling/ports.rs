//! Trigger-engine port.
//!
//! The scheduler facade drives periodic work through this seam. An engine
//! owns wall-clock timing and invocation: it fires each registered callback
//! once per interval until the entry is removed or the engine is stopped.
//! The default implementation lives in `tickflow-infra`.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;
use tickflow_domain::JobId;
use tokio::sync::oneshot;

/// Future driven by the engine for a single tick.
pub type TickFuture = BoxFuture<'static, ()>;

/// Callback invoked once per interval tick.
pub type TickCallback = Arc<dyn Fn() -> TickFuture + Send + Sync>;

/// Failure reported by an engine drain.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The drain observed ordinary cancellation. Not a real failure; the
    /// facade maps it to success.
    #[error("trigger engine drain observed cancellation")]
    Cancelled,

    /// A scheduled task panicked before the drain could join it.
    #[error("scheduled task panicked: {0}")]
    TaskPanicked(String),
}

impl EngineError {
    /// True for cancellation-class completions, which count as a clean
    /// shutdown.
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// One-shot completion signal returned by [`TriggerEngine::stop`].
///
/// Resolves once every in-flight invocation has returned.
#[derive(Debug)]
pub struct DrainSignal {
    rx: oneshot::Receiver<Result<(), EngineError>>,
}

impl DrainSignal {
    /// Wrap a receiver whose sender resolves when the drain completes.
    pub fn new(rx: oneshot::Receiver<Result<(), EngineError>>) -> Self {
        Self { rx }
    }

    /// A signal that is already resolved with `result`.
    pub fn resolved(result: Result<(), EngineError>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self { rx }
    }

    /// Wait for the drain to complete.
    ///
    /// A drain task that disappears without resolving counts as
    /// cancellation.
    pub async fn wait(self) -> Result<(), EngineError> {
        self.rx.await.unwrap_or(Err(EngineError::Cancelled))
    }
}

/// Periodic-trigger engine contract.
///
/// Implementations must invoke distinct entries concurrently but never
/// overlap two ticks of the same entry, and must emit the first tick only
/// after one full interval has elapsed.
pub trait TriggerEngine: Send + Sync {
    /// Make the engine live; it starts accepting schedules and firing ticks.
    fn start(&self);

    /// Stop ticking and return a signal that resolves once all in-flight
    /// invocations finish.
    fn stop(&self) -> DrainSignal;

    /// Register `tick` to fire every `every`, returning the engine-assigned
    /// entry identifier.
    fn schedule(&self, every: Duration, tick: TickCallback) -> JobId;

    /// Deregister an entry. A running invocation completes; no further ticks
    /// fire. Removing an unknown entry is a no-op.
    fn remove(&self, id: JobId);

    /// Identifiers of the currently registered entries.
    fn entries(&self) -> Vec<JobId>;
}
