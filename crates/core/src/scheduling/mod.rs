//! Scheduling abstractions: the trigger-engine port and the job trait.

pub mod job;
pub mod ports;

pub use job::{from_fn, FnJob, PeriodicJob};
pub use ports::{DrainSignal, EngineError, TickCallback, TickFuture, TriggerEngine};
