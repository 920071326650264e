//! # Tickflow Core
//!
//! Pure scheduling logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits)
//! - The periodic job abstraction
//!
//! ## Architecture Principles
//! - Only depends on `tickflow-domain`
//! - No timer, runtime-management, or platform code
//! - All external dependencies via traits

pub mod scheduling;

// Re-export specific items to avoid ambiguity
pub use scheduling::job::{from_fn, FnJob, PeriodicJob};
pub use scheduling::ports::{DrainSignal, EngineError, TickCallback, TickFuture, TriggerEngine};
