//! Scheduling infrastructure for periodic background work
//!
//! This module provides the job life-cycle and cancellation engine:
//! - Trigger engine (interval ticking with drain-on-stop)
//! - Cancellation registry (job id -> cancellation token)
//! - Scheduler facade (start job, stop job, shutdown)
//!
//! All components follow explicit lifecycle management: join handles are
//! tracked, cancellation is token-based, and shutdown drains in-flight
//! invocations before returning.

pub mod error;
pub mod registry;
pub mod scheduler;
pub mod tick_engine;

pub use error::{SchedulerError, SchedulerResult};
pub use registry::ActiveJobs;
pub use scheduler::Scheduler;
pub use tick_engine::TickEngine;
