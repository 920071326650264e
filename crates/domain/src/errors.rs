//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Tickflow
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum TickflowError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Scheduling error: {0}")]
    Scheduling(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Tickflow operations
pub type Result<T> = std::result::Result<T, TickflowError>;
