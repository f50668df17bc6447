//! Error types for the simulation harness.

use flock_core::FlockError;
use thiserror::Error;

/// Errors raised while setting up, running or exporting a scenario.
#[derive(Debug, Error)]
pub enum SimError {
    /// The engine rejected the configuration or a command
    #[error("Flock error: {0}")]
    Flock(#[from] FlockError),

    /// Scenario needs a larger population
    #[error("Scenario {scenario} needs at least {required} drones, got {actual}")]
    PopulationTooSmall {
        scenario: &'static str,
        required: usize,
        actual: usize,
    },

    /// Export file could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Export could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias for the harness.
pub type Result<T> = std::result::Result<T, SimError>;
