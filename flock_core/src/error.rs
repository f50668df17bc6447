//! Error types for flock construction and control commands.
//!
//! The per-tick path has no recoverable errors. Everything here is raised
//! either while building a [`Flock`](crate::Flock) or while applying a
//! [`ControlCommand`](crate::ControlCommand) between ticks.

use thiserror::Error;

/// Errors that can occur while configuring or steering a flock.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FlockError {
    /// Grid cell size must be finite and strictly positive
    #[error("Invalid grid cell size: {0}")]
    InvalidCellSize(f64),

    /// Tick rate must be finite and strictly positive
    #[error("Invalid tick rate: {0} Hz")]
    InvalidTickRate(f64),

    /// Worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// A drone referenced a program that is not registered with the flock
    #[error("Unknown program: {0}")]
    UnknownProgram(usize),

    /// Drone index out of range
    #[error("Unknown drone: {0}")]
    UnknownDrone(usize),

    /// Rule index out of range for the addressed program
    #[error("Unknown rule {rule} in program {program}")]
    UnknownRule {
        /// Program index
        program: usize,
        /// Rule index within the program
        rule: usize,
    },

    /// The addressed rule does not carry the parameter being set
    #[error("Rule {rule} is a {actual} rule, expected {expected}")]
    RuleMismatch {
        /// Rule index within the program
        rule: usize,
        /// Variant name of the rule found at that index
        actual: &'static str,
        /// Variant name(s) the command can be applied to
        expected: &'static str,
    },
}

impl FlockError {
    /// Creates a thread pool error.
    pub fn thread_pool(msg: impl std::fmt::Display) -> Self {
        Self::ThreadPool(msg.to_string())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, FlockError>;
