//! Error types for the circuit crate.

use thiserror::Error;

/// Errors that can occur while assembling a circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CircuitError {
    /// A detector referenced a descriptor that was never measured.
    #[error("no measurement recorded for descriptor {0}")]
    UnknownMeasurement(String),

    /// A detector looked further back than the descriptor's history.
    #[error("lookback {lookback} out of range (descriptor measured {have} times)")]
    LookbackOutOfRange {
        /// How many times the descriptor has been measured.
        have: usize,
        /// The requested lookback index.
        lookback: isize,
    },
}

/// Result type for circuit operations.
pub type CircuitResult<T> = Result<T, CircuitError>;
