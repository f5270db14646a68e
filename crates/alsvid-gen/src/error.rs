//! Error types for circuit generation.

use alsvid_circuit::CircuitError;
use alsvid_code::Coord;
use thiserror::Error;

/// Errors produced while assembling a memory circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenError {
    /// At least one syndrome-extraction round is required.
    #[error("need rounds >= 1, got {rounds}")]
    InvalidRounds {
        /// The rejected round count.
        rounds: usize,
    },

    /// Shell-boundary circuits are not implemented.
    #[error("shell boundary circuits are not implemented")]
    ShellUnsupported,

    /// The patch's super-stabilisers reference a gauge it does not hold.
    #[error("super-stabiliser references gauge {coord} absent from the patch")]
    MissingGauge {
        /// The stale gauge key.
        coord: Coord,
    },

    /// Measurement-record bookkeeping failed.
    #[error(transparent)]
    Record(#[from] CircuitError),
}

/// Result type for circuit generation.
pub type GenResult<T> = Result<T, GenError>;
