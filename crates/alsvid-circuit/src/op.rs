//! Operation names understood by the circuit sink.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A circuit operation.
///
/// The set covers exactly what syndrome-extraction emission needs: resets,
/// measurements, the two Cliffords, the noise channels, and the stim
/// annotations (`QUBIT_COORDS`, `DETECTOR`, `OBSERVABLE_INCLUDE`,
/// `SHIFT_COORDS`, `TICK`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Op {
    /// Declare the lattice position of a qubit index.
    QubitCoords,
    /// Time-step separator.
    Tick,
    /// Reset into the X basis.
    RX,
    /// Reset into the Z basis.
    RZ,
    /// Measure in the X basis.
    MX,
    /// Measure in the Z basis.
    MZ,
    /// Measure and reset in the X basis.
    MRX,
    /// Measure and reset in the Z basis.
    MRZ,
    /// Hadamard.
    H,
    /// Controlled-NOT (control first, target second in the target list).
    CNOT,
    /// Single-qubit depolarising channel.
    Depolarize1,
    /// Two-qubit depolarising channel (targets are consumed in pairs).
    Depolarize2,
    /// Probabilistic X error.
    XError,
    /// Probabilistic Z error.
    ZError,
    /// Parity check over measurement-record targets.
    Detector,
    /// Fold measurement-record targets into a logical observable.
    ObservableInclude,
    /// Shift the coordinate frame of subsequent annotations.
    ShiftCoords,
}

impl Op {
    /// The canonical stim mnemonic.
    pub fn name(self) -> &'static str {
        match self {
            Op::QubitCoords => "QUBIT_COORDS",
            Op::Tick => "TICK",
            Op::RX => "RX",
            Op::RZ => "RZ",
            Op::MX => "MX",
            Op::MZ => "MZ",
            Op::MRX => "MRX",
            Op::MRZ => "MRZ",
            Op::H => "H",
            Op::CNOT => "CNOT",
            Op::Depolarize1 => "DEPOLARIZE1",
            Op::Depolarize2 => "DEPOLARIZE2",
            Op::XError => "X_ERROR",
            Op::ZError => "Z_ERROR",
            Op::Detector => "DETECTOR",
            Op::ObservableInclude => "OBSERVABLE_INCLUDE",
            Op::ShiftCoords => "SHIFT_COORDS",
        }
    }

    /// Whether this operation appends to the measurement record.
    pub fn is_measurement(self) -> bool {
        matches!(self, Op::MX | Op::MZ | Op::MRX | Op::MRZ)
    }

    /// Whether this operation is a noise channel.
    pub fn is_noise(self) -> bool {
        matches!(
            self,
            Op::Depolarize1 | Op::Depolarize2 | Op::XError | Op::ZError
        )
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
