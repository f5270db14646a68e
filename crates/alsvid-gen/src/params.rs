//! Noise-parameter bundle and noisy append helpers.

use alsvid_circuit::{Circuit, Op};
use alsvid_code::Basis;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Configuration for memory-circuit generation.
///
/// All probabilities default to zero; qubits marked as sitting in a
/// burst-error region receive [`burst_errors_depolarization`]
/// (`Self::burst_errors_depolarization`) instead of the nominal
/// depolarisation wherever one applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitGenParameters {
    /// Number of syndrome-extraction rounds (must be at least one).
    pub rounds: usize,
    /// Depolarisation applied after every Clifford gate.
    pub after_clifford_depolarization: f64,
    /// Depolarisation applied to data qubits at the start of each round.
    pub before_round_data_depolarization: f64,
    /// Anti-basis flip probability before each measurement.
    pub before_measure_flip_probability: f64,
    /// Anti-basis flip probability after each reset.
    pub after_reset_flip_probability: f64,
    /// Depolarisation applied to burst-error qubits wherever the nominal
    /// channels apply.
    pub burst_errors_depolarization: f64,
}

impl CircuitGenParameters {
    /// Noise-free parameters for the given number of rounds.
    pub fn new(rounds: usize) -> Self {
        Self {
            rounds,
            after_clifford_depolarization: 0.0,
            before_round_data_depolarization: 0.0,
            before_measure_flip_probability: 0.0,
            after_reset_flip_probability: 0.0,
            burst_errors_depolarization: 0.5,
        }
    }

    /// The same probability for every noise channel.
    pub fn with_uniform_noise(rounds: usize, p: f64) -> Self {
        Self {
            rounds,
            after_clifford_depolarization: p,
            before_round_data_depolarization: p,
            before_measure_flip_probability: p,
            after_reset_flip_probability: p,
            burst_errors_depolarization: 0.5,
        }
    }

    /// Start-of-round tick plus data-qubit depolarisation.
    pub fn append_begin_round_tick(
        &self,
        circuit: &mut Circuit,
        data_qubits: &[u32],
        ano_qubits: &FxHashSet<u32>,
    ) {
        circuit.append(Op::Tick, [], []);
        if self.before_round_data_depolarization > 0.0 {
            let (normal, burst) = split_targets(data_qubits, ano_qubits);
            if !normal.is_empty() {
                circuit.append_qubits(
                    Op::Depolarize1,
                    &normal,
                    [self.before_round_data_depolarization],
                );
            }
            if !burst.is_empty() {
                circuit.append_qubits(Op::Depolarize1, &burst, [self.burst_errors_depolarization]);
            }
        }
    }

    /// A single-qubit Clifford layer followed by its depolarisation.
    pub fn append_unitary_1(
        &self,
        circuit: &mut Circuit,
        op: Op,
        targets: &[u32],
        ano_qubits: &FxHashSet<u32>,
    ) {
        circuit.append_qubits(op, targets, []);
        if self.after_clifford_depolarization > 0.0 {
            let (normal, burst) = split_targets(targets, ano_qubits);
            if !normal.is_empty() {
                circuit.append_qubits(Op::Depolarize1, &normal, [self.after_clifford_depolarization]);
            }
            if !burst.is_empty() {
                circuit.append_qubits(Op::Depolarize1, &burst, [self.burst_errors_depolarization]);
            }
        }
    }

    /// A two-qubit Clifford layer (targets in pairs) followed by its
    /// depolarisation. A pair touching a burst qubit is depolarised at the
    /// burst rate as a whole.
    pub fn append_unitary_2(
        &self,
        circuit: &mut Circuit,
        op: Op,
        targets: &[u32],
        ano_qubits: &FxHashSet<u32>,
    ) {
        circuit.append_qubits(op, targets, []);
        if self.after_clifford_depolarization > 0.0 {
            let mut normal = Vec::new();
            let mut burst = Vec::new();
            for pair in targets.chunks(2) {
                if pair.iter().any(|q| ano_qubits.contains(q)) {
                    burst.extend_from_slice(pair);
                } else {
                    normal.extend_from_slice(pair);
                }
            }
            if !normal.is_empty() {
                circuit.append_qubits(Op::Depolarize2, &normal, [self.after_clifford_depolarization]);
            }
            if !burst.is_empty() {
                circuit.append_qubits(Op::Depolarize2, &burst, [self.burst_errors_depolarization]);
            }
        }
    }

    /// Reset in the given basis, with the after-reset flip.
    pub fn append_reset(&self, circuit: &mut Circuit, targets: &[u32], basis: Basis) {
        let op = match basis {
            Basis::X => Op::RX,
            Basis::Z => Op::RZ,
        };
        circuit.append_qubits(op, targets, []);
        append_anti_basis_error(circuit, targets, self.after_reset_flip_probability, basis);
    }

    /// Measure in the given basis, with the before-measure flip.
    pub fn append_measure(&self, circuit: &mut Circuit, targets: &[u32], basis: Basis) {
        let op = match basis {
            Basis::X => Op::MX,
            Basis::Z => Op::MZ,
        };
        append_anti_basis_error(circuit, targets, self.before_measure_flip_probability, basis);
        circuit.append_qubits(op, targets, []);
    }

    /// Measure and reset in the given basis, with both flips.
    pub fn append_measure_reset(&self, circuit: &mut Circuit, targets: &[u32], basis: Basis) {
        let op = match basis {
            Basis::X => Op::MRX,
            Basis::Z => Op::MRZ,
        };
        append_anti_basis_error(circuit, targets, self.before_measure_flip_probability, basis);
        circuit.append_qubits(op, targets, []);
        append_anti_basis_error(circuit, targets, self.after_reset_flip_probability, basis);
    }
}

/// Flip error in the basis conjugate to a reset or measurement.
fn append_anti_basis_error(circuit: &mut Circuit, targets: &[u32], p: f64, basis: Basis) {
    if p > 0.0 && !targets.is_empty() {
        let op = match basis {
            Basis::X => Op::ZError,
            Basis::Z => Op::XError,
        };
        circuit.append_qubits(op, targets, [p]);
    }
}

fn split_targets(targets: &[u32], ano_qubits: &FxHashSet<u32>) -> (Vec<u32>, Vec<u32>) {
    let mut normal = Vec::new();
    let mut burst = Vec::new();
    for &q in targets {
        if ano_qubits.contains(&q) {
            burst.push(q);
        } else {
            normal.push(q);
        }
    }
    (normal, burst)
}
