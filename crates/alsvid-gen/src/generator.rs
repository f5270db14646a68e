//! Memory-experiment circuit assembly.
//!
//! The emitted circuit alternates gauge bases round by round: one cycle
//! measures every stabiliser plus the Z-type gauges, the next measures
//! every stabiliser plus the X-type gauges. Detectors compare the two most
//! recent measurements of each stabiliser, and super-stabilisers compare
//! the summed outcomes of their member gauges across a full alternation.

use alsvid_circuit::{Circuit, MeasurementRecord, Op, Target};
use alsvid_code::{Basis, Coord, LogicalPatch, PerBasis};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::error::{GenError, GenResult};
use crate::params::CircuitGenParameters;

/// Boundary style of the patch being measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchLayout {
    /// Plain rotated boundaries.
    Unshell,
    /// Shell boundaries (not implemented).
    Shell,
}

/// Role of a measured qubit in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum MeasureRole {
    Stab,
    Gauge,
    Data,
}

/// Descriptor of a repeatedly measured object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct MeasureKey {
    basis: Basis,
    role: MeasureRole,
    qubit: u32,
}

/// Generate a full memory experiment over a finalised patch.
///
/// The circuit prepares the data qubits in `memory_basis`, runs
/// `params.rounds` rounds of alternating syndrome extraction and reads the
/// logical observable out transversally.
pub fn generate_surface_code_circuit(
    params: &CircuitGenParameters,
    patch: &LogicalPatch,
    layout: PatchLayout,
    memory_basis: Basis,
) -> GenResult<Circuit> {
    match layout {
        PatchLayout::Shell => Err(GenError::ShellUnsupported),
        PatchLayout::Unshell => generate_unshell_circuit(params, patch, memory_basis),
    }
}

/// CNOT interaction order per step, chosen so that neighbouring plaquettes
/// commute within a cycle.
fn interaction_order(basis: Basis) -> [(i32, i32); 4] {
    match basis {
        Basis::X => [(1, 1), (-1, 1), (1, -1), (-1, -1)],
        Basis::Z => [(1, 1), (1, -1), (-1, 1), (-1, -1)],
    }
}

struct Assembler<'a> {
    params: &'a CircuitGenParameters,
    patch: &'a LogicalPatch,
    record: MeasurementRecord<MeasureKey>,
    coord_index: FxHashMap<Coord, u32>,
    data_qubits: Vec<u32>,
    ano_qubits: FxHashSet<u32>,
    stab_qubits: PerBasis<Vec<u32>>,
    gauge_ancilla_qubits: PerBasis<Vec<u32>>,
    gauge_data_qubits: PerBasis<Vec<u32>>,
    stab_cnot_targets: [Vec<u32>; 4],
    gauge_cnot_targets: PerBasis<[Vec<u32>; 4]>,
}

impl<'a> Assembler<'a> {
    fn new(params: &'a CircuitGenParameters, patch: &'a LogicalPatch) -> Self {
        let mut coord_index: FxHashMap<Coord, u32> = FxHashMap::default();
        for &q in patch.qubit_coords().iter().chain(patch.ano_coords()) {
            coord_index.insert(q, patch.coord_to_index(q));
        }

        let mut data_qubits: Vec<u32> =
            patch.data_coords().iter().map(|&q| coord_index[&q]).collect();
        data_qubits.sort_unstable();
        let ano_qubits: FxHashSet<u32> =
            patch.ano_coords().iter().map(|&q| coord_index[&q]).collect();

        let mut stab_qubits = PerBasis::<Vec<u32>>::default();
        let mut gauge_ancilla_qubits = PerBasis::<Vec<u32>>::default();
        let mut gauge_data_qubits = PerBasis::<Vec<u32>>::default();
        for basis in Basis::BOTH {
            stab_qubits[basis] = patch.stabs(basis).keys().map(|q| coord_index[q]).collect();
            stab_qubits[basis].sort_unstable();
            for key in patch.gauges(basis).keys() {
                if patch.data_coords().contains(key) {
                    gauge_data_qubits[basis].push(coord_index[key]);
                } else {
                    gauge_ancilla_qubits[basis].push(coord_index[key]);
                }
            }
            gauge_data_qubits[basis].sort_unstable();
            gauge_ancilla_qubits[basis].sort_unstable();
        }

        // CNOT target pairs per interaction step. X-type operators use the
        // ancilla as control, Z-type ones as target.
        let mut stab_cnot_targets: [Vec<u32>; 4] = Default::default();
        let mut gauge_cnot_targets = PerBasis::<[Vec<u32>; 4]>::default();
        for (step, slot) in stab_cnot_targets.iter_mut().enumerate() {
            for basis in Basis::BOTH {
                let (dx, dy) = interaction_order(basis)[step];
                for (&ancilla, support) in patch.stabs(basis) {
                    let data = ancilla.offset(dx, dy);
                    if support.contains(&data) {
                        let (control, target) = match basis {
                            Basis::X => (ancilla, data),
                            Basis::Z => (data, ancilla),
                        };
                        slot.push(coord_index[&control]);
                        slot.push(coord_index[&target]);
                    }
                }
                for (&ancilla, support) in patch.gauges(basis) {
                    let data = ancilla.offset(dx, dy);
                    if support.contains(&data) {
                        let (control, target) = match basis {
                            Basis::X => (ancilla, data),
                            Basis::Z => (data, ancilla),
                        };
                        gauge_cnot_targets[basis][step].push(coord_index[&control]);
                        gauge_cnot_targets[basis][step].push(coord_index[&target]);
                    }
                }
            }
        }

        Self {
            params,
            patch,
            record: MeasurementRecord::new(),
            coord_index,
            data_qubits,
            ano_qubits,
            stab_qubits,
            gauge_ancilla_qubits,
            gauge_data_qubits,
            stab_cnot_targets,
            gauge_cnot_targets,
        }
    }

    /// One syndrome-extraction cycle measuring every stabiliser plus the
    /// gauges of `gauge_basis`.
    fn cycle(&mut self, gauge_basis: Basis) -> Circuit {
        let params = self.params;
        let mut circuit = Circuit::new();

        let mut x_ancillas = self.stab_qubits.x.clone();
        if gauge_basis == Basis::X {
            x_ancillas.extend_from_slice(&self.gauge_ancilla_qubits.x);
        }

        circuit.append(Op::Tick, [], []);

        let mut reset_targets = self.stab_qubits.x.clone();
        reset_targets.extend_from_slice(&self.stab_qubits.z);
        reset_targets.extend_from_slice(&self.gauge_ancilla_qubits[gauge_basis]);
        params.append_reset(&mut circuit, &reset_targets, Basis::Z);

        params.append_begin_round_tick(&mut circuit, &self.data_qubits, &self.ano_qubits);
        params.append_unitary_1(&mut circuit, Op::H, &x_ancillas, &self.ano_qubits);

        for step in 0..4 {
            circuit.append(Op::Tick, [], []);
            let mut targets = self.stab_cnot_targets[step].clone();
            targets.extend_from_slice(&self.gauge_cnot_targets[gauge_basis][step]);
            params.append_unitary_2(&mut circuit, Op::CNOT, &targets, &self.ano_qubits);
        }

        circuit.append(Op::Tick, [], []);
        let mut unrotate = x_ancillas;
        if gauge_basis == Basis::X {
            unrotate.extend_from_slice(&self.gauge_data_qubits.x);
        }
        params.append_unitary_1(&mut circuit, Op::H, &unrotate, &self.ano_qubits);

        circuit.append(Op::Tick, [], []);
        let mut measure_targets = self.stab_qubits.x.clone();
        measure_targets.extend_from_slice(&self.stab_qubits.z);
        measure_targets.extend_from_slice(&self.gauge_ancilla_qubits[gauge_basis]);
        measure_targets.extend_from_slice(&self.gauge_data_qubits[gauge_basis]);
        params.append_measure(&mut circuit, &measure_targets, Basis::Z);

        // X-type data gauges were rotated into the Z basis for readout;
        // rotate them back.
        if gauge_basis == Basis::X && !self.gauge_data_qubits.x.is_empty() {
            params.append_unitary_1(&mut circuit, Op::H, &self.gauge_data_qubits.x, &self.ano_qubits);
        }

        let keys = self
            .stab_qubits
            .x
            .iter()
            .map(|&q| MeasureKey { basis: Basis::X, role: MeasureRole::Stab, qubit: q })
            .chain(
                self.stab_qubits
                    .z
                    .iter()
                    .map(|&q| MeasureKey { basis: Basis::Z, role: MeasureRole::Stab, qubit: q }),
            )
            .chain(
                self.gauge_ancilla_qubits[gauge_basis]
                    .iter()
                    .chain(self.gauge_data_qubits[gauge_basis].iter())
                    .map(|&q| MeasureKey { basis: gauge_basis, role: MeasureRole::Gauge, qubit: q }),
            )
            .collect::<Vec<_>>();
        self.record.measure(keys);

        circuit
    }

    fn stab_key(&self, basis: Basis, coord: Coord) -> MeasureKey {
        MeasureKey {
            basis,
            role: MeasureRole::Stab,
            qubit: self.coord_index[&coord],
        }
    }

    fn gauge_key(&self, basis: Basis, coord: Coord) -> MeasureKey {
        MeasureKey {
            basis,
            role: MeasureRole::Gauge,
            qubit: self.coord_index[&coord],
        }
    }

    fn data_key(&self, basis: Basis, coord: Coord) -> MeasureKey {
        MeasureKey {
            basis,
            role: MeasureRole::Data,
            qubit: self.coord_index[&coord],
        }
    }

    /// Detectors comparing the last two measurements of every stabiliser.
    fn stab_detectors(&self) -> GenResult<Circuit> {
        let mut circuit = Circuit::new();
        for basis in Basis::BOTH {
            for &coord in self.patch.stabs(basis).keys() {
                let key = self.stab_key(basis, coord);
                circuit.append(
                    Op::Detector,
                    [self.record.rec(&key, -1)?, self.record.rec(&key, -2)?],
                    [f64::from(coord.x), f64::from(coord.y), 0.0],
                );
            }
        }
        Ok(circuit)
    }

    /// Detectors comparing the summed gauge outcomes of every
    /// super-stabiliser of `basis` across the last two matching cycles.
    fn gauge_detectors(&self, basis: Basis) -> GenResult<Circuit> {
        let mut circuit = Circuit::new();
        for members in self.patch.super_stabs(basis) {
            let mut targets = Vec::with_capacity(members.len() * 2);
            for &coord in members {
                targets.push(self.record.rec(&self.gauge_key(basis, coord), -1)?);
            }
            for &coord in members {
                targets.push(self.record.rec(&self.gauge_key(basis, coord), -2)?);
            }
            circuit.append(Op::Detector, targets, [-1.0, -1.0, 0.0]);
        }
        Ok(circuit)
    }
}

fn generate_unshell_circuit(
    params: &CircuitGenParameters,
    patch: &LogicalPatch,
    memory_basis: Basis,
) -> GenResult<Circuit> {
    if params.rounds < 1 {
        return Err(GenError::InvalidRounds { rounds: params.rounds });
    }

    let mut asm = Assembler::new(params, patch);

    // Head: declare the layout, prepare the data qubits, and run the first
    // alternation pair. The very first cycle has no predecessor, so its
    // detectors reference a single measurement.
    let mut head = Circuit::new();
    let mut declarations: Vec<(u32, Coord)> =
        asm.coord_index.iter().map(|(&coord, &q)| (q, coord)).collect();
    declarations.sort_unstable();
    for (q, coord) in declarations {
        head.append(
            Op::QubitCoords,
            [Target::Qubit(q)],
            [f64::from(coord.x), f64::from(coord.y)],
        );
    }
    params.append_reset(&mut head, &asm.data_qubits, memory_basis);

    head += asm.cycle(memory_basis);
    for &coord in patch.stabs(memory_basis).keys() {
        let key = asm.stab_key(memory_basis, coord);
        head.append(
            Op::Detector,
            [asm.record.rec(&key, -1)?],
            [f64::from(coord.x), f64::from(coord.y), 0.0],
        );
    }
    for members in patch.super_stabs(memory_basis) {
        let mut targets = Vec::with_capacity(members.len());
        for &coord in members {
            targets.push(asm.record.rec(&asm.gauge_key(memory_basis, coord), -1)?);
        }
        head.append(Op::Detector, targets, [-1.0, -1.0, 0.0]);
    }

    head += asm.cycle(memory_basis.other());
    head.append(Op::ShiftCoords, [], [0.0, 0.0, 1.0]);
    head += asm.stab_detectors()?;

    // Body: one full alternation pair with detectors against the previous
    // pair, repeated `rounds - 1` times.
    let mut body = Circuit::new();
    body += asm.cycle(memory_basis);
    body.append(Op::ShiftCoords, [], [0.0, 0.0, 1.0]);
    body += asm.stab_detectors()?;
    body += asm.gauge_detectors(memory_basis)?;
    body += asm.cycle(memory_basis.other());
    body.append(Op::ShiftCoords, [], [0.0, 0.0, 1.0]);
    body += asm.stab_detectors()?;
    body += asm.gauge_detectors(memory_basis.other())?;

    // Tail: read the data out transversally, close every stabiliser and
    // super-stabiliser against the final data measurements, and declare
    // the logical observable.
    let mut tail = Circuit::new();
    params.append_measure(&mut tail, &asm.data_qubits, memory_basis);
    let data_keys: Vec<MeasureKey> = asm
        .data_qubits
        .iter()
        .map(|&q| MeasureKey { basis: memory_basis, role: MeasureRole::Data, qubit: q })
        .collect();
    asm.record.measure(data_keys);

    for (&coord, support) in patch.stabs(memory_basis) {
        let mut targets = Vec::with_capacity(support.len() + 1);
        for &acting in support {
            targets.push(asm.record.rec(&asm.data_key(memory_basis, acting), -1)?);
        }
        targets.push(asm.record.rec(&asm.stab_key(memory_basis, coord), -1)?);
        tail.append(
            Op::Detector,
            targets,
            [f64::from(coord.x), f64::from(coord.y), 1.0],
        );
    }
    for members in patch.super_stabs(memory_basis) {
        let mut targets = Vec::new();
        for &coord in members {
            let support = patch
                .gauges(memory_basis)
                .get(&coord)
                .ok_or(GenError::MissingGauge { coord })?;
            for &acting in support {
                targets.push(asm.record.rec(&asm.data_key(memory_basis, acting), -1)?);
            }
        }
        for &coord in members {
            targets.push(asm.record.rec(&asm.gauge_key(memory_basis, coord), -1)?);
        }
        tail.append(Op::Detector, targets, [-1.0, -1.0, 1.0]);
    }

    let mut observable = Vec::new();
    for &coord in patch.observable(memory_basis) {
        observable.push(asm.record.rec(&asm.data_key(memory_basis, coord), -1)?);
    }
    tail.append(Op::ObservableInclude, observable, [0.0]);

    let circuit = head + body * (params.rounds - 1) + tail;
    debug!(
        rounds = params.rounds,
        instructions = circuit.len(),
        measurements = circuit.num_measurements(),
        "assembled memory circuit"
    );
    Ok(circuit)
}
