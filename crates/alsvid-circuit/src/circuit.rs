//! Append-only circuit container with stim-flavoured text output.

use crate::instruction::{Instruction, Target};
use crate::op::Op;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul};

/// An ordered list of circuit instructions.
///
/// Circuits compose with `+` (concatenation) and `* n` (n concatenated
/// copies). Relative measurement-record targets stay valid under both,
/// which is what makes the repeated-body emission pattern work.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one instruction.
    pub fn append(
        &mut self,
        op: Op,
        targets: impl IntoIterator<Item = Target>,
        args: impl IntoIterator<Item = f64>,
    ) {
        self.instructions.push(Instruction::new(
            op,
            targets.into_iter().collect(),
            args.into_iter().collect(),
        ));
    }

    /// Append one instruction whose targets are all qubit indices.
    pub fn append_qubits(&mut self, op: Op, qubits: &[u32], args: impl IntoIterator<Item = f64>) {
        self.append(op, qubits.iter().map(|&q| Target::Qubit(q)), args);
    }

    /// The instructions, in emission order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the circuit contains no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Number of instructions with the given operation.
    pub fn count_op(&self, op: Op) -> usize {
        self.instructions.iter().filter(|i| i.op == op).count()
    }

    /// Total number of measurement-record entries this circuit produces.
    pub fn num_measurements(&self) -> usize {
        self.instructions
            .iter()
            .filter(|i| i.op.is_measurement())
            .map(|i| i.targets.len())
            .sum()
    }

    /// Iterate over the instructions.
    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }
}

impl Add for Circuit {
    type Output = Circuit;

    fn add(mut self, rhs: Circuit) -> Circuit {
        self.instructions.extend(rhs.instructions);
        self
    }
}

impl AddAssign for Circuit {
    fn add_assign(&mut self, rhs: Circuit) {
        self.instructions.extend(rhs.instructions);
    }
}

impl Mul<usize> for Circuit {
    type Output = Circuit;

    fn mul(self, n: usize) -> Circuit {
        let mut out = Circuit::new();
        for _ in 0..n {
            out.instructions.extend(self.instructions.iter().cloned());
        }
        out
    }
}

impl<'a> IntoIterator for &'a Circuit {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for inst in &self.instructions {
            writeln!(f, "{inst}")?;
        }
        Ok(())
    }
}
