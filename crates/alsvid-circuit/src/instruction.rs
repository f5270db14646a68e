//! Circuit instructions and their targets.

use crate::op::Op;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A gate or annotation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// A qubit index.
    Qubit(u32),
    /// A relative lookback into the measurement record (always negative).
    Rec(i64),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Qubit(q) => write!(f, "{q}"),
            Target::Rec(k) => write!(f, "rec[{k}]"),
        }
    }
}

/// One operation applied to a list of targets.
///
/// `args` carries the parenthesised arguments: the error probability for
/// noise channels, coordinates for `QUBIT_COORDS` / `DETECTOR` /
/// `SHIFT_COORDS`, and the observable index for `OBSERVABLE_INCLUDE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The operation.
    pub op: Op,
    /// Targets, in order.
    pub targets: Vec<Target>,
    /// Parenthesised arguments, in order.
    pub args: Vec<f64>,
}

impl Instruction {
    /// Create an instruction.
    pub fn new(op: Op, targets: Vec<Target>, args: Vec<f64>) -> Self {
        Self { op, targets, args }
    }

    /// Qubit targets only, skipping record references.
    pub fn qubit_targets(&self) -> impl Iterator<Item = u32> + '_ {
        self.targets.iter().filter_map(|t| match t {
            Target::Qubit(q) => Some(*q),
            Target::Rec(_) => None,
        })
    }
}

fn write_arg(f: &mut fmt::Formatter<'_>, a: f64) -> fmt::Result {
    if a == a.trunc() && a.abs() < 1e15 {
        write!(f, "{}", a as i64)
    } else {
        write!(f, "{a}")
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.op.name())?;
        if !self.args.is_empty() {
            f.write_str("(")?;
            for (i, &a) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_arg(f, a)?;
            }
            f.write_str(")")?;
        }
        for t in &self.targets {
            write!(f, " {t}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_plain() {
        let inst = Instruction::new(Op::H, vec![Target::Qubit(2), Target::Qubit(9)], vec![]);
        assert_eq!(inst.to_string(), "H 2 9");
    }

    #[test]
    fn display_with_args() {
        let inst = Instruction::new(Op::Depolarize1, vec![Target::Qubit(1)], vec![0.001]);
        assert_eq!(inst.to_string(), "DEPOLARIZE1(0.001) 1");

        let det = Instruction::new(
            Op::Detector,
            vec![Target::Rec(-1), Target::Rec(-9)],
            vec![2.0, 4.0, 0.0],
        );
        assert_eq!(det.to_string(), "DETECTOR(2, 4, 0) rec[-1] rec[-9]");
    }

    #[test]
    fn qubit_targets_skip_records() {
        let inst = Instruction::new(
            Op::ObservableInclude,
            vec![Target::Rec(-3), Target::Qubit(7)],
            vec![0.0],
        );
        assert_eq!(inst.qubit_targets().collect::<Vec<_>>(), vec![7]);
    }
}
