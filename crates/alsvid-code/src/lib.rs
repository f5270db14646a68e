//! Alsvid deformable code model
//!
//! This crate owns the state of a rotated planar surface-code patch and the
//! deformation engine that removes physical qubits from it while keeping
//! the code consistent: stabilisers that anti-commute with a destructive
//! measurement are demoted to gauges, gauges are grouped into
//! super-stabilisers whose products remain measurable, boundaries are
//! rerouted and corners walk so the logical operators still stretch from
//! edge to edge.
//!
//! # Core components
//!
//! - [`LogicalPatch`]: one logical qubit with its full code state
//! - [`Coord`] / [`Basis`] / [`PerBasis`]: the lattice vocabulary
//! - [`CodeError`]: structured failures for defect patterns the deformation
//!   rules cannot absorb
//!
//! # Example
//!
//! ```rust
//! use alsvid_code::{Basis, Coord, LogicalPatch};
//!
//! let mut patch = LogicalPatch::new(5, true).unwrap();
//! assert_eq!(patch.data_coords().len(), 25);
//!
//! // Lose a bulk data qubit; the surrounding stabilisers regroup into
//! // super-stabilisers and the distance drops.
//! patch.disable(Coord::new(5, 5)).unwrap();
//! patch.update_distance().unwrap();
//! assert_eq!(patch.distance(Basis::X), 4);
//! assert_eq!(patch.distance(Basis::Z), 4);
//! ```
//!
//! Deformation is monotone: disabled qubits never come back, and a patch
//! that returns a [`CodeError`] should be discarded. The circuit generator
//! in `alsvid-gen` consumes a finalised patch read-only.

mod check;
pub mod coord;
mod deform;
mod distance;
pub mod error;
pub mod patch;

pub use coord::{Basis, Coord, PerBasis, Support, anti_commute, xor_into};
pub use error::{CodeError, CodeResult};
pub use patch::{LogicalPatch, PatchSummary};
