//! Alsvid circuit generation
//!
//! Turns a finalised [`LogicalPatch`](alsvid_code::LogicalPatch) plus a
//! noise configuration into a complete noisy memory experiment: data
//! preparation, alternating rounds of syndrome extraction over stabilisers
//! and gauges, detectors for every stabiliser and super-stabiliser, and
//! transversal logical readout.
//!
//! The generator never mutates the patch; deform first, generate second.
//!
//! # Example
//!
//! ```rust
//! use alsvid_code::{Basis, LogicalPatch};
//! use alsvid_gen::{CircuitGenParameters, PatchLayout, generate_surface_code_circuit};
//!
//! let patch = LogicalPatch::new(3, true).unwrap();
//! let params = CircuitGenParameters::with_uniform_noise(3, 0.001);
//! let circuit =
//!     generate_surface_code_circuit(&params, &patch, PatchLayout::Unshell, Basis::Z).unwrap();
//!
//! // One transversal readout of all nine data qubits at the end.
//! assert_eq!(circuit.count_op(alsvid_circuit::Op::ObservableInclude), 1);
//! ```

pub mod error;
pub mod generator;
pub mod params;

pub use error::{GenError, GenResult};
pub use generator::{PatchLayout, generate_surface_code_circuit};
pub use params::CircuitGenParameters;
