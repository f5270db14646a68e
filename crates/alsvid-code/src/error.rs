//! Error types for the code-model crate.

use crate::coord::{Basis, Coord};
use thiserror::Error;

/// Errors produced while deforming a patch or recomputing its distance.
///
/// Deformation errors indicate a defect pattern the deformation rules cannot
/// absorb (or an internal bookkeeping inconsistency); the patch should be
/// considered unusable once one is returned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodeError {
    /// Only the rotated layout is supported.
    #[error("unrotated surface codes are not supported")]
    UnrotatedUnsupported,

    /// A qubit carrying logical information has no operator to reroute
    /// that information through.
    #[error("removing {coord} would erase logical {basis} information: no stabiliser covers it")]
    InformationLoss {
        /// Basis of the logical operator that would be cut.
        basis: Basis,
        /// The qubit being measured out.
        coord: Coord,
    },

    /// A corner relocation walk ran out of boundary segments.
    #[error("corner walk stalled at {at}: no boundary segment continues the chain")]
    CornerWalkStuck {
        /// Last position reached by the walk.
        at: Coord,
    },

    /// A corner needed for rerouting has been lost.
    #[error("corner ({i}, {j}) is undefined but required to reroute a boundary")]
    MissingCorner {
        /// X-boundary index.
        i: usize,
        /// Z-boundary index.
        j: usize,
    },

    /// A gauge expected during promotion is absent.
    #[error("gauge {coord} missing from basis {basis} during promotion")]
    MissingGauge {
        /// Basis of the missing gauge.
        basis: Basis,
        /// Key of the missing gauge.
        coord: Coord,
    },

    /// A super-stabiliser references a gauge that no longer exists.
    #[error("super-stabiliser references gauge {coord} absent from basis {basis}")]
    DanglingGauge {
        /// Basis of the super-stabiliser.
        basis: Basis,
        /// The stale gauge key.
        coord: Coord,
    },

    /// A super-stabiliser split could not cover all member gauges.
    #[error("super-stabiliser split stalled around {seed}: {remaining} gauges unreachable")]
    SuperStabSplitStuck {
        /// First gauge of the component being grown.
        seed: Coord,
        /// Gauges the anti-commutation relation never reached.
        remaining: usize,
    },

    /// Two opposite-basis boundaries overlap away from their corner.
    #[error("boundaries X[{i}] and Z[{j}] overlap at {coord} away from their corner")]
    BoundaryOverlap {
        /// X-boundary index.
        i: usize,
        /// Z-boundary index.
        j: usize,
        /// The offending shared qubit.
        coord: Coord,
    },

    /// A data qubit touches a single syndrome node in the matching graph.
    #[error("data qubit {coord} touches a single syndrome node; the matching graph is degenerate")]
    DanglingDataQubit {
        /// The under-connected data qubit.
        coord: Coord,
    },

    /// The two boundaries of a basis are no longer connected.
    #[error("the two {basis} boundaries are disconnected in the matching graph")]
    BoundaryNotConnected {
        /// Basis whose boundaries lost connectivity.
        basis: Basis,
    },
}

/// Result type for code-model operations.
pub type CodeResult<T> = Result<T, CodeError>;
