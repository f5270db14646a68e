//! The deformable surface-code patch.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coord::{Basis, Coord, PerBasis, Support, xor_into};
use crate::error::{CodeError, CodeResult};

/// One logical qubit encoded in a rotated planar surface code, together
/// with everything needed to keep it consistent while physical qubits are
/// removed: stabilisers, gauge operators, super-stabilisers, boundaries,
/// corners and the logical observables.
///
/// A patch starts pristine via [`LogicalPatch::new`] and is mutated
/// monotonically by [`disable`](LogicalPatch::disable) and
/// [`burst_error`](LogicalPatch::burst_error); disabled qubits never
/// return. [`update_distance`](LogicalPatch::update_distance) refreshes the
/// cached code distance from the surviving shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalPatch {
    pub(crate) distance: PerBasis<usize>,
    /// Construction-time distance, frozen for qubit indexing.
    pub(crate) index_stride: usize,
    pub(crate) qubit_coords: BTreeSet<Coord>,
    pub(crate) data_coords: BTreeSet<Coord>,
    pub(crate) ano_coords: BTreeSet<Coord>,
    pub(crate) defect_coords: BTreeSet<Coord>,
    pub(crate) stabs: PerBasis<BTreeMap<Coord, Support>>,
    pub(crate) gauges: PerBasis<BTreeMap<Coord, Support>>,
    pub(crate) super_stabs: PerBasis<Vec<BTreeSet<Coord>>>,
    pub(crate) observable: PerBasis<Support>,
    /// Each qubit on `edges[basis]` is acted on by exactly one `basis`
    /// stabiliser.
    pub(crate) edges: PerBasis<[Support; 2]>,
    /// `corners[i][j]` is the intersection of `edges[X][i]` and
    /// `edges[Z][j]`.
    pub(crate) corners: [[Option<Coord>; 2]; 2],
}

impl LogicalPatch {
    /// Build a pristine rotated surface code of the given distance.
    ///
    /// Only `rotated = true` is supported; the unrotated layout is rejected
    /// rather than silently producing an empty patch.
    pub fn new(distance: usize, rotated: bool) -> CodeResult<Self> {
        if !rotated {
            return Err(CodeError::UnrotatedUnsupported);
        }
        let mut patch = Self {
            distance: PerBasis::splat(distance),
            index_stride: distance,
            qubit_coords: BTreeSet::new(),
            data_coords: BTreeSet::new(),
            ano_coords: BTreeSet::new(),
            defect_coords: BTreeSet::new(),
            stabs: PerBasis::default(),
            gauges: PerBasis::default(),
            super_stabs: PerBasis::default(),
            observable: PerBasis::default(),
            edges: PerBasis::default(),
            corners: [[None; 2]; 2],
        };
        patch.build_rotated_lattice();
        patch.normalise()?;
        debug!(
            distance,
            data = patch.data_coords.len(),
            stabs_x = patch.stabs.x.len(),
            stabs_z = patch.stabs.z.len(),
            "built pristine rotated patch"
        );
        Ok(patch)
    }

    fn build_rotated_lattice(&mut self) {
        let d = self.index_stride as i32;

        for x in 0..d {
            for y in 0..d {
                let q = Coord::new(x * 2 + 1, y * 2 + 1);
                self.data_coords.insert(q);

                if x == 0 {
                    self.observable.x.insert(q);
                    self.edges.x[0].insert(q);
                } else if x == d - 1 {
                    self.edges.x[1].insert(q);
                }
                if y == 0 {
                    self.observable.z.insert(q);
                    self.edges.z[0].insert(q);
                } else if y == d - 1 {
                    self.edges.z[1].insert(q);
                }
            }
        }

        self.corners = [
            [Some(Coord::new(1, 1)), Some(Coord::new(1, d * 2 - 1))],
            [Some(Coord::new(d * 2 - 1, 1)), Some(Coord::new(d * 2 - 1, d * 2 - 1))],
        ];

        for x in 0..=d {
            for y in 0..=d {
                let q = Coord::new(x * 2, y * 2);
                let on_x_boundary = x == 0 || x == d;
                let on_y_boundary = y == 0 || y == d;
                let parity = x % 2 != y % 2;
                if (on_x_boundary && parity) || (on_y_boundary && !parity) {
                    continue;
                }
                let support: Support = [(-1, -1), (-1, 1), (1, -1), (1, 1)]
                    .into_iter()
                    .map(|(dx, dy)| q.offset(dx, dy))
                    .filter(|n| self.data_coords.contains(n))
                    .collect();
                let basis = if parity { Basis::X } else { Basis::Z };
                self.stabs[basis].insert(q, support);
            }
        }
    }

    /// Remove a physical qubit from the patch, deforming the code around it.
    ///
    /// Data qubits and measurement ancillas take different paths; a
    /// coordinate that is not currently in use is recorded as a defect and
    /// otherwise ignored, which makes the operation idempotent.
    pub fn disable(&mut self, coord: Coord) -> CodeResult<()> {
        self.defect_coords.insert(coord);
        if self.data_coords.contains(&coord) {
            debug!(%coord, "disabling data qubit");
            self.disable_data(coord)
        } else if self.qubit_coords.contains(&coord) {
            debug!(%coord, "disabling measurement qubit");
            self.disable_ancilla(coord)
        } else {
            Ok(())
        }
    }

    /// Mark every qubit within squared distance `2·radius²` of `center` as
    /// sitting in a burst-error region. The shape of the code is untouched;
    /// only the noise model sees the marking.
    pub fn burst_error(&mut self, center: Coord, radius: i32) {
        let limit = 2 * i64::from(radius) * i64::from(radius);
        let marked: Vec<Coord> = self
            .qubit_coords
            .iter()
            .filter(|q| q.square_distance(center) <= limit)
            .copied()
            .collect();
        debug!(%center, radius, count = marked.len(), "marking burst-error region");
        self.ano_coords.extend(marked);
    }

    /// XOR of the supports of the given gauge keys: the operator the
    /// super-stabiliser actually measures.
    pub fn super_stab_product(&self, basis: Basis, members: &BTreeSet<Coord>) -> Support {
        let mut product = Support::new();
        for key in members {
            if let Some(gauge) = self.gauges[basis].get(key) {
                xor_into(&mut product, gauge);
            }
        }
        product
    }

    /// Dense qubit index for a coordinate, stable across deformation.
    pub fn coord_to_index(&self, q: Coord) -> u32 {
        let d = self.index_stride as i32;
        let r = q.y - (q.x & 1);
        (q.x + r * d + r / 2) as u32
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Currently live data qubits.
    pub fn data_coords(&self) -> &BTreeSet<Coord> {
        &self.data_coords
    }

    /// All coordinates currently in use (data plus measurement keys).
    pub fn qubit_coords(&self) -> &BTreeSet<Coord> {
        &self.qubit_coords
    }

    /// Qubits inside a burst-error region.
    pub fn ano_coords(&self) -> &BTreeSet<Coord> {
        &self.ano_coords
    }

    /// Every coordinate that has been disabled.
    pub fn defect_coords(&self) -> &BTreeSet<Coord> {
        &self.defect_coords
    }

    /// Stabilisers of a basis: ancilla key to measured data qubits.
    pub fn stabs(&self, basis: Basis) -> &BTreeMap<Coord, Support> {
        &self.stabs[basis]
    }

    /// Gauge operators of a basis.
    pub fn gauges(&self, basis: Basis) -> &BTreeMap<Coord, Support> {
        &self.gauges[basis]
    }

    /// Super-stabilisers of a basis, each a set of gauge keys.
    pub fn super_stabs(&self, basis: Basis) -> &[BTreeSet<Coord>] {
        &self.super_stabs[basis]
    }

    /// Data qubits of the logical operator of a basis.
    pub fn observable(&self, basis: Basis) -> &Support {
        &self.observable[basis]
    }

    /// The two opposing boundaries of a basis.
    pub fn edges(&self, basis: Basis) -> &[Support; 2] {
        &self.edges[basis]
    }

    /// Canonical data qubit at the intersection of `edges[X][i]` and
    /// `edges[Z][j]`, if still defined.
    pub fn corner(&self, i: usize, j: usize) -> Option<Coord> {
        self.corners[i][j]
    }

    /// Cached code distance for a basis.
    ///
    /// Refresh with [`update_distance`](LogicalPatch::update_distance) after
    /// deforming.
    pub fn distance(&self, basis: Basis) -> usize {
        self.distance[basis]
    }

    /// Shape counts, for logging and assertions.
    pub fn summary(&self) -> PatchSummary {
        PatchSummary {
            data_qubits: self.data_coords.len(),
            qubits: self.qubit_coords.len(),
            defects: self.defect_coords.len(),
            stabs: PerBasis::new(self.stabs.x.len(), self.stabs.z.len()),
            gauges: PerBasis::new(self.gauges.x.len(), self.gauges.z.len()),
            super_stabs: PerBasis::new(self.super_stabs.x.len(), self.super_stabs.z.len()),
            distance: self.distance.clone(),
        }
    }
}

/// Shape counts of a patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSummary {
    /// Live data qubits.
    pub data_qubits: usize,
    /// All coordinates in use.
    pub qubits: usize,
    /// Disabled coordinates.
    pub defects: usize,
    /// Stabiliser count per basis.
    pub stabs: PerBasis<usize>,
    /// Gauge count per basis.
    pub gauges: PerBasis<usize>,
    /// Super-stabiliser count per basis.
    pub super_stabs: PerBasis<usize>,
    /// Cached distance per basis.
    pub distance: PerBasis<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pristine_distance_three() {
        let patch = LogicalPatch::new(3, true).unwrap();
        assert_eq!(patch.data_coords().len(), 9);
        assert_eq!(patch.qubit_coords().len(), 17);
        assert_eq!(patch.stabs(Basis::X).len(), 4);
        assert_eq!(patch.stabs(Basis::Z).len(), 4);
        assert!(patch.gauges(Basis::X).is_empty());
        assert!(patch.super_stabs(Basis::Z).is_empty());
        assert_eq!(patch.distance(Basis::X), 3);
        assert_eq!(patch.corner(0, 0), Some(Coord::new(1, 1)));
        assert_eq!(patch.corner(1, 1), Some(Coord::new(5, 5)));
        assert_eq!(patch.observable(Basis::X).len(), 3);
        assert_eq!(patch.observable(Basis::Z).len(), 3);
    }

    #[test]
    fn pristine_distance_five_counts() {
        let patch = LogicalPatch::new(5, true).unwrap();
        assert_eq!(patch.data_coords().len(), 25);
        assert_eq!(patch.stabs(Basis::X).len(), 12);
        assert_eq!(patch.stabs(Basis::Z).len(), 12);
    }

    #[test]
    fn boundary_stabilisers_have_weight_two() {
        let patch = LogicalPatch::new(3, true).unwrap();
        let weight2 = patch
            .stabs(Basis::X)
            .values()
            .chain(patch.stabs(Basis::Z).values())
            .filter(|s| s.len() == 2)
            .count();
        assert_eq!(weight2, 4);
    }

    #[test]
    fn unrotated_is_rejected() {
        assert!(matches!(
            LogicalPatch::new(3, false),
            Err(CodeError::UnrotatedUnsupported)
        ));
    }

    #[test]
    fn burst_error_marks_neighbourhood() {
        let mut patch = LogicalPatch::new(3, true).unwrap();
        patch.burst_error(Coord::new(2, 2), 1);
        let marked: Vec<Coord> = patch.ano_coords().iter().copied().collect();
        assert_eq!(
            marked,
            vec![
                Coord::new(1, 1),
                Coord::new(1, 3),
                Coord::new(2, 2),
                Coord::new(3, 1),
                Coord::new(3, 3),
            ]
        );
        // No qubit removed, shape untouched.
        assert_eq!(patch.data_coords().len(), 9);
    }

    #[test]
    fn disable_outside_patch_is_noop() {
        let mut patch = LogicalPatch::new(3, true).unwrap();
        let before = patch.clone();
        patch.disable(Coord::new(99, 99)).unwrap();
        assert!(patch.defect_coords().contains(&Coord::new(99, 99)));
        assert_eq!(patch.stabs, before.stabs);
        assert_eq!(patch.data_coords, before.data_coords);
    }

    #[test]
    fn summary_serialises() {
        let patch = LogicalPatch::new(3, true).unwrap();
        let summary = patch.summary();
        assert_eq!(summary.data_qubits, 9);
        assert_eq!(summary.stabs, PerBasis::new(4, 4));
        let text = serde_json::to_string(&summary).unwrap();
        assert!(text.contains("\"data_qubits\":9"));
    }

    #[test]
    fn coord_index_matches_layout() {
        let patch = LogicalPatch::new(3, true).unwrap();
        assert_eq!(patch.coord_to_index(Coord::new(1, 1)), 1);
        assert_eq!(patch.coord_to_index(Coord::new(2, 0)), 2);
        assert_eq!(patch.coord_to_index(Coord::new(1, 3)), 8);
        assert_eq!(patch.coord_to_index(Coord::new(2, 2)), 9);
        assert_eq!(patch.coord_to_index(Coord::new(5, 5)), 19);
    }
}
