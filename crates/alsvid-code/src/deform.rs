//! Code deformation: removing qubits while keeping the code consistent.
//!
//! Removing a data qubit forces a destructive single-qubit measurement,
//! which anti-commutes with some of the surrounding stabilisers; those are
//! demoted to gauges and regrouped into super-stabilisers so their products
//! stay measurable. Removing an ancilla dissolves its operator into
//! single-body gauges. Both paths can cascade: boundaries wrap, corners
//! walk, and previously clean qubits become removable in turn.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::coord::{Basis, Coord, PerBasis, Support, anti_commute, xor_into};
use crate::error::{CodeError, CodeResult};
use crate::patch::LogicalPatch;

/// What a single deformation step decided to do.
enum StepOutcome {
    /// Gauges were added; the qubit should be gone after normalisation.
    Measured,
    /// A corner has to be removed before this qubit can be.
    CornerFirst(Coord),
}

impl LogicalPatch {
    /// Remove a data qubit, deforming boundaries and corners as needed.
    ///
    /// Runs a worklist: a step may require another qubit (a corner) to be
    /// removed first, in which case the original coordinate is requeued
    /// behind it.
    pub(crate) fn disable_data(&mut self, coord: Coord) -> CodeResult<()> {
        let mut pending = vec![coord];
        while let Some(q) = pending.pop() {
            if !self.data_coords.contains(&q) {
                continue;
            }
            match self.deformation_step(q)? {
                StepOutcome::Measured => {
                    self.normalise()?;
                    pending.push(q);
                }
                StepOutcome::CornerFirst(corner) => {
                    trace!(%q, %corner, "deferring removal until corner is gone");
                    pending.push(q);
                    pending.push(corner);
                }
            }
        }
        Ok(())
    }

    fn deformation_step(&mut self, coord: Coord) -> CodeResult<StepOutcome> {
        // Which boundary of each basis (if any) contains the qubit.
        let mut rel_edge_idx: PerBasis<Option<usize>> = PerBasis::default();
        for basis in Basis::BOTH {
            for idx in 0..2 {
                if self.edges[basis][idx].contains(&coord) {
                    rel_edge_idx[basis] = Some(idx);
                }
            }
        }

        match (rel_edge_idx.x, rel_edge_idx.z) {
            (None, None) => {
                // Bulk qubit: measure it out in both bases and let the
                // normaliser resolve the clash.
                trace!(%coord, "bulk removal");
                self.add_gauge(Basis::X, coord)?;
                self.add_gauge(Basis::Z, coord)?;
                Ok(StepOutcome::Measured)
            }
            (Some(i), None) => self.edge_step(coord, Basis::X, i),
            (None, Some(j)) => self.edge_step(coord, Basis::Z, j),
            (Some(i), Some(j)) => self.corner_step(coord, i, j),
        }
    }

    /// Stabiliser or super-stabiliser of `basis` acting on `coord`, if any.
    fn covering_operator(&self, basis: Basis, coord: Coord) -> Support {
        let mut found = Support::new();
        for stab in self.stabs[basis].values() {
            if stab.contains(&coord) {
                found = stab.clone();
            }
        }
        for members in &self.super_stabs[basis] {
            let product = self.super_stab_product(basis, members);
            if product.contains(&coord) {
                found = product;
            }
        }
        found
    }

    fn edge_step(&mut self, coord: Coord, basis: Basis, edge_idx: usize) -> CodeResult<StepOutcome> {
        let basis2 = basis.other();
        let anti = self.covering_operator(basis, coord);
        let corner_at = |k: usize| match basis {
            Basis::X => (edge_idx, k),
            Basis::Z => (k, edge_idx),
        };

        if anti.is_empty() {
            // The region is already gauge-rich: route the deformation
            // through the shorter of the two opposing boundaries instead.
            let k = if self.edges[basis2][0].len() < self.edges[basis2][1].len() { 0 } else { 1 };
            let (i, j) = corner_at(k);
            let corner = self.corners[i][j].ok_or(CodeError::MissingCorner { i, j })?;
            return Ok(StepOutcome::CornerFirst(corner));
        }

        let mut wrapped = None;
        for k in 0..2 {
            if !anti.is_disjoint(&self.edges[basis2][k]) {
                wrapped = Some(k);
            }
        }
        if let Some(k) = wrapped {
            // The covering operator wraps into the opposite boundary:
            // collapse through the corner they share.
            let (i, j) = corner_at(k);
            let corner = self.corners[i][j].ok_or(CodeError::MissingCorner { i, j })?;
            trace!(%coord, %corner, "boundary wraps; removing corner first");
            return Ok(StepOutcome::CornerFirst(corner));
        }

        // Measure the qubit in the complementary basis and promote that
        // measurement to a stabiliser, extending the boundary across the
        // covering operator.
        self.add_gauge(basis2, coord)?;
        self.fix_gauge(basis2, coord)?;
        Ok(StepOutcome::Measured)
    }

    fn corner_step(&mut self, coord: Coord, ix: usize, jz: usize) -> CodeResult<StepOutcome> {
        let anti: PerBasis<Support> = PerBasis::new(
            self.covering_operator(Basis::X, coord),
            self.covering_operator(Basis::Z, coord),
        );

        // Measurement basis: prefer the basis whose partner operator is
        // empty, then the longer boundary, then the larger operator.
        let edge_len = PerBasis::new(self.edges.x[ix].len(), self.edges.z[jz].len());
        let basis = if anti.x.is_empty() || anti.z.is_empty() {
            if anti.z.is_empty() { Basis::Z } else { Basis::X }
        } else if edge_len.x == edge_len.z {
            if anti.x.len() > anti.z.len() { Basis::X } else { Basis::Z }
        } else if edge_len.x > edge_len.z {
            Basis::X
        } else {
            Basis::Z
        };
        let basis2 = basis.other();
        let rel_idx = if basis == Basis::X { ix } else { jz };
        debug!(%coord, %basis, "removing corner qubit");

        // If the complementary operator bridges both boundaries of the
        // measurement basis, the far corner has to move (or go) first.
        let far_edge = self.edges[basis][1 - rel_idx].clone();
        let i = if basis == Basis::X { 1 - ix } else { ix };
        let j = if basis == Basis::Z { 1 - jz } else { jz };
        if !anti[basis2].is_disjoint(&far_edge) {
            let far_corner = self.corners[i][j].ok_or(CodeError::MissingCorner { i, j })?;
            if !anti[basis2].contains(&far_corner) {
                return Ok(StepOutcome::CornerFirst(far_corner));
            }
            let moved = self.corner_walk(far_corner, &far_edge, &anti[basis2], basis2)?;
            trace!(old = %far_corner, new = %moved, "far corner walked");
            self.corners[i][j] = Some(moved);
        }

        let own_edge = self.edges[basis][rel_idx].clone();
        let moved = self.corner_walk(coord, &own_edge, &anti[basis2], basis2)?;
        trace!(old = %coord, new = %moved, "corner walked");
        self.corners[ix][jz] = Some(moved);

        self.add_gauge(basis, coord)?;
        self.fix_gauge(basis, coord)?;
        Ok(StepOutcome::Measured)
    }

    /// Walk a corner along the chain of `basis2` measurements that overlap
    /// `edge`, shedding the remaining anti-commuting support step by step,
    /// until the boundary no longer intersects it. The endpoint is the new
    /// corner.
    fn corner_walk(
        &self,
        start: Coord,
        edge: &Support,
        anti: &Support,
        basis2: Basis,
    ) -> CodeResult<Coord> {
        let mut q = start;
        let mut remaining = anti.clone();
        remaining.remove(&start);

        let mut segments: Vec<Support> = Vec::new();
        for measurement in self.stabs[basis2].values().chain(self.gauges[basis2].values()) {
            let segment: Support = measurement.intersection(edge).copied().collect();
            if !segment.is_empty() {
                segments.push(segment);
            }
        }

        while edge.intersection(&remaining).next().is_some() {
            let mut advanced = false;
            for segment in segments.iter_mut() {
                if segment.remove(&q) {
                    q = segment
                        .pop_first()
                        .ok_or(CodeError::CornerWalkStuck { at: q })?;
                    advanced = true;
                    break;
                }
            }
            remaining.remove(&q);
            if !advanced {
                return Err(CodeError::CornerWalkStuck { at: q });
            }
        }
        Ok(q)
    }

    /// Remove a measurement qubit, dissolving its operator into gauges.
    pub(crate) fn disable_ancilla(&mut self, coord: Coord) -> CodeResult<()> {
        let basis = if self.stabs.x.contains_key(&coord) || self.gauges.x.contains_key(&coord) {
            Basis::X
        } else {
            Basis::Z
        };
        let basis2 = basis.other();

        while self.stabs[basis].contains_key(&coord) || self.gauges[basis].contains_key(&coord) {
            let measurement = self.stabs[basis]
                .get(&coord)
                .or_else(|| self.gauges[basis].get(&coord))
                .cloned()
                .unwrap_or_default();

            let mut edge_qubits = Support::new();
            let mut corner_qubits = Support::new();
            for &q in &measurement {
                if self.edges[basis2].iter().any(|e| e.contains(&q)) {
                    edge_qubits.insert(q);
                    if self.edges[basis].iter().any(|e| e.contains(&q)) {
                        corner_qubits.insert(q);
                    }
                }
            }

            let mut new_members: BTreeSet<Coord> = BTreeSet::new();

            if !edge_qubits.is_empty() {
                // Two qubits on the same boundary can be covered by a
                // virtual gauge at the reflection of the ancilla, extending
                // the operator outward past the boundary.
                let sum = edge_qubits
                    .iter()
                    .fold((0, 0), |acc, q| (acc.0 + q.x, acc.1 + q.y));
                let reflected = Coord::new(sum.0 - coord.x, sum.1 - coord.y);
                let vacant = !self.qubit_coords.contains(&reflected)
                    && !self.defect_coords.contains(&reflected);
                if edge_qubits.len() == 2 && vacant {
                    trace!(%coord, %reflected, "introducing virtual boundary gauge");
                    self.gauges[basis].insert(reflected, edge_qubits.clone());
                    new_members.insert(reflected);
                } else if let Some(&target) = corner_qubits.first().or_else(|| edge_qubits.first())
                {
                    self.disable_data(target)?;
                    continue;
                }
            }

            let interior: Vec<Coord> = measurement.difference(&edge_qubits).copied().collect();
            for q in interior {
                self.add_gauge(basis, q)?;
                new_members.insert(q);
            }

            if self.stabs[basis].remove(&coord).is_some() {
                self.super_stabs[basis].push(new_members);
            } else if self.gauges[basis].remove(&coord).is_some() {
                for members in self.super_stabs[basis].iter_mut() {
                    if members.remove(&coord) {
                        xor_into(members, &new_members);
                    }
                }
            }

            self.normalise()?;
        }
        Ok(())
    }

    /// Introduce a single-body `basis` gauge at `coord`.
    ///
    /// Every complementary stabiliser acting on `coord` now anti-commutes
    /// with a measured operator and is demoted to a gauge; super-stabilisers
    /// are created, merged or retired so that products of demoted gauges
    /// remain measurable, and the logical operator and boundaries that ran
    /// through `coord` are rerouted across one covering stabiliser.
    pub(crate) fn add_gauge(&mut self, basis: Basis, coord: Coord) -> CodeResult<()> {
        if self.gauges[basis].contains_key(&coord) {
            return Ok(());
        }
        let basis2 = basis.other();

        let anti_stabs: Vec<Coord> = self.stabs[basis2]
            .iter()
            .filter(|(_, stab)| stab.contains(&coord))
            .map(|(&key, _)| key)
            .collect();
        let anti_super_stabs: Vec<usize> = self.super_stabs[basis2]
            .iter()
            .enumerate()
            .filter(|(_, members)| self.super_stab_product(basis2, members).contains(&coord))
            .map(|(idx, _)| idx)
            .collect();

        // Reroute logical information through one covering operator before
        // anything is demoted.
        let representative: Support = if let Some(key) = anti_stabs.first() {
            self.stabs[basis2][key].clone()
        } else if let Some(&idx) = anti_super_stabs.first() {
            self.super_stab_product(basis2, &self.super_stabs[basis2][idx])
        } else {
            Support::new()
        };

        if self.observable[basis2].contains(&coord) {
            if representative.is_empty() {
                return Err(CodeError::InformationLoss { basis: basis2, coord });
            }
            let rerouted = representative.clone();
            xor_into(&mut self.observable[basis2], &rerouted);
        }
        for k in 0..2 {
            if self.edges[basis2][k].contains(&coord) {
                if representative.is_empty() {
                    return Err(CodeError::InformationLoss { basis: basis2, coord });
                }
                let rerouted = representative.clone();
                xor_into(&mut self.edges[basis2][k], &rerouted);
            }
        }

        self.gauges[basis].insert(coord, Support::from([coord]));
        for key in &anti_stabs {
            if let Some(stab) = self.stabs[basis2].remove(key) {
                self.gauges[basis2].insert(*key, stab);
            }
        }

        match (anti_stabs.len(), anti_super_stabs.len()) {
            (2, _) => {
                self.super_stabs[basis2].push(anti_stabs.iter().copied().collect());
            }
            (_, 2) => {
                let absorbed = self.super_stabs[basis2].remove(anti_super_stabs[1]);
                xor_into(&mut self.super_stabs[basis2][anti_super_stabs[0]], &absorbed);
            }
            (1, 1) => {
                self.super_stabs[basis2][anti_super_stabs[0]].insert(anti_stabs[0]);
            }
            (0, 1) => {
                self.super_stabs[basis2].remove(anti_super_stabs[0]);
            }
            _ => {}
        }
        Ok(())
    }

    /// Promote a gauge to a stabiliser.
    ///
    /// The gauge leaves every super-stabiliser, and any complementary gauge
    /// anti-commuting with it can no longer be measured and is dropped
    /// together with its super-stabilisers.
    pub(crate) fn fix_gauge(&mut self, basis: Basis, coord: Coord) -> CodeResult<()> {
        let gauge = self.gauges[basis]
            .remove(&coord)
            .ok_or(CodeError::MissingGauge { basis, coord })?;
        for members in self.super_stabs[basis].iter_mut() {
            members.remove(&coord);
        }

        let basis2 = basis.other();
        let doomed: Vec<Coord> = self.gauges[basis2]
            .iter()
            .filter(|(_, other)| anti_commute(&gauge, other))
            .map(|(&key, _)| key)
            .collect();
        for key in doomed {
            self.gauges[basis2].remove(&key);
            self.super_stabs[basis2].retain(|members| !members.contains(&key));
        }

        self.stabs[basis].insert(coord, gauge);
        Ok(())
    }
}
