//! The consistency normaliser.
//!
//! After every deformation step the patch is driven to a fixpoint:
//! clashing destructive measurements cancel, gauges that became genuine
//! stabilisers are promoted, trivial operators are purged, over-merged
//! super-stabilisers are split along their anti-commutation relation, and
//! regions that collapsed into a boundary are deleted outright. The pass
//! ends by asserting that opposite-basis boundaries only meet at corners.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::coord::{Basis, Coord, Support, anti_commute, xor_into};
use crate::error::{CodeError, CodeResult};
use crate::patch::LogicalPatch;

/// Node of the per-basis connectivity graph used for region pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PruneNode {
    /// A stabiliser or gauge, by key.
    Measurement(Coord),
    /// A super-stabiliser hub, by index.
    Cluster(usize),
}

impl LogicalPatch {
    /// Drive the patch to a consistent fixpoint.
    pub(crate) fn normalise(&mut self) -> CodeResult<()> {
        let mut changed = true;
        while changed {
            changed = false;

            changed |= self.cancel_dual_basis_measurements();
            changed |= self.promote_or_drop_gauges()?;
            for basis in Basis::BOTH {
                changed |= self.canonicalise_gauges(basis);
                changed |= self.purge_trivial_stabs(basis);
                self.super_stabs[basis].retain(|members| !members.is_empty());
            }

            if !changed {
                changed |= self.split_super_stabs()?;
            }
            if !changed {
                changed |= self.prune_collapsed_regions()?;
                self.recompute_coords();
            }
        }

        self.assert_corner_separation()
    }

    /// A data qubit gauged in both bases is being destructively measured
    /// either way: erase it from every gauge support.
    fn cancel_dual_basis_measurements(&mut self) -> bool {
        let dual: Vec<Coord> = self
            .data_coords
            .iter()
            .copied()
            .filter(|q| self.gauges.x.contains_key(q) && self.gauges.z.contains_key(q))
            .collect();
        for q in &dual {
            trace!(coord = %q, "cancelling clashing destructive measurements");
            for basis in Basis::BOTH {
                for gauge in self.gauges[basis].values_mut() {
                    gauge.remove(q);
                }
            }
        }
        !dual.is_empty()
    }

    /// Promote gauges that commute with the whole complementary gauge set;
    /// delete gauges no super-stabiliser uses.
    fn promote_or_drop_gauges(&mut self) -> CodeResult<bool> {
        let mut changed = false;
        for (basis, basis2) in Basis::PAIRS {
            let used: BTreeSet<Coord> = self.super_stabs[basis]
                .iter()
                .flat_map(|members| members.iter().copied())
                .collect();
            let keys: Vec<Coord> = self.gauges[basis].keys().copied().collect();
            for key in keys {
                let Some(gauge) = self.gauges[basis].get(&key) else {
                    continue;
                };
                let commutes_with_all = self.gauges[basis2]
                    .values()
                    .all(|other| !anti_commute(gauge, other));
                if commutes_with_all {
                    self.fix_gauge(basis, key)?;
                    changed = true;
                } else if !used.contains(&key) {
                    self.gauges[basis].remove(&key);
                    changed = true;
                }
            }
        }
        Ok(changed)
    }

    /// Re-key single-qubit gauges onto the qubit they act on and drop
    /// gauges whose support has emptied out.
    fn canonicalise_gauges(&mut self, basis: Basis) -> bool {
        let mut changed = false;
        let keys: Vec<Coord> = self.gauges[basis].keys().copied().collect();
        for key in keys {
            let Some(gauge) = self.gauges[basis].get(&key) else {
                continue;
            };
            if gauge.len() == 1 {
                let Some(&q) = gauge.first() else {
                    continue;
                };
                if q != key {
                    self.gauges[basis].insert(q, Support::from([q]));
                    let single = Support::from([q]);
                    for members in self.super_stabs[basis].iter_mut() {
                        if members.contains(&key) {
                            xor_into(members, &single);
                        }
                    }
                    self.gauges[basis].remove(&key);
                    for members in self.super_stabs[basis].iter_mut() {
                        members.remove(&key);
                    }
                    changed = true;
                }
            } else if gauge.is_empty() {
                self.gauges[basis].remove(&key);
                for members in self.super_stabs[basis].iter_mut() {
                    members.remove(&key);
                }
            }
        }
        changed
    }

    /// A weight-one stabiliser pins its qubit: the qubit leaves every
    /// same-basis operator, the observable and the boundaries. Empty
    /// stabilisers are dropped.
    fn purge_trivial_stabs(&mut self, basis: Basis) -> bool {
        let mut changed = false;
        let keys: Vec<Coord> = self.stabs[basis].keys().copied().collect();
        for key in keys {
            let Some(stab) = self.stabs[basis].get(&key) else {
                continue;
            };
            match stab.first().copied() {
                Some(q) if stab.len() == 1 => {
                    trace!(coord = %q, %basis, "weight-one stabiliser pins qubit");
                    for measurement in self.stabs[basis].values_mut() {
                        measurement.remove(&q);
                    }
                    for measurement in self.gauges[basis].values_mut() {
                        measurement.remove(&q);
                    }
                    self.observable[basis].remove(&q);
                    for k in 0..2 {
                        self.edges[basis][k].remove(&q);
                    }
                    self.stabs[basis].remove(&key);
                    changed = true;
                }
                None => {
                    self.stabs[basis].remove(&key);
                }
                _ => {}
            }
        }
        changed
    }

    /// Split any super-stabiliser whose gauges fall into disjoint
    /// anti-commutation components.
    fn split_super_stabs(&mut self) -> CodeResult<bool> {
        let mut changed = false;
        for (basis, basis2) in Basis::PAIRS {
            let mut partners: BTreeMap<Coord, BTreeSet<Coord>> = BTreeMap::new();
            for (&key, gauge) in &self.gauges[basis] {
                let anti: BTreeSet<Coord> = self.gauges[basis2]
                    .iter()
                    .filter(|(_, other)| anti_commute(gauge, other))
                    .map(|(&other_key, _)| other_key)
                    .collect();
                partners.insert(key, anti);
            }

            let mut idx = 0;
            while idx < self.super_stabs[basis].len() {
                let mut members = std::mem::take(&mut self.super_stabs[basis][idx]);
                let Some(seed) = members.pop_first() else {
                    idx += 1;
                    continue;
                };
                let mut component = BTreeSet::from([seed]);
                let mut frontier = partners
                    .get(&seed)
                    .ok_or(CodeError::DanglingGauge { basis, coord: seed })?
                    .clone();

                while !frontier.is_empty() {
                    let mut advanced = false;
                    for (key, anti) in &partners {
                        if !component.contains(key)
                            && members.contains(key)
                            && !anti.is_disjoint(&frontier)
                        {
                            members.remove(key);
                            component.insert(*key);
                            xor_into(&mut frontier, anti);
                            advanced = true;
                        }
                    }
                    if !advanced {
                        return Err(CodeError::SuperStabSplitStuck {
                            seed,
                            remaining: members.len(),
                        });
                    }
                }

                if members.is_empty() {
                    // Fully connected: restore as it was.
                    self.super_stabs[basis][idx] = component;
                } else {
                    debug!(%basis, split = component.len(), rest = members.len(),
                        "splitting super-stabiliser");
                    self.super_stabs[basis][idx] = members;
                    self.super_stabs[basis].push(component);
                    changed = true;
                }
                idx += 1;
            }
        }
        Ok(changed)
    }

    /// Delete every region whose combined operator collapsed into a single
    /// boundary: its measurements no longer protect anything.
    fn prune_collapsed_regions(&mut self) -> CodeResult<bool> {
        let mut changed = false;
        for basis in Basis::BOTH {
            let merged_keys: BTreeSet<Coord> = self.stabs[basis]
                .keys()
                .chain(self.gauges[basis].keys())
                .copied()
                .collect();

            let mut graph: UnGraph<PruneNode, ()> = UnGraph::new_undirected();
            let mut nodes: FxHashMap<PruneNode, NodeIndex> = FxHashMap::default();
            for &key in &merged_keys {
                let node = PruneNode::Measurement(key);
                nodes.insert(node, graph.add_node(node));
            }

            // Measurements sharing a data qubit are adjacent.
            let mut touching: BTreeMap<Coord, BTreeSet<Coord>> = BTreeMap::new();
            for &key in &merged_keys {
                let support = self.gauges[basis]
                    .get(&key)
                    .or_else(|| self.stabs[basis].get(&key));
                if let Some(support) = support {
                    for &q in support {
                        touching.entry(q).or_default().insert(key);
                    }
                }
            }
            for q in &self.data_coords {
                let Some(keys) = touching.get(q) else { continue };
                let keys: Vec<Coord> = keys.iter().copied().collect();
                if let [a, b] = keys[..] {
                    graph.add_edge(
                        nodes[&PruneNode::Measurement(a)],
                        nodes[&PruneNode::Measurement(b)],
                        (),
                    );
                }
            }

            // Super-stabilisers connect their members in a hub star.
            for (idx, members) in self.super_stabs[basis].iter().enumerate() {
                let hub = graph.add_node(PruneNode::Cluster(idx));
                for key in members {
                    let member = nodes
                        .get(&PruneNode::Measurement(*key))
                        .ok_or(CodeError::DanglingGauge { basis, coord: *key })?;
                    graph.add_edge(hub, *member, ());
                }
            }

            let mut components = UnionFind::new(graph.node_count());
            for edge in graph.edge_references() {
                components.union(edge.source().index(), edge.target().index());
            }
            let labels = components.into_labeling();
            let mut grouped: BTreeMap<usize, Vec<Coord>> = BTreeMap::new();
            for node in graph.node_indices() {
                if let PruneNode::Measurement(key) = graph[node] {
                    grouped.entry(labels[node.index()]).or_default().push(key);
                }
            }

            for keys in grouped.values() {
                let mut support_union = Support::new();
                let mut product = Support::new();
                for key in keys {
                    let support = self.gauges[basis]
                        .get(key)
                        .or_else(|| self.stabs[basis].get(key));
                    if let Some(support) = support {
                        support_union.extend(support.iter().copied());
                        xor_into(&mut product, support);
                    }
                }
                let collapsed = (0..2).any(|k| product.is_subset(&self.edges[basis][k]));
                if !collapsed {
                    continue;
                }
                debug!(%basis, qubits = support_union.len(), "pruning region collapsed into boundary");
                for basis2 in Basis::BOTH {
                    for measurement in self.stabs[basis2].values_mut() {
                        for q in &support_union {
                            measurement.remove(q);
                        }
                    }
                    for measurement in self.gauges[basis2].values_mut() {
                        for q in &support_union {
                            measurement.remove(q);
                        }
                    }
                    for k in 0..2 {
                        for q in &support_union {
                            self.edges[basis2][k].remove(q);
                        }
                    }
                    for q in &support_union {
                        self.observable[basis2].remove(q);
                    }
                }
                changed = true;
            }
        }
        Ok(changed)
    }

    /// Rebuild the live coordinate sets from the surviving operators.
    fn recompute_coords(&mut self) {
        let mut data = BTreeSet::new();
        for basis in Basis::BOTH {
            for support in self.stabs[basis].values().chain(self.gauges[basis].values()) {
                data.extend(support.iter().copied());
            }
            data.extend(self.observable[basis].iter().copied());
        }
        let mut qubits = data.clone();
        for basis in Basis::BOTH {
            qubits.extend(self.stabs[basis].keys().copied());
            qubits.extend(self.gauges[basis].keys().copied());
        }
        self.data_coords = data;
        self.qubit_coords = qubits;
    }

    /// Opposite-basis boundaries may only meet at their canonical corner.
    fn assert_corner_separation(&self) -> CodeResult<()> {
        for i in 0..2 {
            for j in 0..2 {
                let offending = self.edges.x[i]
                    .intersection(&self.edges.z[j])
                    .find(|&&q| Some(q) != self.corners[i][j]);
                if let Some(&coord) = offending {
                    return Err(CodeError::BoundaryOverlap { i, j, coord });
                }
            }
        }
        Ok(())
    }
}
