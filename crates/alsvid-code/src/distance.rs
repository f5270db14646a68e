//! Code-distance recomputation on the syndrome-adjacency graph.

use std::collections::BTreeMap;

use petgraph::algo::dijkstra;
use petgraph::graph::{NodeIndex, UnGraph};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::coord::{Basis, Coord, PerBasis};
use crate::error::{CodeError, CodeResult};
use crate::patch::LogicalPatch;

/// Node of the distance graph for one basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum SyndromeNode {
    /// A stabiliser, by key.
    Stab(Coord),
    /// A super-stabiliser, by index.
    Cluster(usize),
    /// One of the two boundaries of the basis.
    Boundary(usize),
}

impl LogicalPatch {
    /// Recompute the code distance of both bases from the current shape.
    ///
    /// Each data qubit chains together the two syndrome nodes that see it
    /// (a stabiliser, a super-stabiliser or a boundary); the distance of a
    /// basis is the hop count between the two complementary boundaries. A
    /// patch whose observables are gone has distance one by convention.
    pub fn update_distance(&mut self) -> CodeResult<()> {
        if self.observable.x.is_empty() && self.observable.z.is_empty() {
            self.distance = PerBasis::splat(1);
            return Ok(());
        }

        for (basis, basis2) in Basis::PAIRS {
            let mut graph: UnGraph<SyndromeNode, ()> = UnGraph::new_undirected();
            let mut nodes: FxHashMap<SyndromeNode, NodeIndex> = FxHashMap::default();
            let mut add = |graph: &mut UnGraph<SyndromeNode, ()>, node: SyndromeNode| {
                let idx = graph.add_node(node);
                nodes.insert(node, idx);
                idx
            };
            for &key in self.stabs[basis].keys() {
                add(&mut graph, SyndromeNode::Stab(key));
            }
            for idx in 0..self.super_stabs[basis].len() {
                add(&mut graph, SyndromeNode::Cluster(idx));
            }
            let start = add(&mut graph, SyndromeNode::Boundary(0));
            let goal = add(&mut graph, SyndromeNode::Boundary(1));

            let mut touching: BTreeMap<Coord, Vec<SyndromeNode>> = self
                .data_coords
                .iter()
                .map(|&q| (q, Vec::new()))
                .collect();
            for (&key, stab) in &self.stabs[basis] {
                for q in stab {
                    if let Some(list) = touching.get_mut(q) {
                        list.push(SyndromeNode::Stab(key));
                    }
                }
            }
            for (idx, members) in self.super_stabs[basis].iter().enumerate() {
                for q in &self.super_stab_product(basis, members) {
                    if let Some(list) = touching.get_mut(q) {
                        list.push(SyndromeNode::Cluster(idx));
                    }
                }
            }
            for k in 0..2 {
                for q in &self.edges[basis][k] {
                    if let Some(list) = touching.get_mut(q) {
                        list.push(SyndromeNode::Boundary(k));
                    }
                }
            }

            for (&q, list) in &touching {
                match list.as_slice() {
                    [] => {}
                    [_] => return Err(CodeError::DanglingDataQubit { coord: q }),
                    [a, b, ..] => {
                        graph.add_edge(nodes[a], nodes[b], ());
                    }
                }
            }

            let lengths = dijkstra(&graph, start, Some(goal), |_| 1usize);
            let hops = *lengths
                .get(&goal)
                .ok_or(CodeError::BoundaryNotConnected { basis })?;
            self.distance[basis2] = hops;
        }
        debug!(x = self.distance.x, z = self.distance.z, "recomputed code distance");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pristine_distances() {
        for d in [2, 3, 5, 7] {
            let mut patch = LogicalPatch::new(d, true).unwrap();
            patch.update_distance().unwrap();
            assert_eq!(patch.distance(Basis::X), d);
            assert_eq!(patch.distance(Basis::Z), d);
        }
    }

    #[test]
    fn edge_defect_shrinks_one_basis() {
        let mut patch = LogicalPatch::new(5, true).unwrap();
        patch.disable(Coord::new(1, 5)).unwrap();
        patch.update_distance().unwrap();
        assert_eq!(patch.distance(Basis::X), 5);
        assert_eq!(patch.distance(Basis::Z), 4);
    }
}
