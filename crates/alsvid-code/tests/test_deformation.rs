//! Tests for the code deformation engine.

use std::collections::BTreeSet;

use alsvid_code::{Basis, Coord, LogicalPatch, Support, anti_commute};

fn c(x: i32, y: i32) -> Coord {
    Coord::new(x, y)
}

fn supp(coords: &[(i32, i32)]) -> Support {
    coords.iter().map(|&(x, y)| Coord::new(x, y)).collect()
}

/// Structural invariants that must hold after any successful deformation.
fn assert_consistent(patch: &LogicalPatch) {
    for basis in Basis::BOTH {
        // No data qubit is gauged in both bases.
        for q in patch.data_coords() {
            assert!(
                !(patch.gauges(Basis::X).contains_key(q) && patch.gauges(Basis::Z).contains_key(q)),
                "{q} gauged in both bases"
            );
        }

        // Super-stabilisers are non-empty and reference live gauges.
        // A gauge may serve in more than one super-stabiliser when dense
        // ancilla defects overlap.
        for members in patch.super_stabs(basis) {
            assert!(!members.is_empty(), "empty super-stabiliser survived");
            for key in members {
                assert!(
                    patch.gauges(basis).contains_key(key),
                    "super-stabiliser references dead gauge {key}"
                );
            }
        }

        // Every super-stabiliser product is a genuine stabiliser: it
        // commutes with the whole complementary gauge set.
        for members in patch.super_stabs(basis) {
            let product = patch.super_stab_product(basis, members);
            for other in patch.gauges(basis.other()).values() {
                assert!(
                    !anti_commute(&product, other),
                    "super-stabiliser product anti-commutes with a {} gauge",
                    basis.other()
                );
            }
        }

        // The observable commutes with every complementary stabiliser and
        // gauge.
        let observable = patch.observable(basis);
        for other in patch
            .stabs(basis.other())
            .values()
            .chain(patch.gauges(basis.other()).values())
        {
            assert!(
                !anti_commute(observable, other),
                "{basis} observable anti-commutes with a {} operator",
                basis.other()
            );
        }
    }

    // Boundaries of opposite bases only meet at corners.
    for i in 0..2 {
        for j in 0..2 {
            let overlap: Vec<&Coord> = patch.edges(Basis::X)[i]
                .intersection(&patch.edges(Basis::Z)[j])
                .collect();
            for q in overlap {
                assert_eq!(Some(*q), patch.corner(i, j), "stray boundary overlap at {q}");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Corner removal
// ---------------------------------------------------------------------------

#[test]
fn corner_defect_walks_corner_and_shrinks_distance() {
    let mut patch = LogicalPatch::new(3, true).unwrap();
    patch.disable(c(1, 1)).unwrap();
    assert_consistent(&patch);

    assert!(!patch.data_coords().contains(&c(1, 1)));
    assert_eq!(patch.data_coords().len(), 8);

    // The corner moved along the bottom boundary.
    assert_eq!(patch.corner(0, 0), Some(c(3, 1)));
    assert_eq!(patch.corner(1, 0), Some(c(5, 1)));

    // The deformation resolves without leftover gauges.
    assert!(patch.gauges(Basis::X).is_empty());
    assert!(patch.gauges(Basis::Z).is_empty());
    assert!(patch.super_stabs(Basis::X).is_empty());
    assert!(patch.super_stabs(Basis::Z).is_empty());

    // One stabiliser per basis absorbed the removed qubit.
    assert_eq!(patch.stabs(Basis::X).len(), 3);
    assert_eq!(patch.stabs(Basis::Z).len(), 4);
    assert_eq!(patch.stabs(Basis::Z)[&c(2, 2)], supp(&[(1, 3), (3, 1), (3, 3)]));
    assert_eq!(patch.stabs(Basis::X)[&c(4, 6)], supp(&[(3, 5), (5, 5)]));

    assert_eq!(*patch.observable(Basis::X), supp(&[(1, 3), (1, 5), (3, 1)]));
    assert_eq!(*patch.observable(Basis::Z), supp(&[(3, 1), (5, 1)]));
    assert_eq!(patch.edges(Basis::Z)[0], supp(&[(3, 1), (5, 1)]));

    patch.update_distance().unwrap();
    assert_eq!(patch.distance(Basis::X), 3);
    assert_eq!(patch.distance(Basis::Z), 2);
}

// ---------------------------------------------------------------------------
// Ancilla removal
// ---------------------------------------------------------------------------

#[test]
fn bulk_ancilla_defect_creates_super_stabilisers() {
    let mut patch = LogicalPatch::new(5, true).unwrap();
    patch.disable(c(4, 4)).unwrap();
    assert_consistent(&patch);

    // The lost plaquette dissolves into four single-body Z gauges whose
    // product is the old stabiliser; the four demoted X neighbours form
    // the matching X super-stabiliser.
    assert_eq!(patch.super_stabs(Basis::Z).len(), 1);
    assert_eq!(
        patch.super_stabs(Basis::Z)[0],
        supp(&[(3, 3), (3, 5), (5, 3), (5, 5)])
    );
    assert_eq!(patch.super_stabs(Basis::X).len(), 1);
    assert_eq!(
        patch.super_stabs(Basis::X)[0],
        supp(&[(2, 4), (4, 2), (4, 6), (6, 4)])
    );
    assert_eq!(patch.stabs(Basis::X).len(), 8);
    assert_eq!(patch.stabs(Basis::Z).len(), 11);

    // No data qubit was lost.
    assert_eq!(patch.data_coords().len(), 25);

    // Super-stabilisers shorten the matching path for Z.
    patch.update_distance().unwrap();
    assert_eq!(patch.distance(Basis::X), 5);
    assert_eq!(patch.distance(Basis::Z), 3);
}

#[test]
fn bulk_x_ancilla_defect_leaves_data_gauges() {
    let mut patch = LogicalPatch::new(5, true).unwrap();
    patch.disable(c(6, 4)).unwrap();
    assert_consistent(&patch);

    // The X plaquette dissolves into single-body gauges keyed at its own
    // data qubits.
    let gauge_keys: Vec<Coord> = patch.gauges(Basis::X).keys().copied().collect();
    assert_eq!(gauge_keys, vec![c(5, 3), c(5, 5), c(7, 3), c(7, 5)]);
    for key in &gauge_keys {
        assert!(patch.data_coords().contains(key));
        assert_eq!(patch.gauges(Basis::X)[key], supp(&[(key.x, key.y)]));
    }
    assert_eq!(
        patch.super_stabs(Basis::Z)[0],
        supp(&[(4, 4), (6, 2), (6, 6), (8, 4)])
    );
    assert_eq!(patch.stabs(Basis::X).len(), 11);
    assert_eq!(patch.stabs(Basis::Z).len(), 8);

    patch.update_distance().unwrap();
    assert_eq!(patch.distance(Basis::X), 3);
    assert_eq!(patch.distance(Basis::Z), 5);
}

// ---------------------------------------------------------------------------
// Bulk data removal
// ---------------------------------------------------------------------------

#[test]
fn bulk_data_defect_merges_neighbouring_plaquettes() {
    let mut patch = LogicalPatch::new(5, true).unwrap();
    patch.disable(c(5, 5)).unwrap();
    assert_consistent(&patch);

    assert!(!patch.data_coords().contains(&c(5, 5)));

    // The clashing one-body gauges cancel; what survives is a
    // super-stabiliser pair built from the demoted neighbours.
    assert_eq!(patch.super_stabs(Basis::X), &[supp(&[(4, 6), (6, 4)])]);
    assert_eq!(patch.super_stabs(Basis::Z), &[supp(&[(4, 4), (6, 6)])]);
    assert_eq!(
        patch.gauges(Basis::X)[&c(4, 6)],
        supp(&[(3, 5), (3, 7), (5, 7)])
    );
    assert_eq!(
        patch.gauges(Basis::Z)[&c(4, 4)],
        supp(&[(3, 3), (3, 5), (5, 3)])
    );

    patch.update_distance().unwrap();
    assert_eq!(patch.distance(Basis::X), 4);
    assert_eq!(patch.distance(Basis::Z), 4);
}

// ---------------------------------------------------------------------------
// Idempotence and order independence
// ---------------------------------------------------------------------------

#[test]
fn disable_is_idempotent() {
    let mut once = LogicalPatch::new(5, true).unwrap();
    once.disable(c(5, 5)).unwrap();
    let mut twice = once.clone();
    twice.disable(c(5, 5)).unwrap();
    assert_eq!(once, twice);

    once.disable(c(4, 4)).unwrap();
    let mut again = once.clone();
    again.disable(c(4, 4)).unwrap();
    assert_eq!(once, again);
}

#[test]
fn distant_defects_commute() {
    let mut ab = LogicalPatch::new(9, true).unwrap();
    ab.disable(c(5, 5)).unwrap();
    ab.disable(c(13, 13)).unwrap();

    let mut ba = LogicalPatch::new(9, true).unwrap();
    ba.disable(c(13, 13)).unwrap();
    ba.disable(c(5, 5)).unwrap();

    assert_eq!(ab.data_coords(), ba.data_coords());
    assert_eq!(ab.stabs(Basis::X), ba.stabs(Basis::X));
    assert_eq!(ab.stabs(Basis::Z), ba.stabs(Basis::Z));
    assert_eq!(ab.gauges(Basis::X), ba.gauges(Basis::X));
    assert_eq!(ab.gauges(Basis::Z), ba.gauges(Basis::Z));
    for basis in Basis::BOTH {
        assert_eq!(ab.observable(basis), ba.observable(basis));
        assert_eq!(ab.edges(basis), ba.edges(basis));
        // Super-stabilisers match as sets; their creation order differs.
        let lhs: BTreeSet<_> = ab.super_stabs(basis).iter().cloned().collect();
        let rhs: BTreeSet<_> = ba.super_stabs(basis).iter().cloned().collect();
        assert_eq!(lhs, rhs);
    }
}

// ---------------------------------------------------------------------------
// Dense defect pattern
// ---------------------------------------------------------------------------

/// Roughly a hundred defects on a distance-15 patch, including clusters,
/// boundary hits and repeated neighbourhoods. The deformation must absorb
/// all of them and still report a positive distance in both bases.
#[test]
fn dense_defect_pattern_survives() {
    let defects = [
        (20, 20), (3, 13), (28, 12), (19, 9), (10, 6), (5, 19), (8, 18), (17, 21),
        (11, 23), (13, 17), (21, 9), (15, 23), (24, 26), (16, 22), (22, 10), (5, 3),
        (8, 2), (3, 15), (28, 14), (17, 23), (2, 4), (0, 16), (13, 1), (26, 16),
        (14, 8), (5, 5), (9, 3), (3, 17), (28, 16), (23, 29), (9, 21), (15, 9),
        (6, 6), (1, 19), (26, 18), (18, 14), (25, 29), (16, 26), (22, 14), (29, 29),
        (5, 7), (20, 26), (21, 25), (12, 22), (4, 18), (13, 5), (26, 2), (24, 14),
        (13, 23), (18, 16), (29, 13), (12, 6), (28, 2), (22, 16), (14, 12), (17, 11),
        (3, 21), (10, 8), (1, 5), (26, 4), (8, 20), (15, 13), (7, 9), (10, 26),
        (2, 22), (29, 15), (16, 30), (21, 11), (3, 5), (22, 18), (4, 4), (14, 14),
        (5, 11), (19, 13), (10, 10), (1, 7), (13, 9), (8, 22), (18, 2), (25, 17),
        (7, 11), (1, 25), (23, 1), (29, 17), (20, 14), (6, 24), (4, 6), (27, 29),
        (29, 25), (3, 25), (29, 23), (29, 21), (27, 21), (25, 21), (13, 21), (29, 1),
        (23, 3), (25, 5), (5, 17), (7, 15), (9, 15), (11, 21), (11, 17),
    ];

    let mut patch = LogicalPatch::new(15, true).unwrap();
    for &(x, y) in &defects {
        patch.disable(c(x, y)).unwrap();
        assert_consistent(&patch);
    }
    patch.update_distance().unwrap();

    assert_eq!(patch.data_coords().len(), 28);
    assert_eq!(patch.super_stabs(Basis::X).len(), 1);
    assert_eq!(patch.super_stabs(Basis::Z).len(), 1);
    assert_eq!(patch.distance(Basis::X), 8);
    assert_eq!(patch.distance(Basis::Z), 1);

    // The surviving Z super-stabiliser is carried by data-qubit gauges,
    // which the circuit generator measures directly.
    for key in patch.super_stabs(Basis::Z)[0].iter() {
        assert!(patch.data_coords().contains(key));
    }
}
