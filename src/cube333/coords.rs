//! Coordinates of the 3x3x3 cube used by the solvers.

use super::Cube3;
use crate::coord::Coordinate;
use crate::group::{Orbits, Orient, Perm};

/// Corner orientation, `3^7` values.
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone, Hash)]
pub struct CornerOrient;

/// Corner permutation, `8!` values.
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone, Hash)]
pub struct CornerPerm;

impl Coordinate<Cube3> for CornerOrient {
    fn count(&self) -> usize {
        Orient::<8, 3>::COUNT
    }

    fn from_puzzle(&self, puzzle: &Cube3) -> usize {
        puzzle.c.o.rank()
    }

    fn to_puzzle(&self, coord: usize) -> Cube3 {
        let mut c = Cube3::SOLVED;
        c.c.o = Orient::unrank(coord);
        c
    }
}

impl Coordinate<Cube3> for CornerPerm {
    fn count(&self) -> usize {
        Perm::<8>::COUNT
    }

    fn from_puzzle(&self, puzzle: &Cube3) -> usize {
        puzzle.c.p.rank()
    }

    fn to_puzzle(&self, coord: usize) -> Cube3 {
        let mut c = Cube3::SOLVED;
        c.c.p = Perm::unrank(coord);
        c
    }
}

/// Corner permutation and orientation, ranked as `cp * 3^7 + co`.
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone, Hash)]
pub struct Corners;

impl Coordinate<Cube3> for Corners {
    fn count(&self) -> usize {
        Perm::<8>::COUNT * Orient::<8, 3>::COUNT
    }

    fn from_puzzle(&self, puzzle: &Cube3) -> usize {
        puzzle.c.p.rank() * Orient::<8, 3>::COUNT + puzzle.c.o.rank()
    }

    fn to_puzzle(&self, coord: usize) -> Cube3 {
        let mut c = Cube3::SOLVED;
        c.c.p = Perm::unrank(coord / Orient::<8, 3>::COUNT);
        c.c.o = Orient::unrank(coord % Orient::<8, 3>::COUNT);
        c
    }
}

/// The E slice orbits `{0, 1, 2, 3} {4..12}`, where edges of the E slice are indistinguishable.
pub fn e_slice() -> Orbits {
    Orbits::new(vec![vec![0, 1, 2, 3], (4..12).collect()])
}

/// The orbits `{0} {1} {2} {3} {4..12}`, where the E slice edges are told apart.
pub fn e_slice_each() -> Orbits {
    Orbits::new(vec![vec![0], vec![1], vec![2], vec![3], (4..12).collect()])
}

/// The orbits `{0} .. {5} {6, 7}` of corners, which forget the parity of the corner
/// permutation.
pub fn corners_but_last_pair() -> Orbits {
    let mut classes: Vec<Vec<u8>> = (0..6).map(|i| vec![i]).collect();
    classes.push(vec![6, 7]);
    Orbits::new(classes)
}

/// The grouped edge permutation together with edge orientation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeGroupedOrient {
    orbits: Orbits,
}

impl EdgeGroupedOrient {
    /// Group edges by `orbits`.
    pub fn new(orbits: Orbits) -> Self {
        assert_eq!(orbits.len(), 12);
        EdgeGroupedOrient { orbits }
    }
}

impl Coordinate<Cube3> for EdgeGroupedOrient {
    fn count(&self) -> usize {
        self.orbits.count() * Orient::<12, 2>::COUNT
    }

    fn from_puzzle(&self, puzzle: &Cube3) -> usize {
        let mut g = [0; 12];
        self.orbits.group(&puzzle.e.p.0, &mut g);
        self.orbits.rank(&g) * Orient::<12, 2>::COUNT + puzzle.e.o.rank()
    }

    fn to_puzzle(&self, coord: usize) -> Cube3 {
        let mut g = [0; 12];
        let mut c = Cube3::SOLVED;
        self.orbits
            .unrank(coord / Orient::<12, 2>::COUNT, &mut g);
        self.orbits.ungroup(&g, &mut c.e.p.0);
        c.e.o = Orient::unrank(coord % Orient::<12, 2>::COUNT);
        c
    }
}

/// The grouped corner permutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CornerGrouped {
    orbits: Orbits,
}

impl CornerGrouped {
    /// Group corners by `orbits`.
    pub fn new(orbits: Orbits) -> Self {
        assert_eq!(orbits.len(), 8);
        CornerGrouped { orbits }
    }
}

impl Coordinate<Cube3> for CornerGrouped {
    fn count(&self) -> usize {
        self.orbits.count()
    }

    fn from_puzzle(&self, puzzle: &Cube3) -> usize {
        let mut g = [0; 8];
        self.orbits.group(&puzzle.c.p.0, &mut g);
        self.orbits.rank(&g)
    }

    fn to_puzzle(&self, coord: usize) -> Cube3 {
        let mut g = [0; 8];
        let mut c = Cube3::SOLVED;
        self.orbits.unrank(coord, &mut g);
        self.orbits.ungroup(&g, &mut c.c.p.0);
        c
    }
}

/// The positions of the E slice edges, `12 choose 4` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ESlicePos {
    orbits: Orbits,
}

impl ESlicePos {
    /// The coordinate over [`e_slice`].
    pub fn new() -> Self {
        ESlicePos { orbits: e_slice() }
    }
}

impl Default for ESlicePos {
    fn default() -> Self {
        Self::new()
    }
}

impl Coordinate<Cube3> for ESlicePos {
    fn count(&self) -> usize {
        self.orbits.count()
    }

    fn from_puzzle(&self, puzzle: &Cube3) -> usize {
        let mut g = [0; 12];
        self.orbits.group(&puzzle.e.p.0, &mut g);
        self.orbits.rank(&g)
    }

    fn to_puzzle(&self, coord: usize) -> Cube3 {
        let mut g = [0; 12];
        let mut c = Cube3::SOLVED;
        self.orbits.unrank(coord, &mut g);
        self.orbits.ungroup(&g, &mut c.e.p.0);
        c
    }
}

/// The permutations of the E slice edges and of the other eight edges, for cubes whose E slice
/// edges are in the E slice. Ranked as `ep4 * 8! + ep8`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeSplitPerm {
    orbits: Orbits,
}

impl EdgeSplitPerm {
    /// The coordinate over [`e_slice`].
    pub fn new() -> Self {
        EdgeSplitPerm { orbits: e_slice() }
    }

    /// The parity of the edge permutation with the given coordinate.
    pub fn parity(coord: usize) -> bool {
        Perm::<4>::unrank(coord / Perm::<8>::COUNT).parity()
            ^ Perm::<8>::unrank(coord % Perm::<8>::COUNT).parity()
    }
}

impl Default for EdgeSplitPerm {
    fn default() -> Self {
        Self::new()
    }
}

impl Coordinate<Cube3> for EdgeSplitPerm {
    fn count(&self) -> usize {
        Perm::<4>::COUNT * Perm::<8>::COUNT
    }

    fn from_puzzle(&self, puzzle: &Cube3) -> usize {
        let mut ep4 = [0; 4];
        let mut ep8 = [0; 8];
        self.orbits
            .split(&puzzle.e.p.0, &mut [&mut ep4[..], &mut ep8[..]]);
        Perm(ep4).rank() * Perm::<8>::COUNT + Perm(ep8).rank()
    }

    fn to_puzzle(&self, coord: usize) -> Cube3 {
        let ep4 = Perm::<4>::unrank(coord / Perm::<8>::COUNT);
        let ep8 = Perm::<8>::unrank(coord % Perm::<8>::COUNT);
        let mut c = Cube3::SOLVED;
        self.orbits.join(&[&ep4.0[..], &ep8.0[..]], &mut c.e.p.0);
        c
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cube333::{domino, htm, s16};
    use crate::group::Group;
    use crate::moves::Moves;

    use proptest::collection::vec;
    use proptest::prelude::*;

    use std::collections::HashSet;

    fn scramble(base: &crate::moves::Base<Cube3>, mvs: &[usize]) -> Cube3 {
        let m = mvs.iter().fold(Moves::new(), |m, &i| m.push(i));
        base.apply(&Cube3::SOLVED, &m)
    }

    #[test]
    fn counts() {
        assert_eq!(CornerOrient.count(), 2187);
        assert_eq!(CornerPerm.count(), 40320);
        assert_eq!(Corners.count(), 40320 * 2187);
        assert_eq!(EdgeGroupedOrient::new(e_slice()).count(), 495 * 2048);
        assert_eq!(EdgeGroupedOrient::new(e_slice_each()).count(), 11880 * 2048);
        assert_eq!(CornerGrouped::new(corners_but_last_pair()).count(), 20160);
        assert_eq!(EdgeSplitPerm::new().count(), 967680);
        assert_eq!(ESlicePos::new().count(), 495);
    }

    #[test]
    fn solved_is_zero() {
        let id = Cube3::identity();
        assert_eq!(CornerOrient.from_puzzle(&id), 0);
        assert_eq!(CornerPerm.from_puzzle(&id), 0);
        assert_eq!(EdgeGroupedOrient::new(e_slice()).from_puzzle(&id), 0);
        assert_eq!(CornerGrouped::new(corners_but_last_pair()).from_puzzle(&id), 0);
        assert_eq!(EdgeSplitPerm::new().from_puzzle(&id), 0);
        assert_eq!(ESlicePos::new().from_puzzle(&id), 0);
    }

    #[test]
    fn grouped_corners_forget_parity() {
        let g = CornerGrouped::new(corners_but_last_pair());
        let mut c = Cube3::SOLVED;
        c.c.p = Perm([0, 1, 2, 3, 4, 5, 7, 6]);
        assert_eq!(g.from_puzzle(&c), 0);
    }

    #[test]
    fn e_slice_positions_are_distinct() {
        let coord = EdgeGroupedOrient::new(e_slice());
        let values: HashSet<usize> = (0..495)
            .map(|i| coord.from_puzzle(&coord.to_puzzle(i * 2048)))
            .collect();
        assert_eq!(values.len(), 495);
    }

    proptest! {
        #[test]
        fn to_puzzle_roundtrip(co in 0..2187usize, cp in 0..40320usize, e in 0..967680usize) {
            prop_assert_eq!(CornerOrient.from_puzzle(&CornerOrient.to_puzzle(co)), co);
            prop_assert_eq!(CornerPerm.from_puzzle(&CornerPerm.to_puzzle(cp)), cp);
            prop_assert_eq!(Corners.from_puzzle(&Corners.to_puzzle(cp * 2187 + co)), cp * 2187 + co);
            let split = EdgeSplitPerm::new();
            prop_assert_eq!(split.from_puzzle(&split.to_puzzle(e)), e);
            let g = CornerGrouped::new(corners_but_last_pair());
            prop_assert_eq!(g.from_puzzle(&g.to_puzzle(cp / 2)), cp / 2);
        }

        #[test]
        fn edge_parity_matches_cube(mvs in vec(0..10usize, 0..25)) {
            let c = scramble(&domino(), &mvs);
            let e = EdgeSplitPerm::new().from_puzzle(&c);
            let mut ep4 = [0; 4];
            let mut ep8 = [0; 8];
            e_slice().split(&c.e.p.0, &mut [&mut ep4[..], &mut ep8[..]]);
            prop_assert_eq!(e, Perm(ep4).rank() * 40320 + Perm(ep8).rank());
            let pos = ESlicePos::new();
            prop_assert_eq!(pos.from_puzzle(&c), 0);
            prop_assert_eq!(EdgeSplitPerm::parity(e), c.e.p.parity());
            prop_assert_eq!(EdgeSplitPerm::parity(e), c.c.p.parity());
        }

        #[test]
        fn moves_only_depend_on_coordinate(mvs in vec(0..18usize, 0..25), m in 0..18usize) {
            // applying a move to the coordinate's own representative gives the same coordinate
            let base = htm();
            let c = scramble(&base, &mvs);
            let coord = EdgeGroupedOrient::new(e_slice_each());
            let r = coord.to_puzzle(coord.from_puzzle(&c));
            let mv = &base.moves()[m];
            prop_assert_eq!(coord.from_puzzle(&c.compose(mv)), coord.from_puzzle(&r.compose(mv)));
            prop_assert_eq!(
                CornerOrient.from_puzzle(&c.compose(mv)),
                CornerOrient.from_puzzle(&CornerOrient.to_puzzle(CornerOrient.from_puzzle(&c)).compose(mv))
            );
        }

        #[test]
        fn symmetries_only_depend_on_coordinate(mvs in vec(0..18usize, 0..25), s in 0..16usize) {
            let c = scramble(&htm(), &mvs);
            let g = s16();
            let e = g.element(s);
            let coord = EdgeGroupedOrient::new(e_slice());
            let r = coord.to_puzzle(coord.from_puzzle(&c));
            prop_assert_eq!(coord.from_puzzle(&c.conjugate(e)), coord.from_puzzle(&r.conjugate(e)));
            let r = CornerOrient.to_puzzle(CornerOrient.from_puzzle(&c));
            prop_assert_eq!(
                CornerOrient.from_puzzle(&c.conjugate(e)),
                CornerOrient.from_puzzle(&r.conjugate(e))
            );
        }
    }
}
