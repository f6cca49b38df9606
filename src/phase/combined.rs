//! Phases combining the distances of several conjugated views of a puzzle.

use super::Phase;
use crate::error::TableError;
use crate::group::Group;
use crate::moves::Base;
use crate::prune::PruningTable;
use crate::symmetry::{ConjBase, SymmetryGroup};
use crate::table::TwoBitView;

/// How equal distances across conjugated views are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TieBreak {
    /// Take the maximum.
    None,
    /// Add one to the maximum when every view has the same nonzero distance. A state at the same
    /// distance `d` from each of the three axis subgroups is at least `d + 1` from the solved
    /// state.
    #[default]
    PlusOne,
}

/// Combine the distances of the conjugated views with the distance of the extra phase.
pub fn combine(parts: &[usize], extra: usize, tie_break: TieBreak) -> usize {
    let max = parts.iter().copied().max().unwrap_or(0);
    let min = parts.iter().copied().min().unwrap_or(0);
    let mut d = max;
    if tie_break == TieBreak::PlusOne && max == min && max > 0 {
        d += 1;
    }
    d.max(extra)
}

/// A state of a [`SymmetricMax`] phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymmetricState<A, B, const K: usize> {
    /// The states of the conjugated views
    pub parts: [A; K],
    /// The state of the extra phase
    pub extra: B,
}

/// A phase bounding distances by the largest distance of `K` conjugates of the puzzle in phase
/// `P` and the distance in phase `Q`. The view `j` tracks `S_j^-1 X S_j`, where `S_j` is the
/// `j`th conjugator.
#[derive(Debug)]
pub struct SymmetricMax<P: Phase, Q, const K: usize> {
    parts: P,
    extra: Q,
    conjugators: [P::Cube; K],
    conj_base: ConjBase,
    tie_break: TieBreak,
    n_part_tables: usize,
}

impl<P, Q, const K: usize> SymmetricMax<P, Q, K>
where
    P: Phase,
    Q: Phase<Cube = P::Cube>,
{
    /// Combine the phases. The conjugators must form a group with the identity first, and the
    /// base of `P` must be closed under conjugation by them.
    pub fn new(
        parts: P,
        extra: Q,
        conjugators: [P::Cube; K],
        tie_break: TieBreak,
    ) -> Result<Self, TableError> {
        let group = SymmetryGroup::from_elements(conjugators.to_vec())?;
        let conj_base = group.conjugate_base(parts.base())?;
        let n_part_tables = parts.tables().len();
        Ok(SymmetricMax {
            parts,
            extra,
            conjugators,
            conj_base,
            tie_break,
            n_part_tables,
        })
    }

    /// The phase applied to each conjugate.
    pub fn parts(&self) -> &P {
        &self.parts
    }

    /// The extra phase.
    pub fn extra(&self) -> &Q {
        &self.extra
    }
}

impl<P, Q, const K: usize> Phase for SymmetricMax<P, Q, K>
where
    P: Phase,
    Q: Phase<Cube = P::Cube>,
{
    type Cube = P::Cube;
    type State = SymmetricState<P::State, Q::State, K>;
    type Hint = ([P::Hint; K], Q::Hint);

    fn base(&self) -> &Base<P::Cube> {
        self.parts.base()
    }

    fn project(&self, cube: &P::Cube) -> Self::State {
        SymmetricState {
            parts: std::array::from_fn(|j| self.parts.project(&cube.conjugate(&self.conjugators[j]))),
            extra: self.extra.project(cube),
        }
    }

    fn is_start(&self, state: &Self::State) -> bool {
        state.parts.iter().all(|a| self.parts.is_start(a)) && self.extra.is_start(&state.extra)
    }

    fn step(&self, state: &Self::State, m: usize) -> Self::State {
        SymmetricState {
            parts: std::array::from_fn(|j| {
                self.parts.step(&state.parts[j], self.conj_base.get(m, j))
            }),
            extra: self.extra.step(&state.extra, m),
        }
    }

    fn distance(&self, state: &Self::State) -> (usize, Self::Hint) {
        let parts = state.parts.map(|a| self.parts.distance(&a));
        let (extra, extra_hint) = self.extra.distance(&state.extra);
        let d = combine(&parts.map(|(d, _)| d), extra, self.tie_break);
        (d, (parts.map(|(_, h)| h), extra_hint))
    }

    fn distance_hint(&self, state: &Self::State, hint: &Self::Hint) -> (usize, Self::Hint) {
        let parts: [(usize, P::Hint); K] =
            std::array::from_fn(|j| self.parts.distance_hint(&state.parts[j], &hint.0[j]));
        let (extra, extra_hint) = self.extra.distance_hint(&state.extra, &hint.1);
        let d = combine(&parts.map(|(d, _)| d), extra, self.tie_break);
        (d, (parts.map(|(_, h)| h), extra_hint))
    }

    fn distance_hint_with(
        &self,
        state: &Self::State,
        hint: &Self::Hint,
        tables: &[TwoBitView<'_>],
    ) -> (usize, Self::Hint) {
        let (own, rest) = tables.split_at(self.n_part_tables);
        let parts: [(usize, P::Hint); K] = std::array::from_fn(|j| {
            self.parts.distance_hint_with(&state.parts[j], &hint.0[j], own)
        });
        let (extra, extra_hint) = self.extra.distance_hint_with(&state.extra, &hint.1, rest);
        let d = combine(&parts.map(|(d, _)| d), extra, self.tie_break);
        (d, (parts.map(|(_, h)| h), extra_hint))
    }

    fn symmetry_mask(&self, state: &Self::State, cube: &P::Cube) -> u64 {
        self.extra.symmetry_mask(&state.extra, cube)
    }

    fn tables(&self) -> Vec<&PruningTable> {
        let mut tables = self.parts.tables();
        tables.extend(self.extra.tables());
        tables
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::coord::Coordinate;
    use crate::cube333::coords::{CornerOrient, CornerPerm, ESlicePos};
    use crate::cube333::{htm, s3_elements, Cube3};
    use crate::moves::Moves;
    use crate::phase::{ProductSpace, TablePhase};
    use crate::prune::BfsOptions;
    use crate::search::IdaStar;
    use crate::table::TableCache;

    use proptest::collection::vec;
    use proptest::prelude::*;

    use std::sync::OnceLock;

    /// A coordinate with a single value.
    #[derive(Debug, Clone, Copy)]
    struct Unit;

    impl Coordinate<Cube3> for Unit {
        fn count(&self) -> usize {
            1
        }

        fn from_puzzle(&self, _puzzle: &Cube3) -> usize {
            0
        }

        fn to_puzzle(&self, _coord: usize) -> Cube3 {
            Cube3::SOLVED
        }
    }

    type Parts = TablePhase<ProductSpace<Cube3, CornerOrient, ESlicePos>>;
    type Extra = TablePhase<ProductSpace<Cube3, CornerPerm, Unit>>;

    /// Corner orientation x E slice positions seen along each axis, with the corner permutation.
    fn axes() -> &'static SymmetricMax<Parts, Extra, 3> {
        static PHASE: OnceLock<SymmetricMax<Parts, Extra, 3>> = OnceLock::new();
        PHASE.get_or_init(|| {
            let cache = TableCache::disabled();
            let parts = TablePhase::cached(
                ProductSpace::new(&cache, "co_es", htm(), CornerOrient, ESlicePos::new())
                    .unwrap(),
                &cache,
                "co_es.distance_m3",
                BfsOptions::new(4),
            )
            .unwrap();
            let extra = TablePhase::cached(
                ProductSpace::new(&cache, "cp", htm(), CornerPerm, Unit).unwrap(),
                &cache,
                "cp.distance_m3",
                BfsOptions::new(4),
            )
            .unwrap();
            SymmetricMax::new(parts, extra, s3_elements(), TieBreak::PlusOne).unwrap()
        })
    }

    fn scramble(mvs: &[usize]) -> Cube3 {
        let m = mvs.iter().fold(Moves::new(), |m, &i| m.push(i));
        htm().apply(&Cube3::SOLVED, &m)
    }

    #[test]
    fn solved_is_start() {
        let phase = axes();
        let state = phase.project(&Cube3::SOLVED);
        assert!(phase.is_start(&state));
        assert_eq!(phase.distance(&state).0, 0);
        assert_eq!(phase.tables().len(), 2);
    }

    proptest! {
        #[test]
        fn distance_combines_conjugated_views(mvs in vec(0..18usize, 0..12)) {
            let phase = axes();
            let cube = scramble(&mvs);
            let parts: [usize; 3] = std::array::from_fn(|j| {
                let view = cube.conjugate(&s3_elements()[j]);
                phase.parts().distance(&phase.parts().project(&view)).0
            });
            let extra = phase.extra().distance(&phase.extra().project(&cube)).0;
            let d = phase.distance(&phase.project(&cube)).0;
            prop_assert_eq!(d, combine(&parts, extra, TieBreak::PlusOne));
            prop_assert!(d <= mvs.len());
        }

        #[test]
        fn hints_follow_moves(mvs in vec(0..18usize, 1..12)) {
            let phase = axes();
            let images: Vec<Vec<u8>> =
                phase.tables().iter().map(|t| t.labels().to_image()).collect();
            let views: Vec<TwoBitView<'_>> = images.iter().map(|i| TwoBitView::new(i)).collect();
            let mut state = phase.project(&Cube3::SOLVED);
            let (_, mut hint) = phase.distance(&state);
            for (i, &m) in mvs.iter().enumerate() {
                state = phase.step(&state, m);
                let (d, next) = phase.distance_hint(&state, &hint);
                prop_assert_eq!(d, phase.distance(&phase.project(&scramble(&mvs[..=i]))).0);
                prop_assert_eq!(phase.distance_hint_with(&state, &hint, &views), (d, next));
                hint = next;
            }
        }

        #[test]
        fn search_reaches_start(mvs in vec(0..18usize, 0..5)) {
            let phase = axes();
            let cube = scramble(&mvs);
            let sol = IdaStar::new(phase, &cube, 8).next().unwrap();
            prop_assert!(sol.optimal);
            prop_assert!(sol.moves.len() <= mvs.len());
            prop_assert!(phase.distance(&phase.project(&cube)).0 <= sol.moves.len());
            let end = htm().apply(&cube, &sol.moves);
            prop_assert!(phase.is_start(&phase.project(&end)));
        }
    }

    #[test]
    fn combine_takes_maximum() {
        assert_eq!(combine(&[3, 5, 4], 2, TieBreak::PlusOne), 5);
        assert_eq!(combine(&[3, 5, 4], 7, TieBreak::PlusOne), 7);
        assert_eq!(combine(&[], 4, TieBreak::None), 4);
    }

    #[test]
    fn combine_breaks_ties() {
        assert_eq!(combine(&[5, 5, 5], 0, TieBreak::PlusOne), 6);
        assert_eq!(combine(&[5, 5, 5], 0, TieBreak::None), 5);
        assert_eq!(combine(&[5, 5, 5], 6, TieBreak::PlusOne), 6);
        assert_eq!(combine(&[5, 5, 5], 7, TieBreak::PlusOne), 7);
        assert_eq!(combine(&[0, 0, 0], 0, TieBreak::PlusOne), 0);
        assert_eq!(combine(&[4, 5, 5], 0, TieBreak::PlusOne), 5);
    }
}
