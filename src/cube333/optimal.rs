//! An optimal solver. Distances are bounded by three conjugated views of a phase 0 like space,
//! one per axis, and by the exact corner distance.

use super::coords::{e_slice_each, CornerOrient, CornerPerm, Corners, EdgeGroupedOrient};
use super::{htm, s16, s3_elements, s48, Cube3};
use crate::coord::Coordinate;
use crate::error::TableError;
use crate::moves::Base;
use crate::phase::{Phase, ProductSpace, SymSpace, SymmetricMax, TablePhase, TieBreak};
use crate::prune::{BfsOptions, PruningTable};
use crate::search::IdaStar;
use crate::symmetry::LiveSymmetry;
use crate::table::{TableCache, TwoBitView};

use log::debug;

/// Longest solution the optimal solver looks for.
pub const MAX_MOVES: usize = 20;

/// Corner orientation x classes of (E slice edge positions, edge orientation) under the UD
/// symmetries. The four E slice edges are told apart.
pub type EdgePhase = TablePhase<SymSpace<Cube3, CornerOrient, EdgeGroupedOrient>>;

/// The phase of the optimal solver.
pub type OptimalPhase = SymmetricMax<EdgePhase, CornerPhase, 3>;

/// Build or load [`EdgePhase`].
pub fn edge_phase(cache: &TableCache, options: BfsOptions) -> Result<EdgePhase, TableError> {
    let space = SymSpace::new(
        cache,
        "cube3.p0es",
        htm(),
        s16(),
        CornerOrient,
        EdgeGroupedOrient::new(e_slice_each()),
    )?;
    TablePhase::cached(space, cache, "cube3.p0es.distance_m3", options)
}

/// The exact distance of the corners, with symmetry pruning under all 48 cube symmetries.
#[derive(Debug)]
pub struct CornerPhase {
    inner: TablePhase<ProductSpace<Cube3, CornerPerm, CornerOrient>>,
    live: LiveSymmetry<Cube3>,
    stabilizers: Vec<u8>,
}

impl CornerPhase {
    /// Build or load the corner tables, along with the subgroup of symmetries fixing each corner
    /// state.
    pub fn new(cache: &TableCache, options: BfsOptions) -> Result<Self, TableError> {
        let space = ProductSpace::new(cache, "cube3.c8", htm(), CornerPerm, CornerOrient)?;
        let inner = TablePhase::cached(space, cache, "cube3.c8.distance_m3", options)?;
        let live = LiveSymmetry::new(s48(), &htm())?;
        let stabilizers = cache.load_or_compute(
            "cube3.c8.self_sym_subgroup",
            Corners.count(),
            || Ok(live.coordinate_stabilizers(&Corners)),
        )?;
        debug!("c8: n_subgroup={}", live.masks().subgroups().count());
        Ok(CornerPhase {
            inner,
            live,
            stabilizers,
        })
    }

    /// The symmetries fixing the corner state with index `index`.
    pub fn stabilizer(&self, index: usize) -> u64 {
        self.live.masks().subgroup(self.stabilizers[index] as usize)
    }
}

impl Phase for CornerPhase {
    type Cube = Cube3;
    type State = usize;
    type Hint = usize;

    fn base(&self) -> &Base<Cube3> {
        self.inner.base()
    }

    fn project(&self, cube: &Cube3) -> usize {
        self.inner.project(cube)
    }

    fn is_start(&self, state: &usize) -> bool {
        self.inner.is_start(state)
    }

    fn step(&self, state: &usize, m: usize) -> usize {
        self.inner.step(state, m)
    }

    fn distance(&self, state: &usize) -> (usize, usize) {
        self.inner.distance(state)
    }

    fn distance_hint(&self, state: &usize, hint: &usize) -> (usize, usize) {
        self.inner.distance_hint(state, hint)
    }

    fn distance_hint_with(
        &self,
        state: &usize,
        hint: &usize,
        tables: &[TwoBitView<'_>],
    ) -> (usize, usize) {
        self.inner.distance_hint_with(state, hint, tables)
    }

    fn symmetry_mask(&self, state: &usize, cube: &Cube3) -> u64 {
        self.live.mask(self.stabilizer(*state), cube)
    }

    fn tables(&self) -> Vec<&PruningTable> {
        self.inner.tables()
    }
}

/// An optimal solver for the 3x3x3 cube.
#[derive(Debug)]
pub struct Solver {
    phase: OptimalPhase,
}

impl Solver {
    /// Create a solver, loading its tables from `cache` or building them with `options`.
    pub fn new(cache: &TableCache, options: BfsOptions) -> Result<Self, TableError> {
        let phase = SymmetricMax::new(
            edge_phase(cache, options)?,
            CornerPhase::new(cache, options)?,
            s3_elements(),
            TieBreak::PlusOne,
        )?;
        Ok(Solver { phase })
    }

    /// The combined phase.
    pub fn phase(&self) -> &OptimalPhase {
        &self.phase
    }

    /// Enumerate solutions in order of length, pruning symmetric branches within the first
    /// `sym_n_moves` moves. Moves are indices into [`htm`].
    pub fn search(&self, cube: &Cube3, sym_n_moves: usize) -> IdaStar<'_, OptimalPhase> {
        IdaStar::new(&self.phase, cube, MAX_MOVES).with_sym_n_moves(sym_n_moves)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cube333::moves::{to_moves, Move333};
    use crate::group::Group;

    use proptest::collection::vec;
    use proptest::prelude::*;

    use std::sync::OnceLock;

    fn solver() -> &'static Solver {
        static SOLVER: OnceLock<Solver> = OnceLock::new();
        SOLVER.get_or_init(|| Solver::new(&TableCache::new("cache"), BfsOptions::new(8)).unwrap())
    }

    #[test]
    #[ignore]
    fn edge_phase_class_count() {
        let s = solver();
        assert_eq!(s.phase().parts().space().classes().n_classes(), 1523864);
    }

    #[test]
    #[ignore]
    fn superflip_needs_twenty_moves() {
        let mut cube = Cube3::SOLVED;
        cube.e.o.0 = [1; 12];
        let sol = solver().search(&cube, 6).next().unwrap();
        assert_eq!(sol.moves.len(), 20);
        assert_eq!(htm().apply(&cube, &sol.moves), Cube3::SOLVED);
    }

    #[test]
    #[ignore]
    fn solved_corners_are_fully_symmetric() {
        let s = solver();
        let c8 = s.phase().extra();
        assert_eq!(c8.stabilizer(0), u64::MAX >> 16);
        let u2 = htm().apply(&Cube3::SOLVED, &htm().parse("U2").unwrap());
        assert_eq!(c8.stabilizer(c8.project(&u2)).count_ones(), 8);
    }

    #[test]
    #[ignore]
    fn solve_short_scrambles() {
        let solver = solver();
        let base = htm();
        proptest!(|(mvs in vec(any::<Move333>(), 0..8))| {
            let cube = base.apply(&Cube3::SOLVED, &to_moves(&mvs));
            let sol = solver.search(&cube, 6).next().unwrap();
            prop_assert!(sol.optimal);
            prop_assert!(sol.moves.len() <= mvs.len());
            prop_assert_eq!(base.apply(&cube, &sol.moves), Cube3::identity());
        });
    }
}
