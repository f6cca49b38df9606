//! An implementation of the two phase solver described [here](https://kociemba.org/cube.htm).
//!
//! Phase 0 brings the cube into the domino subgroup `<U, D, R2, L2, F2, B2>`, where corners and
//! edges are oriented and the E slice edges sit in the E slice. Phase 1 solves the cube with
//! the moves of that subgroup. Each phase comes in a raw flavour, whose tables index every
//! coordinate combination, and a symmetric flavour, whose tables only index classes under the
//! 16 symmetries preserving the UD axis and are smaller by about that factor.

use super::coords::{
    corners_but_last_pair, e_slice, CornerGrouped, CornerOrient, CornerPerm, EdgeGroupedOrient,
    EdgeSplitPerm,
};
use super::{domino, htm, s16, Cube3};
use crate::error::TableError;
use crate::group::Perm;
use crate::phase::{Phase, ProductSpace, SymSpace, TablePhase};
use crate::prune::BfsOptions;
use crate::search::{Solution, TwoPhaseSearch};
use crate::table::TableCache;

/// Longest solution the two phase solver looks for.
pub const MAX_MOVES: usize = 29;

/// Phase 0 over raw coordinates: corner orientation x (E slice position, edge orientation).
pub type Phase0 = TablePhase<ProductSpace<Cube3, CornerOrient, EdgeGroupedOrient>>;
/// Phase 0 over corner orientation x classes of (E slice position, edge orientation).
pub type Phase0Sym = TablePhase<SymSpace<Cube3, CornerOrient, EdgeGroupedOrient>>;
/// Phase 1 over raw coordinates: grouped corners x (E slice permutation, U/D edge permutation).
pub type Phase1 = TablePhase<ProductSpace<Cube3, CornerGrouped, EdgeSplitPerm>>;
/// Phase 1 over corner permutation x classes of the edge permutation.
pub type Phase1Sym = TablePhase<SymSpace<Cube3, CornerPerm, EdgeSplitPerm>>;

/// Build or load the raw phase 0.
pub fn phase0(cache: &TableCache, options: BfsOptions) -> Result<Phase0, TableError> {
    let space = ProductSpace::new(
        cache,
        "cube3.p0",
        htm(),
        CornerOrient,
        EdgeGroupedOrient::new(e_slice()),
    )?;
    TablePhase::cached(space, cache, "cube3.p0.distance_m3", options)
}

/// Build or load the symmetric phase 0.
pub fn phase0_sym(cache: &TableCache, options: BfsOptions) -> Result<Phase0Sym, TableError> {
    let space = SymSpace::new(
        cache,
        "cube3.p0s",
        htm(),
        s16(),
        CornerOrient,
        EdgeGroupedOrient::new(e_slice()),
    )?;
    TablePhase::cached(space, cache, "cube3.p0s.distance_m3", options)
}

/// Build or load the raw phase 1.
pub fn phase1(cache: &TableCache, options: BfsOptions) -> Result<Phase1, TableError> {
    let space = ProductSpace::new(
        cache,
        "cube3.p1",
        domino(),
        CornerGrouped::new(corners_but_last_pair()),
        EdgeSplitPerm::new(),
    )?;
    TablePhase::cached(space, cache, "cube3.p1.distance_m3", options)
}

/// Build or load the symmetric phase 1. The corner parity equals the edge parity, so only
/// half of the corner permutations are stored with each edge class.
pub fn phase1_sym(cache: &TableCache, options: BfsOptions) -> Result<Phase1Sym, TableError> {
    let space = SymSpace::new(
        cache,
        "cube3.p1s",
        domino(),
        s16(),
        CornerPerm,
        EdgeSplitPerm::new(),
    )?
    .with_parity_fold(|cp| Perm::<8>::unrank(cp).parity(), EdgeSplitPerm::parity);
    TablePhase::cached(space, cache, "cube3.p1s.distance_m3", options)
}

/// A cube solver that uses Kociemba's two phase algorithm. By default it runs on the symmetric
/// phases, [`Solver::raw`] builds one on the raw phases.
#[derive(Debug)]
pub struct Solver<P0 = Phase0Sym, P1 = Phase1Sym> {
    p0: P0,
    p1: P1,
}

impl Solver {
    /// Create a solver, loading its tables from `cache` or building them with `options`.
    pub fn new(cache: &TableCache, options: BfsOptions) -> Result<Self, TableError> {
        Ok(Solver {
            p0: phase0_sym(cache, options)?,
            p1: phase1_sym(cache, options)?,
        })
    }
}

impl Solver<Phase0, Phase1> {
    /// Create a solver on the raw phases, whose tables are much larger.
    pub fn raw(cache: &TableCache, options: BfsOptions) -> Result<Self, TableError> {
        Ok(Solver {
            p0: phase0(cache, options)?,
            p1: phase1(cache, options)?,
        })
    }
}

impl<P0, P1> Solver<P0, P1>
where
    P0: Phase<Cube = Cube3>,
    P1: Phase<Cube = Cube3>,
{
    /// Phase 0.
    pub fn phase0(&self) -> &P0 {
        &self.p0
    }

    /// Phase 1.
    pub fn phase1(&self) -> &P1 {
        &self.p1
    }

    /// Enumerate increasingly short solutions of at most `max_moves` moves. Moves are indices
    /// into [`htm`].
    pub fn search(&self, cube: &Cube3, max_moves: usize) -> TwoPhaseSearch<'_, P0, P1> {
        TwoPhaseSearch::new(&self.p0, &self.p1, cube, max_moves.min(MAX_MOVES))
    }

    /// The first solution which is optimal or no longer than `max_moves`.
    pub fn solve(&self, cube: &Cube3, max_moves: usize) -> Option<Solution> {
        self.search(cube, MAX_MOVES)
            .find(|s| s.optimal || s.moves.len() <= max_moves)
    }
}
