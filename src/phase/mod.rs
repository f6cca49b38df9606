//! Phases: views of a puzzle in which searches run.
//!
//! A phase projects a puzzle onto a smaller state space, moves states with the moves of a base
//! and bounds the number of moves left to reach its start state. The bound comes from pruning
//! tables, possibly several combined into one.

mod combined;
mod space;

pub use combined::{combine, SymmetricMax, SymmetricState, TieBreak};
pub use space::{PhaseSpace, ProductSpace, SymSpace, SymState};

use crate::error::TableError;
use crate::group::Group;
use crate::moves::Base;
use crate::prune::{next_distance, BfsOptions, PruningTable, RankedSpace};
use crate::symmetry::{LiveSymmetry, SymmetryGroup};
use crate::table::{TableCache, TwoBitView};

/// A search phase.
pub trait Phase: Sync {
    /// The puzzle
    type Cube: Group;
    /// Projection of a puzzle
    type State: Copy + Send + Sync;
    /// Whatever is needed to update a distance cheaply after a move
    type Hint: Copy + Send + Sync;

    /// The moves.
    fn base(&self) -> &Base<Self::Cube>;

    /// The state of a puzzle.
    fn project(&self, cube: &Self::Cube) -> Self::State;

    /// Whether `state` is solved within this phase.
    fn is_start(&self, state: &Self::State) -> bool;

    /// Apply move `m`.
    fn step(&self, state: &Self::State, m: usize) -> Self::State;

    /// A lower bound on the number of moves left, computed from scratch.
    fn distance(&self, state: &Self::State) -> (usize, Self::Hint);

    /// A lower bound on the number of moves left, given the hint of a state one move away.
    fn distance_hint(&self, state: &Self::State, hint: &Self::Hint) -> (usize, Self::Hint);

    /// Same as [`Phase::distance_hint`], reading labels from `tables` instead of the phase's own
    /// tables. `tables` views the images of [`Phase::tables`], in the same order.
    fn distance_hint_with(
        &self,
        state: &Self::State,
        hint: &Self::Hint,
        _tables: &[TwoBitView<'_>],
    ) -> (usize, Self::Hint) {
        self.distance_hint(state, hint)
    }

    /// The moves worth searching from `state`, whose concrete puzzle is `cube`. Moves leading to
    /// states symmetric to those reached through an allowed move may be left out.
    fn symmetry_mask(&self, _state: &Self::State, _cube: &Self::Cube) -> u64 {
        !0
    }

    /// The pruning tables used by the phase.
    fn tables(&self) -> Vec<&PruningTable> {
        Vec::new()
    }
}

impl<P: Phase> Phase for &P {
    type Cube = P::Cube;
    type State = P::State;
    type Hint = P::Hint;

    fn base(&self) -> &Base<P::Cube> {
        (*self).base()
    }

    fn project(&self, cube: &P::Cube) -> P::State {
        (*self).project(cube)
    }

    fn is_start(&self, state: &P::State) -> bool {
        (*self).is_start(state)
    }

    fn step(&self, state: &P::State, m: usize) -> P::State {
        (*self).step(state, m)
    }

    fn distance(&self, state: &P::State) -> (usize, P::Hint) {
        (*self).distance(state)
    }

    fn distance_hint(&self, state: &P::State, hint: &P::Hint) -> (usize, P::Hint) {
        (*self).distance_hint(state, hint)
    }

    fn distance_hint_with(
        &self,
        state: &P::State,
        hint: &P::Hint,
        tables: &[TwoBitView<'_>],
    ) -> (usize, P::Hint) {
        (*self).distance_hint_with(state, hint, tables)
    }

    fn symmetry_mask(&self, state: &P::State, cube: &P::Cube) -> u64 {
        (*self).symmetry_mask(state, cube)
    }

    fn tables(&self) -> Vec<&PruningTable> {
        (*self).tables()
    }
}

/// A phase whose distances are read from the pruning table of a single state space.
#[derive(Debug)]
pub struct TablePhase<S> {
    space: S,
    table: PruningTable,
}

impl<S: PhaseSpace> TablePhase<S> {
    /// Pair a space with its table.
    pub fn new(space: S, table: PruningTable) -> Self {
        TablePhase { space, table }
    }

    /// Load the table of `space` from the cache, building it if needed.
    pub fn cached(
        space: S,
        cache: &TableCache,
        key: &str,
        options: BfsOptions,
    ) -> Result<Self, TableError> {
        let table = cache.load_or_compute(key, space.n_states(), || {
            PruningTable::build(&space, options)
        })?;
        Ok(TablePhase { space, table })
    }

    /// The state space.
    pub fn space(&self) -> &S {
        &self.space
    }

    /// The pruning table.
    pub fn table(&self) -> &PruningTable {
        &self.table
    }
}

impl<S: PhaseSpace> Phase for TablePhase<S> {
    type Cube = S::Cube;
    type State = S::State;
    type Hint = usize;

    fn base(&self) -> &Base<S::Cube> {
        self.space.base()
    }

    fn project(&self, cube: &S::Cube) -> S::State {
        self.space.project(cube)
    }

    fn is_start(&self, state: &S::State) -> bool {
        self.space.is_start(state)
    }

    fn step(&self, state: &S::State, m: usize) -> S::State {
        self.space.step(state, m)
    }

    fn distance(&self, state: &S::State) -> (usize, usize) {
        let d = self.table.exact_distance(&self.space, state);
        (d, d)
    }

    fn distance_hint(&self, state: &S::State, hint: &usize) -> (usize, usize) {
        let d = self.table.next_distance(self.space.rank(state), *hint);
        (d, d)
    }

    fn distance_hint_with(
        &self,
        state: &S::State,
        hint: &usize,
        tables: &[TwoBitView<'_>],
    ) -> (usize, usize) {
        let d = next_distance(tables[0].get(self.space.rank(state)), *hint);
        (d, d)
    }

    fn tables(&self) -> Vec<&PruningTable> {
        vec![&self.table]
    }
}

/// A phase which also skips the moves made redundant by the symmetries fixing the concrete
/// puzzle. Every symmetry of the group must map the moves of the base onto moves of the base.
#[derive(Debug)]
pub struct SymmetryPruned<P: Phase> {
    inner: P,
    live: LiveSymmetry<P::Cube>,
}

impl<P: Phase> SymmetryPruned<P> {
    /// Wrap `inner`, pruning with the symmetries of `group`.
    pub fn new(inner: P, group: SymmetryGroup<P::Cube>) -> Result<Self, TableError> {
        let live = LiveSymmetry::new(group, inner.base())?;
        Ok(SymmetryPruned { inner, live })
    }

    /// The wrapped phase.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// The symmetries and their move masks.
    pub fn live(&self) -> &LiveSymmetry<P::Cube> {
        &self.live
    }
}

impl<P: Phase> Phase for SymmetryPruned<P> {
    type Cube = P::Cube;
    type State = P::State;
    type Hint = P::Hint;

    fn base(&self) -> &Base<P::Cube> {
        self.inner.base()
    }

    fn project(&self, cube: &P::Cube) -> P::State {
        self.inner.project(cube)
    }

    fn is_start(&self, state: &P::State) -> bool {
        self.inner.is_start(state)
    }

    fn step(&self, state: &P::State, m: usize) -> P::State {
        self.inner.step(state, m)
    }

    fn distance(&self, state: &P::State) -> (usize, P::Hint) {
        self.inner.distance(state)
    }

    fn distance_hint(&self, state: &P::State, hint: &P::Hint) -> (usize, P::Hint) {
        self.inner.distance_hint(state, hint)
    }

    fn distance_hint_with(
        &self,
        state: &P::State,
        hint: &P::Hint,
        tables: &[TwoBitView<'_>],
    ) -> (usize, P::Hint) {
        self.inner.distance_hint_with(state, hint, tables)
    }

    fn symmetry_mask(&self, state: &P::State, cube: &P::Cube) -> u64 {
        self.live.mask(self.live.all(), cube) & self.inner.symmetry_mask(state, cube)
    }

    fn tables(&self) -> Vec<&PruningTable> {
        self.inner.tables()
    }
}
