//! We give a general description of a coordinate, which is a dense integer encoding of some
//! aspect of a puzzle state, together with the tables that move coordinates around without
//! rebuilding the puzzle.

use crate::error::TableError;
use crate::group::Group;
use crate::moves::Base;
use crate::symmetry::SymmetryGroup;
use crate::table::TableCache;

use rayon::prelude::*;

/// A coordinate of the puzzle `P`, encoding a coset of some subgroup as an integer in
/// `0..count()`.
pub trait Coordinate<P>: Send + Sync {
    /// The number of possible coordinate values.
    fn count(&self) -> usize;

    /// Obtain the coordinate that corresponds to the given puzzle.
    fn from_puzzle(&self, puzzle: &P) -> usize;

    /// A puzzle with the given coordinate. Parts of the puzzle the coordinate doesn't describe
    /// are left solved.
    fn to_puzzle(&self, coord: usize) -> P;
}

/// A move table, which stores mappings of coordinate + move pairs to the coordinate that results
/// from applying the move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTable {
    n_moves: usize,
    table: Vec<u32>,
}

impl MoveTable {
    /// Generate a move table.
    pub fn generate<P: Group, C: Coordinate<P>>(coord: &C, base: &Base<P>) -> Self {
        let table = (0..coord.count())
            .into_par_iter()
            .flat_map_iter(|i| {
                let p = coord.to_puzzle(i);
                base.moves()
                    .iter()
                    .map(move |m| coord.from_puzzle(&p.compose(m)) as u32)
            })
            .collect();
        MoveTable {
            n_moves: base.len(),
            table,
        }
    }

    /// Load the move table from the cache, generating it if needed.
    pub fn cached<P: Group, C: Coordinate<P>>(
        cache: &TableCache,
        key: &str,
        coord: &C,
        base: &Base<P>,
    ) -> Result<Self, TableError> {
        let table = cache.load_or_compute(key, coord.count() * base.len(), || {
            Ok(Self::generate(coord, base).table)
        })?;
        Ok(MoveTable {
            n_moves: base.len(),
            table,
        })
    }

    /// Determine what coordinate comes from applying move `m`.
    pub fn make_move(&self, coord: usize, m: usize) -> usize {
        self.table[coord * self.n_moves + m] as usize
    }
}

/// A table storing results of conjugating coordinates by each element of a symmetry group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConjTable {
    n_sym: usize,
    table: Vec<u32>,
}

impl ConjTable {
    /// Generate the table
    pub fn generate<P: Group, C: Coordinate<P>>(coord: &C, group: &SymmetryGroup<P>) -> Self {
        let table = (0..coord.count())
            .into_par_iter()
            .flat_map_iter(|i| {
                let p = coord.to_puzzle(i);
                group
                    .elements()
                    .iter()
                    .map(move |s| coord.from_puzzle(&p.conjugate(s)) as u32)
            })
            .collect();
        ConjTable {
            n_sym: group.len(),
            table,
        }
    }

    /// Load the table from the cache, generating it if needed.
    pub fn cached<P: Group, C: Coordinate<P>>(
        cache: &TableCache,
        key: &str,
        coord: &C,
        group: &SymmetryGroup<P>,
    ) -> Result<Self, TableError> {
        let table = cache.load_or_compute(key, coord.count() * group.len(), || {
            Ok(Self::generate(coord, group).table)
        })?;
        Ok(ConjTable {
            n_sym: group.len(),
            table,
        })
    }

    /// Conjugate the coordinate by symmetry `s`, giving the coordinate of `S^-1 P S`.
    pub fn conjugate(&self, coord: usize, s: usize) -> usize {
        self.table[coord * self.n_sym + s] as usize
    }
}
