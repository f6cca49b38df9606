//! Symmetry groups of puzzles and the tables derived from them.
//!
//! A symmetry `S` acts on puzzle states by conjugation, `P -> S^-1 P S`. Conjugation preserves
//! distance to the solved state when the generator set is closed under conjugation, so states
//! can be grouped into classes and searches can skip moves that lead to symmetric states.

mod classes;

pub use classes::ConjClassTable;

use crate::coord::Coordinate;
use crate::error::TableError;
use crate::group::Group;
use crate::moves::Base;

use rayon::prelude::*;

use std::collections::BTreeSet;

/// Iterate over the set bits of a mask.
pub fn bits(mut mask: u64) -> impl Iterator<Item = usize> {
    std::iter::from_fn(move || {
        if mask == 0 {
            None
        } else {
            let i = mask.trailing_zeros() as usize;
            mask &= mask - 1;
            Some(i)
        }
    })
}

/// A finite group of symmetries with precomputed multiplication and inverse tables. The
/// identity is always element 0, so subsets of the group are bitmasks with bit 0 for the
/// identity.
#[derive(Clone, Debug)]
pub struct SymmetryGroup<C> {
    elements: Vec<C>,
    mul: Vec<u8>,
    inv: Vec<u8>,
}

impl<C: Group> SymmetryGroup<C> {
    /// Build the group from a list of its elements, the first of which must be the identity.
    pub fn from_elements(elements: Vec<C>) -> Result<Self, TableError> {
        let n = elements.len();
        if n == 0 || n > 64 || elements[0] != C::identity() {
            return Err(TableError::NotClosed);
        }
        let find = |c: &C| elements.iter().position(|e| e == c);

        let mut mul = vec![0; n * n];
        for i in 0..n {
            for j in 0..n {
                let k = find(&elements[i].compose(&elements[j])).ok_or(TableError::NotClosed)?;
                mul[i * n + j] = k as u8;
            }
        }
        let inv = (0..n)
            .map(|i| (0..n).find(|&j| mul[i * n + j] == 0).map(|j| j as u8))
            .collect::<Option<Vec<u8>>>()
            .ok_or(TableError::NotClosed)?;

        Ok(SymmetryGroup { elements, mul, inv })
    }

    /// The closure of a set of generators, with elements in order of discovery.
    pub fn generate(generators: &[C]) -> Result<Self, TableError> {
        let mut elements = vec![C::identity()];
        let mut i = 0;
        while i < elements.len() {
            for g in generators {
                let c = elements[i].compose(g);
                if !elements.contains(&c) {
                    if elements.len() == 64 {
                        return Err(TableError::NotClosed);
                    }
                    elements.push(c);
                }
            }
            i += 1;
        }
        Self::from_elements(elements)
    }

    /// Order of the group.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the group is empty, which never happens.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The elements of the group.
    pub fn elements(&self) -> &[C] {
        &self.elements
    }

    /// Element `s`.
    pub fn element(&self, s: usize) -> &C {
        &self.elements[s]
    }

    /// The index of `a * b`.
    pub fn mul(&self, a: usize, b: usize) -> usize {
        self.mul[a * self.len() + b] as usize
    }

    /// The index of the inverse of `a`.
    pub fn inv(&self, a: usize) -> usize {
        self.inv[a] as usize
    }

    /// The smallest subgroup containing `set`.
    pub fn closure(&self, mut set: u64) -> u64 {
        loop {
            let mut next = set;
            for i in bits(set) {
                for j in bits(set) {
                    next |= 1 << self.mul(i, j);
                }
            }
            if next == set {
                return set;
            }
            set = next;
        }
    }

    /// Every subgroup, in increasing order of mask.
    pub fn subgroups(&self) -> Vec<u64> {
        let mut subgroups = BTreeSet::from([1u64]);
        for i in 0..self.len() {
            let current: Vec<u64> = subgroups.iter().copied().collect();
            for sg in current {
                subgroups.insert(self.closure(sg | 1 << i));
            }
        }
        subgroups.into_iter().collect()
    }

    /// The conjugate subgroup `s^-1 sg s`.
    pub fn conjugate_subgroup(&self, sg: u64, s: usize) -> u64 {
        bits(sg).fold(0, |acc, i| acc | 1 << self.mul(self.inv(s), self.mul(i, s)))
    }

    /// The symmetries in `candidates` that fix `puzzle`.
    pub fn stabilizer(&self, candidates: u64, puzzle: &C) -> u64 {
        bits(candidates)
            .filter(|&s| puzzle.conjugate(&self.elements[s]) == *puzzle)
            .fold(0, |acc, s| acc | 1 << s)
    }

    /// Table of how each move of `base` transforms under conjugation by each symmetry.
    pub fn conjugate_base(&self, base: &Base<C>) -> Result<ConjBase, TableError> {
        let n_sym = self.len();
        let mut table = vec![0; base.len() * n_sym];
        for (i, m) in base.moves().iter().enumerate() {
            for (s, e) in self.elements.iter().enumerate() {
                let c = m.conjugate(e);
                let j = base
                    .moves()
                    .iter()
                    .position(|x| *x == c)
                    .ok_or(TableError::BaseNotSymmetric)?;
                table[i * n_sym + s] = j as u8;
            }
        }
        Ok(ConjBase { n_sym, table })
    }
}

/// Base moves conjugated by symmetries. See [`SymmetryGroup::conjugate_base`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConjBase {
    n_sym: usize,
    table: Vec<u8>,
}

impl ConjBase {
    /// The index of `S^-1 M S` where `M` is move `m` and `S` is symmetry `s`.
    pub fn get(&self, m: usize, s: usize) -> usize {
        self.table[m * self.n_sym + s] as usize
    }

    /// Number of moves.
    pub fn n_moves(&self) -> usize {
        self.table.len() / self.n_sym
    }
}

/// For every subgroup, a mask keeping one move out of each orbit of moves under conjugation by
/// the subgroup. When a state is fixed by every symmetry in a subgroup, moves in the same orbit
/// lead to states at the same distance, so only one of them needs searching.
#[derive(Clone, Debug)]
pub struct SymMasks {
    masks: Vec<(u64, u64)>,
}

impl SymMasks {
    /// Compute the masks of every subgroup of `group`.
    pub fn new<C: Group>(group: &SymmetryGroup<C>, conj_base: &ConjBase) -> Self {
        let masks = group
            .subgroups()
            .into_iter()
            .map(|sg| {
                let mut marked = 0u64;
                let mut mask = 0u64;
                for i in 0..conj_base.n_moves() {
                    if marked >> i & 1 == 0 {
                        mask |= 1 << i;
                        for s in bits(sg) {
                            marked |= 1 << conj_base.get(i, s);
                        }
                    }
                }
                (sg, mask)
            })
            .collect();
        SymMasks { masks }
    }

    /// The subgroups, in increasing order.
    pub fn subgroups(&self) -> impl Iterator<Item = u64> + '_ {
        self.masks.iter().map(|&(sg, _)| sg)
    }

    /// Position of a subgroup in [`SymMasks::subgroups`].
    pub fn index_of(&self, sg: u64) -> Option<usize> {
        self.masks.binary_search_by_key(&sg, |&(s, _)| s).ok()
    }

    /// The subgroup at position `i`.
    pub fn subgroup(&self, i: usize) -> u64 {
        self.masks[i].0
    }

    /// The mask of subgroup `sg`. Sets that aren't subgroups allow every move.
    pub fn mask(&self, sg: u64) -> u64 {
        self.index_of(sg).map_or(!0, |i| self.masks[i].1)
    }
}

/// Symmetry pruning based on the symmetries fixing the concrete state reached during a search.
#[derive(Clone, Debug)]
pub struct LiveSymmetry<C> {
    group: SymmetryGroup<C>,
    masks: SymMasks,
}

impl<C: Group> LiveSymmetry<C> {
    /// Prepare the masks of every subgroup for the moves of `base`.
    pub fn new(group: SymmetryGroup<C>, base: &Base<C>) -> Result<Self, TableError> {
        let conj_base = group.conjugate_base(base)?;
        let masks = SymMasks::new(&group, &conj_base);
        Ok(LiveSymmetry { group, masks })
    }

    /// The symmetry group.
    pub fn group(&self) -> &SymmetryGroup<C> {
        &self.group
    }

    /// The subgroup masks.
    pub fn masks(&self) -> &SymMasks {
        &self.masks
    }

    /// The moves worth searching from `puzzle`, given a subgroup `candidates` known to contain
    /// its stabilizer.
    pub fn mask(&self, candidates: u64, puzzle: &C) -> u64 {
        if candidates == 1 {
            return self.masks.mask(1);
        }
        self.masks.mask(self.group.stabilizer(candidates, puzzle))
    }

    /// For every value of `coord`, the position in [`SymMasks::subgroups`] of the subgroup of
    /// symmetries fixing it. The stabilizer of a puzzle is contained in the subgroup of its
    /// coordinate, which makes this a cheap candidate set for [`LiveSymmetry::mask`].
    pub fn coordinate_stabilizers<K: Coordinate<C>>(&self, coord: &K) -> Vec<u8> {
        let all = self.all();
        (0..coord.count())
            .into_par_iter()
            .map(|g| {
                let sg = self.group.stabilizer(all, &coord.to_puzzle(g));
                let i = self
                    .masks
                    .index_of(sg)
                    .expect("stabilizer is not among the enumerated subgroups");
                i as u8
            })
            .collect()
    }

    /// The mask of every symmetry.
    pub fn all(&self) -> u64 {
        u64::MAX >> (64 - self.group.len())
    }
}
