//! Move sequences and generator sets.
//!
//! A `Base` is an ordered set of generator states. Moves are referred to by their index in the
//! base, and a `Moves` value is a short sequence of such indices.

use crate::error::MoveParseError;
use crate::group::Group;

use itertools::Itertools;

/// Maximum number of moves a `Moves` value can hold.
pub const CAPACITY: usize = 32;

/// A sequence of move indices stored inline, so that search nodes can be copied around freely.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Moves {
    len: u8,
    moves: [u8; CAPACITY],
}

impl Moves {
    /// The empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence from a slice of move indices.
    pub fn from_slice(moves: &[u8]) -> Self {
        assert!(moves.len() <= CAPACITY);
        let mut m = Self::new();
        m.moves[..moves.len()].copy_from_slice(moves);
        m.len = moves.len() as u8;
        m
    }

    /// Number of moves.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Whether there are no moves.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The last move, if any.
    pub fn last(&self) -> Option<usize> {
        self.as_slice().last().map(|&m| m as usize)
    }

    /// The sequence with `m` appended.
    pub fn push(&self, m: usize) -> Self {
        assert!(self.len() < CAPACITY, "move sequence is full");
        let mut next = *self;
        next.moves[self.len()] = m as u8;
        next.len += 1;
        next
    }

    /// The sequence followed by `other`.
    pub fn concat(&self, other: &Moves) -> Self {
        other.iter().fold(*self, |m, x| m.push(x))
    }

    /// Replace every move index by `f(index)`.
    pub fn map(&self, f: impl Fn(usize) -> usize) -> Self {
        let mut next = *self;
        for m in &mut next.moves[..self.len()] {
            *m = f(*m as usize) as u8;
        }
        next
    }

    /// The move indices.
    pub fn as_slice(&self) -> &[u8] {
        &self.moves[..self.len()]
    }

    /// Iterate over the move indices.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.as_slice().iter().map(|&m| m as usize)
    }
}

impl std::fmt::Debug for Moves {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// An ordered set of generators together with the moves each generator may be followed by.
#[derive(Clone, Debug)]
pub struct Base<C> {
    moves: Vec<C>,
    names: Vec<String>,
    masks: Vec<u64>,
    super_index: Vec<usize>,
}

impl<C: Group> Base<C> {
    /// Create a base from named generators.
    pub fn new(names: &[&str], moves: &[C]) -> Self {
        assert_eq!(names.len(), moves.len());
        Self::with_super_index(
            names.iter().map(|n| n.to_string()).collect(),
            moves.to_vec(),
            (0..moves.len()).collect(),
        )
    }

    fn with_super_index(names: Vec<String>, moves: Vec<C>, super_index: Vec<usize>) -> Self {
        assert!(moves.len() <= 64);
        let masks = redundancy_masks(&moves);
        Base {
            moves,
            names,
            masks,
            super_index,
        }
    }

    /// The base made of the moves of `self` at `indices`. Moves of the new base remember their
    /// index in `self`, see [`Base::super_index`].
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self::with_super_index(
            indices.iter().map(|&i| self.names[i].clone()).collect(),
            indices.iter().map(|&i| self.moves[i]).collect(),
            indices.iter().map(|&i| self.super_index[i]).collect(),
        )
    }

    /// Number of generators.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Whether the base has no generators.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// The generators.
    pub fn moves(&self) -> &[C] {
        &self.moves
    }

    /// The name of move `i`.
    pub fn name(&self, i: usize) -> &str {
        &self.names[i]
    }

    /// The index of move `i` in the base this one was taken from.
    pub fn super_index(&self, i: usize) -> usize {
        self.super_index[i]
    }

    /// The mask of moves that may follow `last`. Every move may start a sequence.
    pub fn allowed_after(&self, last: Option<usize>) -> u64 {
        match last {
            Some(m) => self.masks[m],
            None => !0,
        }
    }

    /// Apply a sequence of moves to `start`.
    pub fn apply(&self, start: &C, moves: &Moves) -> C {
        moves
            .iter()
            .fold(*start, |c, m| c.compose(&self.moves[m]))
    }

    /// Format a sequence of moves, separated by spaces.
    pub fn format(&self, moves: &Moves) -> String {
        moves.iter().map(|m| self.name(m)).join(" ")
    }

    /// Parse a whitespace separated sequence of move names.
    pub fn parse(&self, s: &str) -> Result<Moves, MoveParseError> {
        s.split_whitespace().try_fold(Moves::new(), |moves, token| {
            match self.names.iter().position(|n| n == token) {
                Some(i) if moves.len() < CAPACITY => Ok(moves.push(i)),
                _ => Err(MoveParseError(token.to_string())),
            }
        })
    }
}

/// For each move `i`, the set of moves `j` such that `i j` is not redundant. A pair is redundant
/// when it collapses into a single generator or the identity, or when it commutes and `j` comes
/// first in base order.
fn redundancy_masks<C: Group>(moves: &[C]) -> Vec<u64> {
    let n = moves.len();
    let identity = C::identity();
    let mut masks = vec![0u64; n];
    for i in 0..n {
        for j in i + 1..n {
            let a = moves[i].compose(&moves[j]);
            if !moves.contains(&a) && a != identity {
                masks[i] |= 1 << j;
                if a != moves[j].compose(&moves[i]) {
                    masks[j] |= 1 << i;
                }
            }
        }
    }
    masks
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cube333::{htm, Cube3};

    #[test]
    fn same_face_is_redundant() {
        let base = htm();
        let u = base.parse("U").unwrap().last();
        let u2 = base.parse("U2").unwrap().last().unwrap();
        let mask = base.allowed_after(u);
        assert_eq!(mask & (1 << u2), 0);
        assert_eq!(mask & 0b111, 0);
    }

    #[test]
    fn opposite_faces_in_one_order() {
        let base = htm();
        let u = base.parse("U").unwrap().as_slice()[0] as usize;
        let d = base.parse("D").unwrap().as_slice()[0] as usize;
        let r = base.parse("R").unwrap().as_slice()[0] as usize;
        assert_ne!(base.allowed_after(Some(u)) & (1 << d), 0);
        assert_eq!(base.allowed_after(Some(d)) & (1 << u), 0);
        assert_ne!(base.allowed_after(Some(r)) & (1 << u), 0);
        assert_eq!(base.allowed_after(None), !0);
    }

    #[test]
    fn parse_and_format() {
        let base = htm();
        let moves = base.parse("R U2 F'").unwrap();
        assert_eq!(moves.len(), 3);
        assert_eq!(base.format(&moves), "R U2 F'");
        assert_eq!(base.parse("R X"), Err(MoveParseError("X".to_string())));
    }

    #[test]
    fn apply_inverse() {
        let base = htm();
        let c = base.apply(&Cube3::identity(), &base.parse("R U R' U'").unwrap());
        let d = base.apply(&c, &base.parse("U R U' R'").unwrap());
        assert_eq!(d, Cube3::identity());
    }

    #[test]
    fn subset_keeps_super_index() {
        let base = htm();
        let sub = base.subset(&[0, 1, 2, 4]);
        assert_eq!(sub.len(), 4);
        assert_eq!(sub.name(3), "D2");
        assert_eq!(sub.super_index(3), 4);
        let m = Moves::from_slice(&[3, 0]).map(|i| sub.super_index(i));
        assert_eq!(m.as_slice(), &[4, 0]);
    }
}
