//! Face turns of the 3x3x3 cube as typed values, for building move sequences by hand.

use super::{htm, Cube3};
use crate::moves::Moves;

#[cfg(test)]
use proptest_derive::Arbitrary;

/// Represents each type of move. Note that the `Move333` struct uses this along with a counter
/// to represent moves such as R2 or U'.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(test, derive(Arbitrary))]
pub enum Move333Type {
    /// Up
    U,
    /// Down
    D,
    /// Right
    R,
    /// Left
    L,
    /// Front
    F,
    /// Back
    B,
}

impl Move333Type {
    const ALL: [Move333Type; 6] = [
        Move333Type::U,
        Move333Type::D,
        Move333Type::R,
        Move333Type::L,
        Move333Type::F,
        Move333Type::B,
    ];

    /// The move type on the face opposite to the given one.
    pub fn opposite(self) -> Move333Type {
        match self {
            Move333Type::R => Move333Type::L,
            Move333Type::L => Move333Type::R,
            Move333Type::U => Move333Type::D,
            Move333Type::D => Move333Type::U,
            Move333Type::F => Move333Type::B,
            Move333Type::B => Move333Type::F,
        }
    }
}

/// Stores a move type and counter. An anti-clockwise move will have a count of 3.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(test, derive(Arbitrary))]
#[allow(missing_docs)]
pub struct Move333 {
    pub ty: Move333Type,
    #[cfg_attr(test, proptest(strategy = "1..=3u8"))]
    pub count: u8,
}

impl Move333 {
    /// The move undoing this one.
    pub fn inverse(self) -> Self {
        Self {
            ty: self.ty,
            count: 4 - self.count,
        }
    }

    /// The move at index `i` of [`htm`].
    pub fn from_index(i: usize) -> Option<Self> {
        let ty = *Move333Type::ALL.get(i / 3)?;
        Some(Move333 {
            ty,
            count: (i % 3) as u8 + 1,
        })
    }

    /// The cube reached by this move from the solved state.
    pub fn to_cube(self) -> Cube3 {
        htm().moves()[usize::from(self)]
    }
}

// I don't want to have the default derive debug for this!
impl std::fmt::Debug for Move333 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.count {
            1 => write!(f, "{:?}", self.ty),
            3 => write!(f, "{:?}'", self.ty),
            _ => write!(f, "{:?}{}", self.ty, self.count),
        }
    }
}

/// Index of the move in [`htm`], which lists the quarter turn, half turn and inverse turn of
/// each face in `U D R L F B` order.
impl From<Move333> for usize {
    fn from(mv: Move333) -> usize {
        mv.ty as usize * 3 + mv.count as usize - 1
    }
}

/// Convert typed moves into indices of [`htm`].
pub fn to_moves(mvs: &[Move333]) -> Moves {
    mvs.iter().fold(Moves::new(), |m, &mv| m.push(mv.into()))
}

/// Convert indices of [`htm`] into typed moves.
pub fn from_moves(moves: &Moves) -> Vec<Move333> {
    moves.iter().filter_map(Move333::from_index).collect()
}

/// Create a move by specifying a move type and move count. Note that you do not need to specify
/// for example Move333Type::R, you only need to specify R.
#[macro_export]
macro_rules! mv {
    ($ty:ident, $count: expr) => {
        $crate::cube333::moves::Move333 {
            ty: $crate::cube333::moves::Move333Type::$ty,
            count: $count,
        }
    };
}
