//! The 3x3x3 cube.
//!
//! Corners 0..4 are on the U face and 4..8 on the D face. Edges 0..4 are the E slice, edges 4,
//! 5, 8 and 11 are on the U face and 6, 7, 9 and 10 on the D face. Orientations of corners are
//! elements of D3 so that mirror symmetries can be expressed, moves only use rotations.

pub mod coords;
pub mod moves;
pub mod optimal;
pub mod two_phase_solver;

use crate::error::CubeError;
use crate::group::{Cubie, Group};
use crate::moves::Base;
use crate::symmetry::SymmetryGroup;

/// A 3x3x3 cube, as a corner block and an edge block.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Cube3 {
    /// Corners
    pub c: Cubie<8, 3>,
    /// Edges
    pub e: Cubie<12, 2>,
}

impl Cube3 {
    /// The solved cube.
    pub const SOLVED: Self = Cube3 {
        c: Cubie::IDENTITY,
        e: Cubie::IDENTITY,
    };

    /// Build a cube from its permutations and orientations.
    pub const fn new(cp: [u8; 8], co: [u8; 8], ep: [u8; 12], eo: [u8; 12]) -> Self {
        Cube3 {
            c: Cubie::new(cp, co),
            e: Cubie::new(ep, eo),
        }
    }

    /// `self` followed by `other`.
    pub const fn compose(&self, other: &Self) -> Self {
        Cube3 {
            c: self.c.compose(&other.c),
            e: self.e.compose(&other.e),
        }
    }

    /// The inverse.
    pub const fn inverse(&self) -> Self {
        Cube3 {
            c: self.c.inverse(),
            e: self.e.inverse(),
        }
    }

    /// Check that the cube can be reached with face turns.
    pub fn verify(&self) -> Result<(), CubeError> {
        if let Some(&p) = self.c.p.0.iter().find(|&&p| p >= 8) {
            return Err(CubeError::CornerOutOfRange(p as usize));
        }
        if let Some(&p) = self.e.p.0.iter().find(|&&p| p >= 12) {
            return Err(CubeError::EdgeOutOfRange(p as usize));
        }
        if let Some((i, j)) = self.c.p.conflict() {
            return Err(CubeError::CornerConflict(i, j));
        }
        if let Some((i, j)) = self.e.p.conflict() {
            return Err(CubeError::EdgeConflict(i, j));
        }
        if self.c.p.parity() != self.e.p.parity() {
            return Err(CubeError::Parity);
        }
        if !self.c.o.is_valid() {
            return Err(CubeError::CornerOrientation);
        }
        if !self.e.o.is_valid() {
            return Err(CubeError::EdgeOrientation);
        }
        Ok(())
    }
}

impl Group for Cube3 {
    fn identity() -> Self {
        Self::SOLVED
    }

    fn compose(&self, other: &Self) -> Self {
        Cube3::compose(self, other)
    }

    fn inverse(&self) -> Self {
        Cube3::inverse(self)
    }
}

impl std::ops::Mul for Cube3 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.compose(&rhs)
    }
}

#[rustfmt::skip]
mod generators {
    use super::Cube3;

    /// Quarter turn of the U face.
    pub const U1: Cube3 = Cube3::new(
        [1, 3, 0, 2, 4, 5, 6, 7], [0; 8],
        [0, 1, 2, 3, 8, 11, 6, 7, 5, 9, 10, 4], [0; 12],
    );
    /// Quarter turn of the D face.
    pub const D1: Cube3 = Cube3::new(
        [0, 1, 2, 3, 6, 4, 7, 5], [0; 8],
        [0, 1, 2, 3, 4, 5, 9, 10, 8, 7, 6, 11], [0; 12],
    );
    /// Quarter turn of the R face.
    pub const R1: Cube3 = Cube3::new(
        [4, 0, 2, 3, 5, 1, 6, 7], [2, 1, 0, 0, 1, 2, 0, 0],
        [9, 1, 2, 8, 4, 5, 6, 7, 0, 3, 10, 11], [0; 12],
    );
    /// Quarter turn of the L face.
    pub const L1: Cube3 = Cube3::new(
        [0, 1, 3, 7, 4, 5, 2, 6], [0, 0, 1, 2, 0, 0, 2, 1],
        [0, 11, 10, 3, 4, 5, 6, 7, 8, 9, 1, 2], [0; 12],
    );
    /// Quarter turn of the F face.
    pub const F1: Cube3 = Cube3::new(
        [2, 1, 6, 3, 0, 5, 4, 7], [1, 0, 2, 0, 2, 0, 1, 0],
        [4, 7, 2, 3, 1, 5, 6, 0, 8, 9, 10, 11], [1, 1, 0, 0, 1, 0, 0, 1, 0, 0, 0, 0],
    );
    /// Quarter turn of the B face.
    pub const B1: Cube3 = Cube3::new(
        [0, 5, 2, 1, 4, 7, 6, 3], [0, 2, 0, 1, 0, 1, 0, 2],
        [0, 1, 5, 6, 4, 3, 2, 7, 8, 9, 10, 11], [0, 0, 1, 1, 0, 1, 1, 0, 0, 0, 0, 0],
    );

    /// Rotation of the whole cube about the UD axis, like U.
    pub const AU1: Cube3 = Cube3::new(
        [1, 3, 0, 2, 5, 7, 4, 6], [0; 8],
        [3, 0, 1, 2, 8, 11, 10, 9, 5, 6, 7, 4], [1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0],
    );
    /// Rotation of the whole cube about the RL axis, like R.
    pub const AR1: Cube3 = Cube3::new(
        [4, 0, 6, 2, 5, 1, 7, 3], [2, 1, 1, 2, 1, 2, 2, 1],
        [9, 10, 11, 8, 7, 4, 5, 6, 0, 3, 2, 1], [0, 0, 0, 0, 1, 1, 1, 1, 0, 0, 0, 0],
    );
    /// Rotation of the whole cube about the FB axis, like F.
    pub const AF1: Cube3 = Cube3::new(
        [2, 3, 6, 7, 0, 1, 4, 5], [1, 2, 2, 1, 2, 1, 1, 2],
        [4, 7, 6, 5, 1, 2, 3, 0, 11, 8, 9, 10], [1; 12],
    );
    /// Reflection swapping the U and D faces.
    pub const REF_UD: Cube3 = Cube3::new(
        [4, 5, 6, 7, 0, 1, 2, 3], [3; 8],
        [0, 1, 2, 3, 7, 6, 5, 4, 9, 8, 11, 10], [0; 12],
    );
}

pub use generators::{AF1, AR1, AU1, B1, D1, F1, L1, R1, REF_UD, U1};

/// Names of the face turns, in base order.
pub const HTM_NAMES: [&str; 18] = [
    "U", "U2", "U'", "D", "D2", "D'", "R", "R2", "R'", "L", "L2", "L'", "F", "F2", "F'", "B", "B2",
    "B'",
];

/// The 18 face turns: `U U2 U' D D2 D' R R2 R' L L2 L' F F2 F' B B2 B'`.
pub fn htm() -> Base<Cube3> {
    let moves: Vec<Cube3> = [U1, D1, R1, L1, F1, B1]
        .iter()
        .flat_map(|&x| [x, x * x, x.inverse()])
        .collect();
    Base::new(&HTM_NAMES, &moves)
}

/// Indices into [`htm`] of the moves keeping the subgroup reached by the first phase of the two
/// phase solver: `U U2 U' D D2 D' R2 L2 F2 B2`.
pub const DOMINO_MOVES: [usize; 10] = [0, 1, 2, 3, 4, 5, 7, 10, 13, 16];

/// The moves of [`DOMINO_MOVES`].
pub fn domino() -> Base<Cube3> {
    htm().subset(&DOMINO_MOVES)
}

fn pow(x: Cube3, n: usize) -> Cube3 {
    (0..n).fold(Cube3::SOLVED, |a, _| a * x)
}

/// Symmetry `i` of the 16 symmetries preserving the UD axis, `REF_UD^a * AR2^b * AU1^c` with
/// `i = 8a + 4b + c`.
pub fn s16_element(i: usize) -> Cube3 {
    pow(REF_UD, i / 8) * pow(AR1 * AR1, i / 4 % 2) * pow(AU1, i % 4)
}

/// The three rotations permuting the axes cyclically.
pub fn s3_elements() -> [Cube3; 3] {
    let x = AU1 * AF1;
    [Cube3::SOLVED, x, x.inverse()]
}

fn build(elements: Vec<Cube3>) -> SymmetryGroup<Cube3> {
    match SymmetryGroup::from_elements(elements) {
        Ok(g) => g,
        Err(e) => unreachable!("cube symmetries are a group: {e}"),
    }
}

/// The symmetries preserving the UD axis.
pub fn s16() -> SymmetryGroup<Cube3> {
    build((0..16).map(s16_element).collect())
}

/// Every symmetry of the cube, `S3[i / 16] * S16[i % 16]`.
pub fn s48() -> SymmetryGroup<Cube3> {
    let s3 = s3_elements();
    build(
        (0..48)
            .map(|i| s3[i / 16] * s16_element(i % 16))
            .collect(),
    )
}
