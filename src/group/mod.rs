//! Group algebra for puzzle states: permutations, orientations and the blocks of pieces built
//! from them.

mod orbit;
mod orient;
mod perm;

pub use orbit::{Orbits, MAX_POSITIONS};
pub use orient::{orient_inv, orient_mul, Orient, TWIST_INV, TWIST_MUL};
pub use perm::Perm;

use std::fmt::Debug;

/// A puzzle state that forms a group under composition.
pub trait Group: Copy + Eq + Debug + Send + Sync + 'static {
    /// The solved state.
    fn identity() -> Self;

    /// Apply `self`, then `other`.
    fn compose(&self, other: &Self) -> Self;

    /// The state undoing `self`.
    fn inverse(&self) -> Self;

    /// Conjugate by `s`, giving `s^-1 self s`.
    fn conjugate(&self, s: &Self) -> Self {
        s.inverse().compose(self).compose(s)
    }
}

/// A block of `M` pieces, each with a position and an orientation in a group of order `N`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Cubie<const M: usize, const N: usize> {
    /// Which piece is at each position
    pub p: Perm<M>,
    /// The orientation of the piece at each position
    pub o: Orient<M, N>,
}

impl<const M: usize, const N: usize> Cubie<M, N> {
    /// The solved block.
    pub const IDENTITY: Self = Cubie {
        p: Perm::IDENTITY,
        o: Orient::IDENTITY,
    };

    /// Build a block from raw arrays.
    pub const fn new(p: [u8; M], o: [u8; M]) -> Self {
        Cubie {
            p: Perm(p),
            o: Orient(o),
        }
    }

    /// Apply `self`, then `other`. The orientation of `self` is carried along by the permutation
    /// of `other` before being combined with the orientation of `other`.
    pub const fn compose(&self, other: &Self) -> Self {
        let mut o = [0u8; M];
        let mut i = 0;
        while i < M {
            o[i] = orient_mul::<N>(self.o.0[other.p.0[i] as usize], other.o.0[i]);
            i += 1;
        }
        Cubie {
            p: self.p.compose(&other.p),
            o: Orient(o),
        }
    }

    /// The inverse block.
    pub const fn inverse(&self) -> Self {
        let p = self.p.inverse();
        let mut o = [0u8; M];
        let mut i = 0;
        while i < M {
            o[i] = orient_inv::<N>(self.o.0[p.0[i] as usize]);
            i += 1;
        }
        Cubie { p, o: Orient(o) }
    }
}

impl<const M: usize, const N: usize> Group for Cubie<M, N> {
    fn identity() -> Self {
        Self::IDENTITY
    }

    fn compose(&self, other: &Self) -> Self {
        Cubie::compose(self, other)
    }

    fn inverse(&self) -> Self {
        Cubie::inverse(self)
    }
}

impl<const M: usize, const N: usize> std::ops::Mul for Cubie<M, N> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.compose(&rhs)
    }
}
