//! Permutations of a fixed number of pieces and their ranking in the factorial number system.

/// A permutation of `M` pieces, position `i` holds piece `self.0[i]`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Perm<const M: usize>(pub [u8; M]);

const fn factorial(m: usize) -> usize {
    let mut x = 1;
    let mut i = 2;
    while i <= m {
        x *= i;
        i += 1;
    }
    x
}

impl<const M: usize> Perm<M> {
    /// The identity permutation.
    pub const IDENTITY: Self = {
        let mut a = [0u8; M];
        let mut i = 0;
        while i < M {
            a[i] = i as u8;
            i += 1;
        }
        Perm(a)
    };

    /// The number of permutations of `M` pieces.
    pub const COUNT: usize = factorial(M);

    /// Compose two permutations, applying `self` first and then `other`.
    pub const fn compose(&self, other: &Self) -> Self {
        let mut a = [0u8; M];
        let mut i = 0;
        while i < M {
            a[i] = self.0[other.0[i] as usize];
            i += 1;
        }
        Perm(a)
    }

    /// The inverse permutation.
    pub const fn inverse(&self) -> Self {
        let mut a = [0u8; M];
        let mut i = 0;
        while i < M {
            a[self.0[i] as usize] = i as u8;
            i += 1;
        }
        Perm(a)
    }

    /// Whether every piece appears exactly once. Returns the first pair of positions holding the
    /// same piece otherwise. Pieces out of range must be checked by the caller.
    pub fn conflict(&self) -> Option<(usize, usize)> {
        let mut seen = [usize::MAX; M];
        for (i, &p) in self.0.iter().enumerate() {
            let p = p as usize;
            if seen[p] != usize::MAX {
                return Some((seen[p], i));
            }
            seen[p] = i;
        }
        None
    }

    /// The parity of the permutation, `true` when odd.
    pub fn parity(&self) -> bool {
        let mut x = false;
        for i in 0..M {
            for j in i + 1..M {
                x ^= self.0[i] > self.0[j];
            }
        }
        x
    }

    /// The rank of this permutation in `0..COUNT`, the identity has rank 0. Ranks `2k` and
    /// `2k + 1` differ by a swap of the last two pieces.
    pub fn rank(&self) -> usize {
        let mut p = self.0;
        let mut x = 0;
        for i in 0..M {
            for j in i + 1..M {
                if p[j] > p[i] {
                    p[j] -= 1;
                }
            }
            x = x * (M - i) + p[i] as usize;
        }
        x
    }

    /// The permutation with the given rank.
    pub fn unrank(mut x: usize) -> Self {
        let mut p = [0u8; M];
        for i in (0..M).rev() {
            p[i] = (x % (M - i)) as u8;
            x /= M - i;
        }
        for i in (0..M).rev() {
            for j in (i + 1..M).rev() {
                if p[j] >= p[i] {
                    p[j] += 1;
                }
            }
        }
        Perm(p)
    }
}

impl<const M: usize> Default for Perm<M> {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn identity_rank() {
        assert_eq!(Perm::<8>::IDENTITY.rank(), 0);
        assert_eq!(Perm::<8>::unrank(0), Perm::<8>::IDENTITY);
        assert_eq!(Perm::<8>::COUNT, 40320);
        assert_eq!(Perm::<12>::COUNT, 479001600);
    }

    #[test]
    fn last_rank() {
        let reversed = Perm([3, 2, 1, 0]);
        assert_eq!(reversed.rank(), Perm::<4>::COUNT - 1);
    }

    #[test]
    fn neighbouring_ranks_have_opposite_parity() {
        for k in 0..Perm::<6>::COUNT / 2 {
            let a = Perm::<6>::unrank(2 * k);
            let b = Perm::<6>::unrank(2 * k + 1);
            assert_ne!(a.parity(), b.parity());
        }
    }

    #[test]
    fn conflicts() {
        assert_eq!(Perm([0, 1, 2, 1]).conflict(), Some((1, 3)));
        assert_eq!(Perm([3, 1, 2, 0]).conflict(), None);
    }

    proptest! {
        #[test]
        fn rank_roundtrip(x in 0..40320usize) {
            let p = Perm::<8>::unrank(x);
            prop_assert_eq!(p.conflict(), None);
            prop_assert_eq!(p.rank(), x);
        }

        #[test]
        fn inverse_composes_to_identity(x in 0..40320usize) {
            let p = Perm::<8>::unrank(x);
            prop_assert_eq!(p.compose(&p.inverse()), Perm::IDENTITY);
            prop_assert_eq!(p.inverse().compose(&p), Perm::IDENTITY);
        }

        #[test]
        fn parity_is_a_homomorphism(x in 0..40320usize, y in 0..40320usize) {
            let p = Perm::<8>::unrank(x);
            let q = Perm::<8>::unrank(y);
            prop_assert_eq!(p.compose(&q).parity(), p.parity() ^ q.parity());
        }
    }
}
