//! Grouped permutations, which only remember which orbit class each position holds.
//!
//! An `Orbits` value partitions the positions `0..m` into classes. The grouped permutation of a
//! permutation `p` replaces every piece by the index of the class it belongs to, so pieces
//! within a class become indistinguishable. Grouped permutations are ranked with the
//! multinomial number system.

/// Maximum number of positions (and classes) supported by `Orbits`.
pub const MAX_POSITIONS: usize = 16;

/// A partition of positions into orbit classes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Orbits {
    members: Vec<Vec<u8>>,
    class_of: Vec<u8>,
    index_in_class: Vec<u8>,
    count: usize,
}

impl Orbits {
    /// Create a partition from its classes. Every position in `0..m` must occur in exactly one
    /// class, where `m` is the total number of positions.
    pub fn new(members: Vec<Vec<u8>>) -> Self {
        let m: usize = members.iter().map(Vec::len).sum();
        assert!(m <= MAX_POSITIONS && members.len() <= MAX_POSITIONS);
        let mut class_of = vec![u8::MAX; m];
        let mut index_in_class = vec![0; m];
        for (j, class) in members.iter().enumerate() {
            for (k, &p) in class.iter().enumerate() {
                assert_eq!(class_of[p as usize], u8::MAX, "position {p} in two classes");
                class_of[p as usize] = j as u8;
                index_in_class[p as usize] = k as u8;
            }
        }

        let mut count = 1;
        let mut i = 0;
        for class in &members {
            for j in 0..class.len() {
                count = count * (m - i) / (j + 1);
                i += 1;
            }
        }

        Orbits {
            members,
            class_of,
            index_in_class,
            count,
        }
    }

    /// Number of positions.
    pub fn len(&self) -> usize {
        self.class_of.len()
    }

    /// Whether there are no positions at all.
    pub fn is_empty(&self) -> bool {
        self.class_of.is_empty()
    }

    /// The classes of this partition.
    pub fn classes(&self) -> &[Vec<u8>] {
        &self.members
    }

    /// Number of distinct grouped permutations.
    pub fn count(&self) -> usize {
        self.count
    }

    fn sizes(&self) -> [usize; MAX_POSITIONS] {
        let mut ns = [0; MAX_POSITIONS];
        for (j, class) in self.members.iter().enumerate() {
            ns[j] = class.len();
        }
        ns
    }

    /// Rank a grouped permutation.
    pub fn rank(&self, grouped: &[u8]) -> usize {
        let m = self.len();
        let mut ns = self.sizes();
        let mut number = self.count;
        let mut x = 0;
        for (i, &g) in grouped.iter().enumerate() {
            let j = g as usize;
            for &n in &ns[..j] {
                x += number * n / (m - i);
            }
            number = number * ns[j] / (m - i);
            ns[j] -= 1;
        }
        x
    }

    /// Write the grouped permutation with rank `x` into `grouped`.
    pub fn unrank(&self, mut x: usize, grouped: &mut [u8]) {
        let m = self.len();
        let mut ns = self.sizes();
        let mut number = self.count;
        for (i, g) in grouped.iter_mut().enumerate() {
            for j in 0..self.members.len() {
                if ns[j] == 0 {
                    continue;
                }
                let number_j = number * ns[j] / (m - i);
                if x < number_j {
                    *g = j as u8;
                    number = number_j;
                    ns[j] -= 1;
                    break;
                }
                x -= number_j;
            }
        }
    }

    /// Group a permutation by class.
    pub fn group(&self, perm: &[u8], grouped: &mut [u8]) {
        for (g, &p) in grouped.iter_mut().zip(perm) {
            *g = self.class_of[p as usize];
        }
    }

    /// A permutation whose grouping is `grouped`, taking pieces of each class in order.
    pub fn ungroup(&self, grouped: &[u8], perm: &mut [u8]) {
        let mut next = [0usize; MAX_POSITIONS];
        for (p, &g) in perm.iter_mut().zip(grouped) {
            let j = g as usize;
            *p = self.members[j][next[j]];
            next[j] += 1;
        }
    }

    /// Split a permutation that keeps every class in place into one sub-permutation per class.
    /// `parts[j][k]` is the index within class `j` of the piece at the `k`th position of class
    /// `j`.
    pub fn split(&self, perm: &[u8], parts: &mut [&mut [u8]]) {
        for (class, part) in self.members.iter().zip(parts.iter_mut()) {
            for (k, &pos) in class.iter().enumerate() {
                part[k] = self.index_in_class[perm[pos as usize] as usize];
            }
        }
    }

    /// Inverse of `split`.
    pub fn join(&self, parts: &[&[u8]], perm: &mut [u8]) {
        for (class, part) in self.members.iter().zip(parts) {
            for (k, &pos) in class.iter().enumerate() {
                perm[pos as usize] = class[part[k] as usize];
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::group::Perm;
    use proptest::prelude::*;

    fn slice() -> Orbits {
        Orbits::new(vec![vec![0, 1, 2, 3], (4..12).collect()])
    }

    fn slice_one_fixed() -> Orbits {
        Orbits::new(vec![vec![0], vec![1], vec![2], vec![3], (4..12).collect()])
    }

    #[test]
    fn counts() {
        assert_eq!(slice().count(), 495);
        assert_eq!(slice_one_fixed().count(), 11880);
        let corners = Orbits::new(vec![
            vec![0],
            vec![1],
            vec![2],
            vec![3],
            vec![4],
            vec![5],
            vec![6, 7],
        ]);
        assert_eq!(corners.count(), 20160);
    }

    #[test]
    fn identity_grouping_ranks_zero() {
        let o = slice();
        let mut g = [0; 12];
        o.group(&Perm::<12>::IDENTITY.0, &mut g);
        assert_eq!(o.rank(&g), 0);
    }

    proptest! {
        #[test]
        fn rank_roundtrip(x in 0..11880usize) {
            let o = slice_one_fixed();
            let mut g = [0; 12];
            o.unrank(x, &mut g);
            prop_assert_eq!(o.rank(&g), x);
        }

        #[test]
        fn ungroup_then_group(x in 0..495usize) {
            let o = slice();
            let mut g = [0; 12];
            let mut p = [0; 12];
            let mut h = [0; 12];
            o.unrank(x, &mut g);
            o.ungroup(&g, &mut p);
            prop_assert_eq!(Perm(p).conflict(), None);
            o.group(&p, &mut h);
            prop_assert_eq!(g, h);
        }

        #[test]
        fn split_join_roundtrip(a in 0..24usize, b in 0..40320usize) {
            let o = slice();
            let ep4 = Perm::<4>::unrank(a).0;
            let ep8 = Perm::<8>::unrank(b).0;
            let mut p = [0; 12];
            o.join(&[&ep4[..], &ep8[..]], &mut p);
            let mut c4 = [0; 4];
            let mut c8 = [0; 8];
            o.split(&p, &mut [&mut c4[..], &mut c8[..]]);
            prop_assert_eq!(c4, ep4);
            prop_assert_eq!(c8, ep8);
        }
    }
}
