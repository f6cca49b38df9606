//! Classes of coordinate values under conjugation by a symmetry group.

use super::SymmetryGroup;
use crate::coord::Coordinate;
use crate::group::Group;
use crate::moves::Base;
use crate::table::{cache, Persist};

use rayon::prelude::*;

use std::io::{self, Read, Write};

/// Splits the values of a raw coordinate into classes under conjugation.
///
/// The representative of a class is its smallest raw value. A raw value `g` is stored as the
/// pair `(s, c)` where `c` is its class and `s` is the smallest symmetry such that `g` is the
/// conjugate of the representative of `c` by `s`. The table also records, for each class, the
/// symmetries fixing the representative and the result of applying each move to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConjClassTable {
    n_moves: usize,
    raw_sym: Vec<u8>,
    raw_class: Vec<u32>,
    class_raw: Vec<u32>,
    class_stabilizer: Vec<u64>,
    move_sym: Vec<u8>,
    move_class: Vec<u32>,
}

impl ConjClassTable {
    /// Classify the values of `coord`. When a base is given the table also stores the effect of
    /// each move on each representative.
    pub fn generate<P: Group, C: Coordinate<P>>(
        coord: &C,
        group: &SymmetryGroup<P>,
        base: Option<&Base<P>>,
    ) -> Self {
        let n_raw = coord.count();
        let n_sym = group.len();
        let mut raw_sym = vec![0u8; n_raw];
        let mut raw_class = vec![u32::MAX; n_raw];
        let mut class_raw = Vec::new();
        let mut class_stabilizer = Vec::new();

        for i in 0..n_raw {
            if raw_class[i] != u32::MAX {
                continue;
            }
            let k = class_raw.len() as u32;
            let p = coord.to_puzzle(i);
            let mut stabilizer = 0u64;
            for s in 0..n_sym {
                let j = coord.from_puzzle(&p.conjugate(group.element(s)));
                if raw_class[j] == u32::MAX {
                    raw_class[j] = k;
                    raw_sym[j] = s as u8;
                }
                if j == i {
                    stabilizer |= 1 << s;
                }
            }
            class_raw.push(i as u32);
            class_stabilizer.push(stabilizer);
        }

        let (n_moves, move_sym, move_class) = match base {
            Some(base) => {
                let (move_sym, move_class) = class_raw
                    .par_iter()
                    .flat_map_iter(|&i| {
                        let p = coord.to_puzzle(i as usize);
                        let (raw_sym, raw_class) = (&raw_sym, &raw_class);
                        base.moves().iter().map(move |m| {
                            let j = coord.from_puzzle(&p.compose(m));
                            (raw_sym[j], raw_class[j])
                        })
                    })
                    .unzip();
                (base.len(), move_sym, move_class)
            }
            None => (0, Vec::new(), Vec::new()),
        };

        ConjClassTable {
            n_moves,
            raw_sym,
            raw_class,
            class_raw,
            class_stabilizer,
            move_sym,
            move_class,
        }
    }

    /// Number of raw coordinate values.
    pub fn n_raw(&self) -> usize {
        self.raw_class.len()
    }

    /// Number of classes.
    pub fn n_classes(&self) -> usize {
        self.class_raw.len()
    }

    /// The symmetry and class of a raw value.
    pub fn classify(&self, raw: usize) -> (usize, usize) {
        (self.raw_sym[raw] as usize, self.raw_class[raw] as usize)
    }

    /// The raw value representing a class.
    pub fn representative(&self, class: usize) -> usize {
        self.class_raw[class] as usize
    }

    /// The symmetries fixing the representative of a class.
    pub fn stabilizer(&self, class: usize) -> u64 {
        self.class_stabilizer[class]
    }

    /// The symmetry and class of the representative of `class` after move `m`.
    pub fn make_move(&self, class: usize, m: usize) -> (usize, usize) {
        let i = class * self.n_moves + m;
        (self.move_sym[i] as usize, self.move_class[i] as usize)
    }
}

impl Persist for ConjClassTable {
    fn persisted_len(&self) -> usize {
        self.n_raw()
    }

    fn write_to(&self, w: &mut dyn Write) -> io::Result<()> {
        w.write_all(&(self.n_moves as u64).to_le_bytes())?;
        self.raw_sym.write_to(w)?;
        self.raw_class.write_to(w)?;
        self.class_raw.write_to(w)?;
        self.class_stabilizer.write_to(w)?;
        self.move_sym.write_to(w)?;
        self.move_class.write_to(w)
    }

    fn read_from(r: &mut dyn Read) -> io::Result<Self> {
        Ok(ConjClassTable {
            n_moves: cache::read_u64(r)? as usize,
            raw_sym: Persist::read_from(r)?,
            raw_class: Persist::read_from(r)?,
            class_raw: Persist::read_from(r)?,
            class_stabilizer: Persist::read_from(r)?,
            move_sym: Persist::read_from(r)?,
            move_class: Persist::read_from(r)?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cube333::coords::CornerOrient;
    use crate::cube333::{htm, s16};
    use proptest::prelude::*;

    #[test]
    fn representatives_are_canonical() {
        let group = s16();
        let coord = CornerOrient;
        let classes = ConjClassTable::generate(&coord, &group, Some(&htm()));
        for c in 0..classes.n_classes() {
            let rep = classes.representative(c);
            assert_eq!(classes.classify(rep), (0, c));
            let p = coord.to_puzzle(rep);
            for s in 0..group.len() {
                let g = coord.from_puzzle(&p.conjugate(group.element(s)));
                assert_eq!(classes.classify(g).1, c);
                assert!(rep <= g);
                assert_eq!(classes.stabilizer(c) >> s & 1 == 1, g == rep);
            }
        }
    }

    #[test]
    fn persist_roundtrip() {
        let classes = ConjClassTable::generate(&CornerOrient, &s16(), Some(&htm()));
        let mut bytes = Vec::new();
        classes.write_to(&mut bytes).unwrap();
        assert_eq!(ConjClassTable::read_from(&mut bytes.as_slice()).unwrap(), classes);
    }

    proptest! {
        #[test]
        fn recorded_symmetry_maps_representative(raw in 0..2187usize) {
            let group = s16();
            let coord = CornerOrient;
            let classes = ConjClassTable::generate(&coord, &group, None);
            let (s, c) = classes.classify(raw);
            let p = coord.to_puzzle(classes.representative(c));
            prop_assert_eq!(coord.from_puzzle(&p.conjugate(group.element(s))), raw);
        }
    }
}
