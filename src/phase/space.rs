//! State spaces built from coordinates.

use crate::coord::{ConjTable, Coordinate, MoveTable};
use crate::error::TableError;
use crate::group::Group;
use crate::moves::Base;
use crate::prune::RankedSpace;
use crate::symmetry::{bits, ConjBase, ConjClassTable, SymmetryGroup};
use crate::table::TableCache;

use itertools::Itertools;
use log::info;

/// A ranked state space which is the projection of a puzzle.
pub trait PhaseSpace: RankedSpace {
    /// The puzzle
    type Cube: Group;

    /// The moves, in the order used by `step`.
    fn base(&self) -> &Base<Self::Cube>;

    /// The state of a puzzle.
    fn project(&self, cube: &Self::Cube) -> Self::State;
}

/// The product of two coordinates, ranked as `hi * n_lo + lo`.
#[derive(Debug)]
pub struct ProductSpace<C, A, B> {
    base: Base<C>,
    hi: A,
    lo: B,
    hi_moves: MoveTable,
    lo_moves: MoveTable,
    n_lo: usize,
    start: usize,
}

impl<C: Group, A: Coordinate<C>, B: Coordinate<C>> ProductSpace<C, A, B> {
    /// Build the space, loading move tables from the cache under keys starting with `name`.
    pub fn new(
        cache: &TableCache,
        name: &str,
        base: Base<C>,
        hi: A,
        lo: B,
    ) -> Result<Self, TableError> {
        let hi_moves = MoveTable::cached(cache, &format!("{name}.mul_hi"), &hi, &base)?;
        let lo_moves = MoveTable::cached(cache, &format!("{name}.mul_lo"), &lo, &base)?;
        let n_lo = lo.count();
        let id = C::identity();
        let start = hi.from_puzzle(&id) * n_lo + lo.from_puzzle(&id);
        Ok(ProductSpace {
            base,
            hi,
            lo,
            hi_moves,
            lo_moves,
            n_lo,
            start,
        })
    }
}

impl<C: Group, A: Coordinate<C>, B: Coordinate<C>> RankedSpace for ProductSpace<C, A, B> {
    type State = usize;

    fn n_states(&self) -> usize {
        self.hi.count() * self.n_lo
    }

    fn n_moves(&self) -> usize {
        self.base.len()
    }

    fn start(&self) -> usize {
        self.start
    }

    fn rank(&self, state: &usize) -> usize {
        *state
    }

    fn unrank(&self, index: usize) -> usize {
        index
    }

    fn step(&self, state: &usize, m: usize) -> usize {
        self.hi_moves.make_move(state / self.n_lo, m) * self.n_lo
            + self.lo_moves.make_move(state % self.n_lo, m)
    }

    fn is_start(&self, state: &usize) -> bool {
        *state == self.start
    }
}

impl<C: Group, A: Coordinate<C>, B: Coordinate<C>> PhaseSpace for ProductSpace<C, A, B> {
    type Cube = C;

    fn base(&self) -> &Base<C> {
        &self.base
    }

    fn project(&self, cube: &C) -> usize {
        self.hi.from_puzzle(cube) * self.n_lo + self.lo.from_puzzle(cube)
    }
}

/// A state of a [`SymSpace`]: a class of the classed coordinate, the companion coordinate seen
/// from the representative of that class, and the symmetry relating the representative to the
/// actual state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SymState {
    /// The symmetry `s` such that the state is `s^-1 R s` for the representative frame `R`
    pub sym: u8,
    /// The companion coordinate in the representative frame
    pub companion: u32,
    /// The class of the classed coordinate
    pub class: u32,
}

/// Parities used to store only the half of the companion values that can occur together with a
/// class.
#[derive(Debug)]
struct ParityFold {
    companion: Vec<bool>,
    class: Vec<bool>,
}

/// The product of a companion coordinate and the classes of a coordinate under a symmetry group.
/// The space has one state per pair of a companion value and a class, so it is smaller by
/// about the order of the group than the plain product.
#[derive(Debug)]
pub struct SymSpace<C, A, G> {
    base: Base<C>,
    group: SymmetryGroup<C>,
    conj_base: ConjBase,
    companion: A,
    classed: G,
    companion_conj: ConjTable,
    companion_moves: MoveTable,
    classes: ConjClassTable,
    fold: Option<ParityFold>,
    start: SymState,
}

impl<C: Group, A: Coordinate<C>, G: Coordinate<C>> SymSpace<C, A, G> {
    /// Build the space, loading tables from the cache under keys starting with `name`. The base
    /// must be closed under conjugation by the group, and both coordinates must be compatible
    /// with conjugation.
    pub fn new(
        cache: &TableCache,
        name: &str,
        base: Base<C>,
        group: SymmetryGroup<C>,
        companion: A,
        classed: G,
    ) -> Result<Self, TableError> {
        let conj_base = group.conjugate_base(&base)?;
        let companion_conj =
            ConjTable::cached(cache, &format!("{name}.conj_companion"), &companion, &group)?;
        let companion_moves =
            MoveTable::cached(cache, &format!("{name}.mul_companion"), &companion, &base)?;
        let classes = cache.load_or_compute(&format!("{name}.classes"), classed.count(), || {
            Ok(ConjClassTable::generate(&classed, &group, Some(&base)))
        })?;
        info!(
            "{name}: n_companion={}, n_raw={}, n_class={}",
            companion.count(),
            classes.n_raw(),
            classes.n_classes()
        );

        let mut space = SymSpace {
            base,
            group,
            conj_base,
            companion,
            classed,
            companion_conj,
            companion_moves,
            classes,
            fold: None,
            start: SymState::default(),
        };
        space.start = space.project(&C::identity());
        Ok(space)
    }

    /// Store only companion values whose parity matches the parity of the class, halving the
    /// space. Companion values `2k` and `2k + 1` must have different parities.
    pub fn with_parity_fold(
        mut self,
        companion_parity: impl Fn(usize) -> bool,
        class_parity: impl Fn(usize) -> bool,
    ) -> Self {
        let companion = (0..self.companion.count()).map(companion_parity).collect();
        let class = (0..self.classes.n_classes())
            .map(|k| class_parity(self.classes.representative(k)))
            .collect();
        self.fold = Some(ParityFold { companion, class });
        self
    }

    /// The symmetry group.
    pub fn group(&self) -> &SymmetryGroup<C> {
        &self.group
    }

    /// The class table of the classed coordinate.
    pub fn classes(&self) -> &ConjClassTable {
        &self.classes
    }

    fn n_companion(&self) -> usize {
        match self.fold {
            Some(_) => self.companion.count() / 2,
            None => self.companion.count(),
        }
    }

    fn rank_parts(&self, companion: usize, class: usize) -> usize {
        let companion = match self.fold {
            Some(_) => companion / 2,
            None => companion,
        };
        companion * self.classes.n_classes() + class
    }
}

impl<C: Group, A: Coordinate<C>, G: Coordinate<C>> RankedSpace for SymSpace<C, A, G> {
    type State = SymState;

    fn n_states(&self) -> usize {
        self.n_companion() * self.classes.n_classes()
    }

    fn n_moves(&self) -> usize {
        self.base.len()
    }

    fn start(&self) -> SymState {
        self.start
    }

    fn rank(&self, state: &SymState) -> usize {
        self.rank_parts(state.companion as usize, state.class as usize)
    }

    fn unrank(&self, index: usize) -> SymState {
        let n_classes = self.classes.n_classes();
        let class = index % n_classes;
        let mut companion = index / n_classes;
        if let Some(fold) = &self.fold {
            companion *= 2;
            if fold.companion[companion] != fold.class[class] {
                companion += 1;
            }
        }
        SymState {
            sym: 0,
            companion: companion as u32,
            class: class as u32,
        }
    }

    fn step(&self, state: &SymState, m: usize) -> SymState {
        let a_sym = state.sym as usize;
        // the move as seen from the representative frame
        let conj_m = self.conj_base.get(m, self.group.inv(a_sym));
        let (sym, class) = self.classes.make_move(state.class as usize, conj_m);
        let companion = self
            .companion_moves
            .make_move(state.companion as usize, conj_m);
        SymState {
            sym: self.group.mul(sym, a_sym) as u8,
            companion: self.companion_conj.conjugate(companion, self.group.inv(sym)) as u32,
            class: class as u32,
        }
    }

    fn equivalents(&self, state: &SymState, index: usize, out: &mut Vec<usize>) {
        out.clear();
        let class = state.class as usize;
        let stabilizer = self.classes.stabilizer(class);
        if stabilizer == 1 {
            out.push(index);
            return;
        }
        out.extend(
            bits(stabilizer)
                .map(|s| {
                    let companion = self
                        .companion_conj
                        .conjugate(state.companion as usize, s);
                    self.rank_parts(companion, class)
                })
                .sorted_unstable()
                .dedup(),
        );
    }

    fn is_start(&self, state: &SymState) -> bool {
        state.companion == self.start.companion && state.class == self.start.class
    }
}

impl<C: Group, A: Coordinate<C>, G: Coordinate<C>> PhaseSpace for SymSpace<C, A, G> {
    type Cube = C;

    fn base(&self) -> &Base<C> {
        &self.base
    }

    fn project(&self, cube: &C) -> SymState {
        let (sym, class) = self.classes.classify(self.classed.from_puzzle(cube));
        let companion = self
            .companion_conj
            .conjugate(self.companion.from_puzzle(cube), self.group.inv(sym));
        SymState {
            sym: sym as u8,
            companion: companion as u32,
            class: class as u32,
        }
    }
}
