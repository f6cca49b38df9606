//! The 2x2x2 cube, as the eight corners of a 3x3x3 cube with the DBL corner held in place.
//!
//! Only U, R and F turns are used, so the seven remaining corners describe every state. The
//! whole state space is small enough for an exact distance table, which makes the 2x2x2 a
//! convenient puzzle to run every search variant on.

use crate::coord::Coordinate;
use crate::cube333::s48;
use crate::error::{CubeError, TableError};
use crate::group::{Cubie, Group, Orient, Perm};
use crate::moves::Base;
use crate::phase::{ProductSpace, SymmetryPruned, TablePhase};
use crate::prune::BfsOptions;
use crate::symmetry::SymmetryGroup;
use crate::table::TableCache;

/// A 2x2x2 cube.
pub type Cube2 = Cubie<7, 3>;

/// Quarter turn of the U face.
pub const U1: Cube2 = Cubie::new([1, 3, 0, 2, 4, 5, 6], [0; 7]);
/// Quarter turn of the R face.
pub const R1: Cube2 = Cubie::new([4, 0, 2, 3, 5, 1, 6], [2, 1, 0, 0, 1, 2, 0]);
/// Quarter turn of the F face.
pub const F1: Cube2 = Cubie::new([2, 1, 6, 3, 0, 5, 4], [1, 0, 2, 0, 2, 0, 1]);

/// Names of the face turns, in base order.
pub const HTM_NAMES: [&str; 9] = ["U", "U2", "U'", "R", "R2", "R'", "F", "F2", "F'"];

/// The 9 face turns: `U U2 U' R R2 R' F F2 F'`.
pub fn htm() -> Base<Cube2> {
    let moves: Vec<Cube2> = [U1, R1, F1]
        .iter()
        .flat_map(|&x| [x, x * x, x.inverse()])
        .collect();
    Base::new(&HTM_NAMES, &moves)
}

/// The 6 symmetries of the cube fixing the DBL corner: rotations about the DBL-UFR diagonal and
/// reflections through planes containing it.
pub fn symmetries() -> Result<SymmetryGroup<Cube2>, TableError> {
    let elements: Vec<Cube2> = s48()
        .elements()
        .iter()
        .filter(|s| s.c.p.0[7] == 7)
        .map(|s| Cubie {
            p: Perm(std::array::from_fn(|i| s.c.p.0[i])),
            o: Orient(std::array::from_fn(|i| s.c.o.0[i])),
        })
        .collect();
    SymmetryGroup::from_elements(elements)
}

/// Check that the cube can be reached with face turns.
pub fn verify(cube: &Cube2) -> Result<(), CubeError> {
    if let Some(&p) = cube.p.0.iter().find(|&&p| p >= 7) {
        return Err(CubeError::CornerOutOfRange(p as usize));
    }
    if let Some((i, j)) = cube.p.conflict() {
        return Err(CubeError::CornerConflict(i, j));
    }
    if !cube.o.is_valid() {
        return Err(CubeError::CornerOrientation);
    }
    Ok(())
}

/// Corner permutation, `7!` values.
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone, Hash)]
pub struct Corner7Perm;

/// Corner orientation, `3^6` values.
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone, Hash)]
pub struct Corner7Orient;

impl Coordinate<Cube2> for Corner7Perm {
    fn count(&self) -> usize {
        Perm::<7>::COUNT
    }

    fn from_puzzle(&self, puzzle: &Cube2) -> usize {
        puzzle.p.rank()
    }

    fn to_puzzle(&self, coord: usize) -> Cube2 {
        Cubie {
            p: Perm::unrank(coord),
            o: Orient::IDENTITY,
        }
    }
}

impl Coordinate<Cube2> for Corner7Orient {
    fn count(&self) -> usize {
        Orient::<7, 3>::COUNT
    }

    fn from_puzzle(&self, puzzle: &Cube2) -> usize {
        puzzle.o.rank()
    }

    fn to_puzzle(&self, coord: usize) -> Cube2 {
        Cubie {
            p: Perm::IDENTITY,
            o: Orient::unrank(coord),
        }
    }
}

/// The whole 2x2x2 state space, with exact distances.
pub type Phase2 = TablePhase<ProductSpace<Cube2, Corner7Perm, Corner7Orient>>;

/// Build or load the 2x2x2 phase.
pub fn phase(cache: &TableCache, options: BfsOptions) -> Result<Phase2, TableError> {
    let space = ProductSpace::new(cache, "cube2", htm(), Corner7Perm, Corner7Orient)?;
    TablePhase::cached(space, cache, "cube2.distance_m3", options)
}

/// The 2x2x2 phase, skipping symmetric moves while the cube is symmetric.
pub type SymmetricPhase2 = SymmetryPruned<Phase2>;

/// Build or load the 2x2x2 phase with symmetry pruning.
pub fn symmetric_phase(
    cache: &TableCache,
    options: BfsOptions,
) -> Result<SymmetricPhase2, TableError> {
    SymmetryPruned::new(phase(cache, options)?, symmetries()?)
}

/// The cube reached by applying `moves` to the solved cube.
pub fn scramble(moves: &str) -> Result<Cube2, crate::error::MoveParseError> {
    let base = htm();
    Ok(base.apply(&Cube2::identity(), &base.parse(moves)?))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::moves::Moves;
    use crate::phase::Phase;
    use crate::prune::{PruningTable, SwitchRule};
    use crate::error::DeviceError;
    use crate::search::{
        search_device, search_threaded, Device, HostDevice, IdaStar, ParallelOptions, Schedule,
        Step, TwoPhaseSearch,
    };

    use proptest::collection::vec;
    use proptest::prelude::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::OnceLock;

    fn phase2() -> &'static Phase2 {
        static PHASE: OnceLock<Phase2> = OnceLock::new();
        PHASE.get_or_init(|| phase(&TableCache::disabled(), BfsOptions::new(4)).unwrap())
    }

    fn apply(mvs: &[usize]) -> Cube2 {
        let m = mvs.iter().fold(Moves::new(), |m, &i| m.push(i));
        htm().apply(&Cube2::identity(), &m)
    }

    /// Distance straight from the table.
    fn table_distance(cube: &Cube2) -> usize {
        let p = phase2();
        p.distance(&p.project(cube)).0
    }

    #[test]
    fn generators() {
        for x in [U1, R1, F1] {
            assert_eq!(verify(&x), Ok(()));
            assert_ne!(x * x, Cube2::identity());
            assert_eq!(x * x * x * x, Cube2::identity());
        }
        let mut c = U1;
        c.p = Perm([0, 0, 2, 3, 4, 5, 6]);
        assert_eq!(verify(&c), Err(CubeError::CornerConflict(0, 1)));
        c.p = Perm([0, 1, 2, 3, 4, 5, 9]);
        assert_eq!(verify(&c), Err(CubeError::CornerOutOfRange(9)));
        let mut c = Cube2::identity();
        c.o = Orient([1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(verify(&c), Err(CubeError::CornerOrientation));
    }

    #[test_log::test]
    fn layer_distribution() {
        assert_eq!(
            phase2().table().layers(),
            &[1, 9, 54, 321, 1847, 9992, 50136, 227536, 870072, 1887748, 623800, 2644]
        );
    }

    #[test]
    fn same_labels_for_every_build() {
        let reference = phase2().table();
        let space = phase2().space();
        for (n_thread, switch) in [
            (1, SwitchRule::Balanced),
            (3, SwitchRule::Forward),
            (7, SwitchRule::Backward),
        ] {
            let table = PruningTable::build(space, BfsOptions { n_thread, switch }).unwrap();
            assert_eq!(table.labels(), reference.labels());
        }
    }

    #[test]
    fn solved_needs_no_moves() {
        let mut search = IdaStar::new(phase2(), &Cube2::identity(), 11);
        let sol = search.next().unwrap();
        assert!(sol.moves.is_empty());
        assert!(sol.optimal);
    }

    #[test]
    fn two_moves() {
        let cube = scramble("R U").unwrap();
        let sol = IdaStar::new(phase2(), &cube, 11).next().unwrap();
        assert_eq!(htm().format(&sol.moves), "U' R'");
        assert_eq!(htm().apply(&cube, &sol.moves), Cube2::identity());
    }

    #[test]
    fn exhausted_after_optimal_solutions() {
        let cube = scramble("R U").unwrap();
        let mut search = IdaStar::new(phase2(), &cube, 4);
        let mut n_optimal = 0;
        loop {
            match search.step() {
                Step::Solution(s) => {
                    assert!(s.optimal);
                    assert_eq!(s.moves.len(), 2);
                    n_optimal += 1;
                }
                Step::Exhausted { bound } => {
                    assert_eq!(bound, 2);
                    break;
                }
                Step::End => panic!("search ended before exhausting the optimum"),
            }
        }
        assert_eq!(n_optimal, 1);
        for s in search {
            assert!(!s.optimal);
            assert!(s.moves.len() > 2);
        }
    }

    #[test]
    fn max_moves_caps_search() {
        let cube = scramble("R U F R").unwrap();
        assert_eq!(table_distance(&cube), 4);
        assert_eq!(IdaStar::new(phase2(), &cube, 3).next(), None);
        let options = ParallelOptions {
            n_lane: 2,
            frontier_size: 8,
            schedule: Schedule::Static,
            max_moves: 3,
            sym_n_moves: 0,
        };
        assert_eq!(search_threaded(phase2(), &cube, &options).unwrap(), None);
    }

    proptest! {
        #[test]
        fn solution_length_is_distance(mvs in vec(0..9usize, 0..16)) {
            let cube = apply(&mvs);
            let sol = IdaStar::new(phase2(), &cube, 11).next().unwrap();
            prop_assert!(sol.optimal);
            prop_assert_eq!(sol.moves.len(), table_distance(&cube));
            prop_assert_eq!(htm().apply(&cube, &sol.moves), Cube2::identity());
        }

        #[test]
        fn parallel_searches_agree(mvs in vec(0..9usize, 0..16), n_lane in 1..6usize) {
            let cube = apply(&mvs);
            let d = table_distance(&cube);
            for schedule in [Schedule::Static, Schedule::RoundRobin, Schedule::Pull] {
                let options = ParallelOptions {
                    n_lane,
                    frontier_size: 50,
                    schedule,
                    max_moves: 11,
                    sym_n_moves: 0,
                };
                let moves = search_threaded(phase2(), &cube, &options).unwrap().unwrap();
                prop_assert_eq!(moves.len(), d);
                prop_assert_eq!(htm().apply(&cube, &moves), Cube2::identity());

                let moves = search_device(&HostDevice::new(), phase2(), &cube, &options)
                    .unwrap()
                    .unwrap();
                prop_assert_eq!(moves.len(), d);
                prop_assert_eq!(htm().apply(&cube, &moves), Cube2::identity());
            }
        }
    }

    #[test]
    fn symmetries_fix_the_base() {
        let group = symmetries().unwrap();
        assert_eq!(group.len(), 6);
        let conj = group.conjugate_base(&htm()).unwrap();
        for s in 0..6 {
            // half turns stay half turns
            for m in [1, 4, 7] {
                assert_eq!(conj.get(m, s) % 3, 1);
            }
        }
        let pruned = SymmetryPruned::new(phase2(), group).unwrap();
        let id = Cube2::identity();
        let mask = pruned.symmetry_mask(&pruned.project(&id), &id);
        assert_eq!(mask.count_ones(), 2);
        let cube = scramble("R U2 F'").unwrap();
        assert_eq!(pruned.symmetry_mask(&pruned.project(&cube), &cube), (1 << 9) - 1);
    }

    #[test]
    fn symmetry_pruning_skips_first_moves() {
        let pruned = SymmetryPruned::new(phase2(), symmetries().unwrap()).unwrap();
        let id = Cube2::identity();
        let mut plain = IdaStar::new(phase2(), &id, 1);
        while plain.next().is_some() {}
        assert_eq!(plain.node_counts()[1], 9);
        let mut masked = IdaStar::new(&pruned, &id, 1).with_sym_n_moves(1);
        while masked.next().is_some() {}
        assert_eq!(masked.node_counts()[1], 2);
    }

    proptest! {
        #[test]
        fn symmetry_pruning_keeps_optimal_length(mvs in vec(0..9usize, 0..16)) {
            let pruned = SymmetryPruned::new(phase2(), symmetries().unwrap()).unwrap();
            let cube = apply(&mvs);
            let d = table_distance(&cube);
            let sol = IdaStar::new(&pruned, &cube, 11).with_sym_n_moves(6).next().unwrap();
            prop_assert!(sol.optimal);
            prop_assert_eq!(sol.moves.len(), d);
            prop_assert_eq!(htm().apply(&cube, &sol.moves), Cube2::identity());

            let options = ParallelOptions {
                n_lane: 3,
                frontier_size: 30,
                schedule: Schedule::Pull,
                max_moves: 11,
                sym_n_moves: 6,
            };
            let moves = search_threaded(&pruned, &cube, &options).unwrap().unwrap();
            prop_assert_eq!(moves.len(), d);
            prop_assert_eq!(htm().apply(&cube, &moves), Cube2::identity());
        }
    }

    /// A host device remembering the largest buffer read by a kernel.
    #[derive(Default)]
    struct SpyDevice {
        host: HostDevice,
        largest_view: AtomicUsize,
    }

    impl Device for SpyDevice {
        type Buffer = Vec<u8>;

        fn allocate(&self, len: usize) -> Result<Vec<u8>, DeviceError> {
            self.host.allocate(len)
        }

        fn free(&self, buffer: Vec<u8>) {
            self.host.free(buffer)
        }

        fn zero(&self, buffer: &mut Vec<u8>) {
            self.host.zero(buffer)
        }

        fn copy_to_device(&self, dst: &mut Vec<u8>, src: &[u8]) -> Result<(), DeviceError> {
            self.host.copy_to_device(dst, src)
        }

        fn copy_from_device(&self, dst: &mut [u8], src: &Vec<u8>) -> Result<(), DeviceError> {
            self.host.copy_from_device(dst, src)
        }

        fn view<'a>(&self, buffer: &'a Vec<u8>) -> &'a [u8] {
            self.largest_view.fetch_max(buffer.len(), Ordering::Relaxed);
            self.host.view(buffer)
        }

        fn launch<R: Send>(
            &self,
            n_lane: usize,
            kernel: impl Fn(usize) -> R + Sync + Send,
        ) -> Vec<R> {
            self.host.launch(n_lane, kernel)
        }
    }

    #[test]
    fn device_lanes_read_device_tables() {
        let cube = scramble("R U F R U2 F'").unwrap();
        let d = table_distance(&cube);
        let options = ParallelOptions {
            n_lane: 3,
            frontier_size: 20,
            schedule: Schedule::Static,
            max_moves: 11,
            sym_n_moves: 0,
        };
        let device = SpyDevice::default();
        let moves = search_device(&device, phase2(), &cube, &options).unwrap().unwrap();
        assert_eq!(moves.len(), d);
        assert_eq!(htm().apply(&cube, &moves), Cube2::identity());
        let table_bytes = 8 + 8 * phase2().table().labels().n_words();
        assert!(device.largest_view.load(Ordering::Relaxed) >= table_bytes);
        assert_eq!(device.host.used(), 0);
    }

    /// A coordinate with a single value, for phases that only look at one coordinate.
    #[derive(Debug, Clone, Copy)]
    struct Unit;

    impl Coordinate<Cube2> for Unit {
        fn count(&self) -> usize {
            1
        }

        fn from_puzzle(&self, _puzzle: &Cube2) -> usize {
            0
        }

        fn to_puzzle(&self, _coord: usize) -> Cube2 {
            Cube2::identity()
        }
    }

    #[test_log::test]
    fn two_phase_search() {
        // orient the corners, then permute them with <U, R2, F2>
        let cache = TableCache::disabled();
        let p0 = TablePhase::cached(
            ProductSpace::new(&cache, "cube2.co", htm(), Unit, Corner7Orient).unwrap(),
            &cache,
            "cube2.co.distance_m3",
            BfsOptions::new(2),
        )
        .unwrap();
        let p1 = TablePhase::cached(
            ProductSpace::new(&cache, "cube2.cp", htm().subset(&[0, 1, 2, 4, 7]), Corner7Perm, Unit)
                .unwrap(),
            &cache,
            "cube2.cp.distance_m3",
            BfsOptions::new(2),
        )
        .unwrap();
        assert_eq!(p1.table().layers().iter().sum::<usize>(), 5040);

        proptest!(|(mvs in vec(0..9usize, 0..16))| {
            let cube = apply(&mvs);
            let mut last = usize::MAX;
            let mut n_optimal = 0;
            for sol in TwoPhaseSearch::new(&p0, &p1, &cube, 20) {
                prop_assert!(sol.moves.len() < last || sol.optimal && sol.moves.len() == last);
                prop_assert_eq!(htm().apply(&cube, &sol.moves), Cube2::identity());
                last = sol.moves.len();
                n_optimal += usize::from(sol.optimal);
            }
            prop_assert_eq!(n_optimal, 1);
            prop_assert_eq!(last, table_distance(&cube));
        });
    }
}
