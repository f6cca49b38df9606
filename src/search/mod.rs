//! Iterative deepening search over a phase.
//!
//! [`IdaStar`] is resumable: each call to [`IdaStar::step`] runs until the next solution, the
//! end of a bound after an optimal solution was found, or the end of the search. Callers can
//! therefore ask for as many solutions as they want and stop at any time.

mod device;
mod parallel;
mod two_phase;

pub use device::{search_device, Device, HostDevice};
pub use parallel::{expand_frontier, search_threaded, ParallelOptions, Schedule};
pub use two_phase::TwoPhaseSearch;

use crate::moves::{Moves, CAPACITY};
use crate::phase::Phase;

use itertools::Itertools;
use log::info;

use std::time::Instant;

/// A move sequence found by a search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Solution {
    /// The moves, as indices into the base of the phase
    pub moves: Moves,
    /// Whether no shorter solution exists
    pub optimal: bool,
}

/// The result of advancing a search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// A solution was found.
    Solution(Solution),
    /// Every solution of length `bound` was found. Only reported once an optimal solution is
    /// known, after which all further solutions are longer.
    Exhausted {
        /// The bound which was completed
        bound: usize,
    },
    /// Every bound up to the maximum was searched.
    End,
}

/// A search node: a state, the hint of its distance and the moves reaching it.
#[derive(Clone, Copy, Debug)]
pub struct Node<S, H> {
    /// The state reached
    pub state: S,
    /// Hint of the distance of the state
    pub hint: H,
    /// Moves from the start
    pub moves: Moves,
}

/// The moves worth trying from `node`: those not made redundant by its last move, restricted by
/// symmetry within the first `sym_n_moves` plies.
pub(crate) fn allowed_moves<P: Phase>(
    phase: &P,
    start: &P::Cube,
    sym_n_moves: usize,
    node: &Node<P::State, P::Hint>,
) -> u64 {
    let base = phase.base();
    let mut mask = base.allowed_after(node.moves.last());
    if node.moves.len() < sym_n_moves {
        let cube = base.apply(start, &node.moves);
        mask &= phase.symmetry_mask(&node.state, &cube);
    }
    mask
}

/// Push the children of `node` whose distance fits in `bound`, in reverse move order so popping
/// visits them in move order.
pub(crate) fn push_children<P: Phase>(
    phase: &P,
    node: &Node<P::State, P::Hint>,
    mask: u64,
    bound: usize,
    out: &mut Vec<Node<P::State, P::Hint>>,
) {
    let distance = |s: &P::State, h: &P::Hint| phase.distance_hint(s, h);
    push_children_with(phase, node, mask, bound, &distance, out)
}

/// Same as [`push_children`], bounding distances with `distance`.
pub(crate) fn push_children_with<P: Phase>(
    phase: &P,
    node: &Node<P::State, P::Hint>,
    mask: u64,
    bound: usize,
    distance: &impl Fn(&P::State, &P::Hint) -> (usize, P::Hint),
    out: &mut Vec<Node<P::State, P::Hint>>,
) {
    let n = node.moves.len();
    for m in (0..phase.base().len()).rev() {
        if mask >> m & 1 == 0 {
            continue;
        }
        let state = phase.step(&node.state, m);
        let (d, hint) = distance(&state, &node.hint);
        if n + 1 + d <= bound {
            out.push(Node {
                state,
                hint,
                moves: node.moves.push(m),
            });
        }
    }
}

/// The root node of a search from `cube`, with its distance.
pub(crate) fn root<P: Phase>(phase: &P, cube: &P::Cube) -> (Node<P::State, P::Hint>, usize) {
    let state = phase.project(cube);
    let (d, hint) = phase.distance(&state);
    (
        Node {
            state,
            hint,
            moves: Moves::new(),
        },
        d,
    )
}

/// A resumable IDA* search.
pub struct IdaStar<'a, P: Phase> {
    phase: &'a P,
    start: P::Cube,
    root: Node<P::State, P::Hint>,
    max_moves: usize,
    sym_n_moves: usize,
    bound: usize,
    stack: Vec<Node<P::State, P::Hint>>,
    counts: Vec<u64>,
    optimum: Option<usize>,
    done: bool,
    begin: Instant,
    layer_begin: Instant,
}

impl<'a, P: Phase> IdaStar<'a, P> {
    /// Start a search from `cube` for solutions of at most `max_moves` moves.
    pub fn new(phase: &'a P, cube: &P::Cube, max_moves: usize) -> Self {
        let max_moves = max_moves.min(CAPACITY);
        let (root, d) = root(phase, cube);
        let now = Instant::now();
        IdaStar {
            phase,
            start: *cube,
            root,
            max_moves,
            sym_n_moves: 0,
            bound: d.min(max_moves),
            stack: vec![root],
            counts: vec![0; max_moves + 1],
            optimum: None,
            done: false,
            begin: now,
            layer_begin: now,
        }
    }

    /// Prune symmetric branches within the first `n` plies.
    pub fn with_sym_n_moves(mut self, n: usize) -> Self {
        self.sym_n_moves = n;
        self
    }

    /// The bound currently searched.
    pub fn bound(&self) -> usize {
        self.bound
    }

    /// Number of nodes visited at each depth within the current bound.
    pub fn node_counts(&self) -> &[u64] {
        &self.counts
    }

    /// Length of the shortest solution, once found.
    pub fn optimum(&self) -> Option<usize> {
        self.optimum
    }

    fn log(&self, what: &str) {
        info!(
            "ida_star: {what}, n_moves={}, count={}, layer_time={:.3}s, total_time={:.3}s",
            self.bound,
            self.counts.iter().sum::<u64>(),
            self.layer_begin.elapsed().as_secs_f64(),
            self.begin.elapsed().as_secs_f64()
        );
    }

    /// Run until something happens.
    pub fn step(&mut self) -> Step {
        loop {
            if self.done {
                return Step::End;
            }
            let Some(a) = self.stack.pop() else {
                self.log("complete");
                log::debug!("ida_star: counts=[{}]", self.counts.iter().join(" "));
                if self.bound >= self.max_moves {
                    self.done = true;
                    return Step::End;
                }
                self.bound += 1;
                self.stack.push(self.root);
                self.counts.fill(0);
                self.layer_begin = Instant::now();
                if self.optimum.is_some() {
                    return Step::Exhausted {
                        bound: self.bound - 1,
                    };
                }
                continue;
            };

            let n = a.moves.len();
            self.counts[n] += 1;
            if n == self.bound {
                if self.phase.is_start(&a.state) {
                    let optimal = *self.optimum.get_or_insert(n) == n;
                    self.log("found");
                    return Step::Solution(Solution {
                        moves: a.moves,
                        optimal,
                    });
                }
                continue;
            }
            let mask = allowed_moves(self.phase, &self.start, self.sym_n_moves, &a);
            push_children(self.phase, &a, mask, self.bound, &mut self.stack);
        }
    }
}

impl<P: Phase> Iterator for IdaStar<'_, P> {
    type Item = Solution;

    fn next(&mut self) -> Option<Solution> {
        loop {
            match self.step() {
                Step::Solution(s) => return Some(s),
                Step::Exhausted { .. } => continue,
                Step::End => return None,
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cube333::{htm, s48, Cube3};
    use crate::group::Group;
    use crate::moves::Base;
    use crate::symmetry::LiveSymmetry;

    /// Searches the cube itself with no distance information, pruning only by symmetry.
    struct Blind {
        base: Base<Cube3>,
        live: LiveSymmetry<Cube3>,
    }

    impl Blind {
        fn new() -> Self {
            let base = htm();
            let live = LiveSymmetry::new(s48(), &base).unwrap();
            Blind { base, live }
        }
    }

    impl Phase for Blind {
        type Cube = Cube3;
        type State = Cube3;
        type Hint = ();

        fn base(&self) -> &Base<Cube3> {
            &self.base
        }

        fn project(&self, cube: &Cube3) -> Cube3 {
            *cube
        }

        fn is_start(&self, state: &Cube3) -> bool {
            *state == Cube3::identity()
        }

        fn step(&self, state: &Cube3, m: usize) -> Cube3 {
            state.compose(&self.base.moves()[m])
        }

        fn distance(&self, _state: &Cube3) -> (usize, ()) {
            (0, ())
        }

        fn distance_hint(&self, _state: &Cube3, _hint: &()) -> (usize, ()) {
            (0, ())
        }

        fn symmetry_mask(&self, _state: &Cube3, cube: &Cube3) -> u64 {
            self.live.mask(self.live.all(), cube)
        }
    }

    fn u2() -> Cube3 {
        let base = htm();
        base.apply(&Cube3::identity(), &base.parse("U2").unwrap())
    }

    #[test_log::test]
    fn symmetric_branches_are_skipped() {
        let phase = Blind::new();
        let cube = u2();

        let mut plain = IdaStar::new(&phase, &cube, 1);
        assert_eq!(plain.by_ref().count(), 1);
        assert_eq!(plain.node_counts()[1], 18);

        let mut pruned = IdaStar::new(&phase, &cube, 1).with_sym_n_moves(1);
        let solutions: Vec<_> = pruned.by_ref().collect();
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].moves.as_slice(), &[1]);
        assert_eq!(pruned.node_counts()[1], 6);
    }

    #[test]
    fn symmetry_only_applies_to_first_plies() {
        let phase = Blind::new();
        let cube = u2();
        let mut pruned = IdaStar::new(&phase, &cube, 2).with_sym_n_moves(1);
        while pruned.next().is_some() {}
        let mut plain = IdaStar::new(&phase, &cube, 2);
        while plain.next().is_some() {}
        assert!(pruned.node_counts()[2] < plain.node_counts()[2]);
        // the second ply keeps every move allowed after the first
        let kept: u64 = (0..18)
            .filter(|&m| phase.symmetry_mask(&cube, &cube) >> m & 1 == 1)
            .map(|m| phase.base().allowed_after(Some(m)).count_ones() as u64)
            .sum();
        assert_eq!(pruned.node_counts()[2], kept);
    }

    #[test]
    fn steps_report_exhausted_bounds() {
        let phase = Blind::new();
        let cube = u2();
        let mut search = IdaStar::new(&phase, &cube, 3);
        assert!(matches!(search.step(), Step::Solution(Solution { optimal: true, .. })));
        assert!(matches!(search.step(), Step::Exhausted { bound: 1 }));
        assert_eq!(search.optimum(), Some(1));
        for s in search.by_ref() {
            assert!(s.moves.len() > 1);
            assert!(!s.optimal);
            assert_eq!(htm().apply(&cube, &s.moves), Cube3::identity());
        }
        assert!(matches!(search.step(), Step::End));
    }
}
