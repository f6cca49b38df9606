//! Chaining two phases: reductions into a subgroup followed by solutions within it.

use super::{IdaStar, Solution, Step};
use crate::moves::Moves;
use crate::phase::Phase;

use log::info;

use std::time::Instant;

/// Enumerates increasingly short solutions made of a phase 0 solution followed by a phase 1
/// solution of the resulting cube. Moves of both phases are given as indices into the base
/// enclosing both phase bases.
pub struct TwoPhaseSearch<'a, P0: Phase, P1: Phase<Cube = P0::Cube>> {
    p0: &'a P0,
    p1: &'a P1,
    cube: P0::Cube,
    max_moves: usize,
    last: Option<usize>,
    optimum: Option<usize>,
    end: bool,
    it0: IdaStar<'a, P0>,
    count: usize,
    begin: Instant,
}

impl<'a, P0, P1> TwoPhaseSearch<'a, P0, P1>
where
    P0: Phase,
    P1: Phase<Cube = P0::Cube>,
{
    /// Search for solutions of `cube` of at most `max_moves` moves.
    pub fn new(p0: &'a P0, p1: &'a P1, cube: &P0::Cube, max_moves: usize) -> Self {
        TwoPhaseSearch {
            p0,
            p1,
            cube: *cube,
            max_moves,
            last: None,
            optimum: None,
            end: false,
            it0: IdaStar::new(p0, cube, max_moves),
            count: 0,
            begin: Instant::now(),
        }
    }

    /// Length of the last solution returned.
    pub fn last(&self) -> Option<usize> {
        self.last
    }

    fn combine(&self, moves0: &Moves, moves1: &Moves) -> Moves {
        let b0 = self.p0.base();
        let b1 = self.p1.base();
        moves0
            .map(|m| b0.super_index(m))
            .concat(&moves1.map(|m| b1.super_index(m)))
    }

    /// The next solution, strictly shorter than the previous one. A solution is optimal when
    /// its phase 1 part is empty: phase 0 solutions come in order of length, so no shorter
    /// solution exists. The optimal solution may tie the previous one, which then wasn't known
    /// to be optimal.
    pub fn step(&mut self) -> Option<Solution> {
        while !self.end {
            match self.it0.step() {
                Step::Solution(s0) => {
                    self.count += 1;
                    let moves0 = s0.moves;
                    let n0 = moves0.len();
                    let b = self.p0.base().apply(&self.cube, &moves0);
                    let limit = self.last.unwrap_or(usize::MAX).min(self.max_moves);
                    let mut it1 = IdaStar::new(self.p1, &b, limit.saturating_sub(n0));
                    let Some(s1) = it1.find(|s| s.optimal) else {
                        continue;
                    };
                    let n1 = s1.moves.len();
                    if n1 == 0 || self.last.map_or(true, |last| last > n0 + n1) {
                        info!(
                            "combine_search: found, n_moves=({n0} {n1}), count={}, total_time={:.3}s",
                            self.count,
                            self.begin.elapsed().as_secs_f64()
                        );
                        if n1 == 0 {
                            self.optimum = Some(n0);
                            self.end = true;
                        }
                        let last = n0 + n1;
                        self.last = Some(last);
                        return Some(Solution {
                            moves: self.combine(&moves0, &s1.moves),
                            optimal: self.optimum == Some(last),
                        });
                    }
                }
                Step::Exhausted { .. } => {}
                Step::End => {
                    info!(
                        "combine_search: complete, count={}, total_time={:.3}s",
                        self.count,
                        self.begin.elapsed().as_secs_f64()
                    );
                    self.end = true;
                }
            }
        }
        None
    }
}

impl<P0, P1> Iterator for TwoPhaseSearch<'_, P0, P1>
where
    P0: Phase,
    P1: Phase<Cube = P0::Cube>,
{
    type Item = Solution;

    fn next(&mut self) -> Option<Solution> {
        self.step()
    }
}
