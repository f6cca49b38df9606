//! The solver surface: one owned solver per configuration, reused for every cube.

use crate::config::{Algorithm, SolverConfig};
use crate::cube333::{optimal, two_phase_solver, Cube3};
use crate::error::SolveError;
use crate::prune::BfsOptions;
use crate::search::{search_device, search_threaded, Device, HostDevice, ParallelOptions};
use crate::table::TableCache;

use log::info;

use std::time::Instant;

pub use crate::search::Solution;

/// What a solve returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolveOutcome {
    /// Solutions as indices into [`htm`](crate::cube333::htm), in the order they were found
    Solutions(Vec<Solution>),
    /// No solution of at most `max_moves` moves exists
    Exhausted {
        /// The longest solution searched for
        max_moves: usize,
    },
}

#[derive(Debug)]
enum Tables {
    TwoPhase(two_phase_solver::Solver),
    Optimal(optimal::Solver),
}

/// A 3x3x3 solver holding the tables of its algorithm.
#[derive(Debug)]
pub struct Solver<D = HostDevice> {
    config: SolverConfig,
    tables: Tables,
    device: D,
}

impl Solver {
    /// Check `config` and prepare the tables of its algorithm, loading them from the cache
    /// directory when possible.
    pub fn new(config: SolverConfig) -> Result<Self, SolveError> {
        Self::with_device(config, HostDevice::new())
    }
}

impl<D: Device> Solver<D> {
    /// Like [`Solver::new`], running device searches on `device`.
    pub fn with_device(config: SolverConfig, device: D) -> Result<Self, SolveError> {
        config.validate()?;
        let cache = match &config.cache_dir {
            Some(dir) => TableCache::new(dir.clone()),
            None => TableCache::disabled(),
        };
        let options = BfsOptions::new(config.n_thread);
        let begin = Instant::now();
        let tables = match config.algorithm {
            Algorithm::TwoPhase => Tables::TwoPhase(two_phase_solver::Solver::new(&cache, options)?),
            _ => Tables::Optimal(optimal::Solver::new(&cache, options)?),
        };
        info!(
            "solver: {} tables ready, time={:.3}s",
            config.algorithm,
            begin.elapsed().as_secs_f64()
        );
        Ok(Solver {
            config,
            tables,
            device,
        })
    }

    /// The configuration the solver was built with.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn parallel_options(&self, n_lane: usize) -> ParallelOptions {
        ParallelOptions {
            n_lane,
            frontier_size: self.config.frontier_size,
            schedule: self.config.schedule,
            max_moves: optimal::MAX_MOVES,
            sym_n_moves: self.config.sym_n_moves,
        }
    }

    fn optimal(&self) -> Result<&optimal::Solver, SolveError> {
        match &self.tables {
            Tables::Optimal(s) => Ok(s),
            Tables::TwoPhase(_) => Err(SolveError::MissingTables("optimal")),
        }
    }

    /// Solve `cube` with the configured algorithm.
    pub fn solve(&self, cube: &Cube3) -> Result<SolveOutcome, SolveError> {
        cube.verify()?;
        let begin = Instant::now();
        let (solutions, max_moves): (Vec<Solution>, usize) = match self.config.algorithm {
            Algorithm::TwoPhase => {
                let Tables::TwoPhase(s) = &self.tables else {
                    return Err(SolveError::MissingTables("two phase"));
                };
                let found = s.solve(cube, self.config.two_phase_max_moves);
                (found.into_iter().collect(), two_phase_solver::MAX_MOVES)
            }
            Algorithm::Optimal => {
                let found = self
                    .optimal()?
                    .search(cube, self.config.sym_n_moves)
                    .take(self.config.n_solution)
                    .collect();
                (found, optimal::MAX_MOVES)
            }
            Algorithm::ThreadOptimal => {
                let options = self.parallel_options(self.config.n_thread);
                let found = search_threaded(self.optimal()?.phase(), cube, &options)?;
                (found.map(optimal_solution).into_iter().collect(), optimal::MAX_MOVES)
            }
            Algorithm::DeviceOptimal => {
                let options = self.parallel_options(self.config.n_device_lane);
                let found = search_device(&self.device, self.optimal()?.phase(), cube, &options)?;
                (found.map(optimal_solution).into_iter().collect(), optimal::MAX_MOVES)
            }
        };
        info!(
            "solver: {} solved, n_solution={}, time={:.3}s",
            self.config.algorithm,
            solutions.len(),
            begin.elapsed().as_secs_f64()
        );
        if solutions.is_empty() {
            Ok(SolveOutcome::Exhausted { max_moves })
        } else {
            Ok(SolveOutcome::Solutions(solutions))
        }
    }
}

fn optimal_solution(moves: crate::moves::Moves) -> Solution {
    Solution {
        moves,
        optimal: true,
    }
}
