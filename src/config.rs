//! Solver configuration.

use crate::error::ConfigError;
use crate::search::Schedule;

use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;

/// The search run by the solver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Algorithm {
    /// Two phase search, returning the first solution short enough
    #[default]
    TwoPhase,
    /// Optimal search on the calling thread
    Optimal,
    /// Optimal search on a thread pool
    ThreadOptimal,
    /// Optimal search on a device
    DeviceOptimal,
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s {
            "2p" => Ok(Algorithm::TwoPhase),
            "opt" => Ok(Algorithm::Optimal),
            "thread_opt" => Ok(Algorithm::ThreadOptimal),
            "device_opt" => Ok(Algorithm::DeviceOptimal),
            _ => Err(ConfigError::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Algorithm::TwoPhase => "2p",
            Algorithm::Optimal => "opt",
            Algorithm::ThreadOptimal => "thread_opt",
            Algorithm::DeviceOptimal => "device_opt",
        })
    }
}

/// Parameters of a [`Solver`](crate::solver::Solver).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolverConfig {
    /// The search to run
    pub algorithm: Algorithm,
    /// Threads building tables and running threaded searches
    pub n_thread: usize,
    /// Lanes of device searches
    pub n_device_lane: usize,
    /// The two phase search stops at the first solution at most this long
    pub two_phase_max_moves: usize,
    /// Plies pruned by symmetry in optimal searches
    pub sym_n_moves: usize,
    /// Number of solutions returned by the optimal search
    pub n_solution: usize,
    /// Frontier size of threaded and device searches
    pub frontier_size: usize,
    /// Distribution of frontier tasks
    pub schedule: Schedule,
    /// Where tables are cached, `None` to always build them
    pub cache_dir: Option<PathBuf>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            algorithm: Algorithm::default(),
            n_thread: 4,
            n_device_lane: 4096,
            two_phase_max_moves: 24,
            sym_n_moves: 6,
            n_solution: 1,
            frontier_size: 100000,
            schedule: Schedule::default(),
            cache_dir: Some(PathBuf::from("cache")),
        }
    }
}

fn check(name: &'static str, value: usize, range: RangeInclusive<usize>) -> Result<(), ConfigError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { name, value, range })
    }
}

impl SolverConfig {
    /// Check every numeric parameter against its range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check("n_thread", self.n_thread, 1..=256)?;
        check("n_device_lane", self.n_device_lane, 1..=65536)?;
        check("two_phase_max_moves", self.two_phase_max_moves, 0..=29)?;
        check("sym_n_moves", self.sym_n_moves, 0..=20)?;
        check("n_solution", self.n_solution, 1..=usize::MAX)?;
        check("frontier_size", self.frontier_size, 1..=usize::MAX)?;
        Ok(())
    }
}
