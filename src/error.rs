//! This module defines general error types used throughout the crate.

use std::ops::RangeInclusive;

use thiserror::Error;

/// A numeric configuration parameter or a named option was not accepted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric parameter lies outside of its accepted range
    #[error("{name}={value} is out of range, expected {}..={}", range.start(), range.end())]
    OutOfRange {
        /// The name of the parameter
        name: &'static str,
        /// The rejected value
        value: usize,
        /// The accepted range
        range: RangeInclusive<usize>,
    },
    /// The requested search algorithm does not exist
    #[error("unknown algorithm \"{0}\"")]
    UnknownAlgorithm(String),
    /// The requested frontier schedule does not exist
    #[error("unknown schedule \"{0}\"")]
    UnknownSchedule(String),
}

/// Errors raised while building, loading or storing precomputed tables.
#[derive(Debug, Error)]
pub enum TableError {
    /// The breadth first search stopped before labelling every state, so the generators do not
    /// connect the declared state space.
    #[error("breadth first search labelled {labeled} of {total} states")]
    Disconnected {
        /// Number of states that received a distance
        labeled: usize,
        /// Size of the declared state space
        total: usize,
    },
    /// A set of symmetries is not closed under composition
    #[error("symmetry group is not closed under composition")]
    NotClosed,
    /// Conjugating a generator by a symmetry gave a state outside of the base
    #[error("base is not closed under conjugation by the symmetry group")]
    BaseNotSymmetric,
    /// A table could not be read from or written to the cache
    #[error("cache entry {key}: {source}")]
    Io {
        /// Cache key of the table
        key: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// A cached table does not have the expected shape
    #[error("cache entry {key} has an unexpected size")]
    Corrupt {
        /// Cache key of the table
        key: String,
    },
    /// The worker pool could not be created
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Diagnosis of an ill-formed cube state.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum CubeError {
    /// A corner position holds a piece that doesn't exist
    #[error("corner at position {0} is not a valid piece")]
    CornerOutOfRange(usize),
    /// An edge position holds a piece that doesn't exist
    #[error("edge at position {0} is not a valid piece")]
    EdgeOutOfRange(usize),
    /// Two corner positions hold the same piece
    #[error("corner at position {0} and {1} conflict")]
    CornerConflict(usize, usize),
    /// Two edge positions hold the same piece
    #[error("edge at position {0} and {1} conflict")]
    EdgeConflict(usize, usize),
    /// The corner and edge permutation have different parity
    #[error("parity error")]
    Parity,
    /// The corner twists don't sum to zero
    #[error("corner orientation error")]
    CornerOrientation,
    /// The edge flips don't sum to zero
    #[error("edge orientation error")]
    EdgeOrientation,
}

/// A move string contained a token that names no move.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown move \"{0}\"")]
pub struct MoveParseError(pub String);

/// Errors raised by an accelerator device.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeviceError {
    /// The device could not provide the requested amount of memory
    #[error("failed to allocate {0} bytes")]
    Allocation(usize),
    /// A copy was requested between ranges of different sizes
    #[error("transfer of {src} bytes into a buffer of {dst} bytes")]
    SizeMismatch {
        /// Size of the source range
        src: usize,
        /// Size of the destination range
        dst: usize,
    },
}

/// Any error the solver surface can report.
#[derive(Debug, Error)]
pub enum SolveError {
    /// Bad configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Tables could not be prepared
    #[error(transparent)]
    Table(#[from] TableError),
    /// The input cube is not a valid state
    #[error(transparent)]
    Cube(#[from] CubeError),
    /// The accelerator failed
    #[error(transparent)]
    Device(#[from] DeviceError),
    /// The solver was built for a different algorithm than the one requested
    #[error("solver was not built with {0} tables")]
    MissingTables(&'static str),
}
