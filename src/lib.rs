//! A library for optimally (or near optimally) solving permutation puzzles such as the 2x2x2 and
//! 3x3x3 Rubik's cubes. States are elements of a finite group, distances to the solved state are
//! precomputed into compressed pruning tables, and an iterative deepening search walks the state
//! space using those tables.

#![deny(missing_docs)]

pub mod config;
pub mod coord;
pub mod cube2;
pub mod cube333;
pub mod error;
pub mod group;
pub mod moves;
pub mod phase;
pub mod prune;
pub mod search;
pub mod solver;
pub mod symmetry;
pub mod table;
