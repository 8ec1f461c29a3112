//! # FaultLib
//!
//! Faultlib is a library for comparing virtual memory page replacement policies
//!
//! It provides a generic working set engine which can be parameterised by a replacement policy,
//! a generator for synthetic reference traces drawn from a mixture of normal distributions, and a
//! Monte Carlo simulator which averages the page faults of each policy over many traces
//!
//! It prioritises reproducing the reference fault counts exactly over raw speed, while keeping
//! the engine easy to extend with new policies

/// Contains the crate error type
pub mod error;

/// Contains the fixed capacity working set frame, and the engine which drives a replacement policy
/// over a reference trace
pub mod frame;

/// Contains definitions for the JSON configuration format
pub mod config;

/// Contains the provided replacement policies, with a trait for implementing custom replacement
/// policies
pub mod replacement_policies;

/// Contains the uniform random source abstraction and the reference trace generator
pub mod trace;

/// Contains the Monte Carlo simulator which runs every policy over every working set size
pub mod simulator;

/// Contains the results sink, which writes averaged fault counts as a delimited table
pub mod results;

#[cfg(test)]
mod test;

/// Contains utilities for locating earlier result files.
pub mod util;

pub use error::{Error, Result};

/// A page identifier, as it appears in a reference trace
pub type PageId = i64;
