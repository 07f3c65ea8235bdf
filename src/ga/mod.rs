//! Chromosome encoding and the optimizer boundary.
//!
//! A chromosome is a flat string of `u32` genes. The selector chain
//! partitions it into one contiguous segment per decision stage; the
//! sequencing stages store ranks, every other stage stores a raw decision
//! value (index, processing time, capacity, release offset).
//!
//! # Submodules
//!
//! - [`operators`]: Segment-bound mutation operators
//!
//! # Reference
//! - Cheng et al. (1996), "A Tutorial Survey of JSSP using GA"
//! - Bierwirth (1995), "A generalized permutation approach to JSSP"

mod chromosome;
pub mod operators;
mod problem;

pub use chromosome::{Chromosome, Individual, UNDEFINED_GENE};
pub use problem::{ChainEvaluator, Evaluation};
