//! Forward construction and default sequencing.
//!
//! The construction is the terminal stage of every selector chain: once
//! the decision stages have fixed jobs, resources, durations, capacities
//! and release times, it commits every live operation to a start time.
//!
//! # Algorithm
//!
//! Greedy priority-driven serial schedule generation: pick a job by
//! dispatching rule, commit its eligible operations at their earliest
//! resource-feasible starts, repeat. Replay runs follow encoded ranks
//! instead of the rule.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4
//! - Kolisch (1996), "Serial and parallel resource-constrained project
//!   scheduling methods revisited"

mod default_sequence;
mod forward;

pub use default_sequence::{default_sequence, DefaultSequence};
pub use forward::{ForwardConstruction, RunMode, SequenceLayout};
