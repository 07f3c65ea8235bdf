//! Chromosome-driven job-shop scheduling.
//!
//! Decodes a flat integer chromosome into a feasible schedule through a
//! configurable chain of decision stages, each owning one contiguous gene
//! segment, followed by a greedy forward construction over a reversible
//! propagation substrate.
//!
//! # Modules
//!
//! - **`models`**: Arena-backed domain types: `Dataset`, `Job`, `JobOp`,
//!   `Resource`, `ResourceGroup`, `JobGroup`, `Schedule`
//! - **`chain`**: Selector stages (alternative job and resource, capacity
//!   multiple, processing time, resource capacity, sequencing, release
//!   time) and their composition
//! - **`scheduler`**: Forward construction and the default sequence
//! - **`propagation`**: Time-bound propagation, resource timelines, cycle groups
//! - **`rev`**: Trail-based reversible store with checkpoint/backtrack
//! - **`ga`**: Chromosome, operator handles, and the chain evaluator
//! - **`seeder`**: Cost-minimizing seeds for fresh chromosomes
//! - **`dispatching`**: Composable job-ranking rules
//! - **`validation`**: Dataset integrity checks
//!
//! # Evaluation Flow
//!
//! ```text
//! Dataset ─reset─▶ Manager::new ─propagate─▶ stage₁ … stageₙ ─▶ forward construction ─▶ Schedule
//!                                              │ (repairs go to the chromosome's shadow)
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Baptiste, Le Pape, Nuijten (2001), "Constraint-Based Scheduling"
//! - Cheng et al. (1996), "A Tutorial Survey of JSSP using GA"

pub mod chain;
pub mod config;
pub mod dispatching;
pub mod error;
pub mod ga;
pub mod models;
pub mod propagation;
pub mod rev;
pub mod scheduler;
pub mod seeder;
pub mod validation;

pub use error::{ScheduleError, ScheduleResult};
