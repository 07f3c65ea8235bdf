//! Dispatching rules and rule engine for job ordering.
//!
//! The forward construction picks the next job with a rule engine
//! (earliest due, then earliest unscheduled start, then id), and the
//! default sequence ranks jobs with another (due, lateness cost,
//! successor depth, id).
//!
//! # Usage
//!
//! ```
//! use u_jobshop::dispatching::{RuleEngine, SchedulingContext, TieBreaker};
//! use u_jobshop::dispatching::rules;
//!
//! let engine = RuleEngine::new()
//!     .with_rule(rules::Edd)
//!     .with_tie_breaker(rules::EarliestStart)
//!     .with_final_tie_breaker(TieBreaker::ById);
//!
//! let context = SchedulingContext::at_time(0);
//! assert!(engine.sort(&[], &context).is_empty());
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

mod context;
mod engine;
pub mod rules;

pub use context::SchedulingContext;
pub use engine::{RuleEngine, TieBreaker};

use crate::models::Job;
use std::fmt::Debug;

/// Score returned by a dispatching rule.
///
/// Lower scores = higher priority (scheduled first).
pub type RuleScore = f64;

/// A dispatching rule that evaluates job priority.
///
/// # Score Convention
/// **Lower score = higher priority.** Rules should return smaller values
/// for jobs that should be scheduled first.
///
/// # Reference
/// Pinedo (2016), "Scheduling", Ch. 4: Priority Dispatching
pub trait DispatchingRule: Send + Sync + Debug {
    /// Rule name (e.g., "EDD").
    fn name(&self) -> &'static str;

    /// Evaluates the priority of a job given the current scheduling context.
    ///
    /// Returns a score where lower = higher priority.
    fn evaluate(&self, job: &Job, context: &SchedulingContext) -> RuleScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
