//! Built-in dispatching rules.
//!
//! # Categories
//!
//! - **Due-date**: EDD, LATENESS-COST
//! - **Structural**: EST, SUCC-DEPTH
//!
//! # Score Convention
//! All rules return lower scores for higher priority jobs.
//!
//! # References
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use super::{DispatchingRule, RuleScore, SchedulingContext};
use crate::models::Job;

// ======================== Due-date rules ========================

/// Earliest Due Date.
///
/// Prioritizes jobs with the earliest due time. Jobs due at the end of
/// time come last.
///
/// # Reference
/// Jackson (1955), optimal for minimizing maximum lateness on single machine.
#[derive(Debug, Clone, Copy)]
pub struct Edd;

impl DispatchingRule for Edd {
    fn name(&self) -> &'static str {
        "EDD"
    }

    fn evaluate(&self, job: &Job, _context: &SchedulingContext) -> RuleScore {
        if job.due == i64::MAX {
            f64::MAX
        } else {
            job.due as f64
        }
    }

    fn description(&self) -> &'static str {
        "Earliest Due Date"
    }
}

/// Highest lateness cost first.
#[derive(Debug, Clone, Copy)]
pub struct LatenessCost;

impl DispatchingRule for LatenessCost {
    fn name(&self) -> &'static str {
        "LATENESS-COST"
    }

    fn evaluate(&self, job: &Job, _context: &SchedulingContext) -> RuleScore {
        -job.lateness_cost
    }

    fn description(&self) -> &'static str {
        "Highest Lateness Cost"
    }
}

// ======================== Structural rules ========================

/// Earliest start among the job's unscheduled operations.
///
/// Starts before the context's current time count as the current time,
/// so every job that is already ready ties. Jobs unknown to the context
/// come last.
#[derive(Debug, Clone, Copy)]
pub struct EarliestStart;

impl DispatchingRule for EarliestStart {
    fn name(&self) -> &'static str {
        "EST"
    }

    fn evaluate(&self, job: &Job, context: &SchedulingContext) -> RuleScore {
        context
            .earliest_start
            .get(&job.id)
            .map(|&t| t.max(context.current_time) as f64)
            .unwrap_or(f64::MAX)
    }

    fn description(&self) -> &'static str {
        "Earliest Operation Start"
    }
}

/// Largest successor depth first.
///
/// Jobs heading longer precedence chains are structurally more important.
#[derive(Debug, Clone, Copy)]
pub struct SuccessorDepth;

impl DispatchingRule for SuccessorDepth {
    fn name(&self) -> &'static str {
        "SUCC-DEPTH"
    }

    fn evaluate(&self, job: &Job, context: &SchedulingContext) -> RuleScore {
        -f64::from(context.successor_depth.get(&job.id).copied().unwrap_or(0))
    }

    fn description(&self) -> &'static str {
        "Largest Successor Depth"
    }
}
