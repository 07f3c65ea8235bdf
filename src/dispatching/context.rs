//! Scheduling context for dispatching rule evaluation.

use std::collections::HashMap;

use crate::models::JobId;

/// Runtime scheduling state passed to dispatching rules.
///
/// Filled by the forward construction from the propagation manager
/// before each pick. All times are in slots.
#[derive(Debug, Clone, Default)]
pub struct SchedulingContext {
    /// Current construction time. No operation is ranked as starting earlier.
    pub current_time: i64,
    /// Earliest start among each job's unscheduled operations.
    pub earliest_start: HashMap<JobId, i64>,
    /// Largest successor depth among each job's operations.
    pub successor_depth: HashMap<JobId, u32>,
}

impl SchedulingContext {
    /// Creates a context at the given time.
    pub fn at_time(current_time: i64) -> Self {
        Self {
            current_time,
            ..Default::default()
        }
    }

    /// Sets the earliest unscheduled start of a job.
    pub fn with_earliest_start(mut self, job: JobId, t: i64) -> Self {
        self.earliest_start.insert(job, t);
        self
    }

    /// Sets the successor depth of a job.
    pub fn with_successor_depth(mut self, job: JobId, depth: u32) -> Self {
        self.successor_depth.insert(job, depth);
        self
    }
}
