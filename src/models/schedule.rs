//! Schedule (solution) model.
//!
//! A schedule lists the committed operation-resource-time assignments of
//! one successful chromosome evaluation.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{JobId, OpId, ResourceId};

/// A complete schedule produced by the forward construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// One assignment per (operation, resource) pair.
    pub assignments: Vec<Assignment>,
}

/// An operation-resource-time assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned operation.
    pub op: OpId,
    /// Owning job (denormalized for query convenience).
    pub job: JobId,
    /// Resource the operation runs on; `None` for resource-free milestones.
    pub resource: Option<ResourceId>,
    /// Start slot.
    pub start: i64,
    /// End slot (exclusive).
    pub end: i64,
    /// Booked units.
    pub capacity: u32,
}

impl Assignment {
    /// Creates a unit-capacity assignment.
    pub fn new(op: OpId, job: JobId, resource: Option<ResourceId>, start: i64, end: i64) -> Self {
        Self {
            op,
            job,
            resource,
            start,
            end,
            capacity: 1,
        }
    }

    /// Sets the booked units.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Duration in slots.
    #[inline]
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an assignment.
    pub fn add_assignment(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    /// Makespan: latest end across all assignments.
    pub fn makespan(&self) -> i64 {
        self.assignments.iter().map(|a| a.end).max().unwrap_or(0)
    }

    /// First assignment of an operation.
    pub fn assignment_for_op(&self, op: OpId) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.op == op)
    }

    /// All assignments of a job.
    pub fn assignments_for_job(&self, job: JobId) -> Vec<&Assignment> {
        self.assignments.iter().filter(|a| a.job == job).collect()
    }

    /// All assignments on a resource.
    pub fn assignments_for_resource(&self, resource: ResourceId) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.resource == Some(resource))
            .collect()
    }

    /// Busy time of a resource over a horizon.
    ///
    /// Returns `None` if `horizon` is not positive.
    pub fn resource_utilization(&self, resource: ResourceId, horizon: i64) -> Option<f64> {
        if horizon <= 0 {
            return None;
        }
        let busy: i64 = self
            .assignments_for_resource(resource)
            .iter()
            .map(|a| a.duration())
            .sum();
        Some(busy as f64 / horizon as f64)
    }

    /// Completion time per job.
    pub fn job_completions(&self) -> HashMap<JobId, i64> {
        let mut done: HashMap<JobId, i64> = HashMap::new();
        for a in &self.assignments {
            let e = done.entry(a.job).or_insert(a.end);
            *e = (*e).max(a.end);
        }
        done
    }

    /// Completion time of a job (latest end of its assignments).
    pub fn job_completion_time(&self, job: JobId) -> Option<i64> {
        self.assignments_for_job(job).iter().map(|a| a.end).max()
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schedule() -> Schedule {
        let mut s = Schedule::new();
        s.add_assignment(Assignment::new(OpId(0), JobId(0), Some(ResourceId(0)), 0, 5));
        s.add_assignment(Assignment::new(OpId(1), JobId(0), Some(ResourceId(1)), 1, 4).with_capacity(2));
        s.add_assignment(Assignment::new(OpId(2), JobId(1), Some(ResourceId(0)), 5, 8));
        s
    }

    #[test]
    fn test_schedule_makespan() {
        assert_eq!(sample_schedule().makespan(), 8);
        assert_eq!(Schedule::new().makespan(), 0);
    }

    #[test]
    fn test_assignment_queries() {
        let s = sample_schedule();
        assert_eq!(s.assignment_for_op(OpId(1)).map(|a| a.capacity), Some(2));
        assert!(s.assignment_for_op(OpId(9)).is_none());
        assert_eq!(s.assignments_for_job(JobId(0)).len(), 2);
        assert_eq!(s.assignments_for_resource(ResourceId(0)).len(), 2);
    }

    #[test]
    fn test_resource_utilization() {
        let s = sample_schedule();
        let util = s.resource_utilization(ResourceId(0), 8).unwrap();
        assert!((util - 1.0).abs() < 1e-10);
        let util2 = s.resource_utilization(ResourceId(1), 8).unwrap();
        assert!((util2 - 0.375).abs() < 1e-10);
        assert!(s.resource_utilization(ResourceId(0), 0).is_none());
    }

    #[test]
    fn test_job_completion() {
        let s = sample_schedule();
        assert_eq!(s.job_completion_time(JobId(0)), Some(5));
        assert_eq!(s.job_completion_time(JobId(1)), Some(8));
        assert_eq!(s.job_completion_time(JobId(7)), None);
        assert_eq!(s.job_completions()[&JobId(1)], 8);
    }
}
