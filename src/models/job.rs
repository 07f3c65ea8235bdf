//! Job and job-group models.
//!
//! A job is a set of operations with a due time. Jobs may belong to an
//! alternative-job group, in which exactly one member is active at a time.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1

use serde::{Deserialize, Serialize};

use super::{JobGroupId, JobId, OpId};

/// A job to be scheduled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Arena id (assigned by the dataset).
    pub id: JobId,
    /// Human-readable name.
    pub name: String,
    /// Operations in declaration order.
    pub ops: Vec<OpId>,
    /// Whether consecutive operations are implicitly chained.
    pub ordered: bool,
    /// Due time (slot).
    pub due: i64,
    /// Whether the job takes part in the schedule.
    pub active: bool,
    /// Serial rank used by sequencing decisions.
    pub serial_id: Option<u32>,
    /// Lateness cost per slot.
    pub lateness_cost: f64,
    /// Opportunity cost per slot of earliness.
    pub opportunity_cost: f64,
    /// Inventory holding cost per slot.
    pub inventory_cost: f64,
    /// Release time of the job's root operations, if constrained.
    pub release: Option<i64>,
    /// Earliest slot the release may be moved to.
    pub release_floor: Option<i64>,
    /// Owning alternative-job group.
    pub group: Option<JobGroupId>,
}

impl Job {
    /// Creates an active, ordered job due at the end of time.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: JobId(0),
            name: name.into(),
            ops: Vec::new(),
            ordered: true,
            due: i64::MAX,
            active: true,
            serial_id: None,
            lateness_cost: 0.0,
            opportunity_cost: 0.0,
            inventory_cost: 0.0,
            release: None,
            release_floor: None,
            group: None,
        }
    }

    /// Sets the due time.
    pub fn with_due(mut self, due: i64) -> Self {
        self.due = due;
        self
    }

    /// Operations are not implicitly chained.
    pub fn unordered(mut self) -> Self {
        self.ordered = false;
        self
    }

    /// Sets the lateness cost.
    pub fn with_lateness_cost(mut self, cost: f64) -> Self {
        self.lateness_cost = cost;
        self
    }

    /// Sets the opportunity cost.
    pub fn with_opportunity_cost(mut self, cost: f64) -> Self {
        self.opportunity_cost = cost;
        self
    }

    /// Sets the inventory cost.
    pub fn with_inventory_cost(mut self, cost: f64) -> Self {
        self.inventory_cost = cost;
        self
    }

    /// Sets the release time.
    pub fn with_release(mut self, release: i64) -> Self {
        self.release = Some(release);
        self
    }

    /// Sets the minimum bound for release-time moves.
    pub fn with_release_floor(mut self, floor: i64) -> Self {
        self.release_floor = Some(floor);
        self
    }

    /// Sets the serial rank.
    pub fn with_serial_id(mut self, serial_id: u32) -> Self {
        self.serial_id = Some(serial_id);
        self
    }

    /// Marks the job inactive.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// An alternative-job group: exactly one member job is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobGroup {
    /// Arena id (assigned by the dataset).
    pub id: JobGroupId,
    /// Human-readable name.
    pub name: String,
    /// Member jobs, in gene-index order.
    pub jobs: Vec<JobId>,
    /// Index of the active member.
    pub active: usize,
}

impl JobGroup {
    /// Creates a group whose first member is active.
    pub fn new(name: impl Into<String>, jobs: Vec<JobId>) -> Self {
        Self {
            id: JobGroupId(0),
            name: name.into(),
            jobs,
            active: 0,
        }
    }

    /// The active member, if the group is non-empty.
    pub fn active_job(&self) -> Option<JobId> {
        self.jobs.get(self.active).copied()
    }

    /// Gene index of a member job.
    pub fn member_index(&self, job: JobId) -> Option<usize> {
        self.jobs.iter().position(|&j| j == job)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the group has no members.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_builder() {
        let job = Job::new("J1")
            .with_due(500)
            .with_lateness_cost(2.5)
            .with_release(10)
            .with_release_floor(5)
            .unordered();

        assert_eq!(job.name, "J1");
        assert_eq!(job.due, 500);
        assert!((job.lateness_cost - 2.5).abs() < 1e-10);
        assert_eq!(job.release, Some(10));
        assert_eq!(job.release_floor, Some(5));
        assert!(!job.ordered);
        assert!(job.active);
    }

    #[test]
    fn test_group_members() {
        let group = JobGroup::new("G", vec![JobId(4), JobId(7)]);
        assert_eq!(group.active_job(), Some(JobId(4)));
        assert_eq!(group.member_index(JobId(7)), Some(1));
        assert_eq!(group.member_index(JobId(9)), None);
        assert_eq!(group.len(), 2);
    }
}
