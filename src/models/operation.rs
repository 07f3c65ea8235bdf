//! Operation (job step) model.
//!
//! An operation is the smallest schedulable unit. It belongs to a job,
//! requires resources (fixed or alternative), and carries the decision
//! domains the selector chain works over: processing times, capacity
//! multiples, and per-resource capacity/processing-time option tables.
//!
//! # Duration Model
//!
//! The effective duration is `ceil(processing_time / multiple)`; the
//! multiple is only meaningful for interruptible operations and is 1
//! elsewhere. Milestones always last zero slots.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 2

use serde::{Deserialize, Serialize};

use super::{JobId, OpId, ResourceGroupRequirement, ResourceId, ResourceRequirement};

/// Structural kind of an operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpType {
    /// Regular processing step.
    #[default]
    Normal,
    /// Roll-up of other operations; never scheduled itself.
    Summary,
    /// Zero-duration marker.
    Milestone,
    /// Pure time lag between neighbours.
    PrecedenceLag,
    /// Work that may be split across capacity multiples.
    Interruptible,
}

/// Progress of an operation on the shop floor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpStatus {
    #[default]
    Unstarted,
    Started,
    Complete,
}

/// Unary time-window constraint (all bounds inclusive start, exclusive end).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub min_start: Option<i64>,
    pub max_start: Option<i64>,
    pub min_end: Option<i64>,
    pub max_end: Option<i64>,
}

impl TimeWindow {
    /// Unconstrained window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Window `[start, end)` on start and end.
    pub fn between(start: i64, end: i64) -> Self {
        Self {
            min_start: Some(start),
            max_end: Some(end),
            ..Self::default()
        }
    }

    /// Earliest start implied for a given duration.
    pub fn earliest_start(&self, duration: i64) -> Option<i64> {
        match (self.min_start, self.min_end) {
            (Some(s), Some(e)) => Some(s.max(e - duration)),
            (Some(s), None) => Some(s),
            (None, Some(e)) => Some(e - duration),
            (None, None) => None,
        }
    }

    /// Latest finish implied for a given duration.
    pub fn latest_finish(&self, duration: i64) -> Option<i64> {
        match (self.max_end, self.max_start) {
            (Some(e), Some(s)) => Some(e.min(s + duration)),
            (Some(e), None) => Some(e),
            (None, Some(s)) => Some(s + duration),
            (None, None) => None,
        }
    }
}

/// One row of a per-resource capacity/processing-time table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapPtOption {
    pub resource: ResourceId,
    pub capacity: u32,
    pub processing_time: i64,
}

/// Committed placement of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledSlot {
    pub start: i64,
    pub end: i64,
}

/// An operation of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOp {
    /// Arena id (assigned by the dataset).
    pub id: OpId,
    /// Owning job (assigned by the dataset).
    pub job: JobId,
    /// Human-readable name.
    pub name: String,
    pub op_type: OpType,
    pub status: OpStatus,
    /// Frozen operations are excluded from every decision.
    pub frozen: bool,
    /// Fixed start of a frozen operation.
    pub frozen_start: Option<i64>,
    /// Whether the seeder may pick a cheaper capacity/time combination.
    pub breakable: bool,
    pub window: TimeWindow,
    /// Fixed resource requirements.
    pub requirements: Vec<ResourceRequirement>,
    /// Alternative (resource-group) requirements.
    pub group_requirements: Vec<ResourceGroupRequirement>,
    /// Possible processing times, sorted and deduplicated.
    pub processing_times: Vec<i64>,
    /// Chosen processing time.
    pub processing_time: Option<i64>,
    /// Possible capacity multiples (interruptible operations), sorted.
    pub capacity_multiples: Vec<u32>,
    /// Chosen capacity multiple.
    pub multiple: u32,
    /// Capacity/processing-time options per resource.
    pub cap_pt: Vec<CapPtOption>,
    /// Serial rank used by sequencing decisions.
    pub serial_id: Option<u32>,
    /// Closed out of the current evaluation without a schedule.
    pub finalized: bool,
    /// Committed placement in the current evaluation.
    pub scheduled: Option<ScheduledSlot>,
}

impl JobOp {
    /// Creates a normal, unstarted operation with a zero processing time.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: OpId(0),
            job: JobId(0),
            name: name.into(),
            op_type: OpType::Normal,
            status: OpStatus::Unstarted,
            frozen: false,
            frozen_start: None,
            breakable: true,
            window: TimeWindow::new(),
            requirements: Vec::new(),
            group_requirements: Vec::new(),
            processing_times: Vec::new(),
            processing_time: None,
            capacity_multiples: Vec::new(),
            multiple: 1,
            cap_pt: Vec::new(),
            serial_id: None,
            finalized: false,
            scheduled: None,
        }
    }

    /// Sets the operation type.
    pub fn with_type(mut self, op_type: OpType) -> Self {
        self.op_type = op_type;
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: OpStatus) -> Self {
        self.status = status;
        self
    }

    /// Fixes the processing time to a single value.
    pub fn with_processing_time(mut self, pt: i64) -> Self {
        self.processing_times = vec![pt];
        self.processing_time = Some(pt);
        self
    }

    /// Sets the possible processing times.
    pub fn with_processing_times(mut self, mut pts: Vec<i64>) -> Self {
        pts.sort_unstable();
        pts.dedup();
        self.processing_time = pts.first().copied();
        self.processing_times = pts;
        self
    }

    /// Sets the possible capacity multiples and marks the operation interruptible.
    pub fn with_capacity_multiples(mut self, mut multiples: Vec<u32>) -> Self {
        multiples.retain(|&m| m > 0);
        multiples.sort_unstable();
        multiples.dedup();
        self.multiple = multiples.first().copied().unwrap_or(1);
        self.capacity_multiples = multiples;
        self.op_type = OpType::Interruptible;
        self
    }

    /// Adds a capacity/processing-time option on a resource.
    ///
    /// The processing time joins the operation's processing-time domain.
    pub fn with_cap_pt(mut self, resource: ResourceId, capacity: u32, pt: i64) -> Self {
        self.cap_pt.push(CapPtOption {
            resource,
            capacity,
            processing_time: pt,
        });
        if let Err(pos) = self.processing_times.binary_search(&pt) {
            self.processing_times.insert(pos, pt);
        }
        if self.processing_time.is_none() {
            self.processing_time = self.processing_times.first().copied();
        }
        self
    }

    /// Adds a fixed resource requirement.
    pub fn with_requirement(mut self, req: ResourceRequirement) -> Self {
        self.requirements.push(req);
        self
    }

    /// Adds an alternative resource requirement.
    pub fn with_group_requirement(mut self, req: ResourceGroupRequirement) -> Self {
        self.group_requirements.push(req);
        self
    }

    /// Sets the unary time window.
    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    /// Freezes the operation at a fixed start.
    pub fn frozen_at(mut self, start: i64) -> Self {
        self.frozen = true;
        self.frozen_start = Some(start);
        self
    }

    /// Excludes the operation from cost seeding.
    pub fn unbreakable(mut self) -> Self {
        self.breakable = false;
        self
    }

    /// Whether the operation takes resources on the schedule.
    ///
    /// True iff it has at least one requirement, is not a summary and is
    /// not already complete.
    pub fn is_schedulable(&self) -> bool {
        (!self.requirements.is_empty() || !self.group_requirements.is_empty())
            && self.op_type != OpType::Summary
            && self.status != OpStatus::Complete
    }

    /// Whether the operation is interruptible.
    pub fn is_interruptible(&self) -> bool {
        self.op_type == OpType::Interruptible
    }

    /// Chosen processing time (zero for milestones).
    pub fn processing_time(&self) -> i64 {
        if self.op_type == OpType::Milestone {
            return 0;
        }
        self.processing_time
            .or_else(|| self.processing_times.first().copied())
            .unwrap_or(0)
    }

    /// Effective duration: processing time divided over the capacity multiple.
    pub fn duration(&self) -> i64 {
        duration_for(self.processing_time(), self.multiple)
    }

    /// Capacity on `resource` for a processing time, from the option table.
    pub fn capacity_on(&self, resource: ResourceId, pt: i64) -> Option<u32> {
        self.cap_pt
            .iter()
            .find(|o| o.resource == resource && o.processing_time == pt)
            .map(|o| o.capacity)
    }

    /// Units of `resource` one multiple of this operation books.
    ///
    /// `bound` is the requirement's own capacity. Without one, the option
    /// table at the chosen processing time decides, else 1.
    pub fn units_on(&self, resource: ResourceId, bound: Option<u32>) -> u32 {
        bound
            .or_else(|| self.capacity_on(resource, self.processing_time()))
            .unwrap_or(1)
    }

    /// Whether the option table mentions `resource` at all.
    pub fn has_table_for(&self, resource: ResourceId) -> bool {
        self.cap_pt.iter().any(|o| o.resource == resource)
    }

    /// Number of feasible (capacity, processing-time) pairs.
    pub fn feasible_pair_count(&self) -> usize {
        self.cap_pt.len().max(self.processing_times.len())
    }
}

/// Effective duration of `pt` split over `multiple` units.
pub fn duration_for(pt: i64, multiple: u32) -> i64 {
    let m = i64::from(multiple.max(1));
    (pt + m - 1) / m
}
