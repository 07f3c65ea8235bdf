//! Scheduling dataset: the arena owning every domain object.
//!
//! All cross-references are ids into the vectors held here. The dataset is
//! built once and then mutated in place by the selector chain and the
//! forward construction across many chromosome evaluations; [`Dataset::reset`]
//! restores the unscheduled state between evaluations, including the
//! declared capacities, processing times and capacity multiples the chain
//! overwrites.

use serde::{Deserialize, Serialize};

use super::{
    Assignment, Job, JobGroup, JobGroupId, JobId, JobOp, OpId, Resource, ResourceGroup,
    ResourceGroupId, ResourceId, Schedule,
};
use crate::config::SchedulerConfig;
use crate::error::{ScheduleError, ScheduleResult};

/// Explicit precedence edge: `succ` starts no earlier than `pred` ends plus `lag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precedence {
    pub pred: OpId,
    pub succ: OpId,
    pub lag: i64,
}

/// Resource usage of an operation under the current decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub resource: ResourceId,
    pub units: u32,
    /// Index of the group requirement this usage resolves, if any.
    pub group_req: Option<usize>,
}

/// Decision fields as they were before any evaluation touched them.
#[derive(Debug, Clone, Default)]
struct Declared {
    capacities: Vec<u32>,
    processing_times: Vec<Option<i64>>,
    multiples: Vec<u32>,
}

/// The scheduling dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub config: SchedulerConfig,
    pub jobs: Vec<Job>,
    pub ops: Vec<JobOp>,
    pub resources: Vec<Resource>,
    pub resource_groups: Vec<ResourceGroup>,
    pub job_groups: Vec<JobGroup>,
    pub precedences: Vec<Precedence>,
    #[serde(skip)]
    declared: Declared,
}

impl Dataset {
    /// Creates an empty dataset.
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Adds a resource and returns its id.
    pub fn add_resource(&mut self, mut resource: Resource) -> ResourceId {
        let id = ResourceId(self.resources.len());
        resource.id = id;
        self.resources.push(resource);
        id
    }

    /// Adds a resource group and returns its id.
    pub fn add_resource_group(&mut self, mut group: ResourceGroup) -> ResourceGroupId {
        let id = ResourceGroupId(self.resource_groups.len());
        group.id = id;
        self.resource_groups.push(group);
        id
    }

    /// Adds a job and returns its id.
    pub fn add_job(&mut self, mut job: Job) -> JobId {
        let id = JobId(self.jobs.len());
        job.id = id;
        job.ops.clear();
        self.jobs.push(job);
        id
    }

    /// Appends an operation to `job` and returns its id.
    pub fn add_op(&mut self, job: JobId, mut op: JobOp) -> OpId {
        let id = OpId(self.ops.len());
        op.id = id;
        op.job = job;
        self.ops.push(op);
        if let Some(j) = self.jobs.get_mut(job.index()) {
            j.ops.push(id);
        }
        id
    }

    /// Adds an explicit precedence edge.
    pub fn add_precedence(&mut self, pred: OpId, succ: OpId, lag: i64) {
        self.precedences.push(Precedence { pred, succ, lag });
    }

    /// Adds an alternative-job group. Only the group's active member stays active.
    pub fn add_job_group(&mut self, mut group: JobGroup) -> JobGroupId {
        let id = JobGroupId(self.job_groups.len());
        group.id = id;
        for (i, &j) in group.jobs.iter().enumerate() {
            if let Some(job) = self.jobs.get_mut(j.index()) {
                job.group = Some(id);
                job.active = i == group.active;
            }
        }
        self.job_groups.push(group);
        id
    }

    #[inline]
    pub fn job(&self, id: JobId) -> &Job {
        &self.jobs[id.index()]
    }

    #[inline]
    pub fn job_mut(&mut self, id: JobId) -> &mut Job {
        &mut self.jobs[id.index()]
    }

    #[inline]
    pub fn op(&self, id: OpId) -> &JobOp {
        &self.ops[id.index()]
    }

    #[inline]
    pub fn op_mut(&mut self, id: OpId) -> &mut JobOp {
        &mut self.ops[id.index()]
    }

    #[inline]
    pub fn resource(&self, id: ResourceId) -> &Resource {
        &self.resources[id.index()]
    }

    #[inline]
    pub fn resource_mut(&mut self, id: ResourceId) -> &mut Resource {
        &mut self.resources[id.index()]
    }

    #[inline]
    pub fn resource_group(&self, id: ResourceGroupId) -> &ResourceGroup {
        &self.resource_groups[id.index()]
    }

    #[inline]
    pub fn job_group(&self, id: JobGroupId) -> &JobGroup {
        &self.job_groups[id.index()]
    }

    /// Active jobs in id order.
    pub fn active_jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter().filter(|j| j.active)
    }

    /// Operations that take part in the current evaluation: schedulable,
    /// belonging to an active job, and not finalized.
    pub fn live_ops(&self) -> impl Iterator<Item = &JobOp> {
        self.ops
            .iter()
            .filter(move |o| o.is_schedulable() && !o.finalized && self.jobs[o.job.index()].active)
    }

    /// Makes member `index` the active job of `group`.
    ///
    /// The serial ranks of the previous and the new active member are
    /// swapped so the group keeps its position in job sequencing. Returns
    /// the job that was deactivated, if any.
    pub fn activate_job(
        &mut self,
        group: JobGroupId,
        index: usize,
    ) -> ScheduleResult<Option<JobId>> {
        let g = self
            .job_groups
            .get(group.index())
            .ok_or_else(|| ScheduleError::invariant(format!("unknown job group {group}")))?;
        if g.len() < 2 {
            return Err(ScheduleError::invariant(format!(
                "job group {} has {} member(s)",
                g.name,
                g.len()
            )));
        }
        let Some(&next) = g.jobs.get(index) else {
            return Err(ScheduleError::invariant(format!(
                "job group {} has no member {index}",
                g.name
            )));
        };
        let prev_index = g.active;
        let prev = g.jobs[prev_index];

        if prev_index == index {
            for (i, &j) in g.jobs.clone().iter().enumerate() {
                self.jobs[j.index()].active = i == index;
            }
            return Ok(None);
        }

        let prev_rank = self.jobs[prev.index()].serial_id;
        let next_rank = self.jobs[next.index()].serial_id;
        self.jobs[prev.index()].serial_id = next_rank;
        self.jobs[next.index()].serial_id = prev_rank;
        self.jobs[prev.index()].active = false;
        self.jobs[next.index()].active = true;
        self.job_groups[group.index()].active = index;
        Ok(Some(prev))
    }

    /// Marks every operation of an inactive job finalized and returns them.
    pub fn finalize_inactive_ops(&mut self) -> Vec<OpId> {
        let mut closed = Vec::new();
        for job in self.jobs.iter().filter(|j| !j.active) {
            for &o in &job.ops {
                let op = &mut self.ops[o.index()];
                op.finalized = true;
                op.scheduled = None;
                closed.push(o);
            }
        }
        closed
    }

    /// Full ordered candidate list of a group requirement (preferred first).
    ///
    /// Alternative-resource genes are indices into this list.
    pub fn group_members(&self, op: OpId, req: usize) -> Vec<ResourceId> {
        let gr = &self.op(op).group_requirements[req];
        let members = &self.resource_group(gr.group).resources;
        gr.order_candidates(members)
    }

    /// Feasible indices into [`Dataset::group_members`].
    ///
    /// A candidate is feasible when it is available and, if the operation
    /// carries an option table, the table mentions it. A forced resource
    /// narrows the domain to its own index.
    pub fn group_candidates(&self, op: OpId, req: usize) -> Vec<usize> {
        let o = self.op(op);
        let gr = &o.group_requirements[req];
        let members = self.group_members(op, req);
        if let Some(forced) = gr.forced_resource {
            return members
                .iter()
                .position(|&r| r == forced)
                .into_iter()
                .collect();
        }
        members
            .iter()
            .enumerate()
            .filter(|(_, &r)| {
                self.resource(r).available && (o.cap_pt.is_empty() || o.has_table_for(r))
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Resource usage of `op` under the current decisions.
    ///
    /// Unresolved group requirements fall back to their first feasible
    /// candidate. Unbound capacities come from the option table at the
    /// chosen processing time, else 1. Interruptible operations book
    /// their units once per capacity multiple.
    pub fn op_usage(&self, op: OpId) -> ScheduleResult<Vec<Usage>> {
        let o = self.op(op);
        let per_multiple = if o.is_interruptible() { o.multiple.max(1) } else { 1 };
        let mut usage = Vec::with_capacity(o.requirements.len() + o.group_requirements.len());
        for req in &o.requirements {
            let units = o.units_on(req.resource, req.capacity);
            usage.push(Usage {
                resource: req.resource,
                units: units * per_multiple,
                group_req: None,
            });
        }
        for (i, gr) in o.group_requirements.iter().enumerate() {
            let resource = match gr.chosen_resource.or(gr.forced_resource) {
                Some(r) => r,
                None => {
                    let members = self.group_members(op, i);
                    let first = self.group_candidates(op, i).first().copied();
                    match first {
                        Some(idx) => members[idx],
                        None => {
                            return Err(ScheduleError::propagation(format!(
                                "no candidate resource for {} requirement {i}",
                                o.name
                            )))
                        }
                    }
                }
            };
            let units = o.units_on(resource, gr.capacity);
            usage.push(Usage {
                resource,
                units: units * per_multiple,
                group_req: Some(i),
            });
        }
        Ok(usage)
    }

    /// Records the current capacities, processing times and capacity
    /// multiples as the values [`Dataset::reset`] restores.
    ///
    /// Entities added after the last call are recorded by the next reset
    /// on its own; call this after editing existing entities in place.
    pub fn declare(&mut self) {
        self.declared = Declared::default();
        self.record_declared();
    }

    fn record_declared(&mut self) {
        let d = &mut self.declared;
        let known = d.capacities.len().min(self.resources.len());
        d.capacities
            .extend(self.resources[known..].iter().map(|r| r.capacity));
        let known = d.multiples.len().min(self.ops.len());
        d.processing_times
            .extend(self.ops[known..].iter().map(|o| o.processing_time));
        d.multiples.extend(self.ops[known..].iter().map(|o| o.multiple));
    }

    /// Restores the unscheduled state.
    ///
    /// Capacities, processing times and capacity multiples go back to
    /// their declared values, so an evaluation never sees the decisions
    /// of the one before it.
    pub fn reset(&mut self) {
        self.record_declared();
        for (r, &capacity) in self.resources.iter_mut().zip(&self.declared.capacities) {
            r.capacity = capacity;
        }
        let declared = self
            .declared
            .processing_times
            .iter()
            .zip(&self.declared.multiples);
        for (op, (&pt, &multiple)) in self.ops.iter_mut().zip(declared) {
            op.processing_time = pt;
            op.multiple = multiple;
            op.scheduled = None;
            op.finalized = false;
            for req in &mut op.requirements {
                req.scheduled_capacity = None;
            }
            for gr in &mut op.group_requirements {
                gr.chosen_resource = None;
                gr.chosen_capacity = None;
            }
        }
    }

    /// Exports committed operations as a schedule.
    pub fn to_schedule(&self) -> Schedule {
        let mut schedule = Schedule::new();
        for op in &self.ops {
            let Some(slot) = op.scheduled else { continue };
            let before = schedule.assignment_count();
            for req in &op.requirements {
                schedule.add_assignment(
                    Assignment::new(op.id, op.job, Some(req.resource), slot.start, slot.end)
                        .with_capacity(req.scheduled_capacity.or(req.capacity).unwrap_or(1)),
                );
            }
            for gr in &op.group_requirements {
                if let Some(r) = gr.chosen_resource {
                    schedule.add_assignment(
                        Assignment::new(op.id, op.job, Some(r), slot.start, slot.end)
                            .with_capacity(gr.chosen_capacity.or(gr.capacity).unwrap_or(1)),
                    );
                }
            }
            if schedule.assignment_count() == before {
                schedule.add_assignment(Assignment::new(op.id, op.job, None, slot.start, slot.end));
            }
        }
        schedule
    }
}
