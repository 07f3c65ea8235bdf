//! Forward construction: the terminal stage of every selector chain.
//!
//! # Modes
//!
//! | Mode | When | Behaviour |
//! |------|------|-----------|
//! | Simple | no sequencing stage in the chain | greedy build |
//! | InitOpt | a sequencing gene is still undefined | greedy build, ranks written back |
//! | Replay | every sequencing gene is defined | build in encoded rank order |
//!
//! # Algorithm
//!
//! Frozen operations are committed first at their fixed start. The greedy
//! build then repeatedly picks a job (earliest due, then earliest open
//! operation start, then id) and commits its eligible operations, those
//! whose predecessors are all committed, by (earliest start, id), each at
//! the earliest start its resources allow.
//!
//! When the greedy build fails during InitOpt, the manager is rolled back,
//! the deterministic [`default_sequence`] is written into serial ids and
//! sequencing genes, and the failure is returned unchanged.
//!
//! # Reference
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Kolisch (1996), "Serial and parallel resource-constrained project
//!   scheduling methods revisited"

use std::collections::HashMap;

use tracing::{debug, warn};

use super::default_sequence::default_sequence;
use crate::chain::EvalContext;
use crate::dispatching::{rules, RuleEngine, SchedulingContext, TieBreaker};
use crate::error::{ScheduleError, ScheduleResult};
use crate::ga::{Chromosome, UNDEFINED_GENE};
use crate::models::{Dataset, Job, JobId, OpId, ScheduledSlot, Usage};

/// How a construction run treats the sequencing genes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Simple,
    InitOpt,
    Replay,
}

/// Where the sequencing segments live and which ids they govern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceLayout {
    /// Base and governed jobs of the job-sequence segment.
    pub jobs: Option<(usize, Vec<JobId>)>,
    /// Base and governed operations of the op-sequence segment.
    pub ops: Option<(usize, Vec<OpId>)>,
}

impl SequenceLayout {
    /// Whether the chain carries no ordering information.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_none() && self.ops.is_none()
    }

    fn genes(&self) -> impl Iterator<Item = usize> + '_ {
        let jobs = self.jobs.iter().flat_map(|(b, j)| *b..*b + j.len());
        let ops = self.ops.iter().flat_map(|(b, o)| *b..*b + o.len());
        jobs.chain(ops)
    }
}

/// Order in which one greedy build committed things.
#[derive(Debug, Clone, Default)]
struct BuildTrace {
    jobs: Vec<JobId>,
    ops: Vec<OpId>,
}

/// The forward construction stage.
#[derive(Debug, Clone, Default)]
pub struct ForwardConstruction {
    layout: SequenceLayout,
    job_genes: HashMap<JobId, usize>,
    op_genes: HashMap<OpId, usize>,
}

fn pick_engine() -> RuleEngine {
    RuleEngine::new()
        .with_rule(rules::Edd)
        .with_tie_breaker(rules::EarliestStart)
        .with_final_tie_breaker(TieBreaker::ById)
}

fn rank(serial_id: Option<u32>) -> u32 {
    serial_id.unwrap_or(UNDEFINED_GENE)
}

impl ForwardConstruction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the sequencing layout computed by the chain.
    pub fn set_layout(&mut self, layout: SequenceLayout) {
        self.job_genes.clear();
        self.op_genes.clear();
        if let Some((base, jobs)) = &layout.jobs {
            self.job_genes
                .extend(jobs.iter().enumerate().map(|(k, &j)| (j, base + k)));
        }
        if let Some((base, ops)) = &layout.ops {
            self.op_genes
                .extend(ops.iter().enumerate().map(|(k, &o)| (o, base + k)));
        }
        self.layout = layout;
    }

    pub fn layout(&self) -> &SequenceLayout {
        &self.layout
    }

    /// Mode a run on `chromosome` would use.
    pub fn mode(&self, chromosome: &Chromosome) -> RunMode {
        if self.layout.is_empty() {
            RunMode::Simple
        } else if self
            .layout
            .genes()
            .any(|i| chromosome.get(i) == UNDEFINED_GENE)
        {
            RunMode::InitOpt
        } else {
            RunMode::Replay
        }
    }

    /// Builds the schedule.
    pub fn run(&self, chromosome: &mut Chromosome, ctx: &mut EvalContext<'_>) -> ScheduleResult<()> {
        commit_frozen(ctx)?;
        let mode = self.mode(chromosome);
        debug!(?mode, "forward construction");
        match mode {
            RunMode::Simple => greedy(ctx).map(|_| ()),
            RunMode::InitOpt => {
                let base = ctx.manager.depth();
                ctx.manager.checkpoint();
                match greedy(ctx) {
                    Ok(trace) => {
                        self.record(chromosome, ctx.dataset, &trace.jobs, &trace.ops);
                        Ok(())
                    }
                    Err(err) if err.is_recoverable() => {
                        warn!(%err, "greedy construction failed, recording default sequence");
                        ctx.manager.backtrack(base);
                        clear_partial(ctx.dataset);
                        let seq = default_sequence(ctx.dataset, ctx.manager);
                        self.record(chromosome, ctx.dataset, &seq.jobs, &seq.ops);
                        Err(err)
                    }
                    Err(err) => Err(err),
                }
            }
            RunMode::Replay => {
                if self.layout.jobs.is_some() {
                    replay_jobs(ctx)
                } else {
                    replay_ops(ctx)
                }
            }
        }
    }

    /// Writes ranks into serial ids and sequencing genes (and the shadow).
    ///
    /// Governed ids missing from `jobs` / `ops` trail in id order.
    fn record(&self, chromosome: &mut Chromosome, dataset: &mut Dataset, jobs: &[JobId], ops: &[OpId]) {
        if let Some((_, governed)) = &self.layout.jobs {
            let ranked = with_trailing(jobs, governed);
            for (r, &j) in ranked.iter().enumerate() {
                let r = r as u32;
                dataset.job_mut(j).serial_id = Some(r);
                if let Some(&i) = self.job_genes.get(&j) {
                    chromosome.set_with_shadow(i, r);
                }
            }
        }
        if let Some((_, governed)) = &self.layout.ops {
            let ranked = with_trailing(ops, governed);
            for (r, &o) in ranked.iter().enumerate() {
                let r = r as u32;
                dataset.op_mut(o).serial_id = Some(r);
                if let Some(&i) = self.op_genes.get(&o) {
                    chromosome.set_with_shadow(i, r);
                }
            }
        }
    }
}

fn with_trailing<T: Copy + Ord + std::hash::Hash>(used: &[T], governed: &[T]) -> Vec<T> {
    let mut seen = std::collections::HashSet::with_capacity(used.len());
    let mut ranked: Vec<T> = used.iter().copied().filter(|x| seen.insert(*x)).collect();
    let mut rest: Vec<T> = governed.iter().copied().filter(|x| !seen.contains(x)).collect();
    rest.sort_unstable();
    ranked.extend(rest);
    ranked
}

/// Commits `op` at `start` and mirrors the placement into the dataset.
fn commit_at(ctx: &mut EvalContext<'_>, op: OpId, start: i64, usage: &[Usage]) -> ScheduleResult<()> {
    ctx.manager.commit(op, start, usage)?;
    let end = start + ctx.manager.duration(op);
    let o = ctx.dataset.op_mut(op);
    o.scheduled = Some(ScheduledSlot { start, end });
    let fixed = usage.iter().filter(|u| u.group_req.is_none());
    for (req, u) in o.requirements.iter_mut().zip(fixed) {
        req.scheduled_capacity = Some(u.units);
    }
    for u in usage {
        if let Some(i) = u.group_req {
            let gr = &mut o.group_requirements[i];
            gr.chosen_resource = Some(u.resource);
            gr.chosen_capacity = Some(u.units);
        }
    }
    Ok(())
}

/// Commits `op` at its earliest resource-feasible start.
fn place(ctx: &mut EvalContext<'_>, op: OpId) -> ScheduleResult<()> {
    let usage = ctx.dataset.op_usage(op)?;
    let start = ctx.manager.earliest_feasible_start(op, &usage)?;
    commit_at(ctx, op, start, &usage)
}

fn is_open(ctx: &EvalContext<'_>, op: OpId) -> bool {
    ctx.manager.is_present(op) && !ctx.manager.is_scheduled(op)
}

fn is_eligible(ctx: &EvalContext<'_>, op: OpId) -> bool {
    is_open(ctx, op) && ctx.manager.predecessors_committed(op)
}

fn commit_frozen(ctx: &mut EvalContext<'_>) -> ScheduleResult<()> {
    let frozen: Vec<OpId> = ctx
        .dataset
        .ops
        .iter()
        .filter(|o| o.frozen)
        .map(|o| o.id)
        .collect();
    for op in frozen {
        if !is_open(ctx, op) {
            continue;
        }
        let est = ctx.manager.est(op);
        let start = ctx.dataset.op(op).frozen_start.unwrap_or(est);
        let usage = ctx.dataset.op_usage(op)?;
        commit_at(ctx, op, start, &usage)?;
    }
    Ok(())
}

/// Jobs that still have open operations.
fn open_jobs(ctx: &EvalContext<'_>) -> Vec<JobId> {
    ctx.dataset
        .active_jobs()
        .filter(|j| j.ops.iter().any(|&o| is_open(ctx, o)))
        .map(|j| j.id)
        .collect()
}

/// Commits every eligible operation of `job`, re-evaluating after each
/// commit. Returns how many were placed.
fn advance_job(ctx: &mut EvalContext<'_>, job: JobId, trace: &mut BuildTrace) -> ScheduleResult<usize> {
    let mut placed = 0;
    loop {
        let view: &EvalContext<'_> = ctx;
        let next = view
            .dataset
            .job(job)
            .ops
            .iter()
            .copied()
            .filter(|&o| is_eligible(view, o))
            .min_by_key(|&o| (view.manager.est(o), o));
        let Some(op) = next else {
            return Ok(placed);
        };
        place(ctx, op)?;
        trace.ops.push(op);
        placed += 1;
    }
}

fn greedy(ctx: &mut EvalContext<'_>) -> ScheduleResult<BuildTrace> {
    let engine = pick_engine();
    let mut trace = BuildTrace::default();
    loop {
        let open = open_jobs(ctx);
        if open.is_empty() {
            return Ok(trace);
        }
        let view: &EvalContext<'_> = ctx;
        let mut context = SchedulingContext::at_time(view.dataset.config.origin);
        for &j in &open {
            let est = view
                .dataset
                .job(j)
                .ops
                .iter()
                .filter(|&&o| is_open(view, o))
                .map(|&o| view.manager.est(o))
                .min();
            if let Some(est) = est {
                context.earliest_start.insert(j, est);
            }
        }
        let jobs: Vec<&Job> = open.iter().map(|&j| view.dataset.job(j)).collect();
        let order: Vec<JobId> = engine.sort(&jobs, &context).into_iter().map(|j| j.id).collect();

        let mut progressed = false;
        for job in order {
            if advance_job(ctx, job, &mut trace)? > 0 {
                if !trace.jobs.contains(&job) {
                    trace.jobs.push(job);
                }
                progressed = true;
                break;
            }
        }
        if !progressed {
            return Err(ScheduleError::propagation(
                "no open operation has all predecessors committed",
            ));
        }
    }
}

fn replay_jobs(ctx: &mut EvalContext<'_>) -> ScheduleResult<()> {
    let mut jobs = open_jobs(ctx);
    jobs.sort_by_key(|&j| (rank(ctx.dataset.job(j).serial_id), j));
    for job in jobs {
        let view: &EvalContext<'_> = ctx;
        let mut ops: Vec<OpId> = view
            .dataset
            .job(job)
            .ops
            .iter()
            .copied()
            .filter(|&o| is_open(view, o))
            .collect();
        ops.sort_by_key(|&o| (rank(view.dataset.op(o).serial_id), o));
        replay_in_order(ctx, ops)?;
    }
    Ok(())
}

fn replay_ops(ctx: &mut EvalContext<'_>) -> ScheduleResult<()> {
    let view: &EvalContext<'_> = ctx;
    let mut ops: Vec<OpId> = view
        .dataset
        .live_ops()
        .map(|o| o.id)
        .filter(|&o| is_open(view, o))
        .collect();
    ops.sort_by_key(|&o| (rank(view.dataset.op(o).serial_id), o));
    replay_in_order(ctx, ops)
}

/// Commits `ops` in rank order, always taking the first eligible one.
///
/// An operation whose predecessors are not all committed is skipped, not
/// failed: the next eligible operation in rank order is placed instead and
/// the skipped one is retried on the following pass. Ranks therefore order
/// operations only among those that are ready, and the chromosome is left
/// untouched. Fails with `Propagation` when nothing left is eligible.
fn replay_in_order(ctx: &mut EvalContext<'_>, mut ops: Vec<OpId>) -> ScheduleResult<()> {
    while !ops.is_empty() {
        let view: &EvalContext<'_> = ctx;
        let Some(pos) = ops.iter().position(|&o| is_eligible(view, o)) else {
            return Err(ScheduleError::propagation(format!(
                "encoded order blocks {}: a predecessor is ranked later",
                ops[0]
            )));
        };
        let op = ops.remove(pos);
        place(ctx, op)?;
    }
    Ok(())
}

/// Drops the placements of every non-frozen operation.
fn clear_partial(dataset: &mut Dataset) {
    for op in dataset.ops.iter_mut().filter(|o| !o.frozen) {
        op.scheduled = None;
        for req in &mut op.requirements {
            req.scheduled_capacity = None;
        }
        for gr in &mut op.group_requirements {
            gr.chosen_capacity = None;
        }
    }
}
