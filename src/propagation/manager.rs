//! Propagation manager.
//!
//! Owns the reversible store for one evaluation, one [`Activity`] per
//! operation, the precedence edges, the resource timelines and the
//! cycle groups. Selectors tighten bounds through the manager and call
//! [`Manager::propagate`]; the forward construction asks it for the
//! earliest feasible start of an operation and commits placements.
//!
//! # Algorithm
//! Bound propagation over precedence edges `succ.start >= pred.end + lag`:
//! forward passes raise earliest starts, backward passes lower latest
//! finishes, each repeated to a fixpoint (Bellman-Ford style, at most
//! `n + 1` rounds before a positive cycle is reported).
//!
//! # Reference
//! - Baptiste et al. (2001), "Constraint-Based Scheduling", Ch. 1
//! - Schulte (1999), "Comparing Trailing and Copying for Constraint Programming"

use tracing::trace;

use super::{CycleGroups, Timeline};
use crate::config::{Direction, SchedulerConfig};
use crate::error::{ScheduleError, ScheduleResult};
use crate::models::{Dataset, OpId, ResourceId, TimeWindow, Usage};
use crate::rev::{RevInt, RevStore};

/// Reversible bounds of one operation.
#[derive(Debug, Clone, Copy)]
pub struct Activity {
    est: RevInt,
    lft: RevInt,
    duration: RevInt,
    present: RevInt,
    scheduled: RevInt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Edge {
    pred: usize,
    succ: usize,
    lag: i64,
}

/// Owner of the reversible state of one evaluation.
#[derive(Debug, Clone)]
pub struct Manager {
    store: RevStore,
    activities: Vec<Activity>,
    windows: Vec<TimeWindow>,
    edges: Vec<Edge>,
    preds: Vec<Vec<usize>>,
    timelines: Vec<Timeline>,
    cycles: CycleGroups,
    origin: i64,
    horizon: i64,
    direction: Direction,
}

impl Manager {
    /// Builds the manager for the current dataset state at depth 0.
    ///
    /// Precedence edges are the dataset's explicit edges plus one edge
    /// between consecutive schedulable operations of every ordered job.
    pub fn new(dataset: &Dataset) -> Self {
        let SchedulerConfig {
            origin,
            horizon,
            direction,
            ..
        } = dataset.config;
        let mut store = RevStore::new();
        let n = dataset.ops.len();

        let mut activities = Vec::with_capacity(n);
        let mut windows = Vec::with_capacity(n);
        for op in &dataset.ops {
            let present = op.is_schedulable()
                && !op.finalized
                && dataset.job(op.job).active;
            activities.push(Activity {
                est: store.new_int(origin),
                lft: store.new_int(horizon),
                duration: store.new_int(op.duration()),
                present: store.new_int(i64::from(present)),
                scheduled: store.new_int(0),
            });
            windows.push(op.window);
        }

        let mut edges: Vec<Edge> = dataset
            .precedences
            .iter()
            .filter(|p| p.pred.index() < n && p.succ.index() < n)
            .map(|p| Edge {
                pred: p.pred.index(),
                succ: p.succ.index(),
                lag: p.lag,
            })
            .collect();
        for job in dataset.jobs.iter().filter(|j| j.ordered) {
            let chain: Vec<usize> = job
                .ops
                .iter()
                .filter(|&&o| dataset.op(o).is_schedulable())
                .map(|o| o.index())
                .collect();
            for pair in chain.windows(2) {
                edges.push(Edge {
                    pred: pair[0],
                    succ: pair[1],
                    lag: 0,
                });
            }
        }

        let mut preds = vec![Vec::new(); n];
        for e in &edges {
            preds[e.succ].push(e.pred);
        }
        let pairs: Vec<(usize, usize)> = edges.iter().map(|e| (e.pred, e.succ)).collect();
        let cycles = CycleGroups::new(n, &pairs);

        let timelines = dataset
            .resources
            .iter()
            .map(|r| Timeline::new(&mut store, r.capacity))
            .collect();

        Self {
            store,
            activities,
            windows,
            edges,
            preds,
            timelines,
            cycles,
            origin,
            horizon,
            direction,
        }
    }

    /// The reversible store.
    pub fn store(&self) -> &RevStore {
        &self.store
    }

    /// Mutable access to the reversible store.
    pub fn store_mut(&mut self) -> &mut RevStore {
        &mut self.store
    }

    /// Current checkpoint depth.
    pub fn depth(&self) -> u32 {
        self.store.depth()
    }

    /// Opens a checkpoint.
    pub fn checkpoint(&mut self) -> u32 {
        self.store.checkpoint()
    }

    /// Rolls every reversible value back to `depth`.
    pub fn backtrack(&mut self, depth: u32) {
        self.store.backtrack(depth);
    }

    fn act(&self, op: OpId) -> &Activity {
        &self.activities[op.index()]
    }

    /// Earliest start of `op`.
    pub fn est(&self, op: OpId) -> i64 {
        self.store.get(self.act(op).est)
    }

    /// Latest finish of `op`.
    pub fn lft(&self, op: OpId) -> i64 {
        self.store.get(self.act(op).lft)
    }

    /// Duration of `op`.
    pub fn duration(&self, op: OpId) -> i64 {
        self.store.get(self.act(op).duration)
    }

    /// Whether `op` takes part in the evaluation.
    pub fn is_present(&self, op: OpId) -> bool {
        self.store.get(self.act(op).present) != 0
    }

    /// Whether `op` has been committed.
    pub fn is_scheduled(&self, op: OpId) -> bool {
        self.store.get(self.act(op).scheduled) != 0
    }

    /// Includes or excludes `op`.
    pub fn set_present(&mut self, op: OpId, present: bool) {
        let cell = self.act(op).present;
        self.store.set(cell, i64::from(present));
    }

    /// Sets the duration of `op`.
    pub fn set_duration(&mut self, op: OpId, duration: i64) {
        let cell = self.act(op).duration;
        self.store.set(cell, duration.max(0));
    }

    /// Raises the earliest start of `op` to at least `t`.
    pub fn tighten_est(&mut self, op: OpId, t: i64) {
        let cell = self.act(op).est;
        if t > self.store.get(cell) {
            self.store.set(cell, t);
        }
    }

    /// Lowers the latest finish of `op` to at most `t`.
    pub fn tighten_lft(&mut self, op: OpId, t: i64) {
        let cell = self.act(op).lft;
        if t < self.store.get(cell) {
            self.store.set(cell, t);
        }
    }

    /// Capacity of a resource.
    pub fn capacity(&self, resource: ResourceId) -> i64 {
        self.timelines[resource.index()].capacity(&self.store)
    }

    /// Changes the capacity of a resource.
    pub fn set_capacity(&mut self, resource: ResourceId, capacity: u32) {
        let tl = self.timelines[resource.index()];
        tl.set_capacity(&mut self.store, capacity);
    }

    /// Timeline of a resource.
    pub fn timeline(&self, resource: ResourceId) -> &Timeline {
        &self.timelines[resource.index()]
    }

    /// Direct predecessors of `op`.
    pub fn predecessors(&self, op: OpId) -> impl Iterator<Item = OpId> + '_ {
        self.preds[op.index()].iter().map(|&p| OpId(p))
    }

    /// Whether every present predecessor of `op` is committed.
    pub fn predecessors_committed(&self, op: OpId) -> bool {
        self.predecessors(op)
            .all(|p| !self.is_present(p) || self.is_scheduled(p))
    }

    /// Cycle groups of the precedence graph.
    pub fn cycle_groups(&self) -> &CycleGroups {
        &self.cycles
    }

    /// Successor depth of `op` in the configured direction.
    pub fn successor_depth(&self, op: OpId) -> u32 {
        self.cycles.successor_depth(op.index(), self.direction)
    }

    /// Tightens every bound to a fixpoint.
    ///
    /// # Errors
    /// `Propagation` when a present operation no longer fits between its
    /// earliest start and latest finish, when a committed start would
    /// have to move, or when the precedence graph has a positive cycle.
    pub fn propagate(&mut self) -> ScheduleResult<()> {
        self.apply_windows();
        self.forward_pass()?;
        self.backward_pass()?;
        self.check_bounds()
    }

    fn apply_windows(&mut self) {
        for i in 0..self.activities.len() {
            let op = OpId(i);
            if !self.is_present(op) || self.is_scheduled(op) {
                continue;
            }
            let d = self.duration(op);
            let w = self.windows[i];
            let floor = w.earliest_start(d).unwrap_or(self.origin).max(self.origin);
            let ceil = w.latest_finish(d).unwrap_or(self.horizon).min(self.horizon);
            self.tighten_est(op, floor);
            self.tighten_lft(op, ceil);
        }
    }

    fn forward_pass(&mut self) -> ScheduleResult<()> {
        let rounds = self.activities.len() + 1;
        for _ in 0..rounds {
            let mut changed = false;
            for k in 0..self.edges.len() {
                let Edge { pred, succ, lag } = self.edges[k];
                let (p, s) = (OpId(pred), OpId(succ));
                if !self.is_present(p) || !self.is_present(s) {
                    continue;
                }
                let bound = self.est(p) + self.duration(p) + lag;
                if bound > self.est(s) {
                    if self.is_scheduled(s) {
                        return Err(ScheduleError::propagation(format!(
                            "{s} is committed at {} but {p} ends at {bound}",
                            self.est(s)
                        )));
                    }
                    self.tighten_est(s, bound);
                    changed = true;
                }
            }
            if !changed {
                return Ok(());
            }
        }
        Err(ScheduleError::propagation(
            "positive precedence cycle on earliest starts",
        ))
    }

    fn backward_pass(&mut self) -> ScheduleResult<()> {
        let rounds = self.activities.len() + 1;
        for _ in 0..rounds {
            let mut changed = false;
            for k in 0..self.edges.len() {
                let Edge { pred, succ, lag } = self.edges[k];
                let (p, s) = (OpId(pred), OpId(succ));
                if !self.is_present(p) || !self.is_present(s) {
                    continue;
                }
                let bound = self.lft(s) - self.duration(s) - lag;
                if bound < self.lft(p) {
                    self.tighten_lft(p, bound);
                    changed = true;
                }
            }
            if !changed {
                return Ok(());
            }
        }
        Err(ScheduleError::propagation(
            "positive precedence cycle on latest finishes",
        ))
    }

    fn check_bounds(&self) -> ScheduleResult<()> {
        for i in 0..self.activities.len() {
            let op = OpId(i);
            if !self.is_present(op) {
                continue;
            }
            let (est, d, lft) = (self.est(op), self.duration(op), self.lft(op));
            if est + d > lft {
                return Err(ScheduleError::propagation(format!(
                    "{op} cannot fit: start {est} + duration {d} > latest finish {lft}"
                )));
            }
        }
        Ok(())
    }

    /// Earliest start at or after the current earliest start of `op` at
    /// which every usage fits on its resource for the whole duration.
    ///
    /// # Errors
    /// `Propagation` when a usage exceeds its resource's capacity or no
    /// start before the latest finish works.
    pub fn earliest_feasible_start(&self, op: OpId, usage: &[Usage]) -> ScheduleResult<i64> {
        let d = self.duration(op);
        let lft = self.lft(op);
        let mut t = self.est(op);

        for u in usage {
            if i64::from(u.units) > self.capacity(u.resource) {
                return Err(ScheduleError::propagation(format!(
                    "{op} needs {} units of {} (capacity {})",
                    u.units,
                    u.resource,
                    self.capacity(u.resource)
                )));
            }
        }

        loop {
            if t + d > lft {
                return Err(ScheduleError::propagation(format!(
                    "{op} finds no resource slot before {lft}"
                )));
            }
            let blocked = usage.iter().find(|u| {
                !self.timelines[u.resource.index()].fits(&self.store, t, t + d, u.units)
            });
            let Some(u) = blocked else {
                return Ok(t);
            };
            // The load on this resource can only drop at a reservation end.
            let next = self.timelines[u.resource.index()]
                .release_points_after(&self.store, t)
                .first()
                .copied();
            match next {
                Some(n) => t = n,
                None => {
                    return Err(ScheduleError::propagation(format!(
                        "{op} never fits on {}",
                        u.resource
                    )))
                }
            }
        }
    }

    /// Commits `op` at `start`, books its usage and propagates.
    pub fn commit(&mut self, op: OpId, start: i64, usage: &[Usage]) -> ScheduleResult<()> {
        let d = self.duration(op);
        trace!(%op, start, end = start + d, "commit");
        let est = self.act(op).est;
        self.store.set(est, start);
        let scheduled = self.act(op).scheduled;
        self.store.set(scheduled, 1);
        for u in usage {
            let tl = self.timelines[u.resource.index()];
            tl.reserve(&mut self.store, start, start + d, u.units);
        }
        self.propagate()
    }
}
