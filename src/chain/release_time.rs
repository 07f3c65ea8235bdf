//! Release-time selection.
//!
//! One gene per root operation of every job with a release time. A gene
//! is an offset in slots from `config.origin`, not an absolute slot: the
//! operation may start no earlier than `origin + gene`. With the default
//! origin of 0 the two coincide. A gene below the job's release floor
//! (also taken relative to the origin) is raised to it.
//!
//! Root operations are the first schedulable operation of an ordered job,
//! or every schedulable operation of an unordered job that no other
//! operation of the same job precedes.

use rand::Rng;
use tracing::debug;

use super::repair::{gene_value, to_gene};
use super::{is_decidable, EvalContext, Selector};
use crate::error::ScheduleResult;
use crate::ga::operators::OperatorKind;
use crate::ga::Chromosome;
use crate::models::{Dataset, Job, JobId, OpId};
use crate::seeder::CostSeeder;

/// Decides when the root operations of released jobs may start.
///
/// Seeds each gene from the job's declared release and tightens the
/// earliest start of its root operation during the run. Repairs to the
/// floor go to the shadow.
#[derive(Debug, Clone, Default)]
pub struct ReleaseTimeSelector {
    base: usize,
    roots: Vec<(JobId, OpId)>,
}

/// Lowest gene value allowed for `job`.
pub fn release_bound(dataset: &Dataset, job: &Job) -> i64 {
    let origin = dataset.config.origin;
    (job.release_floor.unwrap_or(origin) - origin).max(0)
}

fn root_ops(dataset: &Dataset, job: &Job) -> Vec<OpId> {
    let schedulable = job
        .ops
        .iter()
        .copied()
        .filter(|&o| dataset.op(o).is_schedulable());
    if job.ordered {
        return schedulable.take(1).filter(|&o| !dataset.op(o).frozen).collect();
    }
    schedulable
        .filter(|&o| {
            !dataset.op(o).frozen
                && !dataset
                    .precedences
                    .iter()
                    .any(|p| p.succ == o && dataset.op(p.pred).job == job.id)
        })
        .collect()
}

impl ReleaseTimeSelector {
    /// Creates an empty selector. Roots are found by `initialize`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Governed `(job, root operation)` pairs, in gene order.
    pub fn roots(&self) -> &[(JobId, OpId)] {
        &self.roots
    }

    fn governed(dataset: &Dataset) -> Vec<(JobId, OpId)> {
        dataset
            .jobs
            .iter()
            .filter(|j| j.release.is_some())
            .flat_map(|j| root_ops(dataset, j).into_iter().map(move |o| (j.id, o)))
            .filter(|&(_, o)| is_decidable(dataset.op(o)))
            .collect()
    }
}

impl Selector for ReleaseTimeSelector {
    fn kind(&self) -> OperatorKind {
        OperatorKind::ReleaseTime
    }

    fn own_size(&self, dataset: &Dataset) -> usize {
        Self::governed(dataset).len()
    }

    fn initialize(&mut self, dataset: &Dataset, string_base: usize) -> usize {
        self.base = string_base;
        self.roots = Self::governed(dataset);
        self.roots.len()
    }

    fn string_base(&self) -> usize {
        self.base
    }

    fn len(&self) -> usize {
        self.roots.len()
    }

    fn initialize_ind<R: Rng>(
        &self,
        chromosome: &mut Chromosome,
        dataset: &Dataset,
        _seeder: &CostSeeder,
        _rng: &mut R,
    ) {
        let origin = dataset.config.origin;
        for (k, &(j, _)) in self.roots.iter().enumerate() {
            let job = dataset.job(j);
            let offset = job.release.map_or(0, |r| r - origin);
            chromosome.set(self.base + k, to_gene(offset.max(release_bound(dataset, job))));
        }
    }

    fn run(&self, chromosome: &mut Chromosome, ctx: &mut EvalContext<'_>) -> ScheduleResult<()> {
        if self.roots.is_empty() {
            return Ok(());
        }
        let origin = ctx.dataset.config.origin;
        for (k, &(j, op)) in self.roots.iter().enumerate() {
            if !ctx.manager.is_present(op) {
                continue;
            }
            let index = self.base + k;
            let stored = gene_value(chromosome.get(index));
            let bound = release_bound(ctx.dataset, ctx.dataset.job(j));
            let offset = stored.max(bound);
            if offset != stored {
                debug!(index, stored, offset, "release gene repaired");
                chromosome.write_shadow(index, to_gene(offset));
            }
            ctx.manager.tighten_est(op, origin + offset);
        }
        ctx.manager.propagate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::error::ScheduleError;
    use crate::models::{JobOp, Resource, ResourceRequirement};
    use crate::propagation::Manager;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn op(m: crate::models::ResourceId, name: &str) -> JobOp {
        JobOp::new(name).with_processing_time(3).with_requirement(ResourceRequirement::new(m))
    }

    #[test]
    fn test_ordered_job_has_one_root() {
        let mut ds = Dataset::new(SchedulerConfig::default().with_origin(10));
        let m = ds.add_resource(Resource::new("M"));
        let j = ds.add_job(Job::new("J").with_release(15).with_release_floor(12));
        let first = ds.add_op(j, op(m, "a"));
        ds.add_op(j, op(m, "b"));
        ds.add_job(Job::new("Free"));

        let mut sel = ReleaseTimeSelector::new();
        assert_eq!(sel.initialize(&ds, 0), 1);
        assert_eq!(sel.roots(), &[(j, first)]);

        let mut c = Chromosome::new(1);
        let mut rng = SmallRng::seed_from_u64(42);
        sel.initialize_ind(&mut c, &ds, &CostSeeder::new(), &mut rng);
        assert_eq!(c.get(0), 5);
    }

    #[test]
    fn test_unordered_roots_skip_internal_successors() {
        let mut ds = Dataset::new(SchedulerConfig::default());
        let m = ds.add_resource(Resource::new("M"));
        let j = ds.add_job(Job::new("J").unordered().with_release(4));
        let a = ds.add_op(j, op(m, "a"));
        let b = ds.add_op(j, op(m, "b"));
        let c = ds.add_op(j, op(m, "c"));
        ds.add_precedence(a, c, 0);

        let mut sel = ReleaseTimeSelector::new();
        sel.initialize(&ds, 0);
        assert_eq!(sel.roots(), &[(j, a), (j, b)]);
    }

    #[test]
    fn test_gene_below_floor_is_raised() {
        let mut ds = Dataset::new(SchedulerConfig::default());
        let m = ds.add_resource(Resource::new("M"));
        let j = ds.add_job(Job::new("J").with_release(8).with_release_floor(6));
        let a = ds.add_op(j, op(m, "a"));
        let b = ds.add_op(j, op(m, "b"));

        let mut sel = ReleaseTimeSelector::new();
        sel.initialize(&ds, 0);
        let mut mgr = Manager::new(&ds);
        let mut chrom = Chromosome::from_genes(vec![2]);
        sel.run(&mut chrom, &mut EvalContext::new(&mut ds, &mut mgr)).unwrap();
        assert_eq!(mgr.est(a), 6);
        assert_eq!(mgr.est(b), 9);
        assert_eq!(chrom.get(0), 2);
        assert_eq!(chrom.shadow(), Some(&[6][..]));
    }

    #[test]
    fn test_release_past_horizon_fails() {
        let mut ds = Dataset::new(SchedulerConfig::default().with_horizon(20));
        let m = ds.add_resource(Resource::new("M"));
        let j = ds.add_job(Job::new("J").with_release(0));
        ds.add_op(j, op(m, "a"));

        let mut sel = ReleaseTimeSelector::new();
        sel.initialize(&ds, 0);
        let mut mgr = Manager::new(&ds);
        let mut chrom = Chromosome::from_genes(vec![19]);
        let err = sel
            .run(&mut chrom, &mut EvalContext::new(&mut ds, &mut mgr))
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Propagation(_)));
    }
}
