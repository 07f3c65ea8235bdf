//! Alternative-job selection.
//!
//! One gene per job group: the index of the member job to activate.
//! Members that lose activation have their operations finalized and
//! withdrawn from propagation.

use rand::Rng;
use tracing::debug;

use super::{EvalContext, Selector};
use crate::error::ScheduleResult;
use crate::ga::operators::OperatorKind;
use crate::ga::Chromosome;
use crate::models::{Dataset, JobGroupId, OpId};
use crate::seeder::CostSeeder;

/// Picks the active member of every job group.
#[derive(Debug, Clone, Default)]
pub struct AltJobSelector {
    base: usize,
    groups: Vec<JobGroupId>,
}

impl AltJobSelector {
    /// Creates an uninitialized selector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Governed groups, in gene order.
    pub fn groups(&self) -> &[JobGroupId] {
        &self.groups
    }

    fn governed(dataset: &Dataset) -> Vec<JobGroupId> {
        dataset.job_groups.iter().map(|g| g.id).collect()
    }
}

impl Selector for AltJobSelector {
    fn kind(&self) -> OperatorKind {
        OperatorKind::AltJob
    }

    fn own_size(&self, dataset: &Dataset) -> usize {
        dataset.job_groups.len()
    }

    fn initialize(&mut self, dataset: &Dataset, string_base: usize) -> usize {
        self.base = string_base;
        self.groups = Self::governed(dataset);
        self.groups.len()
    }

    fn string_base(&self) -> usize {
        self.base
    }

    fn len(&self) -> usize {
        self.groups.len()
    }

    fn initialize_ind<R: Rng>(
        &self,
        chromosome: &mut Chromosome,
        dataset: &Dataset,
        _seeder: &CostSeeder,
        _rng: &mut R,
    ) {
        for (k, &g) in self.groups.iter().enumerate() {
            chromosome.set(self.base + k, dataset.job_group(g).active as u32);
        }
    }

    fn run(&self, chromosome: &mut Chromosome, ctx: &mut EvalContext<'_>) -> ScheduleResult<()> {
        if self.groups.is_empty() {
            return Ok(());
        }
        for (k, &g) in self.groups.iter().enumerate() {
            let index = chromosome.get(self.base + k) as usize;
            if let Some(prev) = ctx.dataset.activate_job(g, index)? {
                debug!(group = %g, %prev, index, "job group switched");
            }
        }
        let closed = ctx.dataset.finalize_inactive_ops();
        let ds: &Dataset = ctx.dataset;
        let opened: Vec<OpId> = self
            .groups
            .iter()
            .filter_map(|&g| ds.job_group(g).active_job())
            .flat_map(|j| ds.job(j).ops.iter().copied())
            .filter(|&o| {
                let op = ds.op(o);
                op.is_schedulable() && !op.finalized
            })
            .collect();
        for op in opened {
            ctx.manager.set_present(op, true);
        }
        for op in closed {
            ctx.manager.set_present(op, false);
        }
        ctx.manager.propagate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::error::ScheduleError;
    use crate::models::{Job, JobGroup, JobOp, Resource, ResourceRequirement};
    use crate::propagation::Manager;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn dataset() -> Dataset {
        let mut ds = Dataset::new(SchedulerConfig::default());
        let m = ds.add_resource(Resource::new("M"));
        let a = ds.add_job(Job::new("A").with_serial_id(0));
        let b = ds.add_job(Job::new("B").with_serial_id(1));
        ds.add_op(a, JobOp::new("a").with_processing_time(4).with_requirement(ResourceRequirement::new(m)));
        ds.add_op(b, JobOp::new("b").with_processing_time(6).with_requirement(ResourceRequirement::new(m)));
        ds.add_job_group(JobGroup::new("AB", vec![a, b]));
        ds
    }

    #[test]
    fn test_default_gene_is_active_member() {
        let ds = dataset();
        let mut sel = AltJobSelector::new();
        assert_eq!(sel.initialize(&ds, 0), 1);
        let mut c = Chromosome::new(1);
        c.set(0, 9);
        let mut rng = SmallRng::seed_from_u64(42);
        sel.initialize_ind(&mut c, &ds, &CostSeeder::new(), &mut rng);
        assert_eq!(c.get(0), 0);
    }

    #[test]
    fn test_switch_finalizes_loser() {
        let mut ds = dataset();
        let mut sel = AltJobSelector::new();
        sel.initialize(&ds, 0);
        let mut mgr = Manager::new(&ds);
        let mut c = Chromosome::from_genes(vec![1]);
        sel.run(&mut c, &mut EvalContext::new(&mut ds, &mut mgr)).unwrap();

        assert!(ds.op(OpId(0)).finalized);
        assert!(!mgr.is_present(OpId(0)));
        assert!(mgr.is_present(OpId(1)));
        // the new member inherits the old member's rank
        assert_eq!(ds.jobs[1].serial_id, Some(0));
    }

    #[test]
    fn test_switch_back_restores_presence() {
        let mut ds = dataset();
        let mut sel = AltJobSelector::new();
        sel.initialize(&ds, 0);
        let mut mgr = Manager::new(&ds);
        let mut c = Chromosome::from_genes(vec![1]);
        sel.run(&mut c, &mut EvalContext::new(&mut ds, &mut mgr)).unwrap();

        // next evaluation starts from B active
        ds.reset();
        let mut mgr = Manager::new(&ds);
        assert!(!mgr.is_present(OpId(0)));
        c.set(0, 0);
        sel.run(&mut c, &mut EvalContext::new(&mut ds, &mut mgr)).unwrap();
        assert!(mgr.is_present(OpId(0)));
        assert!(!mgr.is_present(OpId(1)));
        assert!(ds.op(OpId(1)).finalized);
    }

    #[test]
    fn test_out_of_range_gene() {
        let mut ds = dataset();
        let mut sel = AltJobSelector::new();
        sel.initialize(&ds, 0);
        let mut mgr = Manager::new(&ds);
        let mut c = Chromosome::from_genes(vec![2]);
        let err = sel
            .run(&mut c, &mut EvalContext::new(&mut ds, &mut mgr))
            .unwrap_err();
        assert!(matches!(err, ScheduleError::InvariantViolation(_)));
        assert!(!c.has_shadow());
    }
}
