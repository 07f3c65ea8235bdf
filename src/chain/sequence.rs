//! Job and operation sequencing.
//!
//! Sequencing genes are ranks: the forward construction replays jobs (and
//! operations within them) in ascending rank order. A fresh chromosome
//! starts with every rank undefined, which sends the construction down
//! its init-opt path to discover a good order and write it back.
//!
//! Ranks are not repaired: any value orders, ties fall back to id order.

use rand::Rng;

use super::{is_decidable, EvalContext, Selector};
use crate::error::ScheduleResult;
use crate::ga::operators::OperatorKind;
use crate::ga::{Chromosome, UNDEFINED_GENE};
use crate::models::{Dataset, JobId, OpId};
use crate::seeder::CostSeeder;

fn rank_of(gene: u32) -> Option<u32> {
    (gene != UNDEFINED_GENE).then_some(gene)
}

/// Ranks jobs.
#[derive(Debug, Clone, Default)]
pub struct JobSequenceSelector {
    base: usize,
    jobs: Vec<JobId>,
}

impl JobSequenceSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Governed jobs, in gene order.
    pub fn jobs(&self) -> &[JobId] {
        &self.jobs
    }

    fn governed(dataset: &Dataset) -> Vec<JobId> {
        dataset
            .jobs
            .iter()
            .filter(|j| j.ops.iter().any(|&o| is_decidable(dataset.op(o))))
            .map(|j| j.id)
            .collect()
    }
}

impl Selector for JobSequenceSelector {
    fn kind(&self) -> OperatorKind {
        OperatorKind::JobSequence
    }

    fn own_size(&self, dataset: &Dataset) -> usize {
        Self::governed(dataset).len()
    }

    fn initialize(&mut self, dataset: &Dataset, string_base: usize) -> usize {
        self.base = string_base;
        self.jobs = Self::governed(dataset);
        self.jobs.len()
    }

    fn string_base(&self) -> usize {
        self.base
    }

    fn len(&self) -> usize {
        self.jobs.len()
    }

    fn initialize_ind<R: Rng>(
        &self,
        chromosome: &mut Chromosome,
        _dataset: &Dataset,
        _seeder: &CostSeeder,
        _rng: &mut R,
    ) {
        for k in 0..self.jobs.len() {
            chromosome.set(self.base + k, UNDEFINED_GENE);
        }
    }

    fn run(&self, chromosome: &mut Chromosome, ctx: &mut EvalContext<'_>) -> ScheduleResult<()> {
        for (k, &j) in self.jobs.iter().enumerate() {
            ctx.dataset.job_mut(j).serial_id = rank_of(chromosome.get(self.base + k));
        }
        Ok(())
    }
}

/// Ranks operations.
#[derive(Debug, Clone, Default)]
pub struct OpSequenceSelector {
    base: usize,
    ops: Vec<OpId>,
}

impl OpSequenceSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Governed operations, in gene order.
    pub fn ops(&self) -> &[OpId] {
        &self.ops
    }

    fn governed(dataset: &Dataset) -> Vec<OpId> {
        dataset
            .ops
            .iter()
            .filter(|o| is_decidable(o))
            .map(|o| o.id)
            .collect()
    }
}

impl Selector for OpSequenceSelector {
    fn kind(&self) -> OperatorKind {
        OperatorKind::OpSequence
    }

    fn own_size(&self, dataset: &Dataset) -> usize {
        Self::governed(dataset).len()
    }

    fn initialize(&mut self, dataset: &Dataset, string_base: usize) -> usize {
        self.base = string_base;
        self.ops = Self::governed(dataset);
        self.ops.len()
    }

    fn string_base(&self) -> usize {
        self.base
    }

    fn len(&self) -> usize {
        self.ops.len()
    }

    fn initialize_ind<R: Rng>(
        &self,
        chromosome: &mut Chromosome,
        _dataset: &Dataset,
        _seeder: &CostSeeder,
        _rng: &mut R,
    ) {
        for k in 0..self.ops.len() {
            chromosome.set(self.base + k, UNDEFINED_GENE);
        }
    }

    fn run(&self, chromosome: &mut Chromosome, ctx: &mut EvalContext<'_>) -> ScheduleResult<()> {
        for (k, &o) in self.ops.iter().enumerate() {
            ctx.dataset.op_mut(o).serial_id = rank_of(chromosome.get(self.base + k));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::models::{Job, JobOp, Resource, ResourceRequirement};
    use crate::propagation::Manager;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn dataset() -> Dataset {
        let mut ds = Dataset::new(SchedulerConfig::default());
        let m = ds.add_resource(Resource::new("M"));
        let a = ds.add_job(Job::new("A"));
        let b = ds.add_job(Job::new("B"));
        ds.add_job(Job::new("Empty"));
        ds.add_op(a, JobOp::new("a1").with_processing_time(2).with_requirement(ResourceRequirement::new(m)));
        ds.add_op(a, JobOp::new("a2").with_processing_time(2).with_requirement(ResourceRequirement::new(m)));
        ds.add_op(b, JobOp::new("b1").with_processing_time(2).with_requirement(ResourceRequirement::new(m)).frozen_at(0));
        ds
    }

    #[test]
    fn test_governed_sets() {
        let ds = dataset();
        let mut jobs = JobSequenceSelector::new();
        let mut ops = OpSequenceSelector::new();
        // B only has a frozen op, Empty has none
        assert_eq!(jobs.initialize(&ds, 0), 1);
        assert_eq!(ops.initialize(&ds, 1), 2);
        assert_eq!(jobs.jobs(), &[JobId(0)]);
        assert_eq!(ops.ops(), &[OpId(0), OpId(1)]);
    }

    #[test]
    fn test_fresh_genes_are_undefined() {
        let ds = dataset();
        let mut ops = OpSequenceSelector::new();
        ops.initialize(&ds, 0);
        let mut c = Chromosome::new(2);
        let mut rng = SmallRng::seed_from_u64(42);
        ops.initialize_ind(&mut c, &ds, &CostSeeder::new(), &mut rng);
        assert!(c.genes().iter().all(|&g| g == UNDEFINED_GENE));
    }

    #[test]
    fn test_run_writes_serial_ids() {
        let mut ds = dataset();
        let mut ops = OpSequenceSelector::new();
        ops.initialize(&ds, 0);
        let mut mgr = Manager::new(&ds);
        let mut c = Chromosome::from_genes(vec![1, UNDEFINED_GENE]);
        ops.run(&mut c, &mut EvalContext::new(&mut ds, &mut mgr)).unwrap();
        assert_eq!(ds.op(OpId(0)).serial_id, Some(1));
        assert_eq!(ds.op(OpId(1)).serial_id, None);
        assert!(!c.has_shadow());
    }
}
