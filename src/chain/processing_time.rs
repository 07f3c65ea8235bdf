//! Processing-time selection.
//!
//! One gene per operation with several candidate processing times. A
//! processing time is feasible when
//!
//! - every requirement that takes its capacity from the option table has
//!   a row for it (fixed requirements, and group requirements whose chosen
//!   resource appears in the table), and
//! - the resulting duration still fits between the operation's current
//!   earliest start and latest finish.

use rand::Rng;

use super::repair::repair_gene;
use super::{is_decidable, EvalContext, Selector};
use crate::error::ScheduleResult;
use crate::ga::operators::OperatorKind;
use crate::ga::Chromosome;
use crate::models::{duration_for, Dataset, OpId, OpType};
use crate::propagation::Manager;
use crate::seeder::CostSeeder;

/// Chooses the processing time of every multi-duration operation.
#[derive(Debug, Clone, Default)]
pub struct ProcessingTimeSelector {
    base: usize,
    ops: Vec<OpId>,
}

impl ProcessingTimeSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[OpId] {
        &self.ops
    }

    fn governed(dataset: &Dataset) -> Vec<OpId> {
        dataset
            .ops
            .iter()
            .filter(|o| {
                is_decidable(o) && o.op_type != OpType::Milestone && o.processing_times.len() > 1
            })
            .map(|o| o.id)
            .collect()
    }

    fn domain(dataset: &Dataset, manager: &Manager, op: OpId) -> Vec<i64> {
        let o = dataset.op(op);
        let room = manager.lft(op) - manager.est(op);
        o.processing_times
            .iter()
            .copied()
            .filter(|&pt| {
                let fixed_ok = o
                    .requirements
                    .iter()
                    .filter(|req| req.capacity.is_none())
                    .all(|req| o.capacity_on(req.resource, pt).is_some());
                let group_ok = o.group_requirements.iter().all(|gr| match gr.chosen_resource {
                    Some(r) if gr.capacity.is_none() && o.has_table_for(r) => {
                        o.capacity_on(r, pt).is_some()
                    }
                    _ => true,
                });
                fixed_ok && group_ok && duration_for(pt, o.multiple) <= room
            })
            .collect()
    }
}

impl Selector for ProcessingTimeSelector {
    fn kind(&self) -> OperatorKind {
        OperatorKind::ProcessingTime
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
        dataset: &Dataset,
        seeder: &CostSeeder,
        _rng: &mut R,
    ) {
        for (k, &op) in self.ops.iter().enumerate() {
            let pt = seeder
                .seed(op)
                .map(|s| s.processing_time)
                .unwrap_or_else(|| dataset.op(op).processing_time());
            chromosome.set(self.base + k, super::repair::to_gene(pt));
        }
    }

    fn run(&self, chromosome: &mut Chromosome, ctx: &mut EvalContext<'_>) -> ScheduleResult<()> {
        if self.ops.is_empty() {
            return Ok(());
        }
        for (k, &op) in self.ops.iter().enumerate() {
            if !ctx.manager.is_present(op) {
                continue;
            }
            let domain = Self::domain(ctx.dataset, ctx.manager, op);
            let pt = repair_gene(chromosome, self.base + k, &domain)?;
            let o = ctx.dataset.op_mut(op);
            o.processing_time = Some(pt);
            let duration = o.duration();
            ctx.manager.set_duration(op, duration);
        }
        ctx.manager.propagate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::error::ScheduleError;
    use crate::models::{
        Job, JobOp, Resource, ResourceGroup, ResourceGroupRequirement, ResourceRequirement,
        TimeWindow,
    };
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_gene_sets_duration() {
        let mut ds = Dataset::new(SchedulerConfig::default());
        let m = ds.add_resource(Resource::new("M"));
        let j = ds.add_job(Job::new("J"));
        let o = ds.add_op(
            j,
            JobOp::new("o")
                .with_processing_times(vec![4, 6, 9])
                .with_requirement(ResourceRequirement::new(m)),
        );
        let mut sel = ProcessingTimeSelector::new();
        sel.initialize(&ds, 0);
        let mut mgr = Manager::new(&ds);
        let mut c = Chromosome::from_genes(vec![6]);
        sel.run(&mut c, &mut EvalContext::new(&mut ds, &mut mgr)).unwrap();
        assert_eq!(ds.op(o).processing_time, Some(6));
        assert_eq!(mgr.duration(o), 6);
    }

    #[test]
    fn test_window_narrows_domain() {
        let mut ds = Dataset::new(SchedulerConfig::default());
        let m = ds.add_resource(Resource::new("M"));
        let j = ds.add_job(Job::new("J"));
        let o = ds.add_op(
            j,
            JobOp::new("o")
                .with_processing_times(vec![4, 6, 9])
                .with_window(TimeWindow::between(0, 7))
                .with_requirement(ResourceRequirement::new(m)),
        );
        let mut sel = ProcessingTimeSelector::new();
        sel.initialize(&ds, 0);
        let mut mgr = Manager::new(&ds);
        mgr.propagate().unwrap();
        let mut c = Chromosome::from_genes(vec![9]);
        sel.run(&mut c, &mut EvalContext::new(&mut ds, &mut mgr)).unwrap();
        assert_eq!(ds.op(o).processing_time, Some(6));
        assert_eq!(c.shadow(), Some(&[6][..]));
    }

    #[test]
    fn test_option_table_follows_chosen_resource() {
        let mut ds = Dataset::new(SchedulerConfig::default());
        let r0 = ds.add_resource(Resource::new("M0"));
        let r1 = ds.add_resource(Resource::new("M1"));
        let g = ds.add_resource_group(ResourceGroup::new("Ms", vec![r0, r1]));
        let j = ds.add_job(Job::new("J"));
        let o = ds.add_op(
            j,
            JobOp::new("o")
                .with_group_requirement(ResourceGroupRequirement::new(g).unbound())
                .with_cap_pt(r0, 1, 8)
                .with_cap_pt(r1, 1, 3),
        );
        ds.op_mut(o).group_requirements[0].chosen_resource = Some(r1);
        let mut sel = ProcessingTimeSelector::new();
        sel.initialize(&ds, 0);
        let mut mgr = Manager::new(&ds);
        let mut c = Chromosome::from_genes(vec![8]);
        sel.run(&mut c, &mut EvalContext::new(&mut ds, &mut mgr)).unwrap();
        assert_eq!(ds.op(o).processing_time, Some(3));
    }

    #[test]
    fn test_no_supported_time_fails() {
        let mut ds = Dataset::new(SchedulerConfig::default());
        let m = ds.add_resource(Resource::new("M"));
        let other = ds.add_resource(Resource::new("N"));
        let j = ds.add_job(Job::new("J"));
        // the table only covers N, so M's unbound capacity is never known
        ds.add_op(
            j,
            JobOp::new("o")
                .with_requirement(ResourceRequirement::new(m).unbound())
                .with_cap_pt(other, 1, 5)
                .with_cap_pt(other, 2, 6),
        );
        let mut sel = ProcessingTimeSelector::new();
        sel.initialize(&ds, 0);
        let mut mgr = Manager::new(&ds);
        let mut c = Chromosome::from_genes(vec![5]);
        let err = sel
            .run(&mut c, &mut EvalContext::new(&mut ds, &mut mgr))
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Propagation(_)));
    }

    #[test]
    fn test_seeded_initial_gene() {
        let mut ds = Dataset::new(SchedulerConfig::default());
        let m = ds.add_resource(Resource::new("M").with_hourly_rate(2.0));
        let j = ds.add_job(Job::new("J"));
        ds.add_op(
            j,
            JobOp::new("o")
                .with_processing_times(vec![4, 6])
                .with_requirement(ResourceRequirement::new(m)),
        );
        let mut rng = SmallRng::seed_from_u64(42);
        let mut seeder = CostSeeder::new();
        seeder.build(&ds, &mut rng);

        let mut sel = ProcessingTimeSelector::new();
        sel.initialize(&ds, 0);
        let mut c = Chromosome::new(1);
        sel.initialize_ind(&mut c, &ds, &seeder, &mut rng);
        assert_eq!(c.get(0), 4);
    }
}
