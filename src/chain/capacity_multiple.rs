//! Capacity-multiple selection for interruptible operations.
//!
//! An interruptible operation may run on several units at once, cutting
//! its duration to `ceil(pt / multiple)`. A multiple is feasible when the
//! multiplied units fit the current capacity of every fixed requirement.
//! Units are counted as the resource timelines count them: an unbound
//! requirement takes its units from the option table.

use rand::Rng;

use super::repair::repair_gene;
use super::{is_decidable, EvalContext, Selector};
use crate::error::ScheduleResult;
use crate::ga::operators::OperatorKind;
use crate::ga::Chromosome;
use crate::models::{Dataset, OpId};
use crate::propagation::Manager;
use crate::seeder::CostSeeder;

#[derive(Debug, Clone, Default)]
pub struct CapacityMultipleSelector {
    base: usize,
    ops: Vec<OpId>,
}

impl CapacityMultipleSelector {
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
            .filter(|o| is_decidable(o) && o.is_interruptible() && o.capacity_multiples.len() > 1)
            .map(|o| o.id)
            .collect()
    }

    fn domain(dataset: &Dataset, manager: &Manager, op: OpId) -> Vec<i64> {
        let o = dataset.op(op);
        o.capacity_multiples
            .iter()
            .filter(|&&m| {
                o.requirements.iter().all(|req| {
                    let per_unit = o.units_on(req.resource, req.capacity);
                    let units = i64::from(per_unit) * i64::from(m);
                    units <= manager.capacity(req.resource)
                })
            })
            .map(|&m| i64::from(m))
            .collect()
    }
}

impl Selector for CapacityMultipleSelector {
    fn kind(&self) -> OperatorKind {
        OperatorKind::CapacityMultiple
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
        _seeder: &CostSeeder,
        _rng: &mut R,
    ) {
        for (k, &op) in self.ops.iter().enumerate() {
            chromosome.set(self.base + k, dataset.op(op).multiple);
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
            let multiple = repair_gene(chromosome, self.base + k, &domain)? as u32;
            let o = ctx.dataset.op_mut(op);
            o.multiple = multiple;
            let duration = o.duration();
            ctx.manager.set_duration(op, duration);
        }
        ctx.manager.propagate()
    }
}
