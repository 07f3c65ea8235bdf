//! Alternative-resource selection.
//!
//! One gene per group requirement with more than one member: an index
//! into the requirement's ordered member list (preferred members first).
//! The feasible domain is the set of available members the operation's
//! option table supports, or only the forced member when one is set.

use rand::Rng;
use tracing::trace;

use super::repair::repair_gene;
use super::{is_decidable, EvalContext, Selector};
use crate::error::ScheduleResult;
use crate::ga::operators::OperatorKind;
use crate::ga::Chromosome;
use crate::models::{Dataset, OpId};
use crate::seeder::CostSeeder;

/// Chooses a concrete resource for every alternative requirement.
#[derive(Debug, Clone, Default)]
pub struct AltResourceSelector {
    base: usize,
    slots: Vec<(OpId, usize)>,
}

impl AltResourceSelector {
    /// Creates an uninitialized selector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Governed `(operation, group requirement index)` pairs, in gene order.
    pub fn slots(&self) -> &[(OpId, usize)] {
        &self.slots
    }

    fn governed(dataset: &Dataset) -> Vec<(OpId, usize)> {
        let mut slots = Vec::new();
        for op in dataset.ops.iter().filter(|o| is_decidable(o)) {
            for (r, gr) in op.group_requirements.iter().enumerate() {
                if dataset.resource_group(gr.group).resources.len() > 1 {
                    slots.push((op.id, r));
                }
            }
        }
        slots
    }

    /// Feasible gene values for one slot.
    pub fn domain(dataset: &Dataset, op: OpId, req: usize) -> Vec<i64> {
        dataset
            .group_candidates(op, req)
            .into_iter()
            .map(|i| i as i64)
            .collect()
    }
}

impl Selector for AltResourceSelector {
    fn kind(&self) -> OperatorKind {
        OperatorKind::AltResource
    }

    fn own_size(&self, dataset: &Dataset) -> usize {
        Self::governed(dataset).len()
    }

    fn initialize(&mut self, dataset: &Dataset, string_base: usize) -> usize {
        self.base = string_base;
        self.slots = Self::governed(dataset);
        self.slots.len()
    }

    fn string_base(&self) -> usize {
        self.base
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn initialize_ind<R: Rng>(
        &self,
        chromosome: &mut Chromosome,
        dataset: &Dataset,
        seeder: &CostSeeder,
        _rng: &mut R,
    ) {
        for (k, &(op, r)) in self.slots.iter().enumerate() {
            let gene = seeder
                .seed(op)
                .and_then(|s| s.resource_choices.get(r).copied())
                .or_else(|| dataset.group_candidates(op, r).first().copied())
                .unwrap_or(0);
            chromosome.set(self.base + k, gene as u32);
        }
    }

    fn run(&self, chromosome: &mut Chromosome, ctx: &mut EvalContext<'_>) -> ScheduleResult<()> {
        for (k, &(op, r)) in self.slots.iter().enumerate() {
            if !ctx.manager.is_present(op) {
                continue;
            }
            let domain = Self::domain(ctx.dataset, op, r);
            let index = repair_gene(chromosome, self.base + k, &domain)? as usize;
            let resource = ctx.dataset.group_members(op, r)[index];
            trace!(%op, req = r, %resource, "resource chosen");
            ctx.dataset.op_mut(op).group_requirements[r].chosen_resource = Some(resource);
        }
        Ok(())
    }
}
