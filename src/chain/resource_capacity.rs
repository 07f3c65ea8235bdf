//! Resource-capacity selection.
//!
//! One gene per resource with a capacity range: the absolute capacity,
//! snapped to the grid `min, min + step, .., max`.

use rand::Rng;
use tracing::debug;

use super::repair::{gene_value, nearest_on_grid, to_gene};
use super::{EvalContext, Selector};
use crate::error::ScheduleResult;
use crate::ga::operators::OperatorKind;
use crate::ga::Chromosome;
use crate::models::{Dataset, Resource, ResourceId};
use crate::seeder::CostSeeder;

#[derive(Debug, Clone, Default)]
pub struct ResourceCapacitySelector {
    base: usize,
    resources: Vec<ResourceId>,
}

fn snap(resource: &Resource, value: i64) -> i64 {
    nearest_on_grid(
        i64::from(resource.min_capacity),
        i64::from(resource.max_capacity),
        i64::from(resource.step),
        value,
    )
}

impl ResourceCapacitySelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resources(&self) -> &[ResourceId] {
        &self.resources
    }

    fn governed(dataset: &Dataset) -> Vec<ResourceId> {
        dataset
            .resources
            .iter()
            .filter(|r| r.has_capacity_choice())
            .map(|r| r.id)
            .collect()
    }
}

impl Selector for ResourceCapacitySelector {
    fn kind(&self) -> OperatorKind {
        OperatorKind::ResourceCapacity
    }

    fn own_size(&self, dataset: &Dataset) -> usize {
        Self::governed(dataset).len()
    }

    fn initialize(&mut self, dataset: &Dataset, string_base: usize) -> usize {
        self.base = string_base;
        self.resources = Self::governed(dataset);
        self.resources.len()
    }

    fn string_base(&self) -> usize {
        self.base
    }

    fn len(&self) -> usize {
        self.resources.len()
    }

    fn initialize_ind<R: Rng>(
        &self,
        chromosome: &mut Chromosome,
        dataset: &Dataset,
        _seeder: &CostSeeder,
        _rng: &mut R,
    ) {
        for (k, &r) in self.resources.iter().enumerate() {
            let resource = dataset.resource(r);
            let capacity = snap(resource, i64::from(resource.capacity));
            chromosome.set(self.base + k, to_gene(capacity));
        }
    }

    fn run(&self, chromosome: &mut Chromosome, ctx: &mut EvalContext<'_>) -> ScheduleResult<()> {
        for (k, &r) in self.resources.iter().enumerate() {
            let index = self.base + k;
            let stored = gene_value(chromosome.get(index));
            let capacity = snap(ctx.dataset.resource(r), stored);
            if capacity != stored {
                debug!(index, stored, capacity, "capacity gene repaired");
                chromosome.write_shadow(index, to_gene(capacity));
            }
            let capacity = capacity as u32;
            ctx.dataset.resource_mut(r).capacity = capacity;
            ctx.manager.set_capacity(r, capacity);
        }
        Ok(())
    }
}
