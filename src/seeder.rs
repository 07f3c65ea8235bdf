//! Cost-minimizing seeder.
//!
//! For every breakable operation with a real choice (several feasible
//! capacity/processing-time pairs, or alternative resource requirements)
//! the seeder finds the processing time and the per-group candidate
//! resources with the lowest static resource cost. Selectors read these
//! seeds when filling a fresh chromosome.
//!
//! # Cost Model
//!
//! A resource's unit rate is taken from the cheapest applicable period
//! rate (monthly, weekly, daily, hourly, in that preference order; a rate
//! applies when the processing time covers at least one full period)
//! converted to a per-slot rate. The cost of `capacity` units for `pt`
//! slots is `per_slot_rate × capacity × pt`.
//!
//! Ties between equal-cost candidates and equal-cost combinations are
//! broken uniformly at random (reservoir selection).

use std::collections::HashMap;

use rand::Rng;
use tracing::debug;

use crate::config::SchedulerConfig;
use crate::models::{Dataset, JobOp, OpId, Resource, ResourceId};

const COST_EPS: f64 = 1e-9;

/// Cheapest known combination for one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct CostSeed {
    /// Chosen processing time.
    pub processing_time: i64,
    /// Chosen candidate index (into the ordered member list) per group
    /// requirement, in requirement order.
    pub resource_choices: Vec<usize>,
    /// Total static cost.
    pub cost: f64,
}

/// Memoized cost seeds keyed by operation.
#[derive(Debug, Clone, Default)]
pub struct CostSeeder {
    seeds: HashMap<OpId, CostSeed>,
}

/// Per-slot unit rate of a resource for a processing time.
pub fn unit_rate(resource: &Resource, config: &SchedulerConfig, pt: i64) -> f64 {
    let rates = resource.rates;
    let periods = [
        (rates.monthly, config.month_slots()),
        (rates.weekly, config.week_slots()),
        (rates.daily, config.day_slots()),
        (rates.hourly, config.hour_slots()),
    ];
    let mut best: Option<f64> = None;
    for (rate, slots) in periods {
        let Some(rate) = rate else { continue };
        if pt < slots {
            continue;
        }
        let per_slot = rate / slots as f64;
        if best.map_or(true, |b| per_slot < b - COST_EPS) {
            best = Some(per_slot);
        }
    }
    // Short operations still pay the finest rate on offer.
    best.or_else(|| {
        periods
            .iter()
            .rev()
            .find_map(|&(rate, slots)| rate.map(|r| r / slots as f64))
    })
    .unwrap_or(0.0)
}

/// Cost of holding `capacity` units of `resource` for `pt` slots.
pub fn usage_cost(resource: &Resource, config: &SchedulerConfig, capacity: u32, pt: i64) -> f64 {
    unit_rate(resource, config, pt) * f64::from(capacity) * pt as f64
}

/// Whether the seeder considers `op` at all.
pub fn is_seedable(op: &JobOp) -> bool {
    !op.frozen
        && !op.is_interruptible()
        && op.breakable
        && (op.feasible_pair_count() > 1 || !op.group_requirements.is_empty())
}

/// Reservoir pick among ties: the `seen`-th equal candidate replaces the
/// current one with probability `1 / seen`.
fn take_tie<R: Rng>(seen: &mut u32, rng: &mut R) -> bool {
    *seen += 1;
    rng.random_range(0..*seen) == 0
}

impl CostSeeder {
    /// Creates an empty seeder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes seeds for every seedable operation of the dataset.
    pub fn build<R: Rng>(&mut self, dataset: &Dataset, rng: &mut R) {
        self.seeds.clear();
        for op in dataset.ops.iter().filter(|o| is_seedable(o)) {
            if let Some(seed) = Self::cheapest(dataset, op.id, rng) {
                debug!(op = %op.id, pt = seed.processing_time, cost = seed.cost, "cost seed");
                self.seeds.insert(op.id, seed);
            }
        }
    }

    /// Seed of an operation, if it has one.
    pub fn seed(&self, op: OpId) -> Option<&CostSeed> {
        self.seeds.get(&op)
    }

    /// Number of seeded operations.
    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    /// Whether no operation is seeded.
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    fn capacity_for(op: &JobOp, declared: Option<u32>, resource: ResourceId, pt: i64) -> Option<u32> {
        declared.or_else(|| op.capacity_on(resource, pt))
    }

    fn cheapest<R: Rng>(dataset: &Dataset, id: OpId, rng: &mut R) -> Option<CostSeed> {
        let op = dataset.op(id);
        let config = &dataset.config;
        let mut best: Option<CostSeed> = None;
        let mut best_ties = 0u32;

        'pt: for &pt in &op.processing_times {
            let mut total = 0.0;
            for req in &op.requirements {
                let Some(cap) = Self::capacity_for(op, req.capacity, req.resource, pt) else {
                    continue 'pt;
                };
                total += usage_cost(dataset.resource(req.resource), config, cap, pt);
            }

            let mut choices = Vec::with_capacity(op.group_requirements.len());
            for (i, gr) in op.group_requirements.iter().enumerate() {
                let members = dataset.group_members(id, i);
                let mut pick: Option<(usize, f64)> = None;
                let mut ties = 0u32;
                for idx in dataset.group_candidates(id, i) {
                    let r = members[idx];
                    let Some(cap) = Self::capacity_for(op, gr.capacity, r, pt) else {
                        continue;
                    };
                    let cost = usage_cost(dataset.resource(r), config, cap, pt);
                    match pick {
                        Some((_, c)) if cost > c + COST_EPS => {}
                        Some((_, c)) if (cost - c).abs() <= COST_EPS => {
                            if take_tie(&mut ties, rng) {
                                pick = Some((idx, cost));
                            }
                        }
                        _ => {
                            ties = 1;
                            pick = Some((idx, cost));
                        }
                    }
                }
                let Some((idx, cost)) = pick else {
                    continue 'pt;
                };
                choices.push(idx);
                total += cost;
            }

            let candidate = CostSeed {
                processing_time: pt,
                resource_choices: choices,
                cost: total,
            };
            match &best {
                Some(b) if total > b.cost + COST_EPS => {}
                Some(b) if (total - b.cost).abs() <= COST_EPS => {
                    if take_tie(&mut best_ties, rng) {
                        best = Some(candidate);
                    }
                }
                _ => {
                    best_ties = 1;
                    best = Some(candidate);
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Job, JobOp, Resource, ResourceGroup, ResourceGroupRequirement, ResourceRequirement,
    };
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn config() -> SchedulerConfig {
        // One slot per hour.
        SchedulerConfig::default()
    }

    #[test]
    fn test_unit_rate_prefers_cheapest_applicable_period() {
        let cfg = config();
        let r = Resource::new("M").with_hourly_rate(10.0).with_daily_rate(120.0);
        // 24h covers a day: 120/24 = 5 per slot beats 10.
        assert!((unit_rate(&r, &cfg, 24) - 5.0).abs() < 1e-9);
        // 5h does not cover a day.
        assert!((unit_rate(&r, &cfg, 5) - 10.0).abs() < 1e-9);
        // No rates at all.
        assert_eq!(unit_rate(&Resource::new("free"), &cfg, 5), 0.0);
    }

    #[test]
    fn test_short_op_pays_finest_rate() {
        let cfg = config();
        let r = Resource::new("M").with_daily_rate(48.0);
        assert!((unit_rate(&r, &cfg, 3) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_usage_cost_scales() {
        let cfg = config();
        let r = Resource::new("M").with_hourly_rate(2.0);
        assert!((usage_cost(&r, &cfg, 3, 4) - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_picks_cheapest_pt_and_candidate() {
        let mut ds = Dataset::new(config());
        let fixed = ds.add_resource(Resource::new("Crew").with_capacity(4).with_hourly_rate(1.0));
        let cheap = ds.add_resource(Resource::new("Cheap").with_hourly_rate(1.0));
        let dear = ds.add_resource(Resource::new("Dear").with_hourly_rate(5.0));
        let grp = ds.add_resource_group(ResourceGroup::new("Ms", vec![dear, cheap]));
        let j = ds.add_job(Job::new("J"));
        // Two crew sizes: 2 units for 6 slots (12) or 4 units for 2 slots (8).
        let op = ds.add_op(
            j,
            JobOp::new("o")
                .with_cap_pt(fixed, 2, 6)
                .with_cap_pt(fixed, 4, 2)
                .with_requirement(ResourceRequirement::new(fixed).unbound())
                .with_group_requirement(ResourceGroupRequirement::new(grp)),
        );
        // Option table mentions only the crew, so open up the group.
        ds.op_mut(op).cap_pt.push(crate::models::CapPtOption {
            resource: cheap,
            capacity: 1,
            processing_time: 2,
        });
        ds.op_mut(op).cap_pt.push(crate::models::CapPtOption {
            resource: dear,
            capacity: 1,
            processing_time: 2,
        });
        ds.op_mut(op).group_requirements[0].capacity = Some(1);

        let mut seeder = CostSeeder::new();
        seeder.build(&ds, &mut SmallRng::seed_from_u64(7));
        let seed = seeder.seed(op).unwrap();
        assert_eq!(seed.processing_time, 2);
        // Member order is [dear, cheap]; cheap sits at index 1.
        assert_eq!(seed.resource_choices, vec![1]);
        assert!((seed.cost - (8.0 + 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_skips_frozen_and_single_choice_ops() {
        let mut ds = Dataset::new(config());
        let m = ds.add_resource(Resource::new("M").with_hourly_rate(1.0));
        let j = ds.add_job(Job::new("J"));
        let single = ds.add_op(
            j,
            JobOp::new("single").with_processing_time(3).with_requirement(ResourceRequirement::new(m)),
        );
        let frozen = ds.add_op(
            j,
            JobOp::new("frozen")
                .with_processing_times(vec![2, 4])
                .with_requirement(ResourceRequirement::new(m))
                .frozen_at(0),
        );
        let mut seeder = CostSeeder::new();
        seeder.build(&ds, &mut SmallRng::seed_from_u64(1));
        assert!(seeder.seed(single).is_none());
        assert!(seeder.seed(frozen).is_none());
        assert!(seeder.is_empty());
    }

    #[test]
    fn test_tie_break_is_deterministic_per_seed_and_covers_both() {
        let mut ds = Dataset::new(config());
        let a = ds.add_resource(Resource::new("A").with_hourly_rate(1.0));
        let b = ds.add_resource(Resource::new("B").with_hourly_rate(1.0));
        let grp = ds.add_resource_group(ResourceGroup::new("AB", vec![a, b]));
        let j = ds.add_job(Job::new("J"));
        let op = ds.add_op(
            j,
            JobOp::new("o")
                .with_processing_time(4)
                .with_group_requirement(ResourceGroupRequirement::new(grp)),
        );

        let pick = |seed: u64| {
            let mut s = CostSeeder::new();
            s.build(&ds, &mut SmallRng::seed_from_u64(seed));
            s.seed(op).map(|c| c.resource_choices[0])
        };
        assert_eq!(pick(3), pick(3));
        let seen: std::collections::HashSet<_> = (0..64).filter_map(pick).collect();
        assert_eq!(seen.len(), 2);
    }
}
