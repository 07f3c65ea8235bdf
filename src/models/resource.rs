//! Resource and resource-group models.
//!
//! Resources are the machines, workers and tools operations run on. Each
//! resource has a capacity range stepped by a fixed increment, an
//! availability flag and a set of per-period unit cost rates. Resource
//! groups collect interchangeable resources for alternative requirements.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1.2

use serde::{Deserialize, Serialize};

use super::{ResourceGroupId, ResourceId};

/// Unit cost rates per period. Each rate is the cost of one capacity unit
/// held for one full period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostRates {
    pub monthly: Option<f64>,
    pub weekly: Option<f64>,
    pub daily: Option<f64>,
    pub hourly: Option<f64>,
}

impl CostRates {
    /// Whether no rate is set.
    pub fn is_empty(&self) -> bool {
        self.monthly.is_none()
            && self.weekly.is_none()
            && self.daily.is_none()
            && self.hourly.is_none()
    }
}

/// A resource that operations are assigned to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Arena id (assigned by the dataset).
    pub id: ResourceId,
    /// Human-readable name.
    pub name: String,
    /// Current capacity (units available simultaneously).
    pub capacity: u32,
    /// Lowest capacity the capacity selector may pick.
    pub min_capacity: u32,
    /// Highest capacity the capacity selector may pick.
    pub max_capacity: u32,
    /// Capacity increment between min and max.
    pub step: u32,
    /// Unavailable resources drop out of alternative domains.
    pub available: bool,
    pub rates: CostRates,
}

impl Resource {
    /// Creates an available unit-capacity resource.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ResourceId(0),
            name: name.into(),
            capacity: 1,
            min_capacity: 1,
            max_capacity: 1,
            step: 1,
            available: true,
            rates: CostRates::default(),
        }
    }

    /// Sets a fixed capacity.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self.min_capacity = capacity;
        self.max_capacity = capacity;
        self
    }

    /// Sets a variable capacity range; the current capacity starts at `min`.
    pub fn with_capacity_range(mut self, min: u32, max: u32, step: u32) -> Self {
        self.min_capacity = min;
        self.max_capacity = max;
        self.step = step.max(1);
        self.capacity = min;
        self
    }

    /// Marks the resource unavailable.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Sets the hourly rate.
    pub fn with_hourly_rate(mut self, rate: f64) -> Self {
        self.rates.hourly = Some(rate);
        self
    }

    /// Sets the daily rate.
    pub fn with_daily_rate(mut self, rate: f64) -> Self {
        self.rates.daily = Some(rate);
        self
    }

    /// Sets the weekly rate.
    pub fn with_weekly_rate(mut self, rate: f64) -> Self {
        self.rates.weekly = Some(rate);
        self
    }

    /// Sets the monthly rate.
    pub fn with_monthly_rate(mut self, rate: f64) -> Self {
        self.rates.monthly = Some(rate);
        self
    }

    /// Whether the capacity selector has more than one choice.
    pub fn has_capacity_choice(&self) -> bool {
        self.max_capacity > self.min_capacity && self.max_capacity - self.min_capacity >= self.step
    }

    /// Capacity levels from min to max in steps.
    pub fn capacity_levels(&self) -> Vec<u32> {
        let step = self.step.max(1) as usize;
        (self.min_capacity..=self.max_capacity).step_by(step).collect()
    }
}

/// A set of interchangeable resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceGroup {
    /// Arena id (assigned by the dataset).
    pub id: ResourceGroupId,
    /// Human-readable name.
    pub name: String,
    /// Members in declaration order.
    pub resources: Vec<ResourceId>,
}

impl ResourceGroup {
    /// Creates a group.
    pub fn new(name: impl Into<String>, resources: Vec<ResourceId>) -> Self {
        Self {
            id: ResourceGroupId(0),
            name: name.into(),
            resources,
        }
    }

    /// Whether `resource` is a member.
    pub fn contains(&self, resource: ResourceId) -> bool {
        self.resources.contains(&resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_builder() {
        let r = Resource::new("Lathe")
            .with_capacity(2)
            .with_hourly_rate(30.0)
            .with_daily_rate(500.0);

        assert_eq!(r.name, "Lathe");
        assert_eq!(r.capacity, 2);
        assert!(!r.has_capacity_choice());
        assert_eq!(r.rates.hourly, Some(30.0));
        assert!(r.rates.weekly.is_none());
        assert!(!r.rates.is_empty());
    }

    #[test]
    fn test_capacity_levels() {
        let r = Resource::new("Crew").with_capacity_range(2, 8, 3);
        assert!(r.has_capacity_choice());
        assert_eq!(r.capacity_levels(), vec![2, 5, 8]);
        assert_eq!(r.capacity, 2);
    }

    #[test]
    fn test_capacity_range_narrower_than_step() {
        let r = Resource::new("Oven").with_capacity_range(4, 5, 2);
        assert!(!r.has_capacity_choice());
        assert_eq!(r.capacity_levels(), vec![4]);
    }

    #[test]
    fn test_group_membership() {
        let g = ResourceGroup::new("Mills", vec![ResourceId(0), ResourceId(3)]);
        assert!(g.contains(ResourceId(3)));
        assert!(!g.contains(ResourceId(1)));
    }
}
