//! Resource requirements.
//!
//! A [`ResourceRequirement`] names one concrete resource. A
//! [`ResourceGroupRequirement`] names a group of interchangeable resources
//! and is resolved to exactly one member per evaluation.

use serde::{Deserialize, Serialize};

use super::{ResourceGroupId, ResourceId};

/// A requirement on one specific resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequirement {
    /// Required resource.
    pub resource: ResourceId,
    /// Required units; `None` picks the capacity from the option table.
    pub capacity: Option<u32>,
    /// Units actually booked in the current evaluation.
    pub scheduled_capacity: Option<u32>,
}

impl ResourceRequirement {
    /// Requires one unit of `resource`.
    pub fn new(resource: ResourceId) -> Self {
        Self {
            resource,
            capacity: Some(1),
            scheduled_capacity: None,
        }
    }

    /// Requires `capacity` units.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Leaves the capacity to the option table.
    pub fn unbound(mut self) -> Self {
        self.capacity = None;
        self
    }
}

/// An alternative requirement over a resource group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceGroupRequirement {
    /// Candidate group.
    pub group: ResourceGroupId,
    /// Required units; `None` picks the capacity from the option table.
    pub capacity: Option<u32>,
    /// Candidates listed here come first, in this order.
    pub preferred: Vec<ResourceId>,
    /// Resource imposed from outside the search (e.g. a running job).
    pub forced_resource: Option<ResourceId>,
    /// Resource chosen in the current evaluation.
    pub chosen_resource: Option<ResourceId>,
    /// Units booked on the chosen resource.
    pub chosen_capacity: Option<u32>,
}

impl ResourceGroupRequirement {
    /// Requires one unit from `group`.
    pub fn new(group: ResourceGroupId) -> Self {
        Self {
            group,
            capacity: Some(1),
            preferred: Vec::new(),
            forced_resource: None,
            chosen_resource: None,
            chosen_capacity: None,
        }
    }

    /// Requires `capacity` units.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Leaves the capacity to the option table.
    pub fn unbound(mut self) -> Self {
        self.capacity = None;
        self
    }

    /// Sets the preferred candidate ordering.
    pub fn with_preference(mut self, preferred: Vec<ResourceId>) -> Self {
        self.preferred = preferred;
        self
    }

    /// Forces the requirement onto one resource.
    pub fn forced_to(mut self, resource: ResourceId) -> Self {
        self.forced_resource = Some(resource);
        self
    }

    /// Orders group members: preferred ones first (in preference order),
    /// then the rest in group order.
    pub fn order_candidates(&self, members: &[ResourceId]) -> Vec<ResourceId> {
        let mut ordered: Vec<ResourceId> = self
            .preferred
            .iter()
            .copied()
            .filter(|r| members.contains(r))
            .collect();
        ordered.extend(members.iter().copied().filter(|r| !self.preferred.contains(r)));
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_capacity() {
        let req = ResourceRequirement::new(ResourceId(1)).with_capacity(3);
        assert_eq!(req.capacity, Some(3));
        assert_eq!(req.clone().unbound().capacity, None);
    }

    #[test]
    fn test_candidate_preference() {
        let members = vec![ResourceId(0), ResourceId(1), ResourceId(2)];
        let req = ResourceGroupRequirement::new(ResourceGroupId(0))
            .with_preference(vec![ResourceId(2), ResourceId(9)]);
        assert_eq!(
            req.order_candidates(&members),
            vec![ResourceId(2), ResourceId(0), ResourceId(1)]
        );
    }
}
