//! Input validation for scheduling datasets.
//!
//! Checks structural integrity of the dataset before any chromosome is
//! evaluated. Detects:
//! - Dangling resource, group, job and operation ids
//! - Job groups with fewer than two members
//! - Operations without any processing time
//! - Inverted capacity ranges
//! - Circular precedence dependencies (explicit edges plus the implicit
//!   chain of every ordered job)
//!
//! # Reference
//! Tarjan (1972), "Depth-First Search and Linear Graph Algorithms"

use crate::models::{Dataset, OpType};
use crate::propagation::CycleGroups;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// An id points outside its arena.
    DanglingReference,
    /// A job group cannot offer an alternative.
    UndersizedJobGroup,
    /// A schedulable operation has no processing time to choose from.
    EmptyProcessingTimes,
    /// A resource's capacity range is empty or its level lies outside it.
    InvalidCapacityRange,
    /// Precedence graph contains a cycle.
    CyclicDependency,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a dataset.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_dataset(dataset: &Dataset) -> ValidationResult {
    let mut errors = Vec::new();
    let n_res = dataset.resources.len();
    let n_groups = dataset.resource_groups.len();
    let n_jobs = dataset.jobs.len();
    let n_ops = dataset.ops.len();

    for r in &dataset.resources {
        if r.min_capacity > r.max_capacity
            || r.capacity < r.min_capacity
            || r.capacity > r.max_capacity
        {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidCapacityRange,
                format!(
                    "Resource '{}' has capacity {} outside [{}, {}]",
                    r.name, r.capacity, r.min_capacity, r.max_capacity
                ),
            ));
        }
    }

    for g in &dataset.resource_groups {
        for m in g.resources.iter().filter(|m| m.index() >= n_res) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DanglingReference,
                format!("Resource group '{}' lists unknown resource {m}", g.name),
            ));
        }
    }

    for g in &dataset.job_groups {
        if g.len() < 2 {
            errors.push(ValidationError::new(
                ValidationErrorKind::UndersizedJobGroup,
                format!("Job group '{}' has {} member(s)", g.name, g.len()),
            ));
        }
        for j in g.jobs.iter().filter(|j| j.index() >= n_jobs) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DanglingReference,
                format!("Job group '{}' lists unknown job {j}", g.name),
            ));
        }
    }

    for job in &dataset.jobs {
        for o in job.ops.iter().filter(|o| o.index() >= n_ops) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DanglingReference,
                format!("Job '{}' lists unknown operation {o}", job.name),
            ));
        }
    }

    for op in &dataset.ops {
        if op.job.index() >= n_jobs {
            errors.push(ValidationError::new(
                ValidationErrorKind::DanglingReference,
                format!("Operation '{}' belongs to unknown job {}", op.name, op.job),
            ));
        }
        for req in op.requirements.iter().filter(|r| r.resource.index() >= n_res) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DanglingReference,
                format!(
                    "Operation '{}' requires unknown resource {}",
                    op.name, req.resource
                ),
            ));
        }
        for gr in &op.group_requirements {
            if gr.group.index() >= n_groups {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DanglingReference,
                    format!(
                        "Operation '{}' requires unknown resource group {}",
                        op.name, gr.group
                    ),
                ));
                continue;
            }
            let group = dataset.resource_group(gr.group);
            let named = gr.preferred.iter().chain(gr.forced_resource.iter());
            for r in named.filter(|r| !group.contains(**r)) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DanglingReference,
                    format!(
                        "Operation '{}' names {r}, which is not in group '{}'",
                        op.name, group.name
                    ),
                ));
            }
        }
        for opt in op.cap_pt.iter().filter(|o| o.resource.index() >= n_res) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DanglingReference,
                format!(
                    "Operation '{}' has an option on unknown resource {}",
                    op.name, opt.resource
                ),
            ));
        }
        if op.is_schedulable() && op.op_type != OpType::Milestone && op.processing_times.is_empty()
        {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyProcessingTimes,
                format!("Operation '{}' has no processing time", op.name),
            ));
        }
    }

    for p in &dataset.precedences {
        for o in [p.pred, p.succ].into_iter().filter(|o| o.index() >= n_ops) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DanglingReference,
                format!("Precedence references unknown operation {o}"),
            ));
        }
    }

    // Cycle detection only makes sense on a well-formed graph
    if errors.is_empty() {
        if let Some(cycle_err) = detect_cycles(dataset) {
            errors.push(cycle_err);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Detects cycles in the precedence graph.
///
/// # Algorithm
/// Strongly connected components of the graph (see [`CycleGroups`]). An
/// edge whose ends share a component, a self-loop included, closes a
/// cycle.
///
/// # Reference
/// Tarjan (1972), "Depth-First Search and Linear Graph Algorithms"
fn detect_cycles(dataset: &Dataset) -> Option<ValidationError> {
    let mut edges: Vec<(usize, usize)> = dataset
        .precedences
        .iter()
        .map(|p| (p.pred.index(), p.succ.index()))
        .collect();
    for job in dataset.jobs.iter().filter(|j| j.ordered) {
        for w in job.ops.windows(2) {
            edges.push((w[0].index(), w[1].index()));
        }
    }

    let groups = CycleGroups::new(dataset.ops.len(), &edges);
    let (node, _) = edges
        .iter()
        .copied()
        .find(|&(p, s)| groups.group_of(p) == groups.group_of(s))?;
    Some(ValidationError::new(
        ValidationErrorKind::CyclicDependency,
        format!(
            "Circular dependency detected involving operation '{}'",
            dataset.ops[node].name
        ),
    ))
}
