//! Deterministic default sequence.
//!
//! Used when an init-opt construction fails: jobs are ranked by
//! increasing due time, then decreasing lateness cost, then decreasing
//! successor depth, then id; each job's operations by decreasing
//! successor depth, then id. Operation ranks are global, in job order.
//!
//! The result depends only on the dataset and the precedence structure,
//! never on an RNG or on previous evaluations.

use crate::chain::is_decidable;
use crate::dispatching::{rules, RuleEngine, SchedulingContext, TieBreaker};
use crate::models::{Dataset, Job, JobId, OpId};
use crate::propagation::Manager;

/// Ranked jobs and operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultSequence {
    /// Jobs, rank 0 first.
    pub jobs: Vec<JobId>,
    /// Operations, rank 0 first.
    pub ops: Vec<OpId>,
}

fn ranking_engine() -> RuleEngine {
    RuleEngine::new()
        .with_rule(rules::Edd)
        .with_tie_breaker(rules::LatenessCost)
        .with_tie_breaker(rules::SuccessorDepth)
        .with_final_tie_breaker(TieBreaker::ById)
}

fn sequenced_ops<'a>(dataset: &'a Dataset, job: &'a Job) -> impl Iterator<Item = OpId> + 'a {
    job.ops
        .iter()
        .copied()
        .filter(move |&o| is_decidable(dataset.op(o)))
}

/// Computes the default sequence of every job that has sequenced operations.
pub fn default_sequence(dataset: &Dataset, manager: &Manager) -> DefaultSequence {
    let jobs: Vec<&Job> = dataset
        .jobs
        .iter()
        .filter(|j| sequenced_ops(dataset, j).next().is_some())
        .collect();

    let mut context = SchedulingContext::at_time(dataset.config.origin);
    for job in &jobs {
        let depth = sequenced_ops(dataset, job)
            .map(|o| manager.successor_depth(o))
            .max()
            .unwrap_or(0);
        context.successor_depth.insert(job.id, depth);
    }

    let ordered = ranking_engine().sort(&jobs, &context);
    let mut sequence = DefaultSequence::default();
    for job in ordered {
        sequence.jobs.push(job.id);
        let mut ops: Vec<OpId> = sequenced_ops(dataset, job).collect();
        ops.sort_by_key(|&o| (std::cmp::Reverse(manager.successor_depth(o)), o));
        sequence.ops.extend(ops);
    }
    sequence
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::models::{JobOp, Resource, ResourceRequirement};

    fn dataset() -> Dataset {
        let mut ds = Dataset::new(SchedulerConfig::default());
        let m = ds.add_resource(Resource::new("M"));
        let op = |name: &str| {
            JobOp::new(name)
                .with_processing_time(2)
                .with_requirement(ResourceRequirement::new(m))
        };
        let late = ds.add_job(Job::new("late").with_due(90));
        let cheap = ds.add_job(Job::new("cheap").with_due(40).with_lateness_cost(1.0));
        let dear = ds.add_job(Job::new("dear").with_due(40).with_lateness_cost(5.0));
        let shallow = ds.add_job(Job::new("shallow").with_due(90).unordered());
        ds.add_op(late, op("l1"));
        ds.add_op(late, op("l2"));
        ds.add_op(late, op("l3"));
        ds.add_op(cheap, op("c1"));
        ds.add_op(dear, op("d1"));
        ds.add_op(shallow, op("s1"));
        ds.add_op(shallow, op("s2"));
        ds
    }

    #[test]
    fn test_job_ranking() {
        let ds = dataset();
        let mgr = Manager::new(&ds);
        let seq = default_sequence(&ds, &mgr);
        // due 40 first (dear before cheap), then the deeper of the due-90 jobs
        assert_eq!(seq.jobs, vec![JobId(2), JobId(1), JobId(0), JobId(3)]);
    }

    #[test]
    fn test_op_ranking_follows_depth() {
        let ds = dataset();
        let mgr = Manager::new(&ds);
        let seq = default_sequence(&ds, &mgr);
        assert_eq!(
            seq.ops,
            vec![OpId(4), OpId(3), OpId(0), OpId(1), OpId(2), OpId(5), OpId(6)]
        );
    }

    #[test]
    fn test_deterministic() {
        let ds = dataset();
        let mgr = Manager::new(&ds);
        let first = default_sequence(&ds, &mgr);
        for _ in 0..5 {
            assert_eq!(default_sequence(&ds, &mgr), first);
        }
    }

    #[test]
    fn test_frozen_ops_are_not_ranked() {
        let mut ds = dataset();
        ds.ops[3].frozen = true;
        let mgr = Manager::new(&ds);
        let seq = default_sequence(&ds, &mgr);
        assert!(!seq.jobs.contains(&JobId(1)));
        assert!(!seq.ops.contains(&OpId(3)));
    }
}
