//! Lexicographic rule engine.
//!
//! Each job is scored once per rule; jobs are then ordered by comparing
//! the score vectors rule by rule, with scores closer than `epsilon`
//! counting as tied.
//!
//! # Reference
//! Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use std::cmp::Ordering;
use std::sync::Arc;

use super::{DispatchingRule, RuleScore, SchedulingContext};
use crate::models::Job;

/// How ties are broken after all rules are exhausted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TieBreaker {
    /// Keep the input order.
    #[default]
    Stable,
    /// Deterministic by job id.
    ById,
}

/// A composable rule engine for job prioritization.
///
/// The first rule decides; later rules only break its ties.
///
/// # Example
/// ```
/// use u_jobshop::dispatching::{RuleEngine, TieBreaker};
/// use u_jobshop::dispatching::rules;
///
/// let engine = RuleEngine::new()
///     .with_rule(rules::Edd)
///     .with_tie_breaker(rules::LatenessCost)
///     .with_final_tie_breaker(TieBreaker::ById);
/// assert_eq!(engine.rule_names(), vec!["EDD", "LATENESS-COST"]);
/// ```
#[derive(Clone)]
pub struct RuleEngine {
    rules: Vec<Arc<dyn DispatchingRule>>,
    tie_breaker: TieBreaker,
    epsilon: f64,
}

impl RuleEngine {
    /// Creates an empty rule engine.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            tie_breaker: TieBreaker::Stable,
            epsilon: 1e-9,
        }
    }

    /// Makes `rule` the primary rule. Rules added before it become tie-breakers.
    pub fn with_rule<R: DispatchingRule + 'static>(mut self, rule: R) -> Self {
        self.rules.insert(0, Arc::new(rule));
        self
    }

    /// Appends a tie-breaking rule.
    pub fn with_tie_breaker<R: DispatchingRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Sets the final tie-breaking strategy.
    pub fn with_final_tie_breaker(mut self, tie_breaker: TieBreaker) -> Self {
        self.tie_breaker = tie_breaker;
        self
    }

    /// Sets the tolerance under which two scores tie.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon.abs();
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Score vector of one job, one entry per rule in decision order.
    pub fn scores(&self, job: &Job, context: &SchedulingContext) -> Vec<RuleScore> {
        self.rules.iter().map(|r| r.evaluate(job, context)).collect()
    }

    /// Sorts jobs by priority (highest priority first).
    pub fn sort<'a>(&self, jobs: &[&'a Job], context: &SchedulingContext) -> Vec<&'a Job> {
        let mut keyed: Vec<(Vec<RuleScore>, &'a Job)> = jobs
            .iter()
            .map(|&j| (self.scores(j, context), j))
            .collect();
        keyed.sort_by(|(sa, a), (sb, b)| self.compare(sa, sb).then_with(|| self.final_order(a, b)));
        keyed.into_iter().map(|(_, j)| j).collect()
    }

    fn compare(&self, a: &[RuleScore], b: &[RuleScore]) -> Ordering {
        a.iter()
            .zip(b)
            .find(|(x, y)| (*x - *y).abs() > self.epsilon)
            .map_or(Ordering::Equal, |(x, y)| x.total_cmp(y))
    }

    fn final_order(&self, a: &Job, b: &Job) -> Ordering {
        match self.tie_breaker {
            TieBreaker::Stable => Ordering::Equal,
            TieBreaker::ById => a.id.cmp(&b.id),
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field("rules", &self.rule_names())
            .field("tie_breaker", &self.tie_breaker)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatching::rules;
    use crate::models::JobId;

    fn make_job(id: usize, due: i64, lateness_cost: f64) -> Job {
        let mut job = Job::new(format!("J{id}"))
            .with_due(due)
            .with_lateness_cost(lateness_cost);
        job.id = JobId(id);
        job
    }

    fn ids(sorted: &[&Job]) -> Vec<usize> {
        sorted.iter().map(|j| j.id.index()).collect()
    }

    #[test]
    fn test_edd_ordering() {
        let jobs = [
            make_job(0, 50, 0.0),
            make_job(1, 10, 0.0),
            make_job(2, i64::MAX, 0.0),
        ];
        let refs: Vec<&Job> = jobs.iter().collect();
        let ctx = SchedulingContext::at_time(0);
        let engine = RuleEngine::new().with_rule(rules::Edd);
        assert_eq!(ids(&engine.sort(&refs, &ctx)), vec![1, 0, 2]);
    }

    #[test]
    fn test_tie_breaker_only_on_ties() {
        let jobs = [
            make_job(0, 10, 1.0),
            make_job(1, 10, 5.0),
            make_job(2, 5, 0.0),
        ];
        let refs: Vec<&Job> = jobs.iter().collect();
        let ctx = SchedulingContext::at_time(0);
        let engine = RuleEngine::new()
            .with_tie_breaker(rules::LatenessCost)
            .with_rule(rules::Edd);

        // EDD stays primary even though it was added second
        assert_eq!(engine.rule_names(), vec!["EDD", "LATENESS-COST"]);
        assert_eq!(ids(&engine.sort(&refs, &ctx)), vec![2, 1, 0]);
    }

    #[test]
    fn test_final_tie_breaker() {
        let jobs = [make_job(3, 10, 0.0), make_job(1, 10, 0.0)];
        let refs: Vec<&Job> = jobs.iter().collect();
        let ctx = SchedulingContext::at_time(0);

        let stable = RuleEngine::new().with_rule(rules::Edd);
        assert_eq!(ids(&stable.sort(&refs, &ctx)), vec![3, 1]);

        let by_id = stable.with_final_tie_breaker(TieBreaker::ById);
        assert_eq!(ids(&by_id.sort(&refs, &ctx)), vec![1, 3]);
    }

    #[test]
    fn test_epsilon_ties() {
        // due dates 2 apart tie under epsilon 2.5; costs 4 apart do not
        let jobs = [make_job(0, 10, 1.0), make_job(1, 12, 5.0)];
        let refs: Vec<&Job> = jobs.iter().collect();
        let ctx = SchedulingContext::at_time(0);
        let engine = RuleEngine::new()
            .with_rule(rules::Edd)
            .with_tie_breaker(rules::LatenessCost)
            .with_epsilon(2.5);
        assert_eq!(ids(&engine.sort(&refs, &ctx)), vec![1, 0]);

        let strict = engine.with_epsilon(0.5);
        assert_eq!(ids(&strict.sort(&refs, &ctx)), vec![0, 1]);
    }

    #[test]
    fn test_empty_jobs() {
        let ctx = SchedulingContext::at_time(0);
        let engine = RuleEngine::new().with_rule(rules::Edd);
        assert!(engine.sort(&[], &ctx).is_empty());
    }

    #[test]
    fn test_scores() {
        let job = make_job(0, 200, 2.0);
        let ctx = SchedulingContext::at_time(0);
        let engine = RuleEngine::new()
            .with_rule(rules::Edd)
            .with_tie_breaker(rules::LatenessCost);
        let scores = engine.scores(&job, &ctx);
        assert_eq!(scores.len(), 2);
        assert!((scores[0] - 200.0).abs() < 1e-10);
        assert!((scores[1] + 2.0).abs() < 1e-10);
    }
}
