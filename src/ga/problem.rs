//! Chain evaluation at the optimizer boundary.
//!
//! An optimizer sees a [`ChainEvaluator`]: it sizes and seeds fresh
//! chromosomes, tells mutation operators where their segments live, and
//! decodes a chromosome into a schedule. Fitness is the makespan of the
//! decoded schedule; failed or misconfigured evaluations score infinity.
//!
//! # Reference
//! Cheng et al. (1996), "A Tutorial Survey of JSSP using GA"

use rand::Rng;
use tracing::{debug, info};

use super::chromosome::Chromosome;
use super::operators::OperatorHandle;
use crate::chain::{EvalContext, SelectorChain};
use crate::error::{ScheduleError, ScheduleResult};
use crate::models::{Dataset, Schedule};
use crate::propagation::Manager;
use crate::seeder::CostSeeder;

/// Outcome of one chromosome evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// The chain produced a schedule.
    Scheduled(Schedule),
    /// A constraint could not be satisfied, or the dataset is defective.
    Failed(ScheduleError),
    /// The chain and its operators do not fit together.
    Misconfigured(ScheduleError),
}

impl Evaluation {
    /// Whether a schedule was produced.
    pub fn is_scheduled(&self) -> bool {
        matches!(self, Self::Scheduled(_))
    }

    /// The produced schedule, if any.
    pub fn schedule(&self) -> Option<&Schedule> {
        match self {
            Self::Scheduled(s) => Some(s),
            _ => None,
        }
    }

    /// The reported cause, if the evaluation did not produce a schedule.
    pub fn error(&self) -> Option<&ScheduleError> {
        match self {
            Self::Scheduled(_) => None,
            Self::Failed(e) | Self::Misconfigured(e) => Some(e),
        }
    }
}

/// Decodes chromosomes through a selector chain.
///
/// # Example
/// ```
/// use u_jobshop::chain::{SelectorChain, Stage, OpSequenceSelector};
/// use u_jobshop::config::SchedulerConfig;
/// use u_jobshop::ga::ChainEvaluator;
/// use u_jobshop::models::{Dataset, Job, JobOp, Resource, ResourceRequirement};
/// use rand::rngs::SmallRng;
/// use rand::SeedableRng;
///
/// let mut ds = Dataset::new(SchedulerConfig::default());
/// let m = ds.add_resource(Resource::new("M1"));
/// let j = ds.add_job(Job::new("J1").with_due(20));
/// ds.add_op(j, JobOp::new("O1").with_processing_time(5).with_requirement(ResourceRequirement::new(m)));
///
/// let chain = SelectorChain::new().with_stage(Stage::OpSequence(OpSequenceSelector::new()));
/// let mut rng = SmallRng::seed_from_u64(42);
/// let mut evaluator = ChainEvaluator::new(chain);
/// evaluator.prepare(&ds, &mut rng);
///
/// let mut individual = evaluator.new_individual(&ds, &mut rng);
/// let outcome = evaluator.evaluate(&mut ds, &mut individual);
/// assert_eq!(outcome.schedule().map(|s| s.makespan()), Some(5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChainEvaluator {
    chain: SelectorChain,
    seeder: CostSeeder,
}

impl ChainEvaluator {
    /// Wraps a chain. Call [`ChainEvaluator::prepare`] before evaluating.
    pub fn new(chain: SelectorChain) -> Self {
        Self {
            chain,
            seeder: CostSeeder::new(),
        }
    }

    /// Lays the chain out for `dataset` and computes cost seeds.
    ///
    /// Returns the chromosome length.
    pub fn prepare<R: Rng>(&mut self, dataset: &Dataset, rng: &mut R) -> usize {
        let size = self.chain.initialize(dataset, 0);
        self.seeder.build(dataset, rng);
        info!(genes = size, seeds = self.seeder.len(), "chain prepared");
        size
    }

    pub fn chain(&self) -> &SelectorChain {
        &self.chain
    }

    pub fn seeder(&self) -> &CostSeeder {
        &self.seeder
    }

    /// Chromosome length fixed by the last `prepare`.
    pub fn string_size(&self) -> usize {
        self.chain.len()
    }

    /// A fresh, seeded chromosome.
    pub fn new_individual<R: Rng>(&self, dataset: &Dataset, rng: &mut R) -> Chromosome {
        let mut chromosome = Chromosome::new(self.chain.len());
        self.chain
            .initialize_ind(&mut chromosome, dataset, &self.seeder, rng);
        chromosome
    }

    /// Binds a mutation operator to its segment.
    pub fn bind_operator(&self, handle: &mut OperatorHandle) -> ScheduleResult<()> {
        self.chain.set_string_base(handle)
    }

    /// Decodes `chromosome` against `dataset` and scores it.
    ///
    /// The dataset is reset first, so consecutive evaluations do not see
    /// each other's placements. Repairs are left in the chromosome's
    /// shadow copy for the caller to accept or discard.
    pub fn evaluate(&self, dataset: &mut Dataset, chromosome: &mut Chromosome) -> Evaluation {
        dataset.reset();
        let mut manager = Manager::new(dataset);
        let outcome = manager.propagate().and_then(|()| {
            let mut ctx = EvalContext::new(dataset, &mut manager);
            self.chain.run(chromosome, &mut ctx)
        });

        match outcome {
            Ok(()) => {
                let schedule = dataset.to_schedule();
                chromosome.fitness = schedule.makespan() as f64;
                debug!(makespan = schedule.makespan(), "chromosome scheduled");
                Evaluation::Scheduled(schedule)
            }
            Err(err) => {
                chromosome.fitness = f64::INFINITY;
                debug!(%err, "chromosome rejected");
                match err {
                    ScheduleError::Configuration(_) => Evaluation::Misconfigured(err),
                    _ => Evaluation::Failed(err),
                }
            }
        }
    }
}
