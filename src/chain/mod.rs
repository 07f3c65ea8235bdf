//! Decision selector chain.
//!
//! A chain is an ordered list of stages, each owning one decision
//! dimension and one contiguous chromosome segment, followed by the
//! forward construction as terminal stage. Decoding runs the stages in
//! composition order: each reads its genes, applies them to the dataset
//! and the propagation manager, then hands over to the next.
//!
//! # Segment Layout
//!
//! Stage `i`'s segment starts at the sum of the sizes of the stages
//! composed before it. Segment sizes are fixed at [`SelectorChain::initialize`]
//! time and do not depend on the decisions of an evaluation.
//!
//! # Stages
//!
//! | Stage | Gene | Governs |
//! |-------|------|---------|
//! | [`AltJobSelector`] | member index | every job group |
//! | [`AltResourceSelector`] | candidate index | group requirements with several members |
//! | [`CapacityMultipleSelector`] | multiple | interruptible ops with several multiples |
//! | [`ProcessingTimeSelector`] | processing time | ops with several processing times |
//! | [`ResourceCapacitySelector`] | capacity | resources with a capacity range |
//! | [`JobSequenceSelector`] | rank | jobs |
//! | [`OpSequenceSelector`] | rank | operations |
//! | [`ReleaseTimeSelector`] | slots after origin | root ops of released jobs |

mod alt_job;
mod alt_resource;
mod capacity_multiple;
mod processing_time;
pub mod repair;
mod release_time;
mod resource_capacity;
mod sequence;

pub use alt_job::AltJobSelector;
pub use alt_resource::AltResourceSelector;
pub use capacity_multiple::CapacityMultipleSelector;
pub use processing_time::ProcessingTimeSelector;
pub use release_time::ReleaseTimeSelector;
pub use resource_capacity::ResourceCapacitySelector;
pub use sequence::{JobSequenceSelector, OpSequenceSelector};

use rand::Rng;
use tracing::debug;

use crate::error::{ScheduleError, ScheduleResult};
use crate::ga::operators::{OperatorHandle, OperatorKind};
use crate::ga::Chromosome;
use crate::models::Dataset;
use crate::propagation::Manager;
use crate::scheduler::{ForwardConstruction, SequenceLayout};
use crate::seeder::CostSeeder;

/// Mutable state a stage decodes into.
#[derive(Debug)]
pub struct EvalContext<'a> {
    pub dataset: &'a mut Dataset,
    pub manager: &'a mut Manager,
}

impl<'a> EvalContext<'a> {
    /// Bundles a dataset with its manager.
    pub fn new(dataset: &'a mut Dataset, manager: &'a mut Manager) -> Self {
        Self { dataset, manager }
    }
}

/// Common contract of every decoding stage.
pub trait Selector {
    /// Decision dimension of the stage.
    fn kind(&self) -> OperatorKind;

    /// Genes the stage would own for the current dataset.
    fn own_size(&self, dataset: &Dataset) -> usize;

    /// Recomputes the governed instances, stores the segment offset and
    /// returns the segment size.
    fn initialize(&mut self, dataset: &Dataset, string_base: usize) -> usize;

    /// Offset of the stage's segment.
    fn string_base(&self) -> usize;

    /// Size of the stage's segment as of the last `initialize`.
    fn len(&self) -> usize;

    /// Whether the stage owns no genes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes default or seeded genes into a fresh chromosome.
    fn initialize_ind<R: Rng>(
        &self,
        chromosome: &mut Chromosome,
        dataset: &Dataset,
        seeder: &CostSeeder,
        rng: &mut R,
    );

    /// Decodes the segment and applies it.
    fn run(&self, chromosome: &mut Chromosome, ctx: &mut EvalContext<'_>) -> ScheduleResult<()>;
}

/// One decoding stage of a chain.
#[derive(Debug, Clone)]
pub enum Stage {
    AltJob(AltJobSelector),
    AltResource(AltResourceSelector),
    CapacityMultiple(CapacityMultipleSelector),
    ProcessingTime(ProcessingTimeSelector),
    ResourceCapacity(ResourceCapacitySelector),
    JobSequence(JobSequenceSelector),
    OpSequence(OpSequenceSelector),
    ReleaseTime(ReleaseTimeSelector),
}

macro_rules! each_stage {
    ($stage:expr, $s:ident => $body:expr) => {
        match $stage {
            Stage::AltJob($s) => $body,
            Stage::AltResource($s) => $body,
            Stage::CapacityMultiple($s) => $body,
            Stage::ProcessingTime($s) => $body,
            Stage::ResourceCapacity($s) => $body,
            Stage::JobSequence($s) => $body,
            Stage::OpSequence($s) => $body,
            Stage::ReleaseTime($s) => $body,
        }
    };
}

impl Stage {
    /// Whether an operator of `kind` mutates this stage's segment.
    pub fn owns(&self, kind: OperatorKind) -> bool {
        matches!(
            (self, kind),
            (Stage::AltJob(_), OperatorKind::AltJob)
                | (Stage::AltResource(_), OperatorKind::AltResource)
                | (Stage::CapacityMultiple(_), OperatorKind::CapacityMultiple)
                | (Stage::ProcessingTime(_), OperatorKind::ProcessingTime)
                | (Stage::ResourceCapacity(_), OperatorKind::ResourceCapacity)
                | (Stage::JobSequence(_), OperatorKind::JobSequence)
                | (Stage::OpSequence(_), OperatorKind::OpSequence)
                | (Stage::ReleaseTime(_), OperatorKind::ReleaseTime)
        )
    }

    pub fn kind(&self) -> OperatorKind {
        each_stage!(self, s => s.kind())
    }

    pub fn own_size(&self, dataset: &Dataset) -> usize {
        each_stage!(self, s => s.own_size(dataset))
    }

    pub fn initialize(&mut self, dataset: &Dataset, string_base: usize) -> usize {
        each_stage!(self, s => s.initialize(dataset, string_base))
    }

    pub fn string_base(&self) -> usize {
        each_stage!(self, s => s.string_base())
    }

    pub fn len(&self) -> usize {
        each_stage!(self, s => s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn initialize_ind<R: Rng>(
        &self,
        chromosome: &mut Chromosome,
        dataset: &Dataset,
        seeder: &CostSeeder,
        rng: &mut R,
    ) {
        each_stage!(self, s => s.initialize_ind(chromosome, dataset, seeder, rng))
    }

    pub fn run(&self, chromosome: &mut Chromosome, ctx: &mut EvalContext<'_>) -> ScheduleResult<()> {
        each_stage!(self, s => s.run(chromosome, ctx))
    }
}

/// Ordered stages plus the forward construction.
///
/// # Example
/// ```
/// use u_jobshop::chain::{SelectorChain, Stage, ProcessingTimeSelector, OpSequenceSelector};
/// use u_jobshop::config::SchedulerConfig;
/// use u_jobshop::models::Dataset;
///
/// let mut chain = SelectorChain::new()
///     .with_stage(Stage::ProcessingTime(ProcessingTimeSelector::new()))
///     .with_stage(Stage::OpSequence(OpSequenceSelector::new()));
/// let dataset = Dataset::new(SchedulerConfig::default());
/// assert_eq!(chain.initialize(&dataset, 0), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SelectorChain {
    stages: Vec<Stage>,
    terminal: ForwardConstruction,
    string_base: usize,
    size: usize,
}

impl SelectorChain {
    /// Creates a chain with no decision stages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage.
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Replaces the terminal stage.
    pub fn with_terminal(mut self, terminal: ForwardConstruction) -> Self {
        self.terminal = terminal;
        self
    }

    /// Stages in composition order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// The terminal stage.
    pub fn terminal(&self) -> &ForwardConstruction {
        &self.terminal
    }

    /// Total genes the chain would own for the current dataset.
    pub fn string_size(&self, dataset: &Dataset) -> usize {
        self.stages.iter().map(|s| s.own_size(dataset)).sum()
    }

    /// Size fixed by the last `initialize`.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the chain owns no genes.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Lays the segments out from `string_base` in composition order and
    /// hands the sequencing layout to the terminal. Returns the total size.
    pub fn initialize(&mut self, dataset: &Dataset, string_base: usize) -> usize {
        let mut base = string_base;
        let mut layout = SequenceLayout::default();
        for stage in &mut self.stages {
            let own = stage.initialize(dataset, base);
            debug!(kind = ?stage.kind(), base, own, "stage initialized");
            match stage {
                Stage::JobSequence(s) => layout.jobs = Some((base, s.jobs().to_vec())),
                Stage::OpSequence(s) => layout.ops = Some((base, s.ops().to_vec())),
                _ => {}
            }
            base += own;
        }
        self.terminal.set_layout(layout);
        self.string_base = string_base;
        self.size = base - string_base;
        self.size
    }

    /// Sizes a chromosome and fills every segment with default or seeded genes.
    pub fn initialize_ind<R: Rng>(
        &self,
        chromosome: &mut Chromosome,
        dataset: &Dataset,
        seeder: &CostSeeder,
        rng: &mut R,
    ) {
        chromosome.set_size(self.string_base + self.size);
        for stage in &self.stages {
            stage.initialize_ind(chromosome, dataset, seeder, rng);
        }
    }

    /// Decodes a chromosome: every stage in order, then the construction.
    pub fn run(&self, chromosome: &mut Chromosome, ctx: &mut EvalContext<'_>) -> ScheduleResult<()> {
        if chromosome.len() < self.string_base + self.size {
            return Err(ScheduleError::invariant(format!(
                "chromosome has {} genes, chain needs {}",
                chromosome.len(),
                self.string_base + self.size
            )));
        }
        for stage in &self.stages {
            debug!(kind = ?stage.kind(), base = stage.string_base(), "stage run");
            stage.run(chromosome, ctx)?;
        }
        self.terminal.run(chromosome, ctx)
    }

    /// Tells an operator where its segment lives.
    ///
    /// # Errors
    /// `Configuration` when no stage owns the operator's kind.
    pub fn set_string_base(&self, handle: &mut OperatorHandle) -> ScheduleResult<()> {
        let stage = self
            .stages
            .iter()
            .find(|s| s.owns(handle.kind))
            .ok_or_else(|| {
                ScheduleError::configuration(format!("no stage owns {:?} operators", handle.kind))
            })?;
        handle.string_base = Some(stage.string_base());
        handle.string_len = stage.len();
        Ok(())
    }
}

/// Whether `op` is decided by the selector stages at all.
pub(crate) fn is_decidable(op: &crate::models::JobOp) -> bool {
    op.is_schedulable() && !op.frozen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::models::{
        Job, JobGroup, JobOp, Resource, ResourceGroup, ResourceGroupRequirement,
        ResourceRequirement,
    };
    use rand::SeedableRng;

    fn rich_dataset() -> Dataset {
        let mut ds = Dataset::new(SchedulerConfig::default());
        let m0 = ds.add_resource(Resource::new("M0"));
        let m1 = ds.add_resource(Resource::new("M1"));
        let crew = ds.add_resource(Resource::new("Crew").with_capacity_range(1, 3, 1));
        let grp = ds.add_resource_group(ResourceGroup::new("Ms", vec![m0, m1]));

        let a = ds.add_job(Job::new("A").with_due(50).with_release(2));
        let b = ds.add_job(Job::new("B").with_due(80));
        let c = ds.add_job(Job::new("C").with_due(90));
        ds.add_op(
            a,
            JobOp::new("a1")
                .with_processing_times(vec![3, 5])
                .with_group_requirement(ResourceGroupRequirement::new(grp)),
        );
        ds.add_op(
            a,
            JobOp::new("a2")
                .with_processing_time(4)
                .with_capacity_multiples(vec![1, 2])
                .with_requirement(ResourceRequirement::new(crew)),
        );
        ds.add_op(b, JobOp::new("b1").with_processing_time(2).with_requirement(ResourceRequirement::new(m0)));
        ds.add_op(c, JobOp::new("c1").with_processing_time(2).with_requirement(ResourceRequirement::new(m1)));
        ds.add_job_group(JobGroup::new("BC", vec![b, c]));
        ds
    }

    fn all_stages() -> Vec<Stage> {
        vec![
            Stage::AltJob(AltJobSelector::new()),
            Stage::AltResource(AltResourceSelector::new()),
            Stage::CapacityMultiple(CapacityMultipleSelector::new()),
            Stage::ProcessingTime(ProcessingTimeSelector::new()),
            Stage::ResourceCapacity(ResourceCapacitySelector::new()),
            Stage::JobSequence(JobSequenceSelector::new()),
            Stage::OpSequence(OpSequenceSelector::new()),
            Stage::ReleaseTime(ReleaseTimeSelector::new()),
        ]
    }

    fn assert_partition(chain: &SelectorChain, total: usize) {
        let mut expected = 0;
        for stage in chain.stages() {
            assert_eq!(stage.string_base(), expected);
            expected += stage.len();
        }
        assert_eq!(expected, total);
    }

    #[test]
    fn test_segment_partition_for_several_orderings() {
        let ds = rich_dataset();
        let orders: [&[usize]; 4] = [
            &[0, 1, 2, 3, 4, 5, 6, 7],
            &[7, 6, 5, 4, 3, 2, 1, 0],
            &[3, 0, 6, 1, 7, 2, 5, 4],
            &[5, 3],
        ];
        for order in orders {
            let stages = all_stages();
            let mut chain = SelectorChain::new();
            for &i in order {
                chain = chain.with_stage(stages[i].clone());
            }
            let total = chain.initialize(&ds, 0);
            assert_eq!(total, chain.string_size(&ds));
            assert_partition(&chain, total);

            let mut c = Chromosome::new(0);
            let mut rng = rand::rngs::SmallRng::seed_from_u64(1);
            chain.initialize_ind(&mut c, &ds, &CostSeeder::new(), &mut rng);
            assert_eq!(c.len(), total);
        }
    }

    #[test]
    fn test_stage_sizes() {
        let ds = rich_dataset();
        let mut chain = SelectorChain::new();
        for s in all_stages() {
            chain = chain.with_stage(s);
        }
        chain.initialize(&ds, 0);
        let sizes: Vec<usize> = chain.stages().iter().map(|s| s.len()).collect();
        // groups, alt reqs, multiples, pts, capacities, jobs, ops, releases
        assert_eq!(sizes, vec![1, 1, 1, 1, 1, 3, 4, 1]);
    }

    #[test]
    fn test_nested_base_offset() {
        let ds = rich_dataset();
        let mut chain = SelectorChain::new()
            .with_stage(Stage::AltJob(AltJobSelector::new()))
            .with_stage(Stage::OpSequence(OpSequenceSelector::new()));
        assert_eq!(chain.initialize(&ds, 10), 5);
        assert_eq!(chain.stages()[1].string_base(), 11);
    }

    #[test]
    fn test_set_string_base() {
        let ds = rich_dataset();
        let mut chain = SelectorChain::new()
            .with_stage(Stage::AltJob(AltJobSelector::new()))
            .with_stage(Stage::ProcessingTime(ProcessingTimeSelector::new()));
        chain.initialize(&ds, 0);

        let mut handle = OperatorHandle::new(OperatorKind::ProcessingTime);
        chain.set_string_base(&mut handle).unwrap();
        assert_eq!(handle.string_base, Some(1));
        assert_eq!(handle.string_len, 1);

        let mut stray = OperatorHandle::new(OperatorKind::ReleaseTime);
        let err = chain.set_string_base(&mut stray).unwrap_err();
        assert!(matches!(err, ScheduleError::Configuration(_)));
        assert!(!stray.is_bound());
    }

    #[test]
    fn test_owns_matches_kind() {
        for stage in all_stages() {
            assert!(stage.owns(stage.kind()));
        }
        assert!(!Stage::AltJob(AltJobSelector::new()).owns(OperatorKind::OpSequence));
    }

    #[test]
    fn test_short_chromosome_is_invariant_violation() {
        let mut ds = rich_dataset();
        let mut chain = SelectorChain::new().with_stage(Stage::OpSequence(OpSequenceSelector::new()));
        chain.initialize(&ds, 0);
        let mut mgr = Manager::new(&ds);
        let mut c = Chromosome::new(1);
        let mut ctx = EvalContext::new(&mut ds, &mut mgr);
        assert!(matches!(
            chain.run(&mut c, &mut ctx),
            Err(ScheduleError::InvariantViolation(_))
        ));
    }
}
