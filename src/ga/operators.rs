//! Mutation operator handles.
//!
//! An operator works on exactly one decision dimension. Before use it asks
//! the selector chain for the offset of that dimension's segment through
//! [`SelectorChain::set_string_base`](crate::chain::SelectorChain::set_string_base).
//!
//! # Usage
//!
//! ```
//! use u_jobshop::ga::operators::{OperatorHandle, OperatorKind};
//!
//! let handle = OperatorHandle::new(OperatorKind::ReleaseTime);
//! assert!(!handle.is_bound());
//! ```

use rand::Rng;

use super::Chromosome;
use crate::config::SchedulerConfig;

/// Decision dimension an operator mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    AltJob,
    AltResource,
    CapacityMultiple,
    ProcessingTime,
    ResourceCapacity,
    JobSequence,
    OpSequence,
    ReleaseTime,
}

/// Operator-side view of a chromosome segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorHandle {
    /// Dimension the operator mutates.
    pub kind: OperatorKind,
    /// Segment offset, filled in by the chain.
    pub string_base: Option<usize>,
    /// Segment length, filled in by the chain.
    pub string_len: usize,
}

impl OperatorHandle {
    /// Creates an unbound handle.
    pub fn new(kind: OperatorKind) -> Self {
        Self {
            kind,
            string_base: None,
            string_len: 0,
        }
    }

    /// Whether the chain has assigned a segment.
    pub fn is_bound(&self) -> bool {
        self.string_base.is_some()
    }

    /// Gene indices of the bound segment (empty when unbound).
    pub fn range(&self) -> std::ops::Range<usize> {
        match self.string_base {
            Some(base) => base..base + self.string_len,
            None => 0..0,
        }
    }

    /// Picks a random gene index in the segment.
    pub fn random_index<R: Rng>(&self, rng: &mut R) -> Option<usize> {
        let range = self.range();
        if range.is_empty() {
            return None;
        }
        Some(rng.random_range(range))
    }
}

/// Moves a release-time gene by `config.release_step` slots up or down,
/// never below `floor`.
///
/// Returns the new gene value.
pub fn nudge_release(
    chromosome: &mut Chromosome,
    index: usize,
    config: &SchedulerConfig,
    up: bool,
    floor: u32,
) -> u32 {
    let current = i64::from(chromosome.get(index));
    let step = config.release_step.max(1);
    let moved = if up { current + step } else { current - step };
    let value = moved.clamp(i64::from(floor), i64::from(u32::MAX - 1)) as u32;
    chromosome.set(index, value);
    value
}

/// Swaps two random ranks inside a sequencing segment.
pub fn swap_ranks<R: Rng>(chromosome: &mut Chromosome, handle: &OperatorHandle, rng: &mut R) {
    let (Some(i), Some(j)) = (handle.random_index(rng), handle.random_index(rng)) else {
        return;
    };
    let (a, b) = (chromosome.get(i), chromosome.get(j));
    chromosome.set(i, b);
    chromosome.set(j, a);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_unbound_handle() {
        let h = OperatorHandle::new(OperatorKind::OpSequence);
        assert!(h.range().is_empty());
        assert!(h.random_index(&mut SmallRng::seed_from_u64(0)).is_none());
    }

    #[test]
    fn test_random_index_stays_in_segment() {
        let mut h = OperatorHandle::new(OperatorKind::ProcessingTime);
        h.string_base = Some(3);
        h.string_len = 4;
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..50 {
            let i = h.random_index(&mut rng).unwrap();
            assert!((3..7).contains(&i));
        }
    }

    #[test]
    fn test_nudge_release_honors_floor() {
        let cfg = SchedulerConfig::new().with_release_step(4);
        let mut c = Chromosome::from_genes(vec![10]);
        assert_eq!(nudge_release(&mut c, 0, &cfg, true, 8), 14);
        assert_eq!(nudge_release(&mut c, 0, &cfg, false, 8), 10);
        assert_eq!(nudge_release(&mut c, 0, &cfg, false, 8), 8);
        assert_eq!(nudge_release(&mut c, 0, &cfg, false, 8), 8);
    }

    #[test]
    fn test_nudge_release_uses_configured_step() {
        let mut c = Chromosome::from_genes(vec![10]);
        assert_eq!(nudge_release(&mut c, 0, &SchedulerConfig::default(), true, 0), 11);

        let mut cfg = SchedulerConfig::new().with_release_step(15);
        assert_eq!(nudge_release(&mut c, 0, &cfg, true, 0), 26);

        // a hand-edited zero step still moves the gene
        cfg.release_step = 0;
        assert_eq!(nudge_release(&mut c, 0, &cfg, false, 0), 25);
    }

    #[test]
    fn test_swap_ranks_is_permutation() {
        let mut h = OperatorHandle::new(OperatorKind::JobSequence);
        h.string_base = Some(1);
        h.string_len = 3;
        let mut c = Chromosome::from_genes(vec![99, 0, 1, 2]);
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..10 {
            swap_ranks(&mut c, &h, &mut rng);
        }
        assert_eq!(c.get(0), 99);
        let mut seg = c.segment(1, 3).to_vec();
        seg.sort_unstable();
        assert_eq!(seg, vec![0, 1, 2]);
    }
}
