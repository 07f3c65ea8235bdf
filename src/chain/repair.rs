//! Nearest-feasible gene repair.
//!
//! One canonical rule serves every stage whose domain can narrow:
//!
//! - a value inside the domain is kept;
//! - a value below the first / above the last feasible value clamps to
//!   that boundary;
//! - otherwise the closer of the two neighbouring feasible values wins,
//!   exact midpoint ties going to the lower one.
//!
//! Repaired values are written to the chromosome's shadow copy only.

use tracing::debug;

use crate::error::{ScheduleError, ScheduleResult};
use crate::ga::Chromosome;

/// Nearest value of a sorted, deduplicated domain.
///
/// # Errors
/// `Propagation` when the domain is empty.
pub fn nearest_feasible(domain: &[i64], value: i64) -> ScheduleResult<i64> {
    let (Some(&first), Some(&last)) = (domain.first(), domain.last()) else {
        return Err(ScheduleError::propagation("empty decision domain"));
    };
    if value <= first {
        return Ok(first);
    }
    if value >= last {
        return Ok(last);
    }
    match domain.binary_search(&value) {
        Ok(_) => Ok(value),
        Err(pos) => {
            let (lo, hi) = (domain[pos - 1], domain[pos]);
            Ok(if hi - value < value - lo { hi } else { lo })
        }
    }
}

/// Nearest point of the grid `min, min + step, ..` not above `max`.
pub fn nearest_on_grid(min: i64, max: i64, step: i64, value: i64) -> i64 {
    let step = step.max(1);
    if max <= min || value <= min {
        return min;
    }
    let top = min + (max - min) / step * step;
    if value >= top {
        return top;
    }
    let lo = min + (value - min) / step * step;
    let hi = lo + step;
    if hi - value < value - lo {
        hi
    } else {
        lo
    }
}

/// Gene value as a domain value.
#[inline]
pub fn gene_value(gene: u32) -> i64 {
    i64::from(gene)
}

/// Domain value as a gene, saturating below the sequencing sentinel.
#[inline]
pub fn to_gene(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX - 1)) as u32
}

/// Decodes the gene at `index` against `domain`, staging a repair in the
/// shadow copy when the stored value is infeasible.
///
/// A feasible gene leaves the chromosome untouched.
pub fn repair_gene(chromosome: &mut Chromosome, index: usize, domain: &[i64]) -> ScheduleResult<i64> {
    let stored = gene_value(chromosome.get(index));
    if domain.binary_search(&stored).is_ok() {
        return Ok(stored);
    }
    let repaired = nearest_feasible(domain, stored)?;
    debug!(index, stored, repaired, "gene repaired");
    chromosome.write_shadow(index, to_gene(repaired));
    Ok(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_inside_and_exact() {
        let d = [2, 5, 9];
        assert_eq!(nearest_feasible(&d, 5).unwrap(), 5);
        assert_eq!(nearest_feasible(&d, 6).unwrap(), 5);
        assert_eq!(nearest_feasible(&d, 8).unwrap(), 9);
    }

    #[test]
    fn test_midpoint_tie_goes_lower() {
        assert_eq!(nearest_feasible(&[4, 8], 6).unwrap(), 4);
        assert_eq!(nearest_feasible(&[10, 20, 30], 25).unwrap(), 20);
    }

    #[test]
    fn test_boundaries_clamp() {
        let d = [3, 7];
        assert_eq!(nearest_feasible(&d, 0).unwrap(), 3);
        assert_eq!(nearest_feasible(&d, 100).unwrap(), 7);
        assert_eq!(nearest_feasible(&[5], 1).unwrap(), 5);
    }

    #[test]
    fn test_empty_domain_fails() {
        let err = nearest_feasible(&[], 3).unwrap_err();
        assert!(matches!(err, ScheduleError::Propagation(_)));
    }

    #[test]
    fn test_grid() {
        // grid 2, 5, 8
        assert_eq!(nearest_on_grid(2, 9, 3, 5), 5);
        assert_eq!(nearest_on_grid(2, 9, 3, 6), 5);
        assert_eq!(nearest_on_grid(2, 9, 3, 7), 8);
        assert_eq!(nearest_on_grid(2, 9, 3, 9), 8);
        assert_eq!(nearest_on_grid(2, 9, 3, 0), 2);
        // midpoint of 2 and 4
        assert_eq!(nearest_on_grid(2, 10, 2, 3), 2);
    }

    #[test]
    fn test_repair_feasible_gene_is_noop() {
        let mut c = Chromosome::from_genes(vec![5, 9]);
        assert_eq!(repair_gene(&mut c, 1, &[1, 9]).unwrap(), 9);
        assert!(!c.has_shadow());
    }

    #[test]
    fn test_repair_writes_shadow_only() {
        let mut c = Chromosome::from_genes(vec![7]);
        assert_eq!(repair_gene(&mut c, 0, &[4, 12]).unwrap(), 4);
        assert_eq!(c.get(0), 7);
        assert_eq!(c.shadow(), Some(&[4][..]));
    }
}
