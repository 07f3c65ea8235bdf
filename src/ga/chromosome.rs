//! Flat integer chromosome with an optional shadow copy.
//!
//! # Encoding
//!
//! The gene array is partitioned into contiguous segments, one per
//! selector stage, in chain order. Only the owning stage interprets a
//! segment. Sequencing segments use [`UNDEFINED_GENE`] for ranks the
//! forward construction has not assigned yet.
//!
//! # Shadow
//!
//! Repairs never touch the genes themselves; they go into a full-length
//! shadow copy that the optimizer later accepts or discards.

/// Sentinel for an unassigned sequencing gene.
pub const UNDEFINED_GENE: u32 = u32::MAX;

/// Minimal optimizer-side view of a candidate solution.
///
/// Lower fitness = better (minimization convention).
pub trait Individual {
    /// Current fitness.
    fn fitness(&self) -> f64;
    /// Stores an evaluated fitness.
    fn set_fitness(&mut self, fitness: f64);
}

/// Candidate solution decoded by the selector chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Chromosome {
    genes: Vec<u32>,
    shadow: Option<Vec<u32>>,
    /// Fitness value (lower = better).
    pub fitness: f64,
}

impl Individual for Chromosome {
    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }
}

impl Default for Chromosome {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Chromosome {
    /// Creates a zero-filled chromosome of `len` genes.
    pub fn new(len: usize) -> Self {
        Self {
            genes: vec![0; len],
            shadow: None,
            fitness: f64::INFINITY,
        }
    }

    /// Wraps existing genes.
    pub fn from_genes(genes: Vec<u32>) -> Self {
        Self {
            genes,
            shadow: None,
            fitness: f64::INFINITY,
        }
    }

    /// Number of genes.
    #[inline]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Whether the chromosome has no genes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Reads a gene.
    #[inline]
    pub fn get(&self, index: usize) -> u32 {
        self.genes[index]
    }

    /// Writes a gene.
    #[inline]
    pub fn set(&mut self, index: usize, value: u32) {
        self.genes[index] = value;
    }

    /// All genes.
    pub fn genes(&self) -> &[u32] {
        &self.genes
    }

    /// Genes of one segment.
    pub fn segment(&self, base: usize, len: usize) -> &[u32] {
        &self.genes[base..base + len]
    }

    /// Resizes the gene array, zero-filling new genes. Drops any shadow.
    pub fn set_size(&mut self, len: usize) {
        self.genes.resize(len, 0);
        self.shadow = None;
    }

    /// Whether a shadow copy is pending.
    pub fn has_shadow(&self) -> bool {
        self.shadow.is_some()
    }

    /// Pending shadow copy.
    pub fn shadow(&self) -> Option<&[u32]> {
        self.shadow.as_deref()
    }

    /// Creates the shadow copy from the current genes if none exists.
    pub fn create_shadow(&mut self) -> &mut [u32] {
        let genes = &self.genes;
        self.shadow.get_or_insert_with(|| genes.clone())
    }

    /// Writes a repaired gene into the shadow copy, creating it first.
    pub fn write_shadow(&mut self, index: usize, value: u32) {
        self.create_shadow()[index] = value;
    }

    /// Writes a gene and mirrors it into the shadow copy when one exists.
    pub fn set_with_shadow(&mut self, index: usize, value: u32) {
        self.genes[index] = value;
        if let Some(shadow) = self.shadow.as_mut() {
            shadow[index] = value;
        }
    }

    /// Replaces the genes with the shadow copy. Returns whether one existed.
    pub fn accept_shadow(&mut self) -> bool {
        match self.shadow.take() {
            Some(shadow) => {
                self.genes = shadow;
                true
            }
            None => false,
        }
    }

    /// Drops the shadow copy.
    pub fn discard_shadow(&mut self) {
        self.shadow = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_access() {
        let mut c = Chromosome::new(4);
        c.set(2, 9);
        assert_eq!(c.get(2), 9);
        assert_eq!(c.segment(1, 2), &[0, 9]);
        assert_eq!(c.len(), 4);
        assert!(c.fitness.is_infinite());
    }

    #[test]
    fn test_shadow_lifecycle() {
        let mut c = Chromosome::from_genes(vec![1, 2, 3]);
        assert!(!c.has_shadow());

        c.write_shadow(1, 7);
        assert!(c.has_shadow());
        assert_eq!(c.genes(), &[1, 2, 3]);
        assert_eq!(c.shadow(), Some(&[1, 7, 3][..]));

        // A second repair reuses the same shadow.
        c.write_shadow(2, 8);
        assert_eq!(c.shadow(), Some(&[1, 7, 8][..]));

        assert!(c.accept_shadow());
        assert_eq!(c.genes(), &[1, 7, 8]);
        assert!(!c.has_shadow());
        assert!(!c.accept_shadow());
    }

    #[test]
    fn test_discard_and_mirror() {
        let mut c = Chromosome::from_genes(vec![0, 0]);
        c.set_with_shadow(0, 5);
        assert!(!c.has_shadow());
        c.create_shadow();
        c.set_with_shadow(1, 6);
        assert_eq!(c.shadow(), Some(&[5, 6][..]));
        c.discard_shadow();
        assert_eq!(c.genes(), &[5, 6]);
        assert!(c.shadow().is_none());
    }

    #[test]
    fn test_set_size_drops_shadow() {
        let mut c = Chromosome::from_genes(vec![3]);
        c.write_shadow(0, 4);
        c.set_size(3);
        assert_eq!(c.genes(), &[3, 0, 0]);
        assert!(!c.has_shadow());
    }

    #[test]
    fn test_individual_fitness() {
        let mut c = Chromosome::new(1);
        c.set_fitness(12.0);
        assert_eq!(Individual::fitness(&c), 12.0);
    }
}
