use super::Allele;
use serde::{Deserialize, Serialize};

/// Contiguous allele storage for a whole population.
///
/// Every individual occupies one fixed-size block of `stride` alleles laid out
/// as `[ploidy copy][locus]`, and blocks are stored back to back. This keeps
/// the genotypes of neighbouring individuals adjacent in memory and lets
/// cursors address an allele with a single index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenotypeArena {
    /// Flat allele buffer.
    alleles: Vec<Allele>,
    /// Alleles per individual (ploidy × total loci).
    stride: usize,
}

impl GenotypeArena {
    /// Create an arena holding `num_individuals` blocks filled with `value`.
    pub fn filled(stride: usize, num_individuals: usize, value: Allele) -> Self {
        Self {
            alleles: vec![value; stride * num_individuals],
            stride,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.alleles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.alleles.is_empty()
    }

    /// Read the allele at a flat arena index.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn get(&self, index: usize) -> Allele {
        self.alleles[index]
    }

    /// Overwrite the allele at a flat arena index.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn set(&mut self, index: usize, allele: Allele) {
        self.alleles[index] = allele;
    }

    #[inline]
    pub fn as_slice(&self) -> &[Allele] {
        &self.alleles
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Allele] {
        &mut self.alleles
    }

    /// Genotype block of one individual.
    #[inline]
    pub fn individual(&self, index: usize) -> &[Allele] {
        &self.alleles[index * self.stride..(index + 1) * self.stride]
    }

    /// Insert `count` blocks filled with `value` before individual `at`.
    pub fn insert_filled(&mut self, at: usize, count: usize, value: Allele) {
        let start = at * self.stride;
        self.alleles
            .splice(start..start, std::iter::repeat(value).take(count * self.stride));
    }

    /// Remove individuals `range` (in individual units).
    pub fn remove_range(&mut self, range: std::ops::Range<usize>) {
        self.alleles
            .drain(range.start * self.stride..range.end * self.stride);
    }
}
