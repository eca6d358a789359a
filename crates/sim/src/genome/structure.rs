use crate::errors::PopulationError;
use serde::{Deserialize, Serialize};

/// Layout of the genome shared by every individual of a population.
///
/// Loci are numbered globally across chromosomes: the loci of chromosome 0
/// come first, then those of chromosome 1, and so on. Each individual carries
/// `ploidy` copies of the whole set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomeStructure {
    ploidy: usize,
    loci_per_chromosome: Vec<usize>,
    /// Cumulative locus offsets, `chrom_bounds[c]..chrom_bounds[c + 1]` are the
    /// loci of chromosome `c`.
    #[serde(skip)]
    chrom_bounds: Vec<usize>,
}

impl GenomeStructure {
    /// Create a new genome layout.
    ///
    /// # Errors
    /// Returns an error if `ploidy` is zero or any chromosome has no loci.
    pub fn new(ploidy: usize, loci_per_chromosome: Vec<usize>) -> Result<Self, PopulationError> {
        if ploidy == 0 {
            return Err(PopulationError::ZeroPloidy);
        }
        if let Some(chrom) = loci_per_chromosome.iter().position(|&n| n == 0) {
            return Err(PopulationError::EmptyChromosome(chrom));
        }
        let chrom_bounds = bounds_of(&loci_per_chromosome);
        Ok(Self {
            ploidy,
            loci_per_chromosome,
            chrom_bounds,
        })
    }

    #[inline]
    pub fn ploidy(&self) -> usize {
        self.ploidy
    }

    #[inline]
    pub fn num_chromosomes(&self) -> usize {
        self.loci_per_chromosome.len()
    }

    pub fn loci_per_chromosome(&self) -> &[usize] {
        &self.loci_per_chromosome
    }

    /// Total number of loci on one chromosome copy set.
    #[inline]
    pub fn num_loci(&self) -> usize {
        self.chrom_bounds.last().copied().unwrap_or(0)
    }

    /// Number of alleles stored per individual.
    #[inline]
    pub fn genotype_size(&self) -> usize {
        self.ploidy * self.num_loci()
    }

    /// Chromosome that holds `locus`.
    ///
    /// # Panics
    /// Panics if `locus` is not smaller than `num_loci()`.
    pub fn chrom_of(&self, locus: usize) -> usize {
        assert!(locus < self.num_loci(), "locus {locus} out of range");
        // chrom_bounds is sorted; the last bound <= locus identifies the chromosome
        self.chrom_bounds.partition_point(|&b| b <= locus) - 1
    }

    /// First locus of a chromosome.
    #[inline]
    pub fn chrom_begin(&self, chrom: usize) -> usize {
        self.chrom_bounds[chrom]
    }

    /// One past the last locus of a chromosome.
    #[inline]
    pub fn chrom_end(&self, chrom: usize) -> usize {
        self.chrom_bounds[chrom + 1]
    }

    /// Rebuild derived fields after deserialization.
    pub(crate) fn rebuild(&mut self) {
        self.chrom_bounds = bounds_of(&self.loci_per_chromosome);
    }
}

fn bounds_of(loci_per_chromosome: &[usize]) -> Vec<usize> {
    std::iter::once(0)
        .chain(loci_per_chromosome.iter().scan(0, |acc, &n| {
            *acc += n;
            Some(*acc)
        }))
        .collect()
}
