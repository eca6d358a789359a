//! Deterministic allele assignment.

use crate::base::Allele;
use crate::errors::MutationError;
use crate::simulation::Population;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Sets given loci of given individuals to a fixed allele every time it is
/// applied. No random trial is involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointMutator {
    loci: Vec<usize>,
    inds: Vec<usize>,
    /// Chromosome copies to mutate.
    ploidy: Vec<usize>,
    allele: Allele,
}

impl PointMutator {
    /// Mutate the first chromosome copy of `inds` at `loci` to `allele`.
    pub fn new(loci: Vec<usize>, inds: Vec<usize>, allele: Allele) -> Self {
        Self {
            loci,
            inds,
            ploidy: vec![0],
            allele,
        }
    }

    /// Mutate the given chromosome copies instead of the first one.
    pub fn with_ploidy(mut self, ploidy: Vec<usize>) -> Self {
        self.ploidy = ploidy;
        self
    }

    pub fn loci(&self) -> &[usize] {
        &self.loci
    }

    pub fn inds(&self) -> &[usize] {
        &self.inds
    }

    pub fn ploidy(&self) -> &[usize] {
        &self.ploidy
    }

    pub fn allele(&self) -> Allele {
        self.allele
    }

    fn validate(&self, pop: &Population) -> Result<(), MutationError> {
        let size = pop.size();
        if let Some(&index) = self.inds.iter().find(|&&i| i >= size) {
            return Err(MutationError::IndividualOutOfRange { index, size });
        }
        let ploidy = pop.ploidy();
        if let Some(&copy) = self.ploidy.iter().find(|&&p| p >= ploidy) {
            return Err(MutationError::PloidyOutOfRange { copy, ploidy });
        }
        let num_loci = pop.num_loci();
        if let Some(&locus) = self.loci.iter().find(|&&l| l >= num_loci) {
            return Err(MutationError::LocusOutOfRange { locus, num_loci });
        }
        let max = pop.mode().max_allele();
        if u32::from(self.allele) > max {
            return Err(MutationError::AlleleOutOfRange {
                allele: i64::from(self.allele),
                max,
            });
        }
        Ok(())
    }

    /// Assign the allele. Returns the number of alleles written.
    ///
    /// # Errors
    /// Nothing is written if an individual, chromosome copy, locus or the
    /// allele itself is out of range for `pop`.
    pub fn apply(&self, pop: &mut Population) -> Result<usize, MutationError> {
        self.validate(pop)?;
        let mut count = 0;
        for &locus in &self.loci {
            for &ind in &self.inds {
                for &copy in &self.ploidy {
                    trace!(
                        generation = pop.generation(),
                        ind,
                        copy,
                        locus,
                        to = self.allele,
                        "point mutation"
                    );
                    pop.set_allele(ind, copy, locus, self.allele);
                    count += 1;
                }
            }
        }
        Ok(count)
    }
}
