//! Population management.
//!
//! This module provides the population container the mutation engine acts on:
//! genotype storage, subpopulation bookkeeping and virtual subpopulation
//! activation.

use crate::base::{Allele, AlleleMode, GenotypeArena};
use crate::errors::{MutationError, PopulationError};
use crate::genome::{AlleleCursor, GenomeStructure, Members};
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut, Range};
use std::sync::Arc;
use tracing::debug;

/// Selects a subpopulation, optionally narrowed to one of its virtual
/// subpopulations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubPopId {
    pub sp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vsp: Option<usize>,
}

impl SubPopId {
    pub const fn new(sp: usize) -> Self {
        Self { sp, vsp: None }
    }

    pub const fn virtual_subpop(sp: usize, vsp: usize) -> Self {
        Self { sp, vsp: Some(vsp) }
    }

    #[inline]
    pub fn is_virtual(&self) -> bool {
        self.vsp.is_some()
    }
}

impl From<usize> for SubPopId {
    fn from(sp: usize) -> Self {
        Self::new(sp)
    }
}

/// Rule that divides every subpopulation into virtual subpopulations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VirtualSplitter {
    /// Individual index ranges relative to the start of the subpopulation.
    /// Ranges are clipped to the subpopulation size.
    Range(Vec<Range<usize>>),
    /// Consecutive blocks holding the given proportions of the subpopulation.
    Proportion(Vec<f64>),
}

impl VirtualSplitter {
    /// Number of virtual subpopulations defined by this splitter.
    pub fn num_vsps(&self) -> usize {
        match self {
            Self::Range(ranges) => ranges.len(),
            Self::Proportion(props) => props.len(),
        }
    }

    pub fn validate(&self) -> Result<(), PopulationError> {
        match self {
            Self::Range(ranges) => {
                if let Some(r) = ranges.iter().find(|r| r.start > r.end) {
                    return Err(PopulationError::InvalidSplitter(format!(
                        "range {}..{} is reversed",
                        r.start, r.end
                    )));
                }
            }
            Self::Proportion(props) => {
                if props.iter().any(|p| !p.is_finite() || *p < 0.0) {
                    return Err(PopulationError::InvalidSplitter(
                        "proportions must be finite and non-negative".into(),
                    ));
                }
                let total: f64 = props.iter().sum();
                if (total - 1.0).abs() > 1e-6 {
                    return Err(PopulationError::InvalidSplitter(format!(
                        "proportions sum to {total}, expected 1"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Population indices of the members of virtual subpopulation `vsp` of a
    /// subpopulation occupying `block`.
    fn members(&self, vsp: usize, block: Range<usize>) -> Arc<[usize]> {
        let size = block.len();
        let local = match self {
            Self::Range(ranges) => {
                let r = &ranges[vsp];
                r.start.min(size)..r.end.min(size)
            }
            Self::Proportion(props) => {
                let cum_before: f64 = props[..vsp].iter().sum();
                let start = (cum_before * size as f64).round() as usize;
                let end = ((cum_before + props[vsp]) * size as f64).round() as usize;
                start.min(size)..end.min(size)
            }
        };
        (block.start + local.start..block.start + local.end).collect()
    }
}

/// A population of individuals sharing one genome structure.
///
/// Individuals of the same subpopulation are stored contiguously; the
/// subpopulations follow each other in index order.
#[derive(Debug, Clone)]
pub struct Population {
    /// Population ID
    id: Arc<str>,
    structure: GenomeStructure,
    genotypes: GenotypeArena,
    subpop_sizes: Vec<usize>,
    splitter: Option<VirtualSplitter>,
    mode: AlleleMode,
    /// Generation counter
    generation: usize,
    /// Replicate index, only used for diagnostics
    replicate: usize,
    /// Currently activated virtual subpopulation
    active: Option<SubPopId>,
}

impl Population {
    /// Create a population whose alleles are all 0.
    pub fn new(
        id: impl Into<Arc<str>>,
        structure: GenomeStructure,
        subpop_sizes: Vec<usize>,
        mode: AlleleMode,
    ) -> Self {
        let total: usize = subpop_sizes.iter().sum();
        let genotypes = GenotypeArena::filled(structure.genotype_size(), total, 0);
        Self {
            id: id.into(),
            structure,
            genotypes,
            subpop_sizes,
            splitter: None,
            mode,
            generation: 0,
            replicate: 0,
            active: None,
        }
    }

    /// Create a population from a flat genotype buffer laid out
    /// `[individual][ploidy copy][locus]`.
    ///
    /// # Errors
    /// Returns an error if the buffer length does not match the structure and
    /// subpopulation sizes, or if an allele does not fit the allele mode.
    pub fn from_genotypes(
        id: impl Into<Arc<str>>,
        structure: GenomeStructure,
        subpop_sizes: Vec<usize>,
        mode: AlleleMode,
        alleles: Vec<Allele>,
    ) -> Result<Self, PopulationError> {
        let total: usize = subpop_sizes.iter().sum();
        let expected = total * structure.genotype_size();
        if alleles.len() != expected {
            return Err(PopulationError::GenotypeLength {
                expected,
                found: alleles.len(),
            });
        }
        if let Some(&bad) = alleles
            .iter()
            .find(|&&a| u32::from(a) > mode.max_allele())
        {
            return Err(PopulationError::AlleleOutOfRange {
                allele: i64::from(bad),
                max: mode.max_allele(),
            });
        }
        let mut pop = Self::new(id, structure, subpop_sizes, mode);
        pop.genotypes.as_mut_slice().copy_from_slice(&alleles);
        Ok(pop)
    }

    /// Attach a virtual splitter used to resolve `SubPopId`s with a `vsp`.
    pub fn with_splitter(mut self, splitter: VirtualSplitter) -> Result<Self, PopulationError> {
        splitter.validate()?;
        self.splitter = Some(splitter);
        Ok(self)
    }

    /// Get population ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Increment the generation counter.
    pub fn increment_generation(&mut self) {
        self.generation += 1;
    }

    pub fn replicate(&self) -> usize {
        self.replicate
    }

    pub fn set_replicate(&mut self, replicate: usize) {
        self.replicate = replicate;
    }

    /// Get the number of individuals in the population.
    pub fn size(&self) -> usize {
        self.subpop_sizes.iter().sum()
    }

    /// Check if population is empty.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn structure(&self) -> &GenomeStructure {
        &self.structure
    }

    #[inline]
    pub fn ploidy(&self) -> usize {
        self.structure.ploidy()
    }

    #[inline]
    pub fn num_loci(&self) -> usize {
        self.structure.num_loci()
    }

    #[inline]
    pub fn mode(&self) -> AlleleMode {
        self.mode
    }

    pub fn num_subpops(&self) -> usize {
        self.subpop_sizes.len()
    }

    pub fn subpop_sizes(&self) -> &[usize] {
        &self.subpop_sizes
    }

    pub fn splitter(&self) -> Option<&VirtualSplitter> {
        self.splitter.as_ref()
    }

    /// Number of virtual subpopulations per subpopulation.
    pub fn num_virtual_subpops(&self) -> usize {
        self.splitter.as_ref().map_or(0, VirtualSplitter::num_vsps)
    }

    /// Index range of the individuals of subpopulation `sp`.
    pub fn subpop_range(&self, sp: usize) -> Range<usize> {
        let begin: usize = self.subpop_sizes[..sp].iter().sum();
        begin..begin + self.subpop_sizes[sp]
    }

    /// Check that a subpopulation selector refers to an existing
    /// (virtual) subpopulation.
    pub fn check_subpop(&self, id: SubPopId) -> Result<(), MutationError> {
        if id.sp >= self.num_subpops() {
            return Err(MutationError::SubPopOutOfRange {
                subpop: id.sp,
                num_subpops: self.num_subpops(),
            });
        }
        if let Some(vsp) = id.vsp {
            let num_vsps = self.num_virtual_subpops();
            if vsp >= num_vsps {
                return Err(MutationError::VirtualSubPopOutOfRange { vsp, num_vsps });
            }
        }
        Ok(())
    }

    /// Individuals visible through a subpopulation selector.
    pub fn members(&self, id: SubPopId) -> Result<Members, MutationError> {
        self.check_subpop(id)?;
        let block = self.subpop_range(id.sp);
        Ok(match (id.vsp, &self.splitter) {
            (Some(vsp), Some(splitter)) => Members::Listed(splitter.members(vsp, block)),
            _ => Members::Contiguous(block),
        })
    }

    /// Number of individuals visible through a subpopulation selector.
    pub fn subpop_size(&self, id: SubPopId) -> Result<usize, MutationError> {
        Ok(self.members(id)?.len())
    }

    /// Activate a (virtual) subpopulation.
    ///
    /// The returned guard restricts iteration to the selected individuals and
    /// deactivates the subpopulation when dropped.
    pub fn activate(&mut self, id: SubPopId) -> Result<ActiveSubPop<'_>, MutationError> {
        let members = self.members(id)?;
        if id.is_virtual() {
            debug!(subpop = id.sp, vsp = ?id.vsp, size = members.len(), "activate virtual subpopulation");
            self.active = Some(id);
        }
        Ok(ActiveSubPop {
            pop: self,
            id,
            members,
        })
    }

    /// The virtual subpopulation currently activated, if any.
    pub fn active_virtual_subpop(&self) -> Option<SubPopId> {
        self.active
    }

    pub fn genotypes(&self) -> &GenotypeArena {
        &self.genotypes
    }

    pub fn genotypes_mut(&mut self) -> &mut GenotypeArena {
        &mut self.genotypes
    }

    /// Genotype block of one individual.
    pub fn genotype(&self, ind: usize) -> &[Allele] {
        self.genotypes.individual(ind)
    }

    /// Flat arena index of an allele.
    #[inline]
    pub fn allele_index(&self, ind: usize, copy: usize, locus: usize) -> usize {
        ind * self.structure.genotype_size() + copy * self.num_loci() + locus
    }

    pub fn allele(&self, ind: usize, copy: usize, locus: usize) -> Allele {
        self.genotypes.get(self.allele_index(ind, copy, locus))
    }

    pub fn set_allele(&mut self, ind: usize, copy: usize, locus: usize, allele: Allele) {
        let index = self.allele_index(ind, copy, locus);
        self.genotypes.set(index, allele);
    }

    /// Change subpopulation sizes. Shrinking drops individuals from the end
    /// of a subpopulation, growing appends individuals carrying allele 0.
    pub fn resize(&mut self, sizes: &[usize]) -> Result<(), PopulationError> {
        if sizes.len() != self.num_subpops() {
            return Err(PopulationError::SubPopCount {
                expected: self.num_subpops(),
                found: sizes.len(),
            });
        }
        // back to front so earlier subpopulation offsets stay valid
        for sp in (0..self.num_subpops()).rev() {
            let range = self.subpop_range(sp);
            let new_size = sizes[sp];
            if new_size < range.len() {
                self.genotypes
                    .remove_range(range.start + new_size..range.end);
            } else {
                self.genotypes
                    .insert_filled(range.end, new_size - range.len(), 0);
            }
            self.subpop_sizes[sp] = new_size;
        }
        Ok(())
    }

    /// Allele frequencies at `locus` over every chromosome copy. Index `a` of
    /// the result is the frequency of allele `a`; the vector is as long as the
    /// largest allele observed plus one.
    pub fn allele_frequencies(&self, locus: usize) -> Vec<f64> {
        let mut counts: Vec<usize> = Vec::new();
        for ind in 0..self.size() {
            for copy in 0..self.ploidy() {
                let a = self.allele(ind, copy, locus) as usize;
                if a >= counts.len() {
                    counts.resize(a + 1, 0);
                }
                counts[a] += 1;
            }
        }
        let total = (self.size() * self.ploidy()) as f64;
        counts.into_iter().map(|c| c as f64 / total).collect()
    }
}

/// A subpopulation activated for iteration.
///
/// Dereferences to the population so genotypes can be edited while the
/// activation is held. Dropping the guard deactivates a virtual subpopulation.
#[derive(Debug)]
pub struct ActiveSubPop<'a> {
    pop: &'a mut Population,
    id: SubPopId,
    members: Members,
}

impl ActiveSubPop<'_> {
    pub fn id(&self) -> SubPopId {
        self.id
    }

    pub fn members(&self) -> &Members {
        &self.members
    }

    /// Number of visible individuals.
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Cursor over `locus` across the visible chromosome copies.
    pub fn allele_cursor(&self, locus: usize) -> AlleleCursor {
        AlleleCursor::new(
            self.members.clone(),
            self.pop.ploidy(),
            self.pop.num_loci(),
            locus,
        )
    }
}

impl Deref for ActiveSubPop<'_> {
    type Target = Population;

    fn deref(&self) -> &Population {
        self.pop
    }
}

impl DerefMut for ActiveSubPop<'_> {
    fn deref_mut(&mut self) -> &mut Population {
        self.pop
    }
}

impl Drop for ActiveSubPop<'_> {
    fn drop(&mut self) {
        if self.id.is_virtual() {
            debug!(subpop = self.id.sp, vsp = ?self.id.vsp, "deactivate virtual subpopulation");
            self.pop.active = None;
        }
    }
}
