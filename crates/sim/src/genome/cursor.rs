use std::ops::Range;
use std::sync::Arc;

/// The individuals currently visible in a (virtual) subpopulation.
///
/// A plain subpopulation is a contiguous block of individuals. An activated
/// virtual subpopulation is an arbitrary sorted subset of that block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Members {
    Contiguous(Range<usize>),
    Listed(Arc<[usize]>),
}

impl Members {
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Self::Contiguous(range) => range.len(),
            Self::Listed(list) => list.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Population index of the `rank`-th visible individual.
    #[inline]
    pub fn get(&self, rank: usize) -> Option<usize> {
        match self {
            Self::Contiguous(range) => {
                let ind = range.start + rank;
                (ind < range.end).then_some(ind)
            }
            Self::Listed(list) => list.get(rank).copied(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter_map(move |rank| self.get(rank))
    }
}

/// Position of one locus across the visible chromosome copies of a
/// subpopulation.
///
/// Trial slots are numbered `rank * ploidy + copy`, matching the order in which
/// Bernoulli trials are drawn. The cursor only does index arithmetic; it owns
/// no genotype data, so it can be held while the population is mutated.
#[derive(Debug, Clone)]
pub struct AlleleCursor {
    members: Members,
    ploidy: usize,
    genotype_size: usize,
    num_loci: usize,
    locus: usize,
    slot: usize,
}

impl AlleleCursor {
    pub fn new(members: Members, ploidy: usize, num_loci: usize, locus: usize) -> Self {
        Self {
            members,
            ploidy,
            genotype_size: ploidy * num_loci,
            num_loci,
            locus,
            slot: 0,
        }
    }

    /// Move forward by `offset` trial slots.
    #[inline]
    pub fn advance(&mut self, offset: usize) {
        self.slot += offset;
    }

    /// Whether the cursor points at an existing allele.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.slot < self.len()
    }

    /// Number of trial slots covered by the cursor.
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len() * self.ploidy
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current trial slot.
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    #[inline]
    pub fn locus(&self) -> usize {
        self.locus
    }

    /// Population index of the individual under the cursor.
    #[inline]
    pub fn individual(&self) -> Option<usize> {
        self.members.get(self.slot / self.ploidy)
    }

    /// Chromosome copy under the cursor.
    #[inline]
    pub fn copy(&self) -> usize {
        self.slot % self.ploidy
    }

    /// Flat arena index of the allele under the cursor, or `None` past the end.
    #[inline]
    pub fn index(&self) -> Option<usize> {
        self.individual()
            .map(|ind| ind * self.genotype_size + self.copy() * self.num_loci + self.locus)
    }
}
