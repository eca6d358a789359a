use thiserror::Error;

/// Errors raised while building or applying a mutation operator.
///
/// Every variant is fatal for the `apply` call that produced it. Alleles that
/// were already written earlier in the same call stay written.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MutationError {
    /// Invalid mutation rate (must be between 0.0 and 1.0)
    #[error("Invalid mutation rate: {0} (must be between 0.0 and 1.0)")]
    InvalidMutationRate(f64),

    /// A named probability parameter outside [0, 1].
    #[error("Invalid probability for {name}: {value} (must be between 0.0 and 1.0)")]
    InvalidProbability { name: &'static str, value: f64 },

    /// More rates were supplied than there are loci to apply them to.
    #[error("{rates} mutation rates given for {loci} loci")]
    RateCountMismatch { rates: usize, loci: usize },

    #[error("Locus {locus} out of range (total loci = {num_loci})")]
    LocusOutOfRange { locus: usize, num_loci: usize },

    #[error("Locus {0} is listed more than once")]
    DuplicateLocus(usize),

    #[error("Subpopulation index {subpop} out of range ({num_subpops} subpopulations)")]
    SubPopOutOfRange { subpop: usize, num_subpops: usize },

    #[error("Virtual subpopulation {vsp} out of range ({num_vsps} virtual subpopulations)")]
    VirtualSubPopOutOfRange { vsp: usize, num_vsps: usize },

    #[error("Individual {index} out of range (population size = {size})")]
    IndividualOutOfRange { index: usize, size: usize },

    #[error("Chromosome copy {copy} out of range (ploidy = {ploidy})")]
    PloidyOutOfRange { copy: usize, ploidy: usize },

    /// An allele value that cannot be represented or that a model cannot
    /// handle.
    #[error("Allele {allele} out of range (maximum allowed = {max})")]
    AlleleOutOfRange { allele: i64, max: u32 },

    #[error("Mutation matrix must be square: row {row} has {len} entries, expected {expected}")]
    NonSquareMatrix {
        row: usize,
        len: usize,
        expected: usize,
    },

    /// Number of context patterns is neither the number of mutators nor one
    /// less.
    #[error("{patterns} context patterns given for {models} mutators")]
    ContextPatternMismatch { patterns: usize, models: usize },

    #[error("Context pattern has {found} values, expected {expected}")]
    ContextLength { expected: usize, found: usize },

    #[error("No context pattern matches {0:?} and there is no default mutator")]
    NoMatchingContext(Vec<i64>),

    #[error("Invalid mixture weights: {0}")]
    InvalidWeights(String),

    #[error("Invalid mutation step: {0}")]
    InvalidStep(String),

    /// An external callback failed. The message is whatever the callback
    /// reported.
    #[error("Callback failed: {0}")]
    Callback(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Errors that can occur while constructing or editing a population.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PopulationError {
    #[error("Ploidy must be at least 1")]
    ZeroPloidy,

    #[error("Chromosome {0} has no loci")]
    EmptyChromosome(usize),

    #[error("Genotype buffer has {found} alleles, expected {expected}")]
    GenotypeLength { expected: usize, found: usize },

    #[error("Allele {allele} out of range (maximum allowed = {max})")]
    AlleleOutOfRange { allele: i64, max: u32 },

    #[error("{found} subpopulation sizes given for {expected} subpopulations")]
    SubPopCount { expected: usize, found: usize },

    #[error("Invalid virtual splitter: {0}")]
    InvalidSplitter(String),

    #[error("Invalid initial allele frequencies: {0}")]
    InvalidFrequencies(String),
}

/// Errors that can occur while loading or building a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Population error: {0}")]
    Population(#[from] PopulationError),

    #[error("Mutator {index}: {source}")]
    Mutator {
        index: usize,
        #[source]
        source: MutationError,
    },

    #[error("Missing required parameter: {0}")]
    MissingRequired(&'static str),
}

impl ConfigError {
    pub(crate) fn mutator(index: usize) -> impl FnOnce(MutationError) -> Self {
        move |source| Self::Mutator { index, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_error_display() {
        let err = MutationError::InvalidMutationRate(1.5);
        let msg = format!("{err}");
        assert!(msg.contains("Invalid mutation rate"));
        assert!(msg.contains("1.5"));
    }

    #[test]
    fn test_no_matching_context_display() {
        let err = MutationError::NoMatchingContext(vec![0, -1]);
        assert!(err.to_string().contains("[0, -1]"));
    }

    #[test]
    fn test_config_error_wraps_mutator_index() {
        let err = ConfigError::mutator(2)(MutationError::InvalidMutationRate(2.0));
        let msg = err.to_string();
        assert!(msg.starts_with("Mutator 2"));
        assert!(msg.contains("2"));
    }
}
