//! Evolution module providing mutation operators.
//!
//! - **Trials**: batched Bernoulli trials that only yield successes
//! - **Models**: what an allele becomes once it mutates (matrix, K-allele,
//!   stepwise, callback, mixture, context-dependent)
//! - **Mutator**: the driver that decides where mutations happen
//! - **Point mutator**: deterministic assignment of alleles

pub mod callback;
pub mod context;
pub mod mutation;
pub mod mutator;
pub mod point;
pub mod remap;
pub mod trials;

pub use callback::{AlleleFn, ContextFn};
pub use context::{fill_context, OUT_OF_CHROMOSOME};
pub use mutation::{
    CallbackModel, ContextModel, KAlleleModel, MatrixModel, MixtureModel, MutationModel,
    MutationSite, MutationStep, StepwiseModel,
};
pub use mutator::Mutator;
pub use point::PointMutator;
pub use remap::ValueMap;
pub use trials::{BernoulliTrials, Successes, SPARSE_THRESHOLD};

use crate::errors::MutationError;
use crate::simulation::Population;
use rand::Rng;

/// A mutation operator that can be applied to a population.
#[derive(Debug, Clone)]
pub enum MutationOperator {
    Stochastic(Mutator),
    Point(PointMutator),
}

impl MutationOperator {
    /// Apply the operator once. Returns the number of alleles it mutated or
    /// assigned.
    pub fn apply<R: Rng + ?Sized>(
        &mut self,
        pop: &mut Population,
        rng: &mut R,
    ) -> Result<usize, MutationError> {
        match self {
            Self::Stochastic(m) => m.apply(pop, rng),
            Self::Point(p) => p.apply(pop),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Stochastic(m) => m.model().name(),
            Self::Point(_) => "point",
        }
    }
}

impl From<Mutator> for MutationOperator {
    fn from(m: Mutator) -> Self {
        Self::Stochastic(m)
    }
}

impl From<PointMutator> for MutationOperator {
    fn from(p: PointMutator) -> Self {
        Self::Point(p)
    }
}
