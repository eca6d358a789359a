//! Population management and run configuration.
//!
//! - `Population`: in-memory container of genotypes, split into
//!   subpopulations and optionally into virtual subpopulations.
//! - `Configuration`: serde description of a population and the mutation
//!   operators applied to it every generation.

pub mod configs;
pub mod population;

pub use configs::{
    Configuration, ExecutionConfig, InitialAlleles, ModelConfig, MutatorConfig, PopulationConfig,
    StepConfig,
};
pub use population::{ActiveSubPop, Population, SubPopId, VirtualSplitter};
