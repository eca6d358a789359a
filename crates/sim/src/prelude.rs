//! Commonly used imports for convenience.
//!
//! This prelude module provides a convenient way to import the most commonly
//! used types and traits in the allevo library.
//!
//! # Example
//!
//! ```
//! use allevo_sim::prelude::*;
//!
//! let structure = GenomeStructure::new(2, vec![10]).unwrap();
//! let pop = Population::new("pop", structure, vec![5], AlleleMode::Binary);
//! assert_eq!(pop.size(), 5);
//! ```

pub use crate::errors::{self, ConfigError, MutationError, PopulationError};
pub use crate::base::{Allele, AlleleMode, MAX_ALLELE};
pub use crate::genome::GenomeStructure;
pub use crate::evolution::{MutationModel, MutationOperator, Mutator, PointMutator};
pub use crate::simulation::{Configuration, Population, SubPopId, VirtualSplitter};
