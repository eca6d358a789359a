//! Genome layout and allele addressing.
//!
//! This module provides the genome structure shared by all individuals
//! (ploidy, chromosomes and loci) and the cursor used to walk one locus across
//! the chromosome copies of a subpopulation.

mod cursor;
mod structure;

pub use cursor::{AlleleCursor, Members};
pub use structure::GenomeStructure;
