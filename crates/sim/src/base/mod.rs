//! Base types for allele storage.
//!
//! This module provides the allele value type, the allele interpretation mode
//! and the flat arena that holds every genotype of a population.

mod allele;
mod arena;

pub use allele::{Allele, AlleleMode, MAX_ALLELE};
pub use arena::GenotypeArena;
