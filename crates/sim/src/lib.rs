//! # Simulation Crate
//!
//! The `sim` crate provides the mutation engine of a forward-time population
//! simulator. It includes modules for describing genomes, managing
//! populations and their (virtual) subpopulations, and applying stochastic
//! mutation operators driven by per-locus mutation rates.

pub mod base;
pub mod errors;
pub mod evolution;
pub mod genome;
pub mod simulation;
pub mod prelude;

pub use base::{Allele, AlleleMode, MAX_ALLELE};
