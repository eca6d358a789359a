//! Shared default values for command line arguments.

pub const REPLICATES: usize = 1;
pub const REPORT_EVERY: usize = 10;

/// Loci whose allele frequencies are printed at the end of a run.
pub const MAX_REPORTED_LOCI: usize = 10;
