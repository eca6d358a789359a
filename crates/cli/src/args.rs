use clap::Args;
use std::path::PathBuf;

use crate::defaults;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Configuration file (JSON)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Override random seed (default: use configured seed)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override number of generations (default: use configured value)
    #[arg(short = 'g', long)]
    pub generations: Option<usize>,

    /// Number of independent replicates, run in parallel
    ///
    /// Replicate `r` uses seed `seed + r`.
    #[arg(short = 'r', long, default_value_t = defaults::REPLICATES)]
    pub replicates: usize,

    /// Print mutation counts every N generations (0 to disable)
    #[arg(long, default_value_t = defaults::REPORT_EVERY)]
    pub report_every: usize,

    /// Show a progress bar
    #[arg(long)]
    pub progress: bool,
}
