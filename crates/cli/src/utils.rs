use allevo_sim::simulation::Configuration;
use anyhow::{Context, Result};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::path::Path;

pub fn load_config(path: &Path) -> Result<Configuration> {
    Configuration::from_json_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Generator of replicate `replicate` of a run seeded with `base_seed`.
pub fn replicate_rng(base_seed: u64, replicate: usize) -> Xoshiro256PlusPlus {
    Xoshiro256PlusPlus::seed_from_u64(base_seed.wrapping_add(replicate as u64))
}
