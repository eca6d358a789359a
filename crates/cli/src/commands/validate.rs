use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::utils::{load_config, replicate_rng};

pub fn validate_config(config_path: &PathBuf) -> Result<()> {
    println!("🔍 Validating configuration: {}", config_path.display());

    let config = load_config(config_path)?;
    println!("✓ Parsed: OK");

    let operators = config
        .build_operators()
        .context("Invalid mutation operators")?;
    println!("✓ Mutation operators: {} built", operators.len());

    let mut rng = replicate_rng(config.execution.seed.unwrap_or(0), 0);
    let pop = config
        .build_population(&mut rng)
        .context("Invalid population")?;
    println!(
        "✓ Population: {} individuals, {} loci, ploidy {}",
        pop.size(),
        pop.num_loci(),
        pop.ploidy()
    );

    println!("\n✓ Configuration is valid");
    Ok(())
}
