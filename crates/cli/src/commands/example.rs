use allevo_sim::simulation::Configuration;
use anyhow::{Context, Result};
use std::path::PathBuf;

pub fn write_example(output: Option<&PathBuf>) -> Result<()> {
    let json = Configuration::example().to_json_string()?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✓ Example configuration written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
