use allevo_sim::simulation::{Configuration, Population};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use rayon::prelude::*;
use tracing::info;

use crate::args::RunArgs;
use crate::printing::{print_frequencies, print_parameters};
use crate::utils::{load_config, replicate_rng};

/// Outcome of one replicate run.
struct Replicate {
    index: usize,
    /// Mutation events per generation
    events: Vec<usize>,
    population: Population,
}

pub fn run_simulation(args: &RunArgs) -> Result<()> {
    println!("🧬 Allevo - Running Mutation Simulation");
    println!("============================================\n");

    if args.replicates == 0 {
        anyhow::bail!("At least one replicate is required");
    }

    let mut config = load_config(&args.config)?;
    if let Some(generations) = args.generations {
        config.execution.generations = generations;
    }
    if args.seed.is_some() {
        config.execution.seed = args.seed;
    }
    let base_seed = config
        .execution
        .seed
        .unwrap_or_else(|| rand::rng().random());

    print_parameters(&config, base_seed);

    // fail fast before any replicate starts
    config
        .build_operators()
        .context("Invalid mutation operators")?;

    info!(
        replicates = args.replicates,
        generations = config.execution.generations,
        "starting run"
    );
    let pb = if args.progress {
        let pb = ProgressBar::new((args.replicates * config.execution.generations) as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {per_sec}",
                )?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let results = (0..args.replicates)
        .into_par_iter()
        .map(|index| run_replicate(&config, base_seed, index, pb.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    if let Some(pb) = pb {
        pb.finish_with_message("Done");
    }

    for replicate in &results {
        if args.replicates > 1 {
            println!("── Replicate {} ──", replicate.index);
        }
        if args.report_every > 0 {
            for (i, count) in replicate.events.iter().enumerate() {
                let generation = i + 1;
                if generation % args.report_every == 0 || generation == replicate.events.len() {
                    println!("Generation {generation}: {count} mutation events");
                }
            }
        }
        let total: usize = replicate.events.iter().sum();
        println!("Total mutation events: {total}\n");
        print_frequencies(&replicate.population);
        println!();
    }

    println!("✓ Simulation complete!");
    Ok(())
}

fn run_replicate(
    config: &Configuration,
    base_seed: u64,
    index: usize,
    pb: Option<&ProgressBar>,
) -> Result<Replicate> {
    let mut rng = replicate_rng(base_seed, index);
    let mut population = config
        .build_population(&mut rng)
        .context("Failed to build population")?;
    population.set_replicate(index);
    let mut operators = config.build_operators()?;

    let mut events = Vec::with_capacity(config.execution.generations);
    for generation in 1..=config.execution.generations {
        let mut count = 0;
        for op in &mut operators {
            count += op.apply(&mut population, &mut rng).with_context(|| {
                format!(
                    "Replicate {index}, generation {generation}: {} mutator failed",
                    op.name()
                )
            })?;
        }
        population.increment_generation();
        events.push(count);

        if let Some(pb) = pb {
            pb.inc(1);
        }
    }

    info!(
        replicate = index,
        total = events.iter().sum::<usize>(),
        "replicate finished"
    );
    Ok(Replicate {
        index,
        events,
        population,
    })
}
