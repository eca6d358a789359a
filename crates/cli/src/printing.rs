use allevo_sim::simulation::{Configuration, InitialAlleles, ModelConfig, MutatorConfig, Population};

use crate::defaults::MAX_REPORTED_LOCI;

pub fn print_parameters(config: &Configuration, seed: u64) {
    let execution = &config.execution;
    let population = &config.population;

    println!("📋 Run Configuration");
    println!("  • Generations: {} [-g, --generations]", execution.generations);
    println!("  • Random Seed: {seed} [--seed]");

    println!("\n🧬 Population");
    println!("  • Ploidy: {}", population.ploidy);
    println!(
        "  • Loci per chromosome: {:?} ({} loci)",
        population.loci_per_chromosome,
        population.loci_per_chromosome.iter().sum::<usize>()
    );
    println!("  • Subpopulation sizes: {:?}", population.subpop_sizes);
    println!("  • Allele mode: {}", population.allele_mode);
    match &population.initial {
        InitialAlleles::Fixed(allele) => println!("  • Initial alleles: all {allele}"),
        InitialAlleles::Frequencies(freqs) => {
            println!("  • Initial allele frequencies: {freqs:?}")
        }
    }

    println!("\n⚡ Mutation Operators");
    for (i, mutator) in config.mutators.iter().enumerate() {
        println!("  {}. {}", i + 1, describe(mutator));
    }
    println!();
}

fn describe(mutator: &MutatorConfig) -> String {
    let rates = if mutator.rates.is_empty() {
        String::new()
    } else {
        format!(", rates {:?}", mutator.rates)
    };
    let loci = if mutator.loci.is_empty() {
        "all loci".to_string()
    } else {
        format!("loci {:?}", mutator.loci)
    };
    match &mutator.model {
        ModelConfig::KAllele { k } => format!("K-allele (k = {k}) on {loci}{rates}"),
        ModelConfig::Stepwise { inc_prob, .. } => {
            format!("Stepwise (inc_prob = {inc_prob}) on {loci}{rates}")
        }
        ModelConfig::Matrix { matrix } => {
            format!("Matrix ({0}x{0}) on {loci}", matrix.len())
        }
        ModelConfig::Mixture { mutators, .. } => {
            format!("Mixture of {} mutators on {loci}{rates}", mutators.len())
        }
        ModelConfig::Context { patterns, .. } => {
            format!("Context ({} patterns) on {loci}{rates}", patterns.len())
        }
        ModelConfig::Point { inds, allele, .. } => {
            format!("Point (allele {allele}, {} individuals) on {loci}", inds.len())
        }
    }
}

pub fn print_frequencies(pop: &Population) {
    println!("📊 Allele frequencies (generation {})", pop.generation());
    for locus in 0..pop.num_loci().min(MAX_REPORTED_LOCI) {
        let freqs: Vec<String> = pop
            .allele_frequencies(locus)
            .iter()
            .enumerate()
            .filter(|(_, f)| **f > 0.0)
            .map(|(allele, f)| format!("{allele}:{f:.3}"))
            .collect();
        println!("  locus {locus}: {}", freqs.join(" "));
    }
    if pop.num_loci() > MAX_REPORTED_LOCI {
        println!("  ... {} more loci", pop.num_loci() - MAX_REPORTED_LOCI);
    }
}
