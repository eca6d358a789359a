mod args;
mod commands;
pub mod defaults;
mod printing;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use args::RunArgs;
use commands::{example, run, validate};

/// Allevo: a stochastic allele mutation engine
///
/// This tool applies mutation operators (K-allele, stepwise, matrix, mixture,
/// context-dependent and point mutators) to a population of allele sequences
/// over a number of generations.
#[derive(Parser, Debug)]
#[command(name = "allevo")]
#[command(author, version, about = "Simulates allele mutation in a population over time", long_about = None)]
struct Cli {
    /// Number of threads used to run replicates
    ///
    /// If not specified, defaults to the number of logical CPUs.
    #[arg(short = 't', long, global = true)]
    threads: Option<usize>,

    /// Show debug diagnostics (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a configuration for a number of generations.
    ///
    /// Prints the number of mutation events per generation and the final
    /// allele frequencies.
    Run(RunArgs),

    /// Check that a configuration builds without running it.
    Validate {
        /// Configuration file (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Print an example configuration.
    Example {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    match cli.command {
        Commands::Run(args) => {
            run::run_simulation(&args)?;
        }
        Commands::Validate { config } => {
            validate::validate_config(&config)?;
        }
        Commands::Example { output } => {
            example::write_example(output.as_ref())?;
        }
    }

    Ok(())
}
