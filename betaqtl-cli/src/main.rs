//! betaqtl: multi-cohort cis-QTL mapping with a Beta-approximated
//! permutation null.
//!
//! CLI entry point using clap for argument parsing.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "betaqtl",
    version,
    about = "Multi-cohort cis-eQTL mapping with Beta-approximated permutation p-values",
    long_about = "Maps cis-eQTLs per gene across several cohorts with a sample-size weighted\n\
                  Z-score meta-analysis and calibrates the top variant of each gene against\n\
                  a Beta distribution fitted to permutation minima."
)]
struct Cli {
    /// Number of threads to use
    #[arg(long, default_value = "1", global = true)]
    threads: usize,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map cis-QTLs for every gene in an expression matrix
    Cis(commands::cis::CisArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    rayon::ThreadPoolBuilder::new()
        .num_threads(cli.threads)
        .build_global()
        .ok();

    tracing::info!("betaqtl v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Using {} threads", cli.threads);

    match cli.command {
        Commands::Cis(args) => commands::cis::run(args),
    }
}
