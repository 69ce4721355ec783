use anyhow::Context;
use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::logging::init_logging;

mod cli;
mod cmd;
mod logging;

fn main() -> anyhow::Result<()> {
    let cli: Cli = Cli::parse();

    init_logging(cli.verbose.log_level_filter()).expect("Could not initialize logging");

    if cli.cores > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.cores)
            .build_global()
            .context("Failed to configure the worker pool")?;
    }

    match &cli.command {
        Commands::CompareSites(args) => cmd::compare_sites::run(args),
        Commands::CompareCoverages(args) => cmd::compare_coverages::run(args),
        Commands::Consensus(args) => cmd::consensus::run(args),
        Commands::CoverageMatrix(args) => cmd::coverage_matrix::run(args),
        Commands::OccupancyMatrix(args) => cmd::occupancy_matrix::run(args),
        Commands::CoverageSites(args) => cmd::coverage_sites::run(args),
        Commands::Snapshot(args) => cmd::snapshot::run(args),
        Commands::Extend(args) => cmd::extend::run(args),
        Commands::Venn(args) => cmd::venn::run(args),
        Commands::Scatter(args) => cmd::scatter::run(args),
        Commands::FetchAtlas(args) => cmd::fetch_atlas::run(args),
        Commands::ScanRemote(args) => cmd::scan_remote::run(args),
        Commands::Accession(args) => cmd::accession::run(args),
    }
}
