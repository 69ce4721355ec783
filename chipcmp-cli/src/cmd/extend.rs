use anyhow::Result;
use chipcmp_core::genome::ChromSizes;
use chipcmp_core::regions;
use log::info;

use crate::cli::ExtendArgs;

pub fn run(args: &ExtendArgs) -> Result<()> {
    let chrom_sizes = args
        .chrom_sizes
        .as_ref()
        .map(ChromSizes::from_file)
        .transpose()?;
    let sites = regions::read_bed(&args.bed)?;
    let extended = regions::extend_midpoints(&sites, args.window, chrom_sizes.as_ref());
    info!(
        "extended {} regions to windows of {} bp",
        extended.len(),
        2 * args.window
    );
    regions::write_bed(&args.output, extended)
}
