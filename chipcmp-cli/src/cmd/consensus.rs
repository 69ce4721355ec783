use anyhow::Result;
use chipcmp_core::regions::{self, RegionSet};
use log::info;

use crate::cli::ConsensusArgs;

pub fn run(args: &ConsensusArgs) -> Result<()> {
    let sets = args
        .beds
        .iter()
        .map(RegionSet::from_bed)
        .collect::<Result<Vec<_>>>()?;
    let threshold = args.threshold.unwrap_or(args.beds.len() as u64 / 2);

    let consensus = regions::consensus(&sets, threshold);
    info!(
        "{} consensus sites shared by more than {} of {} sets",
        consensus.len(),
        threshold,
        sets.len()
    );
    regions::write_bed(&args.output, consensus)
}
