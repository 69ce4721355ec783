use anyhow::Result;
use chipcmp_core::matrix::{occupancy_matrix, write_table};
use chipcmp_core::regions::{resolve_labels, RegionSet};
use log::info;

use crate::cli::OccupancyMatrixArgs;

pub fn run(args: &OccupancyMatrixArgs) -> Result<()> {
    let reference = RegionSet::from_bed(&args.reference)?;
    info!(
        "total {} sites in the reference: {}",
        reference.len(),
        args.reference.display()
    );
    let labels = resolve_labels(&args.beds, None)?;
    let sets = args
        .beds
        .iter()
        .map(RegionSet::from_bed)
        .collect::<Result<Vec<_>>>()?;

    let mat = occupancy_matrix(&reference, &sets);
    write_table(&args.output, &reference, &labels, &mat)
}
