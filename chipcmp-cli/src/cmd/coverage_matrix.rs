use anyhow::Result;
use chipcmp_core::matrix::{coverage_matrix, write_table};
use chipcmp_core::regions::{load_union, resolve_labels};

use crate::cli::CoverageMatrixArgs;
use crate::cmd::split_paths;

pub fn run(args: &CoverageMatrixArgs) -> Result<()> {
    let beds = split_paths(&args.beds);
    let regions = load_union(&beds)?;
    let labels = resolve_labels(&args.bams, None)?;

    let mat = coverage_matrix(&regions, &args.bams, args.measure.into(), args.fragment)?;
    write_table(&args.output, &regions, &labels, &mat)
}
