use anyhow::Result;
use chipcmp_core::matrix::{coverage_matrix, Measure};
use chipcmp_core::regions::{load_union, resolve_labels};
use chipcmp_core::similarity;

use crate::cli::CompareCoveragesArgs;
use crate::cmd::{render_similarity, split_paths};

pub fn run(args: &CompareCoveragesArgs) -> Result<()> {
    let beds = split_paths(&args.beds);
    let regions = load_union(&beds)?;
    let labels = resolve_labels(&args.bams, args.labels.as_deref())?;

    let coverage = coverage_matrix(&regions, &args.bams, Measure::Fpkm, None)?;
    let corr = similarity::pearson_matrix(&coverage);

    render_similarity(&args.output, &labels, &corr, &args.heatmap)
}
