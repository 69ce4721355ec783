use anyhow::Result;
use chipcmp_core::matrix::occupancy_matrix;
use chipcmp_core::regions::{self, RegionSet};
use chipcmp_core::similarity;
use log::info;

use crate::cli::{CompareSitesArgs, SimilarityMeasure};
use crate::cmd::render_similarity;

pub fn run(args: &CompareSitesArgs) -> Result<()> {
    let labels = regions::resolve_labels(&args.beds, None)?;
    let sets = args
        .beds
        .iter()
        .map(RegionSet::from_bed)
        .collect::<Result<Vec<_>>>()?;

    let mat = match args.measure {
        SimilarityMeasure::Overlap => {
            info!("calculating overlap ratio between interval sets");
            similarity::overlap_matrix(&sets)
        }
        SimilarityMeasure::Correlation => {
            let merged = RegionSet::new(regions::union(sets.iter().map(|s| s.regions())));
            info!("total {} sites in the union", merged.len());
            let occupancy = occupancy_matrix(&merged, &sets);
            similarity::pearson_matrix(&occupancy)
        }
    };

    render_similarity(&args.output, &labels, &mat, &args.heatmap)
}
