use anyhow::Result;
use chipcmp_core::matrix::coverage_matrix;
use chipcmp_core::plot::scatter::{draw_scatter, Highlight, ScatterOptions};
use chipcmp_core::plot::parse_color;
use chipcmp_core::regions::{self, load_union, resolve_labels, RegionSet};
use log::info;

use crate::cli::ScatterArgs;
use crate::cmd::split_paths;

const HIGHLIGHT_COLORS: [&str; 5] = ["red", "blue", "green", "orange", "purple"];

/// Group highlight sites by their name column and map every group to the
/// indices of the regions it overlaps.
fn build_highlights(
    args: &ScatterArgs,
    regions: &RegionSet,
) -> Result<Vec<Highlight>> {
    let path = match &args.highlight {
        None => return Ok(Vec::new()),
        Some(p) => p,
    };
    let named = regions::read_named_bed(path, args.name_index)?;
    let mut groups: Vec<(String, Vec<bed_utils::bed::GenomicRange>)> = Vec::new();
    for (range, name) in named {
        match groups.iter_mut().find(|(n, _)| *n == name) {
            Some((_, sites)) => sites.push(range),
            None => groups.push((name, vec![range])),
        }
    }
    groups
        .into_iter()
        .enumerate()
        .map(|(k, (name, sites))| {
            let set = RegionSet::new(sites);
            let indices = regions
                .iter()
                .enumerate()
                .filter(|(_, r)| set.is_overlapped(*r))
                .map(|(i, _)| i)
                .collect::<Vec<_>>();
            info!("highlighting {} sites as {:?}", indices.len(), name);
            Ok(Highlight {
                label: name,
                indices,
                color: parse_color(HIGHLIGHT_COLORS[k % HIGHLIGHT_COLORS.len()])?,
            })
        })
        .collect()
}

pub fn run(args: &ScatterArgs) -> Result<()> {
    let beds = split_paths(&args.beds);
    let regions = load_union(&beds)?;
    let labels = resolve_labels(&args.bams, None)?;

    let coverage = coverage_matrix(&regions, &args.bams, args.measure.into(), None)?;
    let x = coverage.column(0).to_vec();
    let y = coverage.column(1).to_vec();

    let opts = ScatterOptions {
        x_label: labels[0].clone(),
        y_label: labels[1].clone(),
        title: args.title.clone(),
        fit: args.fit,
        highlights: build_highlights(args, &regions)?,
    };
    draw_scatter(&args.output, &x, &y, &opts)
}
