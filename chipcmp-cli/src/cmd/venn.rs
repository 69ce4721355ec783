use anyhow::{bail, Result};
use chipcmp_core::plot::venn::{draw_venn2, draw_venn3, Venn2, Venn3};
use chipcmp_core::plot::{parse_color, RGBColor};
use chipcmp_core::regions::{self, RegionSet};
use log::info;

use crate::cli::VennArgs;

const DEFAULT_COLORS: [&str; 3] = ["red", "blue", "green"];

/// Membership pattern counts over the union of the input sets: each union
/// region votes for the compartment given by which sets overlap it.
fn compartment_counts(sets: &[RegionSet]) -> Vec<u64> {
    let merged = RegionSet::new(regions::union(sets.iter().map(|s| s.regions())));
    let mut counts = vec![0u64; 1 << sets.len()];
    for region in merged.iter() {
        let mut pattern = 0usize;
        for (k, set) in sets.iter().enumerate() {
            if set.is_overlapped(region) {
                pattern |= 1 << k;
            }
        }
        counts[pattern] += 1;
    }
    counts
}

fn resolve_names(args: &VennArgs) -> Result<Vec<String>> {
    regions::resolve_labels(&args.beds, args.names.as_deref())
}

fn resolve_colors(args: &VennArgs) -> Result<Vec<RGBColor>> {
    match &args.colors {
        None => DEFAULT_COLORS[..args.beds.len()]
            .iter()
            .map(|&c| parse_color(c))
            .collect(),
        Some(list) => {
            let colors: Vec<RGBColor> = list
                .split(',')
                .map(|c| parse_color(c.trim()))
                .collect::<Result<_>>()?;
            if colors.len() != args.beds.len() {
                bail!(
                    "wrong number of colors: {} colors for {} sets",
                    colors.len(),
                    args.beds.len()
                );
            }
            Ok(colors)
        }
    }
}

pub fn run(args: &VennArgs) -> Result<()> {
    let sets = args
        .beds
        .iter()
        .map(RegionSet::from_bed)
        .collect::<Result<Vec<_>>>()?;
    let names = resolve_names(args)?;
    let colors = resolve_colors(args)?;
    let counts = compartment_counts(&sets);

    match sets.len() {
        2 => {
            let venn = Venn2 {
                only_a: counts[0b01],
                only_b: counts[0b10],
                both: counts[0b11],
            };
            info!(
                "{} only {}, {} only {}, {} shared",
                venn.only_a, names[0], venn.only_b, names[1], venn.both
            );
            draw_venn2(
                &args.output,
                (&names[0], &names[1]),
                venn,
                (colors[0], colors[1]),
            )
        }
        3 => {
            let venn = Venn3 {
                only_a: counts[0b001],
                only_b: counts[0b010],
                only_c: counts[0b100],
                ab: counts[0b011],
                ac: counts[0b101],
                bc: counts[0b110],
                abc: counts[0b111],
            };
            draw_venn3(
                &args.output,
                (&names[0], &names[1], &names[2]),
                venn,
                (colors[0], colors[1], colors[2]),
            )
        }
        n => bail!("expected 2 or 3 BED files, got {}", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bed_utils::bed::GenomicRange;

    fn gr(chrom: &str, start: u64, end: u64) -> GenomicRange {
        GenomicRange::new(chrom, start, end)
    }

    #[test]
    fn test_compartment_counts_two_sets() {
        let a = RegionSet::new(vec![gr("chr1", 0, 100), gr("chr1", 500, 600)]);
        let b = RegionSet::new(vec![gr("chr1", 50, 150), gr("chr2", 0, 10)]);
        // union: chr1:0-150 (both), chr1:500-600 (a only), chr2:0-10 (b only)
        let counts = compartment_counts(&[a, b]);
        assert_eq!(counts[0b01], 1);
        assert_eq!(counts[0b10], 1);
        assert_eq!(counts[0b11], 1);
    }

    #[test]
    fn test_compartment_counts_three_sets() {
        let a = RegionSet::new(vec![gr("chr1", 0, 100)]);
        let b = RegionSet::new(vec![gr("chr1", 50, 150)]);
        let c = RegionSet::new(vec![gr("chr1", 90, 200)]);
        let counts = compartment_counts(&[a, b, c]);
        assert_eq!(counts[0b111], 1);
        assert_eq!(counts.iter().sum::<u64>(), 1);
    }
}
