use anyhow::Result;
use chipcmp_core::plot::snapshot::{draw_snapshot, MAX_LOCI};
use chipcmp_core::plot::RGBColor;
use chipcmp_core::profile;
use chipcmp_core::regions::{self, RegionSet};

use crate::cli::SnapshotArgs;

fn channel(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

pub fn run(args: &SnapshotArgs) -> Result<()> {
    let sites = regions::read_bed(&args.bed)?;
    let loci: Vec<_> = sites.into_iter().take(MAX_LOCI).collect();
    let regions = RegionSet::new(loci.clone());
    let samples = regions::resolve_labels(&args.bams, None)?;

    let profiles = profile::bam_profiles(&args.bams, &regions, None, args.fragment)?;
    let color = RGBColor(channel(args.red), channel(args.green), channel(args.blue));
    draw_snapshot(&args.output, &samples, &loci, &profiles, Some(color))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_clamps() {
        assert_eq!(channel(1.0), 255);
        assert_eq!(channel(0.0), 0);
        assert_eq!(channel(0.5), 128);
        assert_eq!(channel(7.0), 255);
        assert_eq!(channel(-1.0), 0);
    }
}
