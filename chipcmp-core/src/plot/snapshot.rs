use anyhow::{bail, Result};
use bed_utils::bed::{BEDLike, GenomicRange};
use ndarray::Array3;
use plotters::prelude::*;
use std::path::Path;

use super::render_err;

/// At most this many loci are shown, one column per locus.
pub const MAX_LOCI: usize = 5;

const PALETTE: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(214, 39, 40),
    RGBColor(44, 160, 44),
    RGBColor(255, 127, 14),
    RGBColor(148, 103, 189),
    RGBColor(127, 127, 127),
];

/// Coverage snapshot: a grid of per-base depth panels with one row per
/// sample and one column per locus. Panels of a row share the y scale so
/// signal is comparable across loci.
pub fn draw_snapshot<P: AsRef<Path>>(
    path: P,
    samples: &[String],
    loci: &[GenomicRange],
    profiles: &Array3<f64>,
    color: Option<RGBColor>,
) -> Result<()> {
    let (n_samples, n_regions, _) = profiles.dim();
    if samples.len() != n_samples {
        bail!(
            "{} sample labels for {} profile rows",
            samples.len(),
            n_samples
        );
    }
    if loci.is_empty() || n_regions == 0 {
        bail!("no loci to draw");
    }
    let n_loci = loci.len().min(n_regions).min(MAX_LOCI);
    render(path.as_ref(), samples, &loci[..n_loci], profiles, color).map_err(render_err)
}

fn render(
    path: &Path,
    samples: &[String],
    loci: &[GenomicRange],
    profiles: &Array3<f64>,
    color: Option<RGBColor>,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let rows = samples.len();
    let cols = loci.len();
    let root = BitMapBackend::new(path, (300 * cols as u32, 160 * rows as u32 + 40))
        .into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((rows, cols));

    for (s, sample) in samples.iter().enumerate() {
        let y_max = (0..cols)
            .flat_map(|r| {
                profiles
                    .index_axis(ndarray::Axis(0), s)
                    .index_axis(ndarray::Axis(0), r)
                    .to_vec()
            })
            .fold(1.0f64, f64::max);
        let color = color.unwrap_or(PALETTE[s % PALETTE.len()]);

        for (r, locus) in loci.iter().enumerate() {
            let panel = &panels[s * cols + r];
            let caption = if s == 0 {
                format!("{}:{}-{}", locus.chrom(), locus.start(), locus.end())
            } else {
                String::new()
            };
            let mut chart = ChartBuilder::on(panel)
                .caption(caption, ("sans-serif", 14))
                .margin(5)
                .x_label_area_size(if s == rows - 1 { 25 } else { 5 })
                .y_label_area_size(45)
                .build_cartesian_2d(
                    locus.start() as f64..locus.end() as f64,
                    0.0..y_max * 1.05,
                )?;

            let mut mesh = chart.configure_mesh();
            mesh.disable_x_mesh().disable_y_mesh().x_labels(3).y_labels(3);
            if r == 0 {
                mesh.y_desc(sample.as_str());
            }
            mesh.draw()?;

            let sample_profiles = profiles.index_axis(ndarray::Axis(0), s);
            let depth = sample_profiles.index_axis(ndarray::Axis(0), r);
            let width = (locus.len() as usize).min(depth.len());
            chart.draw_series(
                AreaSeries::new(
                    (0..width).map(|i| (locus.start() as f64 + i as f64, depth[i])),
                    0.0,
                    &color.mix(0.6),
                )
                .border_style(&color),
            )?;
        }
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_snapshot_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.png");
        let profiles = Array3::from_shape_fn((2, 3, 100), |(s, r, i)| {
            ((s + 1) * (r + 1)) as f64 * (i as f64 / 10.0).sin().abs()
        });
        let loci = vec![
            GenomicRange::new("chr1", 1000, 1100),
            GenomicRange::new("chr2", 5000, 5100),
            GenomicRange::new("chr3", 200, 300),
        ];
        let samples = vec!["input".to_string(), "chip".to_string()];
        draw_snapshot(&path, &samples, &loci, &profiles, Some(RGBColor(200, 30, 30))).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }

    #[test]
    fn test_draw_snapshot_label_mismatch() {
        let profiles = Array3::zeros((2, 1, 10));
        let loci = vec![GenomicRange::new("chr1", 0, 10)];
        let samples = vec!["only-one".to_string()];
        assert!(draw_snapshot("/dev/null", &samples, &loci, &profiles, None).is_err());
    }
}
