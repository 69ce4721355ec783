pub mod accession;
pub mod compare_coverages;
pub mod compare_sites;
pub mod consensus;
pub mod coverage_matrix;
pub mod coverage_sites;
pub mod extend;
pub mod fetch_atlas;
pub mod occupancy_matrix;
pub mod scan_remote;
pub mod scatter;
pub mod snapshot;
pub mod venn;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chipcmp_core::plot::heatmap::{draw_heatmap, HeatmapOptions};
use ndarray::Array2;

use crate::cli::{HeatmapArgs, PlotType};

/// Split a comma-separated list of file paths.
pub(crate) fn split_paths(list: &str) -> Vec<PathBuf> {
    list.split(',')
        .map(|s| PathBuf::from(s.trim()))
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
}

/// Write a labeled square matrix as tab-delimited text: label header row
/// and one label column.
fn write_labeled_matrix(path: &Path, labels: &[String], mat: &Array2<f64>) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("cannot create file: {}", path.display()))?;
    let mut header = vec![String::new()];
    header.extend_from_slice(labels);
    writer.write_record(&header)?;
    for (label, row) in labels.iter().zip(mat.rows()) {
        let mut record = vec![label.clone()];
        record.extend(row.iter().map(|x| x.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Render a similarity matrix as the requested plot variant, or save it as
/// text when `matrix` was asked for.
pub(crate) fn render_similarity(
    output: &Path,
    labels: &[String],
    mat: &Array2<f64>,
    args: &HeatmapArgs,
) -> Result<()> {
    match args.plot {
        PlotType::Matrix => write_labeled_matrix(output, labels, mat),
        plot => {
            let opts = HeatmapOptions {
                colormap: args.colormap.into(),
                vmin: Some(args.grad_min),
                vmax: Some(args.grad_max),
                cluster: plot == PlotType::Clustermap,
                lower_triangle: plot == PlotType::LtHeatmap,
                title: None,
            };
            draw_heatmap(output, labels, mat, &opts)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_paths() {
        assert_eq!(
            split_paths("a.bed, b.bed,c.bed"),
            vec![
                PathBuf::from("a.bed"),
                PathBuf::from("b.bed"),
                PathBuf::from("c.bed")
            ]
        );
        assert_eq!(split_paths("single.bed").len(), 1);
    }

    #[test]
    fn test_write_labeled_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.tsv");
        let labels = vec!["x".to_string(), "y".to_string()];
        let mat = ndarray::array![[1.0, 0.5], [0.5, 1.0]];
        write_labeled_matrix(&path, &labels, &mat).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "\tx\ty\nx\t1\t0.5\ny\t0.5\t1\n");
    }
}
