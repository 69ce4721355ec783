use anyhow::Result;
use ndarray::Array2;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;
use std::path::Path;

use super::{render_err, value_range, Colormap};
use crate::similarity;

const LABEL_AREA: u32 = 160;
const TITLE_AREA: u32 = 40;
const COLORBAR_AREA: u32 = 90;

#[derive(Debug, Clone)]
pub struct HeatmapOptions {
    pub colormap: Colormap,
    pub vmin: Option<f64>,
    pub vmax: Option<f64>,
    /// Reorder rows and columns by average-linkage clustering.
    pub cluster: bool,
    /// Blank out cells above the diagonal.
    pub lower_triangle: bool,
    pub title: Option<String>,
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        Self {
            colormap: Colormap::Reds,
            vmin: None,
            vmax: None,
            cluster: false,
            lower_triangle: false,
            title: None,
        }
    }
}

fn cell_size(n: usize) -> u32 {
    (600 / n.max(1) as u32).clamp(14, 60)
}

/// Render a square sample-by-sample matrix as a PNG heatmap with row/column
/// labels and a vertical colorbar.
pub fn draw_heatmap<P: AsRef<Path>>(
    path: P,
    labels: &[String],
    mat: &Array2<f64>,
    opts: &HeatmapOptions,
) -> Result<()> {
    let order: Vec<usize> = if opts.cluster {
        similarity::cluster_order(mat)
    } else {
        (0..mat.nrows()).collect()
    };
    let mat = Array2::from_shape_fn(mat.dim(), |(i, j)| mat[[order[i], order[j]]]);
    let labels: Vec<&str> = order.iter().map(|&i| labels[i].as_str()).collect();
    render(path.as_ref(), &labels, &mat, opts).map_err(render_err)
}

fn render(
    path: &Path,
    labels: &[&str],
    mat: &Array2<f64>,
    opts: &HeatmapOptions,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let n = mat.nrows();
    let cell = cell_size(n);
    let grid = cell * n as u32;
    let width = LABEL_AREA + grid + COLORBAR_AREA;
    let height = TITLE_AREA + grid + LABEL_AREA;
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let (lo, hi) = match (opts.vmin, opts.vmax) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => {
            let (dlo, dhi) = value_range(mat.iter().copied());
            (opts.vmin.unwrap_or(dlo), opts.vmax.unwrap_or(dhi))
        }
    };
    // a flat gradient range would make every cell NaN
    let hi = if hi > lo { hi } else { lo + 1.0 };

    if let Some(title) = &opts.title {
        root.draw(&Text::new(
            title.as_str(),
            ((width / 2) as i32, 10),
            ("sans-serif", 22)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Top)),
        ))?;
    }

    let x0 = LABEL_AREA as i32;
    let y0 = TITLE_AREA as i32;
    for i in 0..n {
        for j in 0..n {
            if opts.lower_triangle && j > i {
                continue;
            }
            let v = mat[[i, j]];
            let t = (v - lo) / (hi - lo);
            let x = x0 + (j as u32 * cell) as i32;
            let y = y0 + (i as u32 * cell) as i32;
            root.draw(&Rectangle::new(
                [(x, y), (x + cell as i32, y + cell as i32)],
                opts.colormap.color(t).filled(),
            ))?;
            if n <= 20 {
                let t = t.clamp(0.0, 1.0);
                let ink = if t > 0.6 { WHITE } else { BLACK };
                root.draw(&Text::new(
                    format!("{:.2}", v),
                    (x + cell as i32 / 2, y + cell as i32 / 2),
                    ("sans-serif", (cell / 3).max(10) as i32)
                        .into_font()
                        .color(&ink)
                        .pos(Pos::new(HPos::Center, VPos::Center)),
                ))?;
            }
        }
    }

    for (i, label) in labels.iter().enumerate() {
        let mid = (i as u32 * cell + cell / 2) as i32;
        root.draw(&Text::new(
            *label,
            (x0 - 6, y0 + mid),
            ("sans-serif", 14)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Right, VPos::Center)),
        ))?;
        root.draw(&Text::new(
            *label,
            (x0 + mid, y0 + grid as i32 + 6),
            ("sans-serif", 14)
                .into_font()
                .color(&BLACK)
                .transform(FontTransform::Rotate90)
                .pos(Pos::new(HPos::Left, VPos::Center)),
        ))?;
    }

    let bar_x = x0 + grid as i32 + 30;
    let bar_w = 18;
    for y in 0..grid as i32 {
        let t = 1.0 - y as f64 / grid as f64;
        root.draw(&Rectangle::new(
            [(bar_x, y0 + y), (bar_x + bar_w, y0 + y + 1)],
            opts.colormap.color(t).filled(),
        ))?;
    }
    root.draw(&Rectangle::new(
        [(bar_x, y0), (bar_x + bar_w, y0 + grid as i32)],
        BLACK.stroke_width(1),
    ))?;
    root.draw(&Text::new(
        format!("{:.2}", hi),
        (bar_x + bar_w + 4, y0),
        ("sans-serif", 13)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Left, VPos::Center)),
    ))?;
    root.draw(&Text::new(
        format!("{:.2}", lo),
        (bar_x + bar_w + 4, y0 + grid as i32),
        ("sans-serif", 13)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Left, VPos::Center)),
    ))?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_cell_size_bounds() {
        assert_eq!(cell_size(3), 60);
        assert_eq!(cell_size(30), 20);
        assert_eq!(cell_size(100), 14);
    }

    #[test]
    fn test_draw_heatmap_flat_gradient_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.png");
        let mat = array![[2.0, 2.0], [2.0, 2.0]];
        let labels = vec!["a".to_string(), "b".to_string()];
        let opts = HeatmapOptions {
            vmin: Some(2.0),
            vmax: Some(2.0),
            ..Default::default()
        };
        draw_heatmap(&path, &labels, &mat, &opts).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }

    #[test]
    fn test_draw_heatmap_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heatmap.png");
        let mat = array![[1.0, 0.3, 0.1], [0.3, 1.0, 0.8], [0.1, 0.8, 1.0]];
        let labels = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let opts = HeatmapOptions {
            cluster: true,
            lower_triangle: true,
            title: Some("overlap".into()),
            ..Default::default()
        };
        draw_heatmap(&path, &labels, &mat, &opts).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }
}
