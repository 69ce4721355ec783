use anyhow::Result;
use plotters::prelude::*;
use std::path::Path;

use super::{render_err, value_range};

/// A named subset of points drawn in its own color on top of the base
/// scatter, with a legend entry.
#[derive(Debug, Clone)]
pub struct Highlight {
    pub label: String,
    pub indices: Vec<usize>,
    pub color: RGBColor,
}

#[derive(Debug, Clone, Default)]
pub struct ScatterOptions {
    pub x_label: String,
    pub y_label: String,
    pub title: Option<String>,
    /// Draw the least-squares regression line.
    pub fit: bool,
    pub highlights: Vec<Highlight>,
}

/// Least-squares line through the points, as (slope, intercept).
fn fit_line(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let n = x.len() as f64;
    if x.len() < 2 {
        return None;
    }
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;
    let var = x.iter().map(|v| (v - mx).powi(2)).sum::<f64>();
    if var == 0.0 {
        return None;
    }
    let cov = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum::<f64>();
    let slope = cov / var;
    Some((slope, my - slope * mx))
}

/// Scatter plot of two coverage columns, one point per region.
pub fn draw_scatter<P: AsRef<Path>>(
    path: P,
    x: &[f64],
    y: &[f64],
    opts: &ScatterOptions,
) -> Result<()> {
    render(path.as_ref(), x, y, opts).map_err(render_err)
}

fn render(
    path: &Path,
    x: &[f64],
    y: &[f64],
    opts: &ScatterOptions,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, (800, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let (x_lo, x_hi) = value_range(x.iter().copied());
    let (y_lo, y_hi) = value_range(y.iter().copied());
    let x_pad = (x_hi - x_lo) * 0.05;
    let y_pad = (y_hi - y_lo) * 0.05;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            opts.title.as_deref().unwrap_or(""),
            ("sans-serif", 24),
        )
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_lo - x_pad..x_hi + x_pad, y_lo - y_pad..y_hi + y_pad)?;

    chart
        .configure_mesh()
        .x_desc(opts.x_label.as_str())
        .y_desc(opts.y_label.as_str())
        .draw()?;

    chart.draw_series(
        x.iter()
            .zip(y)
            .map(|(&a, &b)| Circle::new((a, b), 3, RGBColor(120, 120, 120).mix(0.5).filled())),
    )?;

    for highlight in &opts.highlights {
        let color = highlight.color;
        chart
            .draw_series(highlight.indices.iter().filter(|&&i| i < x.len()).map(|&i| {
                Circle::new((x[i], y[i]), 4, color.filled())
            }))?
            .label(highlight.label.as_str())
            .legend(move |(lx, ly)| Circle::new((lx + 8, ly), 4, color.filled()));
    }

    if opts.fit {
        if let Some((slope, intercept)) = fit_line(x, y) {
            let x0 = x_lo - x_pad;
            let x1 = x_hi + x_pad;
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(x0, slope * x0 + intercept), (x1, slope * x1 + intercept)],
                BLACK.stroke_width(2),
            )))?;
        }
    }

    if !opts.highlights.is_empty() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_line_exact() {
        let x = vec![0.0, 1.0, 2.0, 3.0];
        let y = vec![1.0, 3.0, 5.0, 7.0];
        let (slope, intercept) = fit_line(&x, &y).unwrap();
        assert!((slope - 2.0).abs() < 1e-12);
        assert!((intercept - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fit_line_degenerate() {
        assert!(fit_line(&[1.0], &[2.0]).is_none());
        assert!(fit_line(&[2.0, 2.0], &[1.0, 5.0]).is_none());
    }

    #[test]
    fn test_draw_scatter_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scatter.png");
        let x: Vec<f64> = (0..50).map(|i| i as f64 / 10.0).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        let opts = ScatterOptions {
            x_label: "sample A".into(),
            y_label: "sample B".into(),
            fit: true,
            highlights: vec![Highlight {
                label: "promoters".into(),
                indices: vec![0, 5, 10],
                color: RGBColor(214, 39, 40),
            }],
            ..Default::default()
        };
        draw_scatter(&path, &x, &y, &opts).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }
}
