use anyhow::Result;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

use super::render_err;

/// Overlap counts of two interval sets: regions only in the first set, only
/// in the second, and in both.
#[derive(Debug, Clone, Copy)]
pub struct Venn2 {
    pub only_a: u64,
    pub only_b: u64,
    pub both: u64,
}

/// The seven compartments of a three-set diagram.
#[derive(Debug, Clone, Copy)]
pub struct Venn3 {
    pub only_a: u64,
    pub only_b: u64,
    pub only_c: u64,
    pub ab: u64,
    pub ac: u64,
    pub bc: u64,
    pub abc: u64,
}

fn count_text(value: u64, pos: (i32, i32)) -> Text<'static, (i32, i32), String> {
    Text::new(
        value.to_string(),
        pos,
        ("sans-serif", 24)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center)),
    )
}

fn set_label(label: &str, pos: (i32, i32)) -> Text<'_, (i32, i32), &str> {
    Text::new(
        label,
        pos,
        ("sans-serif", 20)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center)),
    )
}

/// Two-set Venn diagram: translucent circles with the compartment counts
/// printed inside.
pub fn draw_venn2<P: AsRef<Path>>(
    path: P,
    labels: (&str, &str),
    counts: Venn2,
    colors: (RGBColor, RGBColor),
) -> Result<()> {
    render_venn2(path.as_ref(), labels, counts, colors).map_err(render_err)
}

fn render_venn2(
    path: &Path,
    labels: (&str, &str),
    counts: Venn2,
    colors: (RGBColor, RGBColor),
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let radius = 180;
    let (ca, cb) = ((320, 320), (480, 320));
    root.draw(&Circle::new(ca, radius, colors.0.mix(0.45).filled()))?;
    root.draw(&Circle::new(cb, radius, colors.1.mix(0.45).filled()))?;
    root.draw(&Circle::new(ca, radius, colors.0.stroke_width(2)))?;
    root.draw(&Circle::new(cb, radius, colors.1.stroke_width(2)))?;

    root.draw(&set_label(labels.0, (250, 100)))?;
    root.draw(&set_label(labels.1, (550, 100)))?;
    root.draw(&count_text(counts.only_a, (230, 320)))?;
    root.draw(&count_text(counts.only_b, (570, 320)))?;
    root.draw(&count_text(counts.both, (400, 320)))?;

    root.present()?;
    Ok(())
}

/// Three-set Venn diagram with all seven compartment counts.
pub fn draw_venn3<P: AsRef<Path>>(
    path: P,
    labels: (&str, &str, &str),
    counts: Venn3,
    colors: (RGBColor, RGBColor, RGBColor),
) -> Result<()> {
    render_venn3(path.as_ref(), labels, counts, colors).map_err(render_err)
}

fn render_venn3(
    path: &Path,
    labels: (&str, &str, &str),
    counts: Venn3,
    colors: (RGBColor, RGBColor, RGBColor),
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, (800, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let radius = 160;
    let (ca, cb, cc) = ((330, 280), (470, 280), (400, 400));
    for (center, color) in [(ca, colors.0), (cb, colors.1), (cc, colors.2)] {
        root.draw(&Circle::new(center, radius, color.mix(0.35).filled()))?;
        root.draw(&Circle::new(center, radius, color.stroke_width(2)))?;
    }

    root.draw(&set_label(labels.0, (220, 90)))?;
    root.draw(&set_label(labels.1, (580, 90)))?;
    root.draw(&set_label(labels.2, (400, 600)))?;

    root.draw(&count_text(counts.only_a, (250, 240)))?;
    root.draw(&count_text(counts.only_b, (550, 240)))?;
    root.draw(&count_text(counts.only_c, (400, 480)))?;
    root.draw(&count_text(counts.ab, (400, 230)))?;
    root.draw(&count_text(counts.ac, (310, 370)))?;
    root.draw(&count_text(counts.bc, (490, 370)))?;
    root.draw(&count_text(counts.abc, (400, 320)))?;

    root.present()?;
    Ok(())
}
