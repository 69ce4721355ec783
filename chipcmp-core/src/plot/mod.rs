//! Rendering of heatmaps, scatter plots, Venn diagrams and coverage
//! snapshots to PNG files.

pub mod heatmap;
pub mod scatter;
pub mod snapshot;
pub mod venn;

use anyhow::{anyhow, bail, Result};
pub use plotters::style::RGBColor;

/// Sequential and diverging color scales for heatmap cells. Gradients are
/// linear interpolations between a few anchor colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    Reds,
    Blues,
    Greens,
    RdBu,
    YlOrRd,
}

impl Colormap {
    fn stops(self) -> &'static [(u8, u8, u8)] {
        match self {
            Colormap::Reds => &[(255, 245, 240), (251, 106, 74), (103, 0, 13)],
            Colormap::Blues => &[(247, 251, 255), (107, 174, 214), (8, 48, 107)],
            Colormap::Greens => &[(247, 252, 245), (116, 196, 118), (0, 68, 27)],
            Colormap::RdBu => &[(33, 102, 172), (247, 247, 247), (178, 24, 43)],
            Colormap::YlOrRd => &[(255, 255, 204), (254, 178, 76), (189, 0, 38)],
        }
    }

    /// Color at position `t` in `[0, 1]`; values outside are clamped.
    pub fn color(self, t: f64) -> RGBColor {
        let stops = self.stops();
        let t = t.clamp(0.0, 1.0) * (stops.len() - 1) as f64;
        let i = (t.floor() as usize).min(stops.len() - 2);
        let frac = t - i as f64;
        let (r0, g0, b0) = stops[i];
        let (r1, g1, b1) = stops[i + 1];
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
    }
}

impl std::str::FromStr for Colormap {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "reds" => Ok(Colormap::Reds),
            "blues" => Ok(Colormap::Blues),
            "greens" => Ok(Colormap::Greens),
            "rdbu" => Ok(Colormap::RdBu),
            "ylorrd" => Ok(Colormap::YlOrRd),
            other => bail!("unknown colormap: {}", other),
        }
    }
}

/// Parse a color given either as a `#rrggbb` hex string or as one of a few
/// well-known names.
pub fn parse_color(s: &str) -> Result<RGBColor> {
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() != 6 {
            bail!("malformed hex color: {}", s);
        }
        let r = u8::from_str_radix(&hex[0..2], 16)?;
        let g = u8::from_str_radix(&hex[2..4], 16)?;
        let b = u8::from_str_radix(&hex[4..6], 16)?;
        return Ok(RGBColor(r, g, b));
    }
    match s.to_ascii_lowercase().as_str() {
        "red" => Ok(RGBColor(214, 39, 40)),
        "blue" => Ok(RGBColor(31, 119, 180)),
        "green" => Ok(RGBColor(44, 160, 44)),
        "orange" => Ok(RGBColor(255, 127, 14)),
        "purple" => Ok(RGBColor(148, 103, 189)),
        "grey" | "gray" => Ok(RGBColor(127, 127, 127)),
        "black" => Ok(RGBColor(0, 0, 0)),
        other => bail!("unknown color: {}", other),
    }
}

/// plotters reports drawing failures through backend-specific error types
/// that do not always satisfy `anyhow`'s bounds; render internally with
/// `Box<dyn Error>` and convert at the boundary.
pub(crate) fn render_err(e: Box<dyn std::error::Error>) -> anyhow::Error {
    anyhow!("rendering failed: {}", e)
}

/// Value range of a matrix, used when vmin/vmax are not given explicitly.
pub(crate) fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values {
        if v.is_finite() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    if lo > hi {
        (0.0, 1.0)
    } else if lo == hi {
        (lo, lo + 1.0)
    } else {
        (lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colormap_endpoints() {
        assert_eq!(Colormap::Reds.color(0.0), RGBColor(255, 245, 240));
        assert_eq!(Colormap::Reds.color(1.0), RGBColor(103, 0, 13));
        assert_eq!(Colormap::Reds.color(-5.0), Colormap::Reds.color(0.0));
        assert_eq!(Colormap::Reds.color(9.0), Colormap::Reds.color(1.0));
        assert_eq!(Colormap::RdBu.color(0.5), RGBColor(247, 247, 247));
    }

    #[test]
    fn test_colormap_names() {
        assert_eq!("RdBu".parse::<Colormap>().unwrap(), Colormap::RdBu);
        assert_eq!("ylorrd".parse::<Colormap>().unwrap(), Colormap::YlOrRd);
        assert!("viridis".parse::<Colormap>().is_err());
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff0080").unwrap(), RGBColor(255, 0, 128));
        assert_eq!(parse_color("black").unwrap(), RGBColor(0, 0, 0));
        assert!(parse_color("#ff00").is_err());
        assert!(parse_color("chartreuse").is_err());
    }

    #[test]
    fn test_value_range() {
        assert_eq!(value_range([1.0, -2.0, 3.0].into_iter()), (-2.0, 3.0));
        assert_eq!(value_range([5.0, 5.0].into_iter()), (5.0, 6.0));
        assert_eq!(value_range(std::iter::empty()), (0.0, 1.0));
    }
}
