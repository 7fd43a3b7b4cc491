//! SVG generation
//!
//! A tiny typed DOM covering the elements a drawing needs. Serialization is
//! its `Display` impl.

use glam::DVec2;
use std::fmt;

use super::Drawing;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const SVG_VERSION: &str = "1.1";

/// Root `<svg>` element
#[derive(Debug, Clone, PartialEq)]
pub struct Svg {
    pub width: String,
    pub height: String,
    pub view_box: String,
    pub children: Vec<SvgNode>,
}

/// Any SVG node we emit
#[derive(Debug, Clone, PartialEq)]
pub enum SvgNode {
    Polygon(Polygon),
}

/// SVG polygon element (`<polygon>`)
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub points: Points,
}

/// The `points` attribute of a polygon: `x,y` pairs separated by spaces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Points(pub Vec<DVec2>);

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{},{}", fmt_num(p.x), fmt_num(p.y))?;
        }
        Ok(())
    }
}

impl fmt::Display for SvgNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SvgNode::Polygon(polygon) => write!(f, "<polygon points=\"{}\" />", polygon.points),
        }
    }
}

impl fmt::Display for Svg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<?xml version=\"1.0\" encoding=\"utf-8\" ?>")?;
        writeln!(
            f,
            "<svg xmlns=\"{SVG_NS}\" version=\"{SVG_VERSION}\" width=\"{}\" height=\"{}\" viewBox=\"{}\">",
            self.width, self.height, self.view_box
        )?;
        for child in &self.children {
            writeln!(f, "  {child}")?;
        }
        writeln!(f, "</svg>")
    }
}

impl Drawing {
    /// Build the SVG document for this drawing.
    pub fn to_svg(&self) -> Svg {
        let size = self.size();
        let view_box = self.view_box();
        crate::log::debug!(
            width = size.x,
            height = size.y,
            polygons = self.polygons.len(),
            "generate svg"
        );

        Svg {
            width: format!("{}in", fmt_num(size.x)),
            height: format!("{}in", fmt_num(size.y)),
            view_box: format!("0 0 {} {}", fmt_num(view_box.x), fmt_num(view_box.y)),
            children: self
                .polygons
                .iter()
                .map(|points| {
                    SvgNode::Polygon(Polygon {
                        points: Points(points.clone()),
                    })
                })
                .collect(),
        }
    }
}

/// Format a coordinate with at most four decimals, trailing zeros trimmed.
pub(crate) fn fmt_num(value: f64) -> String {
    let s = format!("{value:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" => "0".to_string(),
        _ => s.to_string(),
    }
}
