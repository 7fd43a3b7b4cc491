//! Polygon geometry

use glam::{DVec2, dvec2};
use std::f64::consts::PI;

use super::context::DrawContext;

/// Vertices of a regular polygon, in device units.
///
/// The circumradius is `scale * dpi / scale_factor`. The polygon's bounding
/// circle touches the context origin at its top-left corner rather than
/// being centered on it, and vertex `i` (for `i` in `1..=sides`) sits at
/// angle `π/n + i·2π/n`, measured from the +y axis.
pub fn regular_polygon(sides: u32, scale: f64, ctx: &DrawContext) -> Vec<DVec2> {
    let radius = ctx.canvas.radius(scale);
    let angle = PI / f64::from(sides);
    let offset = radius;

    (1..=sides)
        .map(|i| {
            let theta = angle + f64::from(i) * 2.0 * angle;
            dvec2(
                ctx.origin.x + offset + radius * theta.sin(),
                ctx.origin.y + offset + radius * theta.cos(),
            )
        })
        .collect()
}
