//! Default settings and property names

/// `scale` of a primitive when the script gives none
pub const SCALE: f64 = 1.0;
/// `scale_factor` of the canvas when the script gives none
pub const SCALE_FACTOR: f64 = 1.0;

/// Smallest vertex count of a regular polygon
pub const MIN_SIDES: u32 = 3;
/// Largest vertex count accepted from `sides`
pub const MAX_SIDES: u32 = 4096;

pub const SCALE_KEY: &str = "scale";
pub const SIDES_KEY: &str = "sides";

pub const CANVAS_WIDTH: &str = "width";
pub const CANVAS_HEIGHT: &str = "height";
pub const CANVAS_DPI: &str = "dpi";
pub const CANVAS_SCALE_FACTOR: &str = "scale_factor";
