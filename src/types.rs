//! Numeric validation and the canvas description.
//!
//! Values coming out of a script are plain `f64`s; everything that ends up
//! in geometry goes through [`try_positive`] first, and so do the products
//! derived from them, so NaN and infinities never reach the SVG.

use glam::DVec2;
use std::fmt;

/// Error type for invalid numeric values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericError {
    /// Value is NaN
    NaN,
    /// Value is infinite
    Infinite,
    /// Value is zero when non-zero required
    Zero,
    /// Value is negative when positive required
    Negative,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::NaN => write!(f, "value is NaN"),
            NumericError::Infinite => write!(f, "value is infinite"),
            NumericError::Zero => write!(f, "value is zero"),
            NumericError::Negative => write!(f, "value is negative"),
        }
    }
}

impl std::error::Error for NumericError {}

/// Accept a finite, strictly positive value
#[inline]
pub fn try_positive(val: f64) -> Result<f64, NumericError> {
    if val.is_nan() {
        Err(NumericError::NaN)
    } else if val.is_infinite() {
        Err(NumericError::Infinite)
    } else if val == 0.0 {
        Err(NumericError::Zero)
    } else if val < 0.0 {
        Err(NumericError::Negative)
    } else {
        Ok(val)
    }
}

/// Document sizing and resolution
///
/// `width` and `height` are in document units (inches); `dpi` converts them
/// to device units. `scale_factor` shrinks every primitive uniformly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    pub dpi: f64,
    pub scale_factor: f64,
}

impl Canvas {
    /// Create a canvas, validating every field.
    ///
    /// On failure, reports which field was rejected.
    pub fn try_new(
        width: f64,
        height: f64,
        dpi: f64,
        scale_factor: f64,
    ) -> Result<Canvas, (&'static str, NumericError)> {
        let canvas = Canvas {
            width: try_positive(width).map_err(|e| ("width", e))?,
            height: try_positive(height).map_err(|e| ("height", e))?,
            dpi: try_positive(dpi).map_err(|e| ("dpi", e))?,
            scale_factor: try_positive(scale_factor).map_err(|e| ("scale_factor", e))?,
        };
        // Each field can be fine while the products are not.
        try_positive(width * dpi).map_err(|e| ("width * dpi", e))?;
        try_positive(height * dpi).map_err(|e| ("height * dpi", e))?;
        try_positive(canvas.radius(1.0)).map_err(|e| ("dpi / scale_factor", e))?;
        Ok(canvas)
    }

    /// Document size in document units
    pub fn size(&self) -> DVec2 {
        DVec2::new(self.width, self.height)
    }

    /// Document size in device units, the extent of the viewbox
    pub fn device_size(&self) -> DVec2 {
        self.size() * self.dpi
    }

    /// Circumradius, in device units, of a primitive drawn at `scale`
    pub fn radius(&self, scale: f64) -> f64 {
        scale * self.dpi / self.scale_factor
    }
}
