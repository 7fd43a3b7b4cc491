//! Rendering of scripts into drawings
//!
//! This module is organized into submodules:
//! - `defaults`: Default settings and property names
//! - `context`: The drawing context stack
//! - `ops`: Lowered instructions and the `Draw` trait
//! - `geometry`: Polygon vertex computation
//! - `svg`: SVG generation

pub mod context;
pub mod defaults;
pub mod geometry;
pub mod ops;
pub mod svg;

use std::rc::Rc;

use glam::DVec2;

use crate::ast::{MetaKey, Script};
use crate::errors::RenderError;
use crate::types::Canvas;
use crate::value::Mapping;

pub use context::{ContextStack, DrawContext, Scope};
pub use ops::{Draw, Op};

/// Polygon vertices in device units
pub type Polygon = Vec<DVec2>;

/// Per-invocation rendering switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Draw every child of a `tile`, instead of only the first
    pub tile_all: bool,
}

/// The result of rendering a script
#[derive(Debug, Clone, PartialEq)]
pub struct Drawing {
    pub canvas: Canvas,
    /// Polygons in emission order
    pub polygons: Vec<Polygon>,
}

impl Drawing {
    /// Document size in document units (inches)
    pub fn size(&self) -> DVec2 {
        self.canvas.size()
    }

    /// Extent of the viewbox in device units
    pub fn view_box(&self) -> DVec2 {
        self.canvas.device_size()
    }
}

/// What an [`Op`] draws with: the context stack and the output
pub struct Painter<'a> {
    pub stack: &'a mut ContextStack,
    pub polygons: &'a mut Vec<Polygon>,
    pub options: RenderOptions,
}

/// Walks a script and collects its polygons
#[derive(Debug, Default)]
pub struct Engine {
    stack: ContextStack,
    polygons: Vec<Polygon>,
    options: RenderOptions,
}

impl Engine {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Current depth of the context stack
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// Render a whole script.
    ///
    /// Builds the canvas, installs the only absolute context at the origin
    /// and draws the layout under it.
    pub fn render_root(&mut self, script: &Script) -> Result<Drawing, RenderError> {
        let canvas = Rc::new(canvas_from_meta(script)?);
        let root = Op::lower(&script.layout)?;
        self.polygons.clear();
        crate::log::debug!(
            width = canvas.width,
            height = canvas.height,
            dpi = canvas.dpi,
            scale_factor = canvas.scale_factor,
            "render root"
        );

        {
            let mut scope = self.stack.push_absolute(Rc::clone(&canvas), DVec2::ZERO);
            let mut painter = Painter {
                stack: &mut *scope,
                polygons: &mut self.polygons,
                options: self.options,
            };
            root.draw(&mut painter)?;
        }

        Ok(Drawing {
            canvas: *canvas,
            polygons: std::mem::take(&mut self.polygons),
        })
    }
}

/// Render a script into a drawing
pub fn render(script: &Script, options: &RenderOptions) -> Result<Drawing, RenderError> {
    Engine::new(*options).render_root(script)
}

fn canvas_from_meta(script: &Script) -> Result<Canvas, RenderError> {
    let value = script
        .meta(MetaKey::Canvas)
        .ok_or(RenderError::MissingCanvas)?;
    let map = value.as_mapping().ok_or_else(|| RenderError::InvalidCanvas {
        reason: format!("expected a mapping, found {}", value.type_name()),
        span: value.span,
    })?;

    let known = [
        defaults::CANVAS_WIDTH,
        defaults::CANVAS_HEIGHT,
        defaults::CANVAS_DPI,
        defaults::CANVAS_SCALE_FACTOR,
    ];
    if let Some(key) = map.keys().find(|k| !known.contains(&k.name.as_str())) {
        return Err(RenderError::InvalidCanvas {
            reason: format!("unknown key `{key}`"),
            span: key.span,
        });
    }

    let required = |name: &str| {
        canvas_field(map, name)?.ok_or_else(|| RenderError::InvalidCanvas {
            reason: format!("missing `{name}`"),
            span: value.span,
        })
    };
    let width = required(defaults::CANVAS_WIDTH)?;
    let height = required(defaults::CANVAS_HEIGHT)?;
    let dpi = required(defaults::CANVAS_DPI)?;
    let scale_factor =
        canvas_field(map, defaults::CANVAS_SCALE_FACTOR)?.unwrap_or(defaults::SCALE_FACTOR);

    Canvas::try_new(width, height, dpi, scale_factor).map_err(|(name, e)| {
        let span = map.get(name).map_or(value.span, |v| v.span);
        RenderError::InvalidCanvas {
            reason: format!("`{name}` must be positive and finite, {e}"),
            span,
        }
    })
}

fn canvas_field(map: &Mapping, name: &str) -> Result<Option<f64>, RenderError> {
    let Some(value) = map.get(name) else {
        return Ok(None);
    };
    value.as_f64().map(Some).ok_or_else(|| RenderError::InvalidCanvas {
        reason: format!("`{name}` must be a number, found {}", value.type_name()),
        span: value.span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;
    use crate::parse::parse;

    fn script(source: &str) -> Script {
        parse(&decode(source).unwrap()).unwrap()
    }

    fn draw(source: &str) -> Result<Drawing, RenderError> {
        render(&script(source), &RenderOptions::default())
    }

    const CANVAS: &str = "canvas: {width: 1, height: 1, dpi: 100}\n";

    #[test]
    fn single_triangle() {
        let drawing = draw(&format!("{CANVAS}tile: [triangle]\n")).unwrap();
        assert_eq!(drawing.polygons.len(), 1);
        assert_eq!(drawing.polygons[0].len(), 3);
        assert_eq!(drawing.size(), DVec2::new(1.0, 1.0));
        assert_eq!(drawing.view_box(), DVec2::new(100.0, 100.0));
    }

    #[test]
    fn tile_draws_first_child_by_default() {
        let drawing = draw(&format!("{CANVAS}tile: [square, triangle, hexagon]\n")).unwrap();
        assert_eq!(drawing.polygons.len(), 1);
        assert_eq!(drawing.polygons[0].len(), 4);
    }

    #[test]
    fn tile_all_draws_every_child_in_order() {
        let script = script(&format!("{CANVAS}tile: [square, triangle, hexagon]\n"));
        let options = RenderOptions { tile_all: true };
        let drawing = render(&script, &options).unwrap();
        let counts: Vec<_> = drawing.polygons.iter().map(Vec::len).collect();
        assert_eq!(counts, [4, 3, 6]);
    }

    #[test]
    fn nested_tiles() {
        let source = format!("{CANVAS}tile:\n  - tile: [pentagon, square]\n  - triangle\n");
        let script = script(&source);

        let first = render(&script, &RenderOptions::default()).unwrap();
        assert_eq!(first.polygons.len(), 1);
        assert_eq!(first.polygons[0].len(), 5);

        let all = render(&script, &RenderOptions { tile_all: true }).unwrap();
        let counts: Vec<_> = all.polygons.iter().map(Vec::len).collect();
        assert_eq!(counts, [5, 4, 3]);
    }

    #[test]
    fn scale_factor_shrinks_polygons() {
        let plain = draw(&format!("{CANVAS}tile: [square]\n")).unwrap();
        let shrunk = draw(
            "canvas: {width: 1, height: 1, dpi: 100, scale_factor: 2}\ntile: [square]\n",
        )
        .unwrap();
        assert_eq!(shrunk.canvas.scale_factor, 2.0);
        let max = |d: &Drawing| d.polygons[0].iter().fold(0.0_f64, |m, p| m.max(p.x));
        assert!(max(&shrunk) < max(&plain));
    }

    #[test]
    fn missing_canvas() {
        let err = draw("tile: [triangle]\n").unwrap_err();
        assert!(matches!(err, RenderError::MissingCanvas));
    }

    #[test]
    fn invalid_canvas() {
        for (canvas, needle) in [
            ("canvas: 3", "expected a mapping"),
            ("canvas: {width: 1, height: 1}", "missing `dpi`"),
            ("canvas: {width: 1, height: 1, dpi: 100, depth: 2}", "unknown key `depth`"),
            ("canvas: {width: wide, height: 1, dpi: 100}", "`width` must be a number"),
            ("canvas: {width: 1, height: 1, dpi: 0}", "`dpi` must be positive"),
            ("canvas: {width: 1, height: -1, dpi: 100}", "`height` must be positive"),
            (
                "canvas: {width: 1e300, height: 1, dpi: 1e300, scale_factor: 1e-300}",
                "`width * dpi` must be positive and finite, value is infinite",
            ),
            (
                "canvas: {width: 1, height: 1, dpi: 1e300, scale_factor: 1e-300}",
                "`dpi / scale_factor` must be positive and finite",
            ),
        ] {
            let err = draw(&format!("{canvas}\ntile: [triangle]\n")).unwrap_err();
            match err {
                RenderError::InvalidCanvas { reason, .. } => {
                    assert!(reason.contains(needle), "{canvas}: {reason}")
                }
                other => panic!("{canvas}: unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn stack_is_balanced_after_success() {
        let mut engine = Engine::new(RenderOptions { tile_all: true });
        engine
            .render_root(&script(&format!("{CANVAS}tile: [square, triangle]\n")))
            .unwrap();
        assert_eq!(engine.depth(), 0);
    }

    #[test]
    fn stack_is_balanced_after_failure() {
        let mut engine = Engine::default();
        let bad = script(&format!("{CANVAS}tile: [{{square: {{scale: -2}}}}]\n"));
        assert!(engine.render_root(&bad).is_err());
        assert_eq!(engine.depth(), 0);

        let mut stack = ContextStack::new();
        let mut polygons = Vec::new();
        let mut painter = Painter {
            stack: &mut stack,
            polygons: &mut polygons,
            options: RenderOptions::default(),
        };
        let op = Op::lower(&script(&format!("{CANVAS}tile: [square]\n")).layout).unwrap();
        assert!(matches!(
            op.draw(&mut painter),
            Err(RenderError::StackUnderflow)
        ));
        assert_eq!(stack.depth(), 0);
        assert!(polygons.is_empty());
    }

    #[test]
    fn engine_is_reusable() {
        let mut engine = Engine::default();
        let script = script(&format!("{CANVAS}tile: [square]\n"));
        let first = engine.render_root(&script).unwrap();
        let second = engine.render_root(&script).unwrap();
        assert_eq!(first, second);
    }
}
