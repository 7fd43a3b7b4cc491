//! Drawing operations
//!
//! Instructions are lowered into [`Op`]s before anything is drawn. Lowering
//! checks every property against what the operation understands, so a
//! script with a bad property fails as a whole instead of drawing partially.

use enum_dispatch::enum_dispatch;
use miette::SourceSpan;

use crate::ast::{Instruction, InstructionName, LayoutName, Primitive};
use crate::errors::RenderError;
use crate::types::try_positive;
use crate::value::{Key, Value};

use super::Painter;
use super::defaults;
use super::geometry::regular_polygon;

/// Something that can draw into the current context
#[enum_dispatch]
pub trait Draw {
    fn draw(&self, painter: &mut Painter<'_>) -> Result<(), RenderError>;
}

/// A lowered instruction
#[enum_dispatch(Draw)]
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Tile(TileOp),
    Polygon(PolygonOp),
}

impl Op {
    /// Lower an instruction and everything beneath it.
    pub fn lower(instr: &Instruction) -> Result<Op, RenderError> {
        match instr.name {
            InstructionName::Layout(LayoutName::Tile) => TileOp::lower(instr).map(Op::Tile),
            InstructionName::Primitive(primitive) => {
                PolygonOp::lower(primitive, instr).map(Op::Polygon)
            }
        }
    }
}

/// `tile`: draws its children under the current context
#[derive(Debug, Clone, PartialEq)]
pub struct TileOp {
    pub children: Vec<Op>,
    pub span: SourceSpan,
}

impl TileOp {
    const NAME: &'static str = "tile";

    fn lower(instr: &Instruction) -> Result<TileOp, RenderError> {
        if let Some((key, _)) = instr.kwargs.iter().next() {
            return Err(RenderError::UnknownProperty {
                key: key.name.clone(),
                name: Self::NAME,
                help: "`tile` takes no properties, only children under `do`".to_string(),
                span: key.span,
            });
        }

        let group = instr.children().ok_or(RenderError::MissingGroup {
            name: Self::NAME,
            span: instr.span,
        })?;
        if group.is_empty() {
            return Err(RenderError::EmptyLayout {
                name: Self::NAME,
                span: instr.span,
            });
        }

        let children = group.iter().map(Op::lower).collect::<Result<_, _>>()?;
        Ok(TileOp {
            children,
            span: instr.span,
        })
    }
}

impl Draw for TileOp {
    fn draw(&self, painter: &mut Painter<'_>) -> Result<(), RenderError> {
        let drawn = if painter.options.tile_all {
            &self.children[..]
        } else {
            &self.children[..self.children.len().min(1)]
        };

        let skipped = self.children.len() - drawn.len();
        if skipped > 0 {
            crate::log::warn!(skipped, "tile draws only its first child");
        }

        for child in drawn {
            child.draw(painter)?;
        }
        Ok(())
    }
}

/// A regular polygon primitive
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonOp {
    pub name: &'static str,
    pub sides: u32,
    pub scale: f64,
    /// Where `scale` was given, or the instruction when it defaulted
    pub scale_span: SourceSpan,
    pub span: SourceSpan,
}

impl PolygonOp {
    fn lower(primitive: Primitive, instr: &Instruction) -> Result<PolygonOp, RenderError> {
        let name = primitive.name();
        let mut sides = primitive.vertex_count();
        let mut scale = defaults::SCALE;
        let mut scale_span = instr.span;

        for (key, value) in instr.kwargs.iter() {
            match key.name.as_str() {
                defaults::SCALE_KEY => {
                    let n = number(name, key, value)?;
                    scale = try_positive(n).map_err(|e| invalid(name, key, e.to_string()))?;
                    scale_span = key.span;
                }
                defaults::SIDES_KEY if primitive == Primitive::Poly => {
                    sides = Some(side_count(name, key, value)?);
                }
                _ => {
                    return Err(RenderError::UnknownProperty {
                        key: key.name.clone(),
                        name,
                        help: accepted_properties(primitive),
                        span: key.span,
                    });
                }
            }
        }

        let sides = sides.ok_or_else(|| RenderError::InvalidProperty {
            key: defaults::SIDES_KEY.to_string(),
            name,
            reason: "required but not given".to_string(),
            span: instr.span,
        })?;

        Ok(PolygonOp {
            name,
            sides,
            scale,
            scale_span,
            span: instr.span,
        })
    }

    fn too_large(&self, reason: String) -> RenderError {
        RenderError::InvalidProperty {
            key: defaults::SCALE_KEY.to_string(),
            name: self.name,
            reason,
            span: self.scale_span,
        }
    }
}

impl Draw for PolygonOp {
    fn draw(&self, painter: &mut Painter<'_>) -> Result<(), RenderError> {
        let ctx = painter.stack.top()?;
        try_positive(ctx.canvas.radius(self.scale))
            .map_err(|e| self.too_large(format!("radius on this canvas: {e}")))?;
        let points = regular_polygon(self.sides, self.scale, ctx);
        if !points.iter().all(|p| p.is_finite()) {
            return Err(self.too_large("vertices overflow on this canvas".to_string()));
        }
        crate::log::debug!(
            sides = self.sides,
            scale = self.scale,
            x = ctx.origin.x,
            y = ctx.origin.y,
            "emit polygon"
        );
        painter.polygons.push(points);
        Ok(())
    }
}

fn invalid(name: &'static str, key: &Key, reason: String) -> RenderError {
    RenderError::InvalidProperty {
        key: key.name.clone(),
        name,
        reason,
        span: key.span,
    }
}

fn number(name: &'static str, key: &Key, value: &Value) -> Result<f64, RenderError> {
    value.as_f64().ok_or_else(|| {
        invalid(
            name,
            key,
            format!("expected a number, found {}", value.type_name()),
        )
    })
}

fn side_count(name: &'static str, key: &Key, value: &Value) -> Result<u32, RenderError> {
    let n = number(name, key, value)?;
    let range = f64::from(defaults::MIN_SIDES)..=f64::from(defaults::MAX_SIDES);
    if n.fract() != 0.0 || !range.contains(&n) {
        return Err(invalid(
            name,
            key,
            format!(
                "expected a whole number from {} to {}",
                defaults::MIN_SIDES,
                defaults::MAX_SIDES
            ),
        ));
    }
    Ok(n as u32)
}

fn accepted_properties(primitive: Primitive) -> String {
    match primitive {
        Primitive::Poly => format!(
            "`poly` accepts `{}` and `{}`",
            defaults::SIDES_KEY,
            defaults::SCALE_KEY
        ),
        other => format!("`{other}` accepts `{}`", defaults::SCALE_KEY),
    }
}
