//! arturo: render drawing scripts to SVG.
//!
//! A script is an indentation-based YAML subset with a `canvas` block and a
//! single layout:
//!
//! ```text
//! canvas:
//!   width: 8.5
//!   height: 11
//!   dpi: 600
//! tile:
//!   - triangle
//!   - triangle:
//!       scale: 2
//! ```
//!
//! Text goes through [`decode`](decode::decode) into a [`Value`](value::Value)
//! tree, through [`parse`](parse::parse) into a [`Script`](ast::Script), and
//! through [`render`](render::render) into a [`Drawing`](render::Drawing),
//! which serializes to SVG.

pub mod ast;
pub mod decode;
pub mod errors;
pub mod log;
pub mod parse;
pub mod render;
pub mod types;
pub mod value;

pub use ast::Script;
pub use errors::SourceContext;
pub use render::{Drawing, RenderOptions};

/// Render script source to SVG with default options.
pub fn arturo(source: &str) -> Result<String, miette::Report> {
    arturo_with_options("<input>", source, &RenderOptions::default())
}

/// Render script source to SVG.
///
/// `name` labels the source in diagnostics, usually a file name.
pub fn arturo_with_options(
    name: &str,
    source: &str,
    options: &RenderOptions,
) -> Result<String, miette::Report> {
    let ctx = SourceContext::new(name, source);
    let script = compile_in(&ctx)?;
    let drawing = render::render(&script, options).map_err(|e| ctx.report(e))?;
    Ok(drawing.to_svg().to_string())
}

/// Decode and parse script source without rendering it.
pub fn compile(name: &str, source: &str) -> Result<Script, miette::Report> {
    compile_in(&SourceContext::new(name, source))
}

fn compile_in(ctx: &SourceContext) -> Result<Script, miette::Report> {
    let document = decode::decode(&ctx.source).map_err(|e| ctx.report(e))?;
    parse::parse(&document).map_err(|e| ctx.report(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_minimal_script() {
        let svg = arturo("canvas: {width: 1, height: 1, dpi: 100}\ntile: [triangle]\n").unwrap();
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("viewBox=\"0 0 100 100\""));
        assert_eq!(svg.matches("<polygon").count(), 1);
    }

    #[test]
    fn compile_skips_rendering() {
        // No canvas: fine to compile, fails to render.
        let script = compile("test.art", "tile: [square]\n").unwrap();
        assert!(script.meta.is_empty());
        assert!(arturo("tile: [square]\n").is_err());
    }

    #[test]
    fn reports_carry_codes_and_source() {
        let report = compile("bad.art", "tile: [circle]\n").unwrap_err();
        let code = report.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("arturo::parse::unknown_instruction"));
        assert!(report.source_code().is_some());
    }

    #[test]
    fn options_reach_the_renderer() {
        let source = "canvas: {width: 2, height: 2, dpi: 10}\ntile: [square, triangle]\n";
        let all = RenderOptions { tile_all: true };
        let svg = arturo_with_options("two.art", source, &all).unwrap();
        assert_eq!(svg.matches("<polygon").count(), 2);
    }
}
