//! Error types with rich diagnostics using miette
//!
//! Errors carry spans into the script text; the text itself is attached
//! once, at the pipeline boundary, through [`SourceContext`].

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Source context for error reporting
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Name of the source (filename or "<input>")
    pub name: String,
    /// The full source text
    pub source: String,
}

impl SourceContext {
    /// Create a new source context
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Create a NamedSource for miette
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, self.source.clone())
    }

    /// Turn a diagnostic into a report that renders against this source
    pub fn report<E>(&self, err: E) -> miette::Report
    where
        E: Diagnostic + Send + Sync + 'static,
    {
        miette::Report::new(err).with_source_code(self.named_source())
    }
}

// ============================================================================
// Decode Errors
// ============================================================================

/// Errors that occur while decoding script text into values
#[derive(Error, Diagnostic, Debug)]
pub enum DecodeError {
    #[error("syntax error: {message}")]
    #[diagnostic(code(arturo::decode::syntax))]
    Syntax {
        message: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("unexpected indentation")]
    #[diagnostic(
        code(arturo::decode::unexpected_indent),
        help("nested values go under a `key:` or `-` on the line above")
    )]
    UnexpectedIndent {
        #[label("this line does not belong to the block above")]
        span: SourceSpan,
    },

    #[error("duplicate key: {key}")]
    #[diagnostic(code(arturo::decode::duplicate_key))]
    DuplicateKey {
        key: String,
        #[label("first defined here")]
        first: SourceSpan,
        #[label("defined again here")]
        span: SourceSpan,
    },

    #[error("number out of range: {text}")]
    #[diagnostic(
        code(arturo::decode::number_out_of_range),
        help("numbers must fit in a 64-bit float")
    )]
    NumberOutOfRange {
        text: String,
        #[label("too large to represent")]
        span: SourceSpan,
    },
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Errors that occur while shaping decoded values into a script
#[derive(Error, Diagnostic, Debug)]
pub enum ParseError {
    #[error("expected a mapping at the top of the script, found {found}")]
    #[diagnostic(
        code(arturo::parse::expected_mapping),
        help("a script is a mapping with a `canvas` entry and one layout such as `tile`")
    )]
    ExpectedMapping {
        found: &'static str,
        #[label("not a mapping")]
        span: SourceSpan,
    },

    #[error("unknown key: {key}")]
    #[diagnostic(code(arturo::parse::unknown_key))]
    UnknownKey {
        key: String,
        #[help]
        help: String,
        #[label("not a metadata block or layout")]
        span: SourceSpan,
    },

    #[error("only one layout is allowed per script, found `{first_name}` and `{second_name}`")]
    #[diagnostic(code(arturo::parse::multiple_layouts))]
    MultipleLayouts {
        first_name: String,
        second_name: String,
        #[label("first layout")]
        first: SourceSpan,
        #[label("second layout")]
        second: SourceSpan,
    },

    #[error("metadata block `{key}` is given more than once")]
    #[diagnostic(code(arturo::parse::duplicate_meta))]
    DuplicateMeta {
        key: String,
        #[label("first given here")]
        first: SourceSpan,
        #[label("given again here")]
        span: SourceSpan,
    },

    #[error("script has no layout")]
    #[diagnostic(code(arturo::parse::missing_layout), help("add a layout, e.g. `tile: [triangle]`"))]
    MissingLayout {
        #[label("expected a layout in this document")]
        span: SourceSpan,
    },

    #[error("layout `{name}` has no children")]
    #[diagnostic(
        code(arturo::parse::missing_children),
        help("give the layout a list of elements, or a mapping with the elements under `do`")
    )]
    MissingChildren {
        name: String,
        #[label("children expected here")]
        span: SourceSpan,
    },

    #[error("expected a sequence of elements, found {found}")]
    #[diagnostic(code(arturo::parse::expected_sequence))]
    ExpectedSequence {
        found: &'static str,
        #[label("not a sequence")]
        span: SourceSpan,
    },

    #[error("unknown instruction: {name}")]
    #[diagnostic(code(arturo::parse::unknown_instruction))]
    UnknownInstruction {
        name: String,
        #[help]
        help: String,
        #[label("not a primitive or layout")]
        span: SourceSpan,
    },

    #[error("malformed element: {reason}")]
    #[diagnostic(
        code(arturo::parse::malformed_element),
        help("an element is a bare name like `triangle` or a single entry with its properties nested under the name")
    )]
    MalformedElement {
        reason: String,
        #[label("this element")]
        span: SourceSpan,
    },

    #[error("`{key}` is reserved and cannot be a property of `{name}`")]
    #[diagnostic(code(arturo::parse::reserved_property))]
    ReservedProperty {
        key: String,
        name: String,
        #[label("reserved for layout children")]
        span: SourceSpan,
    },
}

// ============================================================================
// Render Errors
// ============================================================================

/// Errors that occur during rendering
#[derive(Error, Diagnostic, Debug)]
pub enum RenderError {
    #[error("script has no canvas")]
    #[diagnostic(
        code(arturo::render::missing_canvas),
        help("add a `canvas` block with `width`, `height` and `dpi`")
    )]
    MissingCanvas,

    #[error("invalid canvas: {reason}")]
    #[diagnostic(code(arturo::render::invalid_canvas))]
    InvalidCanvas {
        reason: String,
        #[label("{reason}")]
        span: SourceSpan,
    },

    #[error("unknown property `{key}` on `{name}`")]
    #[diagnostic(code(arturo::render::unknown_property))]
    UnknownProperty {
        key: String,
        name: &'static str,
        #[help]
        help: String,
        #[label("not understood by `{name}`")]
        span: SourceSpan,
    },

    #[error("invalid property `{key}` on `{name}`: {reason}")]
    #[diagnostic(code(arturo::render::invalid_property))]
    InvalidProperty {
        key: String,
        name: &'static str,
        reason: String,
        #[label("{reason}")]
        span: SourceSpan,
    },

    #[error("layout `{name}` has nothing to draw")]
    #[diagnostic(code(arturo::render::empty_layout))]
    EmptyLayout {
        name: &'static str,
        #[label("empty layout")]
        span: SourceSpan,
    },

    #[error("internal error: `{name}` was rendered without its child group")]
    #[diagnostic(code(arturo::render::missing_group))]
    MissingGroup {
        name: &'static str,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("internal error: draw context stack is empty")]
    #[diagnostic(code(arturo::render::stack_underflow))]
    StackUnderflow,
}
