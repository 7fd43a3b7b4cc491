//! Abstract Syntax Tree types for arturo scripts
//!
//! A script is a set of metadata blocks plus exactly one layout tree. The
//! names that may appear in a script form small closed vocabularies, so an
//! instruction that parsed successfully always has a renderer.

use miette::SourceSpan;

use crate::value::{Mapping, Value};

/// Key under which a layout's mapping body lists its children
pub const CHILDREN_KEY: &str = "do";

/// Declares a closed vocabulary of names as a fieldless enum.
macro_rules! vocabulary {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $text),*
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($text => Some($name::$variant),)*
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

vocabulary! {
    /// Recognized top-level metadata blocks
    MetaKey {
        Canvas => "canvas",
    }
}

vocabulary! {
    /// Composite instructions that arrange their children
    LayoutName {
        Tile => "tile",
    }
}

vocabulary! {
    /// Leaf instructions that emit geometry
    Primitive {
        Triangle => "triangle",
        Square => "square",
        Pentagon => "pentagon",
        Hexagon => "hexagon",
        Octagon => "octagon",
        Poly => "poly",
    }
}

impl Primitive {
    /// Vertex count of the regular polygon this primitive draws.
    ///
    /// `poly` takes its vertex count from the `sides` property instead.
    pub fn vertex_count(self) -> Option<u32> {
        match self {
            Primitive::Triangle => Some(3),
            Primitive::Square => Some(4),
            Primitive::Pentagon => Some(5),
            Primitive::Hexagon => Some(6),
            Primitive::Octagon => Some(8),
            Primitive::Poly => None,
        }
    }
}

/// Comma-separated list of a vocabulary's names, for help messages
pub fn list_names<T: Copy>(all: &[T], name: impl Fn(T) -> &'static str) -> String {
    all.iter()
        .map(|&item| format!("`{}`", name(item)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A complete script
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    /// Metadata blocks in document order
    pub meta: Vec<(MetaKey, Value)>,
    pub layout: Instruction,
}

impl Script {
    pub fn meta(&self, key: MetaKey) -> Option<&Value> {
        self.meta.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// The name of an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionName {
    Layout(LayoutName),
    Primitive(Primitive),
}

impl InstructionName {
    pub fn from_name(name: &str) -> Option<Self> {
        LayoutName::from_name(name)
            .map(InstructionName::Layout)
            .or_else(|| Primitive::from_name(name).map(InstructionName::Primitive))
    }

    pub fn name(self) -> &'static str {
        match self {
            InstructionName::Layout(l) => l.name(),
            InstructionName::Primitive(p) => p.name(),
        }
    }
}

impl std::fmt::Display for InstructionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One node of the layout tree
#[derive(Debug, Clone)]
pub struct Instruction {
    pub name: InstructionName,
    /// Positional arguments; a layout carries its children as one group
    pub args: Vec<Arg>,
    /// Named properties such as `scale`
    pub kwargs: Mapping,
    /// Where the instruction's name was written
    pub span: SourceSpan,
}

impl PartialEq for Instruction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.args == other.args && self.kwargs == other.kwargs
    }
}

impl Instruction {
    pub fn new(name: InstructionName, span: SourceSpan) -> Self {
        Self {
            name,
            args: Vec::new(),
            kwargs: Mapping::new(),
            span,
        }
    }

    pub fn with_args(mut self, args: Vec<Arg>) -> Self {
        self.args = args;
        self
    }

    pub fn with_kwargs(mut self, kwargs: Mapping) -> Self {
        self.kwargs = kwargs;
        self
    }

    /// The child group of a layout instruction
    pub fn children(&self) -> Option<&[Instruction]> {
        self.args.iter().find_map(|arg| match arg {
            Arg::Group(children) => Some(children.as_slice()),
            Arg::Instruction(_) => None,
        })
    }
}

/// A positional argument of an instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Instruction(Instruction),
    /// Children that travel together, such as the elements of a tile
    Group(Vec<Instruction>),
}
