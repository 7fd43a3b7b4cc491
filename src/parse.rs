//! Shape decoded values into a [`Script`]
//!
//! An instruction can be written three ways:
//!
//! ```text
//! triangle                  # bare name, no properties
//!
//! tile:                     # name over a list: the list is the children
//!   - triangle
//!
//! tile:                     # name over a mapping: properties, with the
//!   some_property: 1        # children under the reserved `do` key
//!   do:
//!     - triangle
//! ```

use miette::SourceSpan;

use crate::ast::*;
use crate::errors::ParseError;
use crate::value::{Key, Mapping, Value, ValueKind};

/// Parse a decoded document into a script
pub fn parse(document: &Value) -> Result<Script, ParseError> {
    let Some(top) = document.as_mapping() else {
        return Err(ParseError::ExpectedMapping {
            found: document.type_name(),
            span: document.span,
        });
    };

    let mut meta = Vec::new();
    let mut meta_keys: Vec<&Key> = Vec::new();
    let mut layout: Option<(&Key, Instruction)> = None;

    // The top-level mapping may repeat names; each one is allowed once here.
    for (key, value) in top.iter() {
        if let Some(meta_key) = MetaKey::from_name(&key.name) {
            if let Some(first) = meta_keys.iter().find(|k| k.name == key.name) {
                return Err(ParseError::DuplicateMeta {
                    key: key.name.clone(),
                    first: first.span,
                    span: key.span,
                });
            }
            meta_keys.push(key);
            meta.push((meta_key, value.clone()));
        } else if let Some(name) = LayoutName::from_name(&key.name) {
            if let Some((first, _)) = &layout {
                return Err(ParseError::MultipleLayouts {
                    first_name: first.name.clone(),
                    second_name: key.name.clone(),
                    first: first.span,
                    second: key.span,
                });
            }
            layout = Some((key, parse_layout(name, key.span, value)?));
        } else {
            return Err(ParseError::UnknownKey {
                key: key.name.clone(),
                help: format!(
                    "metadata blocks are {}; layouts are {}",
                    list_names(MetaKey::ALL, MetaKey::name),
                    list_names(LayoutName::ALL, LayoutName::name)
                ),
                span: key.span,
            });
        }
    }

    let Some((_, layout)) = layout else {
        return Err(ParseError::MissingLayout {
            span: document.span,
        });
    };

    crate::log::debug!(layout = %layout.name, meta = meta.len(), "parsed script");
    Ok(Script { meta, layout })
}

/// Parse `name: body` where `name` is a layout.
fn parse_layout(name: LayoutName, span: SourceSpan, body: &Value) -> Result<Instruction, ParseError> {
    let (elements, kwargs) = match &body.kind {
        ValueKind::Sequence(elements) => (elements.as_slice(), Mapping::new()),
        ValueKind::Mapping(properties) => {
            let mut kwargs = properties.clone();
            let Some((_, children)) = kwargs.remove(CHILDREN_KEY) else {
                return Err(missing_children(name, body.span));
            };
            let Some(elements) = properties
                .get(CHILDREN_KEY)
                .and_then(Value::as_sequence)
            else {
                return Err(ParseError::ExpectedSequence {
                    found: children.type_name(),
                    span: children.span,
                });
            };
            (elements, kwargs)
        }
        _ => return Err(missing_children(name, body.span)),
    };

    let children = elements
        .iter()
        .map(parse_element)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Instruction::new(InstructionName::Layout(name), span)
        .with_args(vec![Arg::Group(children)])
        .with_kwargs(kwargs))
}

fn missing_children(name: LayoutName, span: SourceSpan) -> ParseError {
    ParseError::MissingChildren {
        name: name.name().to_string(),
        span,
    }
}

/// Parse one child of a layout.
fn parse_element(element: &Value) -> Result<Instruction, ParseError> {
    match &element.kind {
        ValueKind::String(name) => match InstructionName::from_name(name) {
            Some(InstructionName::Primitive(p)) => Ok(Instruction::new(
                InstructionName::Primitive(p),
                element.span,
            )),
            Some(InstructionName::Layout(l)) => Err(missing_children(l, element.span)),
            None => Err(unknown_instruction(name, element.span)),
        },
        ValueKind::Mapping(entry) => {
            let mut entries = entry.iter();
            let (Some((key, body)), None) = (entries.next(), entries.next()) else {
                return Err(ParseError::MalformedElement {
                    reason: format!("expected a single entry, found {}", entry.len()),
                    span: element.span,
                });
            };
            match InstructionName::from_name(&key.name) {
                Some(InstructionName::Primitive(p)) => parse_primitive(p, key, body),
                Some(InstructionName::Layout(l)) => parse_layout(l, key.span, body),
                None => Err(unknown_instruction(&key.name, key.span)),
            }
        }
        _ => Err(ParseError::MalformedElement {
            reason: format!("expected a name or a single entry, found {}", element.type_name()),
            span: element.span,
        }),
    }
}

/// Parse `name: properties` where `name` is a primitive.
fn parse_primitive(primitive: Primitive, key: &Key, body: &Value) -> Result<Instruction, ParseError> {
    let kwargs = match &body.kind {
        ValueKind::Null => Mapping::new(),
        ValueKind::Mapping(properties) => {
            if let Some((reserved, _)) = properties.get_entry(CHILDREN_KEY) {
                return Err(ParseError::ReservedProperty {
                    key: reserved.name.clone(),
                    name: primitive.name().to_string(),
                    span: reserved.span,
                });
            }
            properties.clone()
        }
        _ => {
            return Err(ParseError::MalformedElement {
                reason: format!(
                    "properties of `{}` must be a mapping, found {}",
                    primitive,
                    body.type_name()
                ),
                span: body.span,
            });
        }
    };

    Ok(Instruction::new(InstructionName::Primitive(primitive), key.span).with_kwargs(kwargs))
}

fn unknown_instruction(name: &str, span: SourceSpan) -> ParseError {
    ParseError::UnknownInstruction {
        name: name.to_string(),
        help: format!(
            "primitives are {}; layouts are {}",
            list_names(Primitive::ALL, Primitive::name),
            list_names(LayoutName::ALL, LayoutName::name)
        ),
        span,
    }
}
