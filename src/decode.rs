//! Decode script text into generic [`Value`] trees
//!
//! The pest grammar in `script.pest` lexes each line into tokens (dashes,
//! `key:` entries, scalars, flow collections). Block structure is then
//! rebuilt here from token columns, the same way YAML nests by indentation.

use miette::SourceSpan;
use pest::Parser;
use pest::error::InputLocation;
use pest::iterators::Pair;
use pest_derive::Parser;
use std::iter::Peekable;
use std::vec::IntoIter;

use crate::errors::DecodeError;
use crate::value::{Key, Mapping, Value, ValueKind};

#[derive(Parser)]
#[grammar = "script.pest"]
pub struct ScriptParser;

/// Decode a script into a value tree.
///
/// An empty document (or one holding only comments) decodes to null.
pub fn decode(source: &str) -> Result<Value, DecodeError> {
    let pairs = ScriptParser::parse(Rule::document, source).map_err(syntax_error)?;

    let mut tokens = Vec::new();
    let lines = pairs
        .flat_map(|document| document.into_inner())
        .filter(|pair| pair.as_rule() == Rule::line);
    for (line_no, line) in lines.enumerate() {
        let line_start = line.as_span().start();
        for item in line.into_inner() {
            lex(item, line_start, line_no, &mut tokens)?;
        }
    }

    crate::log::trace!(tokens = tokens.len(), "lexed script");
    Builder::new(tokens).finish()
}

fn syntax_error(err: pest::error::Error<Rule>) -> DecodeError {
    let err = err.renamed_rules(|rule| match rule {
        Rule::dash | Rule::dash_item => "`-`".to_string(),
        Rule::entry | Rule::flow_pair => "`key: value`".to_string(),
        Rule::key | Rule::plain_key => "a key".to_string(),
        Rule::plain | Rule::flow_plain => "a scalar".to_string(),
        Rule::double_quoted | Rule::single_quoted => "a quoted string".to_string(),
        Rule::flow_seq => "`[`".to_string(),
        Rule::flow_map => "`{`".to_string(),
        Rule::EOI => "end of input".to_string(),
        other => format!("{other:?}"),
    });
    let span = match err.location {
        InputLocation::Pos(pos) => SourceSpan::from((pos, 0)),
        InputLocation::Span((start, end)) => SourceSpan::from((start, end - start)),
    };
    DecodeError::Syntax {
        message: err.variant.message().into_owned(),
        span,
    }
}

// ============================================================================
// Lexing
// ============================================================================

#[derive(Debug)]
struct Token {
    /// Column of the token within its line
    col: usize,
    line: usize,
    span: SourceSpan,
    kind: TokenKind,
}

#[derive(Debug)]
enum TokenKind {
    Dash,
    /// `key:` with the value written on the same line, if any
    Key(Key, Option<Value>),
    Scalar(Value),
}

fn lex(
    pair: Pair<'_, Rule>,
    line_start: usize,
    line: usize,
    tokens: &mut Vec<Token>,
) -> Result<(), DecodeError> {
    let span = pair_span(&pair);
    let col = pair.as_span().start() - line_start;

    match pair.as_rule() {
        Rule::marker => {
            if !tokens.is_empty() || col != 0 {
                return Err(DecodeError::Syntax {
                    message: "`---` is only allowed before the first entry".to_string(),
                    span,
                });
            }
        }
        Rule::dash_item => {
            let mut inner = pair.into_inner();
            if let Some(dash) = inner.next() {
                tokens.push(Token {
                    col,
                    line,
                    span: pair_span(&dash),
                    kind: TokenKind::Dash,
                });
            }
            for rest in inner {
                lex(rest, line_start, line, tokens)?;
            }
        }
        Rule::entry => {
            let mut inner = pair.into_inner();
            let key = match inner.next() {
                Some(key) => key_of(key),
                None => return Err(missing("key", span)),
            };
            let value = inner.next().map(value_of).transpose()?;
            tokens.push(Token {
                col,
                line,
                span: key.span,
                kind: TokenKind::Key(key, value),
            });
        }
        _ => {
            let value = value_of(pair)?;
            tokens.push(Token {
                col,
                line,
                span: value.span,
                kind: TokenKind::Scalar(value),
            });
        }
    }
    Ok(())
}

fn pair_span(pair: &Pair<'_, Rule>) -> SourceSpan {
    let span = pair.as_span();
    SourceSpan::from((span.start(), span.end() - span.start()))
}

fn missing(what: &str, span: SourceSpan) -> DecodeError {
    DecodeError::Syntax {
        message: format!("expected {what}"),
        span,
    }
}

fn key_of(pair: Pair<'_, Rule>) -> Key {
    let span = pair_span(&pair);
    let name = match pair.into_inner().next() {
        Some(inner) => match inner.as_rule() {
            Rule::double_quoted | Rule::single_quoted => quoted_text(inner),
            _ => inner.as_str().to_string(),
        },
        None => String::new(),
    };
    Key::new(name, span)
}

fn value_of(pair: Pair<'_, Rule>) -> Result<Value, DecodeError> {
    let span = pair_span(&pair);
    match pair.as_rule() {
        Rule::plain | Rule::flow_plain => {
            let text = pair.as_str().trim_end();
            let span = SourceSpan::from((span.offset(), text.len()));
            Ok(Value::new(plain_scalar(text, span)?, span))
        }
        Rule::double_quoted | Rule::single_quoted => {
            Ok(Value::new(ValueKind::String(quoted_text(pair)), span))
        }
        Rule::flow_seq => {
            let items = pair
                .into_inner()
                .map(value_of)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::new(ValueKind::Sequence(items), span))
        }
        Rule::flow_map => {
            let mut mapping = Mapping::new();
            for entry in pair.into_inner() {
                let entry_span = pair_span(&entry);
                let mut inner = entry.into_inner();
                let key = inner
                    .next()
                    .map(key_of)
                    .ok_or_else(|| missing("key", entry_span))?;
                let value = match inner.next() {
                    Some(value) => value_of(value)?,
                    None => return Err(missing("value", entry_span)),
                };
                insert(&mut mapping, key, value)?;
            }
            Ok(Value::new(ValueKind::Mapping(mapping), span))
        }
        _ => Err(missing("a value", span)),
    }
}

/// Type a plain (unquoted) scalar.
fn plain_scalar(text: &str, span: SourceSpan) -> Result<ValueKind, DecodeError> {
    let kind = match text {
        "" | "~" | "null" | "Null" | "NULL" => ValueKind::Null,
        "true" | "True" | "TRUE" => ValueKind::Bool(true),
        "false" | "False" | "FALSE" => ValueKind::Bool(false),
        _ if looks_numeric(text) => match text.parse::<f64>() {
            Ok(n) if n.is_finite() => ValueKind::Number(n),
            Ok(_) => {
                return Err(DecodeError::NumberOutOfRange {
                    text: text.to_string(),
                    span,
                });
            }
            Err(_) => ValueKind::String(text.to_string()),
        },
        _ => ValueKind::String(text.to_string()),
    };
    Ok(kind)
}

/// Decimal forms only; `f64::from_str` would also take "inf" and "NaN"
fn looks_numeric(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let digits = unsigned.strip_prefix('.').unwrap_or(unsigned);
    digits.starts_with(|c: char| c.is_ascii_digit())
}

fn quoted_text(pair: Pair<'_, Rule>) -> String {
    let rule = pair.as_rule();
    let raw = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
    match rule {
        Rule::single_quoted => raw.replace("''", "'"),
        _ => unescape(raw),
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn insert(mapping: &mut Mapping, key: Key, value: Value) -> Result<(), DecodeError> {
    let span = key.span;
    let name = key.name.clone();
    mapping
        .insert(key, value)
        .map_err(|first| DecodeError::DuplicateKey {
            key: name,
            first: first.span,
            span,
        })
}

// ============================================================================
// Block structure
// ============================================================================

struct Builder {
    tokens: Peekable<IntoIter<Token>>,
}

impl Builder {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into_iter().peekable(),
        }
    }

    fn finish(mut self) -> Result<Value, DecodeError> {
        if self.tokens.peek().is_none() {
            return Ok(Value::null((0, 0)));
        }
        // The document's own mapping keeps repeated keys for the parser,
        // which knows which top-level names may appear once.
        let root = self.tokens.peek().map(|tok| (tok.col, Opens::of(&tok.kind)));
        let value = match root {
            Some((col, Opens::Mapping)) => self.mapping(col, Repeats::Keep)?,
            _ => self.block()?,
        };
        match self.tokens.next() {
            Some(stray) => Err(DecodeError::UnexpectedIndent { span: stray.span }),
            None => Ok(value),
        }
    }

    /// Parse the block starting at the next token.
    fn block(&mut self) -> Result<Value, DecodeError> {
        let Some((col, opens)) = self
            .tokens
            .peek()
            .map(|tok| (tok.col, Opens::of(&tok.kind)))
        else {
            return Ok(Value::null((0, 0)));
        };
        match opens {
            Opens::Sequence => self.sequence(col),
            Opens::Mapping => self.mapping(col, Repeats::Reject),
            Opens::Scalar => match self.tokens.next() {
                Some(Token {
                    kind: TokenKind::Scalar(value),
                    ..
                }) => Ok(value),
                Some(tok) => Err(missing("a value", tok.span)),
                None => Ok(Value::null((0, 0))),
            },
        }
    }

    fn sequence(&mut self, col: usize) -> Result<Value, DecodeError> {
        let mut items = Vec::new();
        let mut start = None;
        let mut end = 0;

        while self.at(col, |kind| matches!(kind, TokenKind::Dash)) {
            let Some(dash) = self.tokens.next() else {
                break;
            };
            start.get_or_insert(dash.span.offset());
            end = end.max(span_end(dash.span));

            let nested = self
                .tokens
                .peek()
                .is_some_and(|next| next.line == dash.line || next.col > col);
            let item = if nested {
                self.block()?
            } else {
                Value::null((span_end(dash.span), 0))
            };
            end = end.max(span_end(item.span));
            items.push(item);
            self.reject_deeper(col)?;
        }

        let start = start.unwrap_or(end);
        Ok(Value::new(ValueKind::Sequence(items), (start, end - start)))
    }

    fn mapping(&mut self, col: usize, repeats: Repeats) -> Result<Value, DecodeError> {
        let mut mapping = Mapping::new();
        let mut start = None;
        let mut end = 0;

        while self.at(col, |kind| matches!(kind, TokenKind::Key(..))) {
            let Some(Token {
                kind: TokenKind::Key(key, inline),
                ..
            }) = self.tokens.next()
            else {
                break;
            };
            start.get_or_insert(key.span.offset());
            end = end.max(span_end(key.span));

            let next = self
                .tokens
                .peek()
                .map(|next| (next.col, matches!(next.kind, TokenKind::Dash)));
            let value = match (inline, next) {
                (Some(value), _) => value,
                (None, Some((next_col, _))) if next_col > col => self.block()?,
                // YAML lets a sequence sit at the same indentation as its key
                (None, Some((next_col, true))) if next_col == col => self.sequence(col)?,
                _ => Value::null((span_end(key.span), 0)),
            };
            end = end.max(span_end(value.span));
            match repeats {
                Repeats::Keep => mapping.push(key, value),
                Repeats::Reject => insert(&mut mapping, key, value)?,
            }
            self.reject_deeper(col)?;
        }

        let start = start.unwrap_or(end);
        Ok(Value::new(ValueKind::Mapping(mapping), (start, end - start)))
    }

    fn at(&mut self, col: usize, kind: impl Fn(&TokenKind) -> bool) -> bool {
        self.tokens
            .peek()
            .is_some_and(|tok| tok.col == col && kind(&tok.kind))
    }

    /// After a complete entry, nothing may continue at a deeper column.
    fn reject_deeper(&mut self, col: usize) -> Result<(), DecodeError> {
        match self.tokens.peek() {
            Some(next) if next.col > col => Err(DecodeError::UnexpectedIndent { span: next.span }),
            _ => Ok(()),
        }
    }
}

/// Whether a block mapping accepts a key name more than once
#[derive(Clone, Copy)]
enum Repeats {
    Keep,
    Reject,
}

/// What kind of block a token opens
enum Opens {
    Sequence,
    Mapping,
    Scalar,
}

impl Opens {
    fn of(kind: &TokenKind) -> Self {
        match kind {
            TokenKind::Dash => Opens::Sequence,
            TokenKind::Key(..) => Opens::Mapping,
            TokenKind::Scalar(_) => Opens::Scalar,
        }
    }
}

fn span_end(span: SourceSpan) -> usize {
    span.offset() + span.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_ok(source: &str) -> Value {
        match decode(source) {
            Ok(value) => value,
            Err(e) => panic!("failed to decode {source:?}: {e:?}"),
        }
    }

    fn names(value: &Value) -> Vec<&str> {
        value
            .as_mapping()
            .unwrap()
            .keys()
            .map(|k| k.name.as_str())
            .collect()
    }

    #[test]
    fn decode_canvas_and_tile() {
        let source = "\
canvas:
  width: 8.5
  height: 11
  dpi: 600
tile:
  - triangle
  - triangle:
      scale: 2
";
        let doc = decode_ok(source);
        assert_eq!(names(&doc), ["canvas", "tile"]);

        let map = doc.as_mapping().unwrap();
        let canvas = map.get("canvas").unwrap().as_mapping().unwrap();
        assert_eq!(canvas.get("width").unwrap().as_f64(), Some(8.5));
        assert_eq!(canvas.get("height").unwrap().as_f64(), Some(11.0));
        assert_eq!(canvas.get("dpi").unwrap().as_f64(), Some(600.0));

        let tile = map.get("tile").unwrap().as_sequence().unwrap();
        assert_eq!(tile.len(), 2);
        assert_eq!(tile[0].as_str(), Some("triangle"));
        let second = tile[1].as_mapping().unwrap();
        let props = second.get("triangle").unwrap().as_mapping().unwrap();
        assert_eq!(props.get("scale").unwrap().as_f64(), Some(2.0));
    }

    #[test]
    fn decode_flow_collections() {
        let doc = decode_ok("canvas: {width:1, height:1, dpi:100}\ntile: [triangle, {square: {scale: 2}}]\n");
        let map = doc.as_mapping().unwrap();
        let canvas = map.get("canvas").unwrap().as_mapping().unwrap();
        assert_eq!(canvas.len(), 3);
        assert_eq!(canvas.get("dpi").unwrap().as_f64(), Some(100.0));

        let tile = map.get("tile").unwrap().as_sequence().unwrap();
        assert_eq!(tile[0].as_str(), Some("triangle"));
        assert!(tile[1].as_mapping().unwrap().contains_key("square"));
    }

    #[test]
    fn sequence_may_share_key_indentation() {
        let doc = decode_ok("tile:\n- triangle\n- square\ncanvas: ~\n");
        assert_eq!(names(&doc), ["tile", "canvas"]);
        let map = doc.as_mapping().unwrap();
        assert_eq!(map.get("tile").unwrap().as_sequence().unwrap().len(), 2);
        assert!(map.get("canvas").unwrap().is_null());
    }

    #[test]
    fn nested_sequences_on_one_line() {
        let doc = decode_ok("- - a\n  - b\n- c\n");
        let outer = doc.as_sequence().unwrap();
        assert_eq!(outer.len(), 2);
        assert_eq!(outer[0].as_sequence().unwrap().len(), 2);
        assert_eq!(outer[1].as_str(), Some("c"));
    }

    #[test]
    fn scalars_are_typed() {
        let doc = decode_ok(
            "a: 12\nb: -0.5\nc: true\nd: ~\ne: hello world\nf: \"quoted \\\"x\\\"\"\ng: 'it''s'\nh: inf\ni: 1e3\n",
        );
        let map = doc.as_mapping().unwrap();
        let kind = |k: &str| map.get(k).unwrap().kind.clone();
        assert_eq!(kind("a"), ValueKind::Number(12.0));
        assert_eq!(kind("b"), ValueKind::Number(-0.5));
        assert_eq!(kind("c"), ValueKind::Bool(true));
        assert_eq!(kind("d"), ValueKind::Null);
        assert_eq!(kind("e"), ValueKind::String("hello world".into()));
        assert_eq!(kind("f"), ValueKind::String("quoted \"x\"".into()));
        assert_eq!(kind("g"), ValueKind::String("it's".into()));
        assert_eq!(kind("h"), ValueKind::String("inf".into()));
        assert_eq!(kind("i"), ValueKind::Number(1000.0));
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let source = "---\n# a drawing\ncanvas:   # metadata\n\n  dpi: 72 # per inch\ntile: [triangle]\n";
        let doc = decode_ok(source);
        let map = doc.as_mapping().unwrap();
        let canvas = map.get("canvas").unwrap().as_mapping().unwrap();
        assert_eq!(canvas.get("dpi").unwrap().as_f64(), Some(72.0));
    }

    #[test]
    fn crlf_line_endings() {
        let doc = decode_ok("canvas:\r\n  dpi: 10\r\ntile:\r\n  - triangle\r\n");
        assert_eq!(names(&doc), ["canvas", "tile"]);
    }

    #[test]
    fn empty_document_is_null() {
        assert!(decode_ok("").is_null());
        assert!(decode_ok("# nothing here\n\n").is_null());
    }

    #[test]
    fn key_without_value_is_null() {
        let doc = decode_ok("tile:\n  - triangle:\n");
        let tile = doc.as_mapping().unwrap().get("tile").unwrap();
        let element = tile.as_sequence().unwrap()[0].as_mapping().unwrap();
        assert!(element.get("triangle").unwrap().is_null());
    }

    #[test]
    fn spans_point_at_source() {
        let source = "canvas: ~\ntile: [triangle]\n";
        let doc = decode_ok(source);
        let (key, value) = doc.as_mapping().unwrap().get_entry("tile").unwrap();
        assert_eq!(&source[key.span.offset()..span_end(key.span)], "tile");
        let element = &value.as_sequence().unwrap()[0];
        assert_eq!(&source[element.span.offset()..span_end(element.span)], "triangle");
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let source = "canvas:\n  dpi: 1\n  dpi: 2\n";
        let err = decode(source).unwrap_err();
        match err {
            DecodeError::DuplicateKey { key, first, span } => {
                assert_eq!(key, "dpi");
                assert_eq!(first.offset(), 10);
                assert_eq!(span.offset(), 19);
            }
            other => panic!("expected DuplicateKey, got {other:?}"),
        }

        let err = decode("tile: [{square: {scale: 1, scale: 2}}]\n").unwrap_err();
        assert!(matches!(err, DecodeError::DuplicateKey { .. }), "{err:?}");
    }

    #[test]
    fn document_mapping_keeps_repeated_keys() {
        let doc = decode_ok("tile: [triangle]\ntile: [square]\n");
        assert_eq!(names(&doc), ["tile", "tile"]);
        let spans: Vec<_> = doc
            .as_mapping()
            .unwrap()
            .keys()
            .map(|k| k.span.offset())
            .collect();
        assert_eq!(spans, [0, 17]);
    }

    #[test]
    fn overflowing_numbers_are_rejected() {
        let source = "tile:\n  - square:\n      scale: 1e400\n";
        match decode(source).unwrap_err() {
            DecodeError::NumberOutOfRange { text, span } => {
                assert_eq!(text, "1e400");
                assert_eq!(span.offset(), source.find("1e400").unwrap());
            }
            other => panic!("expected NumberOutOfRange, got {other:?}"),
        }

        let err = decode("canvas: {dpi: -1e999}\n").unwrap_err();
        assert!(matches!(err, DecodeError::NumberOutOfRange { .. }), "{err:?}");
    }

    #[test]
    fn flow_collections_stay_on_one_line() {
        let err = decode("tile: [\n  triangle\n]\n").unwrap_err();
        assert!(matches!(err, DecodeError::Syntax { .. }), "{err:?}");
    }

    #[test]
    fn stray_indentation_is_rejected() {
        let err = decode("canvas: 1\n  dpi: 2\n").unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedIndent { .. }), "{err:?}");

        let err = decode("tile:\n  - triangle\n      extra\n").unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedIndent { .. }), "{err:?}");
    }

    #[test]
    fn tabs_in_indentation_are_syntax_errors() {
        let err = decode("canvas:\n\tdpi: 2\n").unwrap_err();
        assert!(matches!(err, DecodeError::Syntax { .. }), "{err:?}");
    }

    #[test]
    fn unterminated_flow_is_syntax_error() {
        let err = decode("tile: [triangle\n").unwrap_err();
        assert!(matches!(err, DecodeError::Syntax { .. }), "{err:?}");
    }
}
