//! Generic nested values produced by the decoder
//!
//! A script is first decoded into a tree of [`Value`]s (scalars, ordered
//! mappings and sequences) and only then shaped into instructions by the
//! parser. Every node remembers where it came from so diagnostics can point
//! at the offending text. Spans never take part in equality.

use miette::SourceSpan;
use std::fmt;

/// A decoded node together with its location in the source
#[derive(Debug, Clone)]
pub struct Value {
    pub kind: ValueKind,
    pub span: SourceSpan,
}

/// The shape of a decoded node
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Mapping(Mapping),
    Sequence(Vec<Value>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Value {
    pub fn new(kind: ValueKind, span: impl Into<SourceSpan>) -> Self {
        Self {
            kind,
            span: span.into(),
        }
    }

    pub fn null(span: impl Into<SourceSpan>) -> Self {
        Self::new(ValueKind::Null, span)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, ValueKind::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.kind {
            ValueKind::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match &self.kind {
            ValueKind::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match &self.kind {
            ValueKind::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Human-readable name of the node's shape, for error messages
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }
}

impl ValueKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool(_) => "boolean",
            ValueKind::Number(_) => "number",
            ValueKind::String(_) => "string",
            ValueKind::Mapping(_) => "mapping",
            ValueKind::Sequence(_) => "sequence",
        }
    }
}

/// A mapping key and where it was written
#[derive(Debug, Clone)]
pub struct Key {
    pub name: String,
    pub span: SourceSpan,
}

impl Key {
    pub fn new(name: impl Into<String>, span: impl Into<SourceSpan>) -> Self {
        Self {
            name: name.into(),
            span: span.into(),
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An insertion-ordered mapping with unique keys
///
/// Mappings in scripts are tiny (a handful of properties), so lookups are a
/// linear scan and ordering is simply the order of `entries`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: Vec<(Key, Value)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, handing back the existing key if the name is taken.
    pub fn insert(&mut self, key: Key, value: Value) -> Result<(), Key> {
        if let Some((existing, _)) = self.get_entry(&key.name) {
            return Err(existing.clone());
        }
        self.entries.push((key, value));
        Ok(())
    }

    /// Append an entry without checking for a repeated name.
    pub fn push(&mut self, key: Key, value: Value) {
        self.entries.push((key, value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.get_entry(name).map(|(_, v)| v)
    }

    pub fn get_entry(&self, name: &str) -> Option<(&Key, &Value)> {
        self.entries
            .iter()
            .find(|(k, _)| k.name == name)
            .map(|(k, v)| (k, v))
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get_entry(name).is_some()
    }

    /// Remove an entry by name, returning it if present.
    pub fn remove(&mut self, name: &str) -> Option<(Key, Value)> {
        let idx = self.entries.iter().position(|(k, _)| k.name == name)?;
        Some(self.entries.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects entries as given, without checking for repeated names.
impl FromIterator<(Key, Value)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (Key, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Mapping {
    type Item = (Key, Value);
    type IntoIter = std::vec::IntoIter<(Key, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
