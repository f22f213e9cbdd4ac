//! Format compiler
//!
//! Compiles a `!FORMAT:` header string (for example `<MX> <MY> <K1> <K2>`)
//! into a [`FormatSpec`]: an ordered list of typed fields plus a generated
//! line matcher. Field names are classified once here, so downstream code
//! switches over a closed enum instead of re-parsing string prefixes for
//! every instruction.

use crate::compile::keymap;
use crate::script::instruction::{RawInstruction, RawValue};
use crate::{Error, Result};
use regex::Regex;
use std::sync::Arc;

/// A typed script field, classified at format-compile time.
///
/// Mouse coordinates are positional; keys carry their resolved key code and
/// buttons their button number, so compilation never re-resolves names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Field {
    /// Absolute mouse x coordinate (`MX`)
    MouseX,
    /// Absolute mouse y coordinate (`MY`)
    MouseY,
    /// Keyboard key (`K<name>`), resolved to a key code
    Key { name: String, code: u16 },
    /// Mouse button (`M<n>`)
    Button(u16),
}

impl Field {
    /// Classify a raw field name from a format header.
    fn classify(name: &str) -> Result<Self> {
        match name {
            "MX" => Ok(Field::MouseX),
            "MY" => Ok(Field::MouseY),
            _ if name.starts_with('K') && name.len() > 1 => {
                let key_name = &name[1..];
                let code = keymap::key_code(key_name)?;
                Ok(Field::Key {
                    name: key_name.to_string(),
                    code,
                })
            }
            _ if name.starts_with('M') && name.len() > 1 => name[1..]
                .parse::<u16>()
                .map(Field::Button)
                .map_err(|_| Error::UnknownField(name.to_string())),
            _ => Err(Error::UnknownField(name.to_string())),
        }
    }
}

/// A compiled line format: ordered named fields plus the generated matcher.
///
/// Invariants: field names are unique within one spec, and every field
/// corresponds to exactly one capture region of the source format string.
#[derive(Debug)]
pub struct FormatSpec {
    /// Field names in declaration order (e.g. `["MX", "MY", "KA"]`)
    names: Vec<String>,
    /// Typed fields, parallel to `names`
    fields: Vec<Field>,
    /// Whole-line matcher with one named group per field
    matcher: Regex,
    /// The source format string, kept for diagnostics
    source: String,
}

impl FormatSpec {
    /// Compile a format string into a [`FormatSpec`].
    ///
    /// Placeholders are `<name>` with `name` in `[A-Za-z0-9]+`; the text
    /// between placeholders is matched literally. Each placeholder region
    /// accepts a non-empty, non-greedy token of word characters, `-`, or
    /// `.`, and the whole match is anchored to the full line with trailing
    /// whitespace tolerated.
    pub fn compile(format: &str) -> Result<Arc<Self>> {
        if format.contains("<>") {
            return Err(Error::MalformedFormat(format!(
                "empty placeholder name in \"{format}\""
            )));
        }

        // The placeholder scanner itself is a fixed pattern.
        let placeholder =
            Regex::new("<([A-Za-z0-9]+?)>").expect("placeholder pattern is valid");

        let mut names = Vec::new();
        let mut fields = Vec::new();
        let mut pattern = String::from("^");
        let mut prev = 0;
        for caps in placeholder.captures_iter(format) {
            let whole = caps.get(0).expect("group 0 always present");
            let name = &caps[1];
            if names.iter().any(|n| n == name) {
                return Err(Error::MalformedFormat(format!(
                    "duplicate field name \"{name}\" in \"{format}\""
                )));
            }

            pattern.push_str(&regex::escape(&format[prev..whole.start()]));
            pattern.push_str(&format!(r"(?P<{name}>[\w.\-]+?)"));

            fields.push(Field::classify(name)?);
            names.push(name.to_string());
            prev = whole.end();
        }
        pattern.push_str(&regex::escape(&format[prev..]));
        pattern.push_str(r"\s*$");

        tracing::trace!(format, pattern, "compiled format");

        let matcher = Regex::new(&pattern)
            .map_err(|e| Error::MalformedFormat(format!("pattern did not compile: {e}")))?;

        Ok(Arc::new(Self {
            names,
            fields,
            matcher,
            source: format.to_string(),
        }))
    }

    /// Match a data line against this format.
    ///
    /// Returns the extracted field values in declaration order, or `None` if
    /// the line does not match. Never partial-matches.
    pub fn match_line(self: &Arc<Self>, line: &str) -> Option<RawInstruction> {
        let caps = self.matcher.captures(line)?;
        let values = self
            .names
            .iter()
            .map(|name| RawValue::parse(&caps[name.as_str()]))
            .collect();
        Some(RawInstruction::new(Arc::clone(self), values))
    }

    /// Field names in declaration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Typed fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The source format string.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the spec declares no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of a field within this spec, if declared.
    pub fn position(&self, field: &Field) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    /// Whether two specs declare the same set of field names.
    ///
    /// Order does not matter; instructions from files with reordered but
    /// identical field sets remain compatible.
    pub fn same_field_set(&self, other: &FormatSpec) -> bool {
        if self.names.len() != other.names.len() {
            return false;
        }
        let mut a: Vec<&str> = self.names.iter().map(String::as_str).collect();
        let mut b: Vec<&str> = other.names.iter().map(String::as_str).collect();
        a.sort_unstable();
        b.sort_unstable();
        a == b
    }
}
