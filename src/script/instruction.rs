//! Raw instructions
//!
//! A [`RawInstruction`] is one parsed data line: an immutable mapping from
//! the file's declared fields to raw textual values, stored positionally
//! against a shared [`FormatSpec`].

use crate::script::format::{Field, FormatSpec};
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// The three reserved "no input" sentinel tokens.
pub const NO_INPUT: [&str; 3] = [".", "_", "-"];

/// One raw field value: either a token or a no-input sentinel.
///
/// The original sentinel text is preserved so delta comparison operates on
/// the exact tokens the author wrote.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum RawValue {
    /// One of `.`, `_`, `-`: this field is inactive this frame.
    NoInput(String),
    /// An active value (key held, button held, or a coordinate).
    Token(String),
}

impl RawValue {
    /// Classify a matched token.
    pub fn parse(token: &str) -> Self {
        if NO_INPUT.contains(&token) {
            RawValue::NoInput(token.to_string())
        } else {
            RawValue::Token(token.to_string())
        }
    }

    /// Whether this value is a no-input sentinel.
    pub fn is_no_input(&self) -> bool {
        matches!(self, RawValue::NoInput(_))
    }

    /// The raw token text.
    pub fn text(&self) -> &str {
        match self {
            RawValue::NoInput(s) | RawValue::Token(s) => s,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// An immutable field-to-value mapping for one frame.
///
/// Every instruction produced from one file shares that file's
/// [`FormatSpec`]; values are stored in the spec's declaration order.
#[derive(Debug, Clone)]
pub struct RawInstruction {
    spec: Arc<FormatSpec>,
    values: Vec<RawValue>,
}

impl RawInstruction {
    pub(crate) fn new(spec: Arc<FormatSpec>, values: Vec<RawValue>) -> Self {
        debug_assert_eq!(spec.len(), values.len());
        Self { spec, values }
    }

    /// The format this instruction was parsed with.
    pub fn spec(&self) -> &Arc<FormatSpec> {
        &self.spec
    }

    /// Field values in the spec's declaration order.
    pub fn values(&self) -> &[RawValue] {
        &self.values
    }

    /// The value of a specific field, if this instruction's spec declares it.
    pub fn value_of(&self, field: &Field) -> Option<&RawValue> {
        self.spec.position(field).map(|i| &self.values[i])
    }

    /// Check that `previous` has exactly the same field-name set.
    ///
    /// Instructions spliced in from `INCLUDE`d files carry their own spec;
    /// they stay compatible as long as the field-name sets agree.
    pub fn check_compatible(&self, previous: &RawInstruction) -> Result<()> {
        if Arc::ptr_eq(&self.spec, &previous.spec)
            || self.spec.same_field_set(&previous.spec)
        {
            Ok(())
        } else {
            Err(Error::IncompatibleInstruction(format!(
                "field set [{}] does not match preceding [{}]",
                self.spec.names().join(", "),
                previous.spec.names().join(", "),
            )))
        }
    }
}

impl fmt::Display for RawInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[RawInstruction")?;
        for (name, value) in self.spec.names().iter().zip(&self.values) {
            write!(f, " {name}={value}")?;
        }
        write!(f, "]")
    }
}
