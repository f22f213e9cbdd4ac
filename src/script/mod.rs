//! Script Module
//!
//! Turns TAS script text into ordered raw instruction sequences: the format
//! compiler builds a line matcher from the `!FORMAT:` header, the structural
//! parser expands indentation blocks, `REPEAT`, and `INCLUDE`, and the script
//! cache memoizes parsed files by canonical path.

pub mod cache;
pub mod format;
pub mod instruction;
pub mod parser;

pub use cache::ScriptCache;
pub use format::{Field, FormatSpec};
pub use instruction::{RawInstruction, RawValue};
pub use parser::{ParsedUnit, ScriptType};
