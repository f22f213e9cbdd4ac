//! Structural parser
//!
//! Reads a script file, validates its header directives, and recursively
//! expands indentation blocks, `REPEAT`, and `INCLUDE` into a flat ordered
//! instruction sequence. The parser walks an explicit line-indexed cursor
//! with a peek operation, so ending a block on a dedent never consumes the
//! dedented line.

use crate::script::cache::ScriptCache;
use crate::script::format::FormatSpec;
use crate::script::instruction::RawInstruction;
use crate::{Error, Result};
use std::path::Path;
use std::sync::Arc;

/// Number of columns per indentation level; tabs expand to this width.
pub const INDENT_COLS: usize = 4;

/// The declared type of a root-level playback file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ScriptType {
    /// A full playback file; may include other files.
    Default,
    /// An include-only file; `INCLUDE` directives are forbidden inside it.
    Fragment,
}

/// The result of structurally parsing one file: a flat, ordered instruction
/// sequence with includes and repeats already expanded.
///
/// Owned by the [`ScriptCache`] after first parse and shared read-only by
/// every inclusion site.
#[derive(Debug)]
pub struct ParsedUnit {
    /// Declared `!TYPE:`, present only in root-level playback files.
    pub script_type: Option<ScriptType>,
    /// The file's declared format.
    pub format: Arc<FormatSpec>,
    /// The expanded instruction sequence.
    pub instructions: Vec<RawInstruction>,
}

/// A line-indexed cursor over a file's lines, tabs already expanded.
struct LineCursor {
    lines: Vec<String>,
    pos: usize,
}

impl LineCursor {
    fn new(text: &str) -> Self {
        Self {
            lines: text
                .lines()
                .map(|l| l.replace('\t', "    "))
                .collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&str> {
        self.lines.get(self.pos).map(String::as_str)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }
}

/// Parse the file at `path`, resolving includes through `cache`.
pub(crate) fn parse_path(path: &Path, cache: &ScriptCache) -> Result<ParsedUnit> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::ResourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    parse_text(&text, path.parent(), cache)
}

/// Parse script text directly.
///
/// `dir` is the directory `INCLUDE` paths resolve against; without one
/// (an unsaved buffer) any include fails. Header layout: a root-level
/// playback file declares `!TYPE: DEFAULT|FRAGMENT` followed by
/// `!FORMAT: …`; a fragment-only file declares just `!FORMAT: …`.
pub fn parse_text(
    text: &str,
    dir: Option<&Path>,
    cache: &ScriptCache,
) -> Result<ParsedUnit> {
    let mut cursor = LineCursor::new(text);

    let first = next_header_line(&mut cursor)?;
    let (script_type, format_line) = if let Some(decl) = first.strip_prefix("!TYPE: ") {
        let script_type = match decl.trim_end() {
            "DEFAULT" => ScriptType::Default,
            "FRAGMENT" => ScriptType::Fragment,
            other => {
                return Err(Error::InvalidFileFormat(format!(
                    "invalid type in type declaration: \"{other}\""
                )))
            }
        };
        (Some(script_type), next_header_line(&mut cursor)?)
    } else {
        (None, first)
    };

    let Some(spec_text) = format_line.strip_prefix("!FORMAT: ") else {
        return Err(Error::InvalidFileFormat(
            "invalid or missing format declaration".to_string(),
        ));
    };
    let format = FormatSpec::compile(spec_text.trim_end())?;

    let allow_include = script_type != Some(ScriptType::Fragment);
    let instructions = parse_block(&mut cursor, &format, 0, dir, allow_include, cache)?;

    tracing::debug!(
        instructions = instructions.len(),
        format = format.source(),
        "parsed script"
    );

    Ok(ParsedUnit {
        script_type,
        format,
        instructions,
    })
}

/// Consume skippable lines and return the next header line.
fn next_header_line(cursor: &mut LineCursor) -> Result<String> {
    while let Some(line) = cursor.peek() {
        let content = line.trim_start();
        if content.is_empty() || content.starts_with('#') {
            cursor.advance();
            continue;
        }
        let line = line.to_string();
        cursor.advance();
        return Ok(line);
    }
    Err(Error::InvalidFileFormat(
        "invalid or missing format declaration".to_string(),
    ))
}

/// Parse one indentation block at `level`.
///
/// Returns when the file ends or a shallower line is seen (without
/// consuming it). A deeper line than `level` is an error.
fn parse_block(
    cursor: &mut LineCursor,
    format: &Arc<FormatSpec>,
    level: usize,
    dir: Option<&Path>,
    allow_include: bool,
    cache: &ScriptCache,
) -> Result<Vec<RawInstruction>> {
    let mut output = Vec::new();

    while let Some(line) = cursor.peek() {
        let content = line.trim_start_matches(' ');
        if content.is_empty() || content.starts_with('#') {
            cursor.advance();
            continue;
        }

        let indent_cols = line.len() - content.len();
        if indent_cols % INDENT_COLS != 0 || indent_cols / INDENT_COLS > level {
            return Err(Error::InvalidFileFormat(format!(
                "invalid indentation: \"{line}\""
            )));
        }
        if indent_cols / INDENT_COLS < level {
            // Dedent ends this block; the caller re-examines the line.
            break;
        }

        let content = content.to_string();
        cursor.advance();

        if let Some(rel) = content.strip_prefix("INCLUDE ") {
            if !allow_include {
                return Err(Error::InvalidFileFormat(
                    "fragments cannot have include statements".to_string(),
                ));
            }
            let Some(dir) = dir else {
                return Err(Error::InvalidFileFormat(format!(
                    "cannot resolve \"INCLUDE {}\" without a base directory",
                    rel.trim()
                )));
            };
            let target = dir.join(rel.trim());
            tracing::trace!(target = %target.display(), "include");
            let unit = cache.get_or_parse(&target)?;
            output.extend(unit.instructions.iter().cloned());
        } else if let Some(count) = content.strip_prefix("REPEAT ") {
            let repeat: u64 = count.trim().parse().map_err(|_| {
                Error::InvalidFileFormat(format!("invalid REPEAT count \"{}\"", count.trim()))
            })?;
            let block = parse_block(cursor, format, level + 1, dir, allow_include, cache)?;
            if !block.is_empty() {
                for _ in 0..repeat {
                    output.extend(block.iter().cloned());
                }
            }
        } else {
            let instruction = format.match_line(&content).ok_or_else(|| {
                Error::InvalidFileFormat(format!(
                    "line does not match format \"{}\": \"{content}\"",
                    format.source()
                ))
            })?;
            output.push(instruction);
        }
    }

    Ok(output)
}
