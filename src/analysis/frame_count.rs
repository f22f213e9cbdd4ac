//! Frame counter
//!
//! Computes how many effective frames a file or fragment expands to,
//! honoring `REPEAT` multipliers and `INCLUDE` expansion. This is a separate
//! textual pass over raw lines, not the parsed tree, so it can size and
//! validate a script before (or without) a full structural parse.
//!
//! Structural problems (bad indentation, bad `REPEAT` count, include cycles)
//! yield [`FrameCount::Indeterminate`] for the whole file; this is a
//! successful return value, distinct from an I/O failure reading the file.

use crate::script::parser::INDENT_COLS;
use crate::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::thread::ThreadId;

/// The number of frames a file or fragment contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameCount {
    /// The file expands to exactly this many frames.
    Frames(u64),
    /// The file could not be counted (structural error or include cycle).
    Indeterminate,
}

impl FrameCount {
    /// The frame count, if determinate.
    pub fn frames(self) -> Option<u64> {
        match self {
            FrameCount::Frames(n) => Some(n),
            FrameCount::Indeterminate => None,
        }
    }

    pub fn is_indeterminate(self) -> bool {
        matches!(self, FrameCount::Indeterminate)
    }
}

impl fmt::Display for FrameCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameCount::Frames(n) => write!(f, "{n}"),
            FrameCount::Indeterminate => write!(f, "indeterminate"),
        }
    }
}

#[derive(Default)]
struct CountState {
    memo: HashMap<PathBuf, FrameCount>,
    in_flight: HashMap<PathBuf, ThreadId>,
}

/// Memoizing frame counter, keyed by canonical path.
///
/// Only determinate counts are memoized; indeterminate files are recounted
/// on the next request. Entries are invalidated solely by [`clear`].
///
/// [`clear`]: FrameCache::clear
#[derive(Default)]
pub struct FrameCache {
    state: Mutex<CountState>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count the frames the file at `path` expands to.
    ///
    /// A cache hit short-circuits; recursion through `INCLUDE` re-enters
    /// this method per included file. An inclusion chain that reaches a file
    /// already being counted is a cycle and yields
    /// [`FrameCount::Indeterminate`].
    pub fn count_file(&self, path: &Path) -> Result<FrameCount> {
        let canonical = path
            .canonicalize()
            .map_err(|source| Error::ResourceUnavailable {
                path: path.to_path_buf(),
                source,
            })?;

        {
            let mut state = self.state.lock();
            if let Some(&count) = state.memo.get(&canonical) {
                return Ok(count);
            }
            match state.in_flight.get(&canonical) {
                Some(owner) if *owner == std::thread::current().id() => {
                    return Ok(FrameCount::Indeterminate);
                }
                _ => {
                    state
                        .in_flight
                        .insert(canonical.clone(), std::thread::current().id());
                }
            }
        }

        let result = std::fs::read_to_string(&canonical)
            .map_err(|source| Error::ResourceUnavailable {
                path: canonical.clone(),
                source,
            })
            .and_then(|text| self.count_text(&text, canonical.parent()));

        let mut state = self.state.lock();
        state.in_flight.remove(&canonical);
        if let Ok(count @ FrameCount::Frames(_)) = result {
            state.memo.insert(canonical, count);
        }
        result
    }

    /// Count the frames script text expands to.
    ///
    /// `dir` resolves `INCLUDE` paths; without one, any include makes the
    /// count indeterminate.
    pub fn count_text(&self, text: &str, dir: Option<&Path>) -> Result<FrameCount> {
        let lines: Vec<String> = text.lines().map(|l| l.replace('\t', "    ")).collect();
        let mut pos = 0;
        let count = self.count_block(&lines, &mut pos, 0, dir)?;
        tracing::debug!(%count, "counted frames");
        Ok(count)
    }

    /// Count one indentation block; `pos` is left on the first line outside
    /// the block.
    fn count_block(
        &self,
        lines: &[String],
        pos: &mut usize,
        level: usize,
        dir: Option<&Path>,
    ) -> Result<FrameCount> {
        let mut total: u64 = 0;

        while let Some(line) = lines.get(*pos) {
            let content = line.trim_start_matches(' ');
            // Blank lines, comments, and header directives contribute zero
            // frames and do not affect indentation bookkeeping.
            if content.is_empty() || content.starts_with('#') || content.starts_with('!') {
                *pos += 1;
                continue;
            }

            let indent_cols = line.len() - content.len();
            if indent_cols % INDENT_COLS != 0 || indent_cols / INDENT_COLS > level {
                return Ok(FrameCount::Indeterminate);
            }
            if indent_cols / INDENT_COLS < level {
                break;
            }

            let content = content.to_string();
            *pos += 1;

            if let Some(rel) = content.strip_prefix("INCLUDE ") {
                let Some(dir) = dir else {
                    return Ok(FrameCount::Indeterminate);
                };
                match self.count_file(&dir.join(rel.trim()))? {
                    FrameCount::Frames(n) => match total.checked_add(n) {
                        Some(sum) => total = sum,
                        None => return Ok(FrameCount::Indeterminate),
                    },
                    FrameCount::Indeterminate => return Ok(FrameCount::Indeterminate),
                }
            } else if let Some(count) = content.strip_prefix("REPEAT ") {
                let Ok(repeat) = count.trim().parse::<u64>() else {
                    return Ok(FrameCount::Indeterminate);
                };
                match self.count_block(lines, pos, level + 1, dir)? {
                    // A product too large for u64 is uncountable, not zero.
                    FrameCount::Frames(n) => {
                        match repeat.checked_mul(n).and_then(|add| total.checked_add(add)) {
                            Some(sum) => total = sum,
                            None => return Ok(FrameCount::Indeterminate),
                        }
                    }
                    FrameCount::Indeterminate => return Ok(FrameCount::Indeterminate),
                }
            } else {
                total += 1;
            }
        }

        Ok(FrameCount::Frames(total))
    }

    /// Drop every memoized count. Call when underlying files may have
    /// changed on disk.
    pub fn clear(&self) {
        self.state.lock().memo.clear();
    }
}
