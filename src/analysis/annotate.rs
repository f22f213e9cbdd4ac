//! Per-line frame annotation
//!
//! Maps every source line of a script to the cumulative frame index shown in
//! an editor gutter or progress display. Inside a `REPEAT` block the index
//! advances once per line (first iteration); when the block closes, the
//! index jumps to the true weighted total so the lines after it reflect
//! every iteration.

use crate::analysis::frame_count::{FrameCache, FrameCount};
use crate::script::parser::INDENT_COLS;
use std::fmt;
use std::path::Path;

/// The gutter annotation for one source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum LineAnnotation {
    /// Structurally inert line: blank, comment, header, or `REPEAT`.
    None,
    /// The line (or its include target) is structurally invalid.
    Error,
    /// Cumulative frame index after this line.
    Frame(u64),
}

impl fmt::Display for LineAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineAnnotation::None => Ok(()),
            LineAnnotation::Error => write!(f, "ERR"),
            LineAnnotation::Frame(n) => write!(f, "{n}"),
        }
    }
}

/// An open indentation block and the frames each of its lines is worth.
struct Block {
    weight: u64,
    indent: usize,
}

/// Annotate every line of `text` with its cumulative frame index.
///
/// `dir` resolves `INCLUDE` paths (counted through `cache`); with no base
/// directory, include lines annotate as [`LineAnnotation::None`]. The
/// returned vector has one entry per source line. Unlike the structural
/// parser, annotation never fails: invalid lines are marked
/// [`LineAnnotation::Error`] and the walk continues, so a half-edited buffer
/// still gets a usable gutter.
pub fn annotate_text(
    text: &str,
    dir: Option<&Path>,
    cache: &FrameCache,
) -> Vec<LineAnnotation> {
    let mut annotations = Vec::new();
    // Open REPEAT blocks; an empty stack is the root (weight 1, indent 0).
    let mut stack: Vec<Block> = Vec::new();
    let mut true_total: u64 = 0;
    let mut shown: u64 = 0;

    for raw_line in text.lines() {
        let line = raw_line.replace('\t', "    ");
        let content = line.trim_start_matches(' ');

        if content.is_empty() || content.starts_with('#') || content.starts_with('!') {
            annotations.push(LineAnnotation::None);
            continue;
        }

        let indent_cols = line.len() - content.len();
        if indent_cols % INDENT_COLS != 0 {
            annotations.push(LineAnnotation::Error);
            continue;
        }
        let depth = indent_cols / INDENT_COLS;
        if depth > stack.last().map_or(0, |b| b.indent) {
            annotations.push(LineAnnotation::Error);
            continue;
        }
        while stack.last().is_some_and(|b| depth < b.indent) {
            stack.pop();
            // The closed block ran every iteration; catch the gutter up.
            shown = true_total;
        }
        let weight = stack.last().map_or(1, |b| b.weight);

        if let Some(rel) = content.strip_prefix("INCLUDE ") {
            let Some(dir) = dir else {
                annotations.push(LineAnnotation::None);
                continue;
            };
            match cache.count_file(&dir.join(rel.trim())) {
                Ok(FrameCount::Frames(n)) => {
                    true_total = true_total.saturating_add(weight.saturating_mul(n));
                    shown = shown.saturating_add(n);
                    annotations.push(LineAnnotation::Frame(shown));
                }
                Ok(FrameCount::Indeterminate) | Err(_) => {
                    annotations.push(LineAnnotation::Error);
                }
            }
        } else if let Some(count) = content.strip_prefix("REPEAT ") {
            // A weight too large for u64 cannot be numbered past the block.
            match count.trim().parse::<u64>().ok().and_then(|n| weight.checked_mul(n)) {
                Some(block_weight) => {
                    stack.push(Block {
                        weight: block_weight,
                        indent: depth + 1,
                    });
                    annotations.push(LineAnnotation::None);
                }
                None => annotations.push(LineAnnotation::Error),
            }
        } else {
            true_total = true_total.saturating_add(weight);
            shown += 1;
            annotations.push(LineAnnotation::Frame(shown));
        }
    }

    annotations
}

#[cfg(test)]
mod tests {
    use super::*;
    use LineAnnotation::{Error, Frame, None};

    fn annotate(text: &str) -> Vec<LineAnnotation> {
        annotate_text(text, Option::None, &FrameCache::new())
    }

    #[test]
    fn test_plain_lines_count_up() {
        assert_eq!(
            annotate("!FORMAT: <KA>\nA\n.\nA\n"),
            vec![None, Frame(1), Frame(2), Frame(3)]
        );
    }

    #[test]
    fn test_blank_comment_header_lines_are_unnumbered() {
        assert_eq!(
            annotate("!TYPE: DEFAULT\n!FORMAT: <KA>\n\n# hi\nA\n"),
            vec![None, None, None, None, Frame(1)]
        );
    }

    #[test]
    fn test_repeat_block_is_first_iteration_local() {
        // Inside REPEAT 3 the gutter shows 1, 2; the line after the block
        // jumps to 7 because the block ran three times.
        assert_eq!(
            annotate("!FORMAT: <KA>\nREPEAT 3\n    A\n    A\n.\n"),
            vec![None, None, Frame(1), Frame(2), Frame(7)]
        );
    }

    #[test]
    fn test_nested_repeat_weights_multiply() {
        // 2 * (2 * 1) = 4 frames from the inner line, then the closer.
        assert_eq!(
            annotate("!FORMAT: <KA>\nREPEAT 2\n    REPEAT 2\n        A\n.\n"),
            vec![None, None, None, Frame(1), Frame(5)]
        );
    }

    #[test]
    fn test_bad_indentation_marks_line() {
        assert_eq!(
            annotate("!FORMAT: <KA>\n   A\nA\n"),
            vec![None, Error, Frame(1)]
        );
    }

    #[test]
    fn test_over_indent_marks_line() {
        assert_eq!(
            annotate("!FORMAT: <KA>\n    A\nA\n"),
            vec![None, Error, Frame(1)]
        );
    }

    #[test]
    fn test_bad_repeat_count_marks_line() {
        assert_eq!(
            annotate("!FORMAT: <KA>\nREPEAT x\nA\n"),
            vec![None, Error, Frame(1)]
        );
    }

    #[test]
    fn test_include_without_dir_is_unnumbered() {
        assert_eq!(
            annotate("!FORMAT: <KA>\nINCLUDE sub.tas\nA\n"),
            vec![None, None, Frame(1)]
        );
    }

    #[test]
    fn test_include_advances_by_included_count() {
        use std::io::Write;
        let dir = tempfile::TempDir::new().unwrap();
        let sub = dir.path().join("sub.tas");
        let mut file = std::fs::File::create(&sub).unwrap();
        file.write_all(b"!FORMAT: <K1>\nX\nX\n").unwrap();

        let cache = FrameCache::new();
        let anns = annotate_text(
            "!FORMAT: <K1>\nX\nINCLUDE sub.tas\nX\n",
            Some(dir.path()),
            &cache,
        );
        assert_eq!(anns, vec![None, Frame(1), Frame(3), Frame(4)]);
    }

    #[test]
    fn test_repeat_weight_overflow_marks_line() {
        assert_eq!(
            annotate(
                "!FORMAT: <KA>\nREPEAT 10000000000000000000\n    REPEAT 10000000000000000000\nA\n"
            ),
            vec![None, None, Error, Frame(1)]
        );
    }

    #[test]
    fn test_missing_include_marks_line() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = FrameCache::new();
        let anns = annotate_text(
            "!FORMAT: <K1>\nINCLUDE nope.tas\n",
            Some(dir.path()),
            &cache,
        );
        assert_eq!(anns, vec![None, Error]);
    }
}
