//! Analysis Module
//!
//! Static analysis over raw script text, independent of the structural
//! parser: effective frame counting (memoized per canonical path) and the
//! per-line cumulative frame index used for progress/gutter display.

pub mod annotate;
pub mod frame_count;

pub use annotate::{annotate_text, LineAnnotation};
pub use frame_count::{FrameCache, FrameCount};
