//! # tascript
//!
//! An engine for tool-assisted-automation (TAS) input scripts: indentation
//! structured text files in which every line describes one frame of synthetic
//! keyboard/mouse input, with `REPEAT n` and `INCLUDE path` macros.
//!
//! ## Overview
//!
//! A script declares its field layout in a `!FORMAT:` header (for example
//! `<MX> <MY> <K1> <K2>`), then lists one event-set per line. The engine
//! turns that text into a flat, time-ordered instruction sequence,
//! delta-compiles consecutive frames into minimal press/release/move sets,
//! and replays them through an abstract input sink either as fast as
//! possible or at a fixed frame period.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tascript::script::cache::ScriptCache;
//! use tascript::compile::compiler::InstructionCompiler;
//! use tascript::playback::scheduler::PlaybackScheduler;
//! use tascript::playback::sink::LoggingSink;
//!
//! let cache = ScriptCache::new();
//! let unit = cache.get_or_parse("scripts/demo.tas".as_ref()).expect("parse failed");
//!
//! let compiler = InstructionCompiler::new();
//! let compiled = compiler.compile_sequence(&unit.instructions).expect("compile failed");
//!
//! let mut sink = LoggingSink;
//! PlaybackScheduler::run_quick(&compiled, &mut sink).expect("playback failed");
//! ```
//!
//! ## Architecture
//!
//! - [`script`]: format compiler, structural parser, and the parse cache
//! - [`compile`]: delta compilation of raw frames into instructions
//! - [`analysis`]: frame counting and per-line gutter annotation
//! - [`playback`]: input sink boundary, clock abstraction, schedulers
//! - [`app`]: CLI and configuration management
//!
//! ## Pipeline
//!
//! ```text
//! ┌───────────┐    ┌─────────────────┐    ┌──────────────┐    ┌───────────┐
//! │ .tas text │───▶│ StructuralParser│───▶│ Instruction  │───▶│ Playback  │
//! │           │    │ (+ ScriptCache) │    │ Compiler     │    │ Scheduler │
//! └─────┬─────┘    └─────────────────┘    └──────────────┘    └─────┬─────┘
//!       │                                                          ▼
//!       └─────────▶ FrameCounter (independent textual pass)     InputSink
//! ```

pub mod script;
pub mod compile;
pub mod analysis;
pub mod playback;
pub mod app;

// Re-export commonly used types
pub use analysis::frame_count::{FrameCache, FrameCount};
pub use compile::compiler::{CompiledInstruction, InstructionCompiler};
pub use playback::scheduler::{CancelToken, PlaybackScheduler};
pub use playback::sink::InputSink;
pub use script::cache::ScriptCache;
pub use script::format::{Field, FormatSpec};
pub use script::instruction::{RawInstruction, RawValue};
pub use script::parser::ParsedUnit;

/// Result type alias for the script engine
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the script engine
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The `!FORMAT:` specification itself is invalid.
    #[error("Malformed format specification: {0}")]
    MalformedFormat(String),

    /// Missing/bad header, bad indentation, non-matching data line, invalid
    /// REPEAT count, or an INCLUDE inside a FRAGMENT file.
    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    /// An instruction was compiled or executed against a predecessor with a
    /// different field set.
    #[error("Incompatible instruction: {0}")]
    IncompatibleInstruction(String),

    /// A key name outside the recognized vocabulary.
    #[error("Unknown key name: {0}")]
    UnknownKey(String),

    /// A field name outside the recognized vocabulary.
    #[error("Unknown field name: {0}")]
    UnknownField(String),

    /// A file could not be read (missing, permissions, bad path).
    #[error("Could not read {path}: {source}")]
    ResourceUnavailable {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input sink rejected an event.
    #[error("Input sink error: {0}")]
    Sink(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
