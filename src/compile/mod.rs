//! Compile Module
//!
//! Delta compilation: converts raw per-frame field values into
//! [`CompiledInstruction`]s that carry only the state *changes* between
//! consecutive frames (presses, releases, and an optional mouse move).

pub mod compiler;
pub mod keymap;

pub use compiler::{CompiledInstruction, InstructionCompiler};
