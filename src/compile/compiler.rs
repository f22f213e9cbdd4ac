//! Instruction compiler
//!
//! Compiles a [`RawInstruction`] against its predecessor into a
//! [`CompiledInstruction`] delta: only the fields whose state changed
//! contribute a press or release, and a mouse move is emitted whenever both
//! coordinates are active this frame.

use crate::playback::sink::InputSink;
use crate::script::format::Field;
use crate::script::instruction::{RawInstruction, RawValue};
use crate::{Error, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

/// Process-wide mouse offset, applied to absolute coordinates at compile
/// time. Settable before a compile/execute call; there is no per-call
/// override (documented limitation).
static X_OFFSET: AtomicI32 = AtomicI32::new(0);
static Y_OFFSET: AtomicI32 = AtomicI32::new(0);

/// Set the process-wide mouse offset.
pub fn set_mouse_offset(x: i32, y: i32) {
    X_OFFSET.store(x, Ordering::Relaxed);
    Y_OFFSET.store(y, Ordering::Relaxed);
}

/// The process-wide mouse offset currently in effect.
pub fn mouse_offset() -> (i32, i32) {
    (X_OFFSET.load(Ordering::Relaxed), Y_OFFSET.load(Ordering::Relaxed))
}

/// A delta-compiled instruction: the state changes for one frame.
///
/// A code appears in at most one of the press/release sets for the same
/// device class; a field unchanged from the predecessor contributes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CompiledInstruction {
    /// Absolute mouse target, offsets already applied
    pub mouse_target: Option<(i32, i32)>,
    /// Mouse buttons to press this frame
    pub mouse_press: BTreeSet<u16>,
    /// Mouse buttons to release this frame
    pub mouse_release: BTreeSet<u16>,
    /// Keys to press this frame
    pub key_press: BTreeSet<u16>,
    /// Keys to release this frame
    pub key_release: BTreeSet<u16>,
}

impl CompiledInstruction {
    /// Whether this instruction changes nothing at all.
    pub fn is_empty(&self) -> bool {
        self.mouse_target.is_none()
            && self.mouse_press.is_empty()
            && self.mouse_release.is_empty()
            && self.key_press.is_empty()
            && self.key_release.is_empty()
    }

    /// Apply this instruction to an input sink.
    ///
    /// Order: mouse move, mouse presses, mouse releases, key presses, key
    /// releases.
    pub fn apply<S: InputSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        if let Some((x, y)) = self.mouse_target {
            sink.move_mouse_to(x, y)?;
        }
        for &button in &self.mouse_press {
            sink.press_mouse_button(button)?;
        }
        for &button in &self.mouse_release {
            sink.release_mouse_button(button)?;
        }
        for &key in &self.key_press {
            sink.press_key(key)?;
        }
        for &key in &self.key_release {
            sink.release_key(key)?;
        }
        Ok(())
    }
}

impl fmt::Display for CompiledInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[CompiledInstruction")?;
        if let Some((x, y)) = self.mouse_target {
            write!(f, " mouse_target=({x}, {y})")?;
        }
        if !self.mouse_press.is_empty() {
            write!(f, " mouse_press={:?}", self.mouse_press)?;
        }
        if !self.mouse_release.is_empty() {
            write!(f, " mouse_release={:?}", self.mouse_release)?;
        }
        if !self.key_press.is_empty() {
            write!(f, " key_press={:?}", self.key_press)?;
        }
        if !self.key_release.is_empty() {
            write!(f, " key_release={:?}", self.key_release)?;
        }
        write!(f, "]")
    }
}

/// Compiles raw instructions into deltas.
///
/// The mouse offset is snapshotted at construction; [`with_offset`] lets
/// callers (and tests) bypass the process-wide pair.
///
/// [`with_offset`]: InstructionCompiler::with_offset
#[derive(Debug, Clone, Copy)]
pub struct InstructionCompiler {
    offset: (i32, i32),
}

impl InstructionCompiler {
    /// Create a compiler using the process-wide mouse offset.
    pub fn new() -> Self {
        Self {
            offset: mouse_offset(),
        }
    }

    /// Create a compiler with an explicit mouse offset.
    pub fn with_offset(x: i32, y: i32) -> Self {
        Self { offset: (x, y) }
    }

    /// Compile one instruction against its predecessor.
    ///
    /// With no predecessor, every active value is treated as a press/move
    /// compiled against an all-sentinel implicit frame.
    pub fn compile(
        &self,
        current: &RawInstruction,
        previous: Option<&RawInstruction>,
    ) -> Result<CompiledInstruction> {
        if let Some(prev) = previous {
            current.check_compatible(prev)?;
        }

        let mut out = CompiledInstruction::default();
        let mut x: Option<i32> = None;
        let mut y: Option<i32> = None;

        for (field, value) in current.spec().fields().iter().zip(current.values()) {
            let prev_value = previous.and_then(|p| p.value_of(field));

            match field {
                Field::MouseX => {
                    if !value.is_no_input() {
                        x = Some(parse_coordinate(value)?);
                    }
                }
                Field::MouseY => {
                    if !value.is_no_input() {
                        y = Some(parse_coordinate(value)?);
                    }
                }
                Field::Key { code, .. } => {
                    delta(value, prev_value, *code, &mut out.key_press, &mut out.key_release);
                }
                Field::Button(button) => {
                    delta(
                        value,
                        prev_value,
                        *button,
                        &mut out.mouse_press,
                        &mut out.mouse_release,
                    );
                }
            }
        }

        // A move needs both axes active; no "previous position" suppression
        // applies to absolute coordinates.
        if let (Some(x), Some(y)) = (x, y) {
            out.mouse_target = Some((self.offset.0 + x, self.offset.1 + y));
        }

        tracing::trace!(instruction = %out, "compiled");
        Ok(out)
    }

    /// Compile a whole sequence pairwise.
    ///
    /// An empty input yields an empty output.
    pub fn compile_sequence(
        &self,
        instructions: &[RawInstruction],
    ) -> Result<Vec<CompiledInstruction>> {
        let mut compiled = Vec::with_capacity(instructions.len());
        let mut previous: Option<&RawInstruction> = None;
        for instruction in instructions {
            compiled.push(self.compile(instruction, previous)?);
            previous = Some(instruction);
        }
        Ok(compiled)
    }
}

impl Default for InstructionCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Delta-compile one key/button field into the press or release set.
///
/// A value equal to the predecessor's contributes nothing; releasing a
/// control that was never pressed is suppressed.
fn delta(
    current: &RawValue,
    previous: Option<&RawValue>,
    code: u16,
    press: &mut BTreeSet<u16>,
    release: &mut BTreeSet<u16>,
) {
    if previous == Some(current) {
        return;
    }
    if current.is_no_input() {
        match previous {
            Some(prev) if !prev.is_no_input() => {
                release.insert(code);
            }
            _ => {}
        }
    } else {
        press.insert(code);
    }
}

fn parse_coordinate(value: &RawValue) -> Result<i32> {
    value.text().parse::<i32>().map_err(|_| {
        Error::InvalidFileFormat(format!("invalid coordinate \"{}\"", value.text()))
    })
}
