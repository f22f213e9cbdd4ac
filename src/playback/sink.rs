//! Input event sinks
//!
//! A [`CompiledInstruction`](crate::compile::CompiledInstruction) is applied
//! against an [`InputSink`], which decides what the events mean: log them,
//! record them for inspection, or drop them. Platform event injection plugs
//! in behind the same trait.

use crate::Result;

/// Receiver for the primitive input events a frame produces.
///
/// Implementations may fail per event; the scheduler logs and skips the rest
/// of the failing frame rather than aborting playback.
pub trait InputSink {
    /// Move the pointer to an absolute screen position.
    fn move_mouse_to(&mut self, x: i32, y: i32) -> Result<()>;
    fn press_mouse_button(&mut self, button: u16) -> Result<()>;
    fn release_mouse_button(&mut self, button: u16) -> Result<()>;
    fn press_key(&mut self, code: u16) -> Result<()>;
    fn release_key(&mut self, code: u16) -> Result<()>;
}

/// Sink that emits each event through `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl InputSink for LoggingSink {
    fn move_mouse_to(&mut self, x: i32, y: i32) -> Result<()> {
        tracing::debug!(x, y, "mouse move");
        Ok(())
    }

    fn press_mouse_button(&mut self, button: u16) -> Result<()> {
        tracing::debug!(button, "mouse press");
        Ok(())
    }

    fn release_mouse_button(&mut self, button: u16) -> Result<()> {
        tracing::debug!(button, "mouse release");
        Ok(())
    }

    fn press_key(&mut self, code: u16) -> Result<()> {
        tracing::debug!(code, "key press");
        Ok(())
    }

    fn release_key(&mut self, code: u16) -> Result<()> {
        tracing::debug!(code, "key release");
        Ok(())
    }
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl InputSink for NullSink {
    fn move_mouse_to(&mut self, _x: i32, _y: i32) -> Result<()> {
        Ok(())
    }

    fn press_mouse_button(&mut self, _button: u16) -> Result<()> {
        Ok(())
    }

    fn release_mouse_button(&mut self, _button: u16) -> Result<()> {
        Ok(())
    }

    fn press_key(&mut self, _code: u16) -> Result<()> {
        Ok(())
    }

    fn release_key(&mut self, _code: u16) -> Result<()> {
        Ok(())
    }
}

/// One event as seen by a [`RecordingSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEvent {
    MouseMove(i32, i32),
    MousePress(u16),
    MouseRelease(u16),
    KeyPress(u16),
    KeyRelease(u16),
}

/// Sink that records every event in order. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events received so far, in arrival order.
    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }
}

impl InputSink for RecordingSink {
    fn move_mouse_to(&mut self, x: i32, y: i32) -> Result<()> {
        self.events.push(SinkEvent::MouseMove(x, y));
        Ok(())
    }

    fn press_mouse_button(&mut self, button: u16) -> Result<()> {
        self.events.push(SinkEvent::MousePress(button));
        Ok(())
    }

    fn release_mouse_button(&mut self, button: u16) -> Result<()> {
        self.events.push(SinkEvent::MouseRelease(button));
        Ok(())
    }

    fn press_key(&mut self, code: u16) -> Result<()> {
        self.events.push(SinkEvent::KeyPress(code));
        Ok(())
    }

    fn release_key(&mut self, code: u16) -> Result<()> {
        self.events.push(SinkEvent::KeyRelease(code));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_preserves_order() {
        let mut sink = RecordingSink::new();
        sink.move_mouse_to(10, 20).unwrap();
        sink.press_key(65).unwrap();
        sink.release_key(65).unwrap();
        assert_eq!(
            sink.events(),
            vec![
                SinkEvent::MouseMove(10, 20),
                SinkEvent::KeyPress(65),
                SinkEvent::KeyRelease(65),
            ]
        );
    }

    #[test]
    fn test_null_sink_accepts_everything() {
        let mut sink = NullSink;
        assert!(sink.press_mouse_button(1).is_ok());
        assert!(sink.release_mouse_button(1).is_ok());
    }
}
