//! Frame-paced playback
//!
//! Runs a sequence of compiled frames against an [`InputSink`], either as
//! fast as the sink accepts them (`run_quick`) or paced against a fixed
//! frame period on a background thread (`spawn_timed`). Pacing is computed
//! from absolute deadlines so one slow frame does not shift every later
//! frame.

use crate::compile::{CompiledInstruction, InstructionCompiler};
use crate::playback::clock::{Clock, SystemClock};
use crate::playback::sink::InputSink;
use crate::script::RawInstruction;
use crate::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Cooperative stop signal for a timed playback run.
///
/// Cloning shares the flag; cancellation takes effect at the next frame
/// boundary, never mid-frame.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// A timed playback run on a background thread.
///
/// The sink travels with the thread and comes back from [`wait`], so a
/// recording sink can be inspected after the run completes.
///
/// [`wait`]: PlaybackHandle::wait
pub struct PlaybackHandle<S> {
    thread: JoinHandle<(S, Result<()>)>,
    token: CancelToken,
}

impl<S> PlaybackHandle<S> {
    /// Request a stop at the next frame boundary.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Block until the run finishes and recover the sink.
    pub fn wait(self) -> Result<S> {
        match self.thread.join() {
            Ok((sink, result)) => result.map(|()| sink),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

/// Executes compiled frame sequences against a sink.
pub struct PlaybackScheduler<C: Clock = SystemClock> {
    clock: C,
    period: Duration,
}

impl PlaybackScheduler<SystemClock> {
    pub fn new(period: Duration) -> Self {
        Self::with_clock(SystemClock, period)
    }

    /// Apply every frame back to back, with no pacing.
    ///
    /// Sink errors abort immediately here: a quick run is a batch operation,
    /// not a live session that must keep tempo.
    pub fn run_quick<S: InputSink>(
        frames: &[CompiledInstruction],
        sink: &mut S,
    ) -> Result<()> {
        for frame in frames {
            frame.apply(sink)?;
        }
        Ok(())
    }

    /// Compile and apply raw instructions pairwise, with no pacing.
    pub fn run_quick_raw<S: InputSink>(
        compiler: InstructionCompiler,
        instructions: &[RawInstruction],
        sink: &mut S,
    ) -> Result<()> {
        let mut previous: Option<&RawInstruction> = None;
        for instruction in instructions {
            compiler.compile(instruction, previous)?.apply(sink)?;
            previous = Some(instruction);
        }
        Ok(())
    }
}

impl<C: Clock> PlaybackScheduler<C> {
    pub fn with_clock(clock: C, period: Duration) -> Self {
        Self { clock, period }
    }

    /// Play pre-compiled frames on a background thread, one per period.
    pub fn spawn_timed<S>(self, frames: Vec<CompiledInstruction>, sink: S) -> PlaybackHandle<S>
    where
        S: InputSink + Send + 'static,
        C: 'static,
    {
        self.spawn(frames.into_iter().map(Ok), sink)
    }

    /// Play raw instructions on a background thread, compiling each frame
    /// against its predecessor as the run progresses.
    pub fn spawn_timed_raw<S>(
        self,
        compiler: InstructionCompiler,
        instructions: Vec<RawInstruction>,
        sink: S,
    ) -> PlaybackHandle<S>
    where
        S: InputSink + Send + 'static,
        C: 'static,
    {
        let frames = instructions.into_iter().scan(None, move |previous, current| {
            let compiled = compiler.compile(&current, previous.as_ref());
            *previous = Some(current);
            Some(compiled)
        });
        self.spawn(frames, sink)
    }

    fn spawn<S, I>(self, frames: I, mut sink: S) -> PlaybackHandle<S>
    where
        S: InputSink + Send + 'static,
        I: Iterator<Item = Result<CompiledInstruction>> + Send + 'static,
        C: 'static,
    {
        let token = CancelToken::new();
        let thread_token = token.clone();
        let thread = std::thread::spawn(move || {
            let result = self.timed_loop(frames, &mut sink, &thread_token);
            (sink, result)
        });
        PlaybackHandle { thread, token }
    }

    fn timed_loop<S, I>(&self, frames: I, sink: &mut S, token: &CancelToken) -> Result<()>
    where
        S: InputSink,
        I: Iterator<Item = Result<CompiledInstruction>>,
    {
        let mut deadline = self.clock.now();
        for (index, frame) in frames.enumerate() {
            if token.is_cancelled() {
                tracing::info!(frame = index, "playback cancelled");
                return Ok(());
            }
            deadline += self.period;
            // A compile failure means the script itself is bad; a sink
            // failure only loses this frame's events.
            let frame = frame?;
            if let Err(error) = frame.apply(sink) {
                tracing::warn!(frame = index, %error, "frame dropped");
            }
            let now = self.clock.now();
            if now > deadline {
                tracing::debug!(
                    frame = index,
                    behind_ms = (now - deadline).as_millis() as u64,
                    "frame deadline missed"
                );
            } else {
                self.clock.sleep(deadline - now);
            }
        }
        Ok(())
    }
}
