//! Integration tests for playback
//!
//! Parse a script, compile it, and replay it through the scheduler with a
//! manual clock and a recording sink, asserting on the exact event stream.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tascript::compile::compiler::InstructionCompiler;
use tascript::playback::clock::Clock;
use tascript::playback::scheduler::PlaybackScheduler;
use tascript::playback::sink::{RecordingSink, SinkEvent};
use tascript::script::cache::ScriptCache;
use tascript::script::parser;

/// Clock that advances only when the scheduler sleeps.
#[derive(Clone)]
struct ManualClock {
    state: Arc<Mutex<(Instant, Vec<Duration>)>>,
}

impl ManualClock {
    fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new((Instant::now(), Vec::new()))),
        }
    }

    fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().1.clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.state.lock().0
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.state.lock();
        state.0 += duration;
        state.1.push(duration);
    }
}

const SCRIPT: &str = concat!(
    "!FORMAT: <MX> <MY> <M1> <KA>\n",
    "50 60 . .\n",
    ". . 1 A\n",
    ". . 1 A\n",
    ". . . .\n",
);

fn compile_script() -> Vec<tascript::CompiledInstruction> {
    let cache = ScriptCache::new();
    let unit = parser::parse_text(SCRIPT, None, &cache).expect("parse failed");
    InstructionCompiler::with_offset(0, 0)
        .compile_sequence(&unit.instructions)
        .expect("compile failed")
}

#[test]
fn test_quick_playback_event_stream() {
    let frames = compile_script();
    let mut sink = RecordingSink::new();
    PlaybackScheduler::run_quick(&frames, &mut sink).expect("playback failed");

    assert_eq!(
        sink.events(),
        vec![
            SinkEvent::MouseMove(50, 60),
            SinkEvent::MousePress(1),
            SinkEvent::KeyPress(65),
            SinkEvent::MouseRelease(1),
            SinkEvent::KeyRelease(65),
        ]
    );
}

#[test]
fn test_timed_playback_one_frame_per_tick() {
    let frames = compile_script();
    let clock = ManualClock::new();
    let period = Duration::from_millis(17);
    let scheduler = PlaybackScheduler::with_clock(clock.clone(), period);

    let sink = scheduler
        .spawn_timed(frames, RecordingSink::new())
        .wait()
        .expect("playback failed");

    // Same stream as the quick run, one sleep per frame.
    assert_eq!(sink.events().len(), 5);
    assert_eq!(clock.sleeps(), vec![period; 4]);
}

#[test]
fn test_timed_raw_playback_compiles_on_the_fly() {
    let cache = ScriptCache::new();
    let unit = parser::parse_text(SCRIPT, None, &cache).expect("parse failed");

    let clock = ManualClock::new();
    let scheduler = PlaybackScheduler::with_clock(clock, Duration::from_millis(17));
    let sink = scheduler
        .spawn_timed_raw(
            InstructionCompiler::with_offset(0, 0),
            unit.instructions.clone(),
            RecordingSink::new(),
        )
        .wait()
        .expect("playback failed");

    assert_eq!(
        sink.events(),
        vec![
            SinkEvent::MouseMove(50, 60),
            SinkEvent::MousePress(1),
            SinkEvent::KeyPress(65),
            SinkEvent::MouseRelease(1),
            SinkEvent::KeyRelease(65),
        ]
    );
}

#[test]
fn test_offset_applies_to_mouse_moves() {
    let cache = ScriptCache::new();
    let unit = parser::parse_text(SCRIPT, None, &cache).expect("parse failed");
    let frames = InstructionCompiler::with_offset(1000, -10)
        .compile_sequence(&unit.instructions)
        .expect("compile failed");

    let mut sink = RecordingSink::new();
    PlaybackScheduler::run_quick(&frames, &mut sink).expect("playback failed");
    assert_eq!(sink.events()[0], SinkEvent::MouseMove(1050, 50));
}
