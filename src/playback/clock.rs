//! Time source abstraction for the playback scheduler

use std::time::{Duration, Instant};

/// Source of time and sleep for [`PlaybackScheduler`](super::PlaybackScheduler).
///
/// The scheduler never touches `Instant::now` or `thread::sleep` directly, so
/// tests can drive playback with a manual clock and assert on frame timing
/// without waiting in real time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall-clock implementation backed by the OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
