//! Timed and immediate execution of compiled instructions

pub mod clock;
pub mod scheduler;
pub mod sink;

pub use clock::{Clock, SystemClock};
pub use scheduler::{CancelToken, PlaybackHandle, PlaybackScheduler};
pub use sink::{InputSink, LoggingSink, NullSink, RecordingSink, SinkEvent};
