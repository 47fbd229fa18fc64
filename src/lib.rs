//! # SignStream session recorder and replay engine
//!
//! Captures the events of a live speech-to-sign interpretation session
//! (transcriptions, translations, avatar sign timing, operator markers,
//! errors) into a serializable recording, and replays that recording
//! deterministically without the original live sources.
//!
//! ## Architecture
//!
//! - **Recorder**: appends timestamped events and keeps running statistics
//! - **Player**: virtual-time state machine dispatching events to a handler
//! - **Clock / TickScheduler**: injected time and scheduling, so both sides
//!   run the same under a real clock and in tests
//!
//! ## Example
//!
//! ```
//! use signstream_session::{
//!     clock::{ManualClock, QueuedTickScheduler},
//!     session::{SessionOptions, SessionPlayer, SessionRecorder},
//!     types::TranscriptSegment,
//! };
//!
//! let clock = ManualClock::new();
//! let mut recorder = SessionRecorder::new(clock.clone());
//! recorder.start(SessionOptions::named("Demo"));
//! clock.advance_ms(250);
//! recorder.record_transcription(TranscriptSegment::final_text("hello"), 120);
//! clock.advance_ms(250);
//! let recording = recorder.stop().expect("session was recording");
//!
//! let host = QueuedTickScheduler::new();
//! let mut player = SessionPlayer::new(clock.clone(), host.clone());
//! player.load(recording);
//! player.play();
//! while host.take_due() {
//!     clock.advance_ms(16);
//!     player.tick();
//! }
//! assert!(player.state().is_ended());
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, QueuedTickScheduler, SystemClock, TickHandle, TickScheduler};
pub use config::{PlayerConfig, RecorderConfig, SessionConfig};
pub use error::{Result, SessionError};
pub use session::{
    EventKind, PlaybackHandler, PlaybackState, SessionEvent, SessionPlayer, SessionRecorder,
    SessionRecording,
};
pub use types::{Sign, TranscriptSegment};
