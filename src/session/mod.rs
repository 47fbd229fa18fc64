//! Session recording and playback module
//!
//! This module records live interpretation sessions as an append-only event
//! log and replays them later on a virtual clock.
//!
//! # Features
//!
//! - Record pipeline events with timestamps relative to session start
//! - Keep running statistics that can be rebuilt from the log alone
//! - Save sessions to disk as JSON
//! - Play back sessions at variable speed, with seeking and marker navigation
//!
//! Calling a control in the wrong state (recording while idle, seeking with
//! nothing loaded) is logged as a warning and otherwise ignored.

pub mod codec;
pub mod listeners;
pub mod player;
pub mod recorder;
pub mod stats;
pub mod types;

pub use codec::{export_recording, import_recording};
pub use listeners::{EventListener, ListenerRegistry, SubscriptionId};
pub use player::{NullPlaybackHandler, PlaybackHandler, PlaybackProgress, SessionPlayer};
pub use recorder::{SessionOptions, SessionRecorder};
pub use stats::StatsAccumulator;
pub use types::{
    EventKind, MarkerInfo, PlaybackState, RecorderState, SessionEvent, SessionMetadata,
    SessionRecording, SessionStats, RECORDING_FORMAT_VERSION,
};
