//! Session player for replaying recorded sessions
//!
//! Playback runs on a virtual clock. Each [`tick`](SessionPlayer::tick)
//! advances virtual time by the wall time since the previous tick, scaled by
//! the playback speed, and then dispatches every event that has become due.
//! Draining all due events at once means a long gap between ticks (a
//! suspended host, a slow frame) still delivers each event exactly once and
//! in log order.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::{Clock, TickHandle, TickScheduler};
use crate::config::{clamp_speed, PlayerConfig};
use crate::types::{Sign, TranscriptSegment};

use super::types::{EventKind, MarkerInfo, PlaybackState, SessionEvent, SessionRecording};

/// Progress report sent after each tick and seek
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackProgress {
    /// Virtual time in milliseconds
    pub current_time: f64,
    /// Recording duration in milliseconds
    pub duration: u64,
    /// `current_time / duration`, capped at 1
    pub progress: f64,
}

/// Receiver of replayed events
///
/// Every method defaults to doing nothing. Handlers are called directly: a
/// panic inside one propagates to the caller of `tick()` or the control
/// method that triggered it.
pub trait PlaybackHandler {
    fn on_transcription(&mut self, _segment: &TranscriptSegment) {}

    fn on_translation(&mut self, _signs: &[Sign], _source_text: &str) {}

    fn on_sign_start(&mut self, _sign: &Sign, _index: usize) {}

    fn on_sign_end(&mut self, _sign: &Sign, _index: usize) {}

    fn on_marker(&mut self, _label: &str, _notes: Option<&str>) {}

    fn on_error(&mut self, _code: &str, _message: &str) {}

    fn on_state_change(&mut self, _state: PlaybackState) {}

    fn on_progress(&mut self, _progress: PlaybackProgress) {}
}

/// Handler that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPlaybackHandler;

impl PlaybackHandler for NullPlaybackHandler {}

/// Replays a [`SessionRecording`] against a [`PlaybackHandler`]
pub struct SessionPlayer {
    /// Current playback state
    state: PlaybackState,
    config: PlayerConfig,
    /// The recording being played
    recording: Option<SessionRecording>,
    /// Index of the next event to dispatch
    cursor: usize,
    /// Virtual time in milliseconds
    virtual_time: f64,
    /// Playback speed multiplier (1.0 = real-time)
    speed: f64,
    /// Clock reading at the previous tick (or at play/seek)
    last_tick: Duration,
    pending_tick: Option<TickHandle>,
    clock: Box<dyn Clock>,
    scheduler: Box<dyn TickScheduler>,
    handler: Box<dyn PlaybackHandler>,
}

impl std::fmt::Debug for SessionPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPlayer")
            .field("state", &self.state)
            .field("cursor", &self.cursor)
            .field("virtual_time", &self.virtual_time)
            .field("speed", &self.speed)
            .field("scheduler", &self.scheduler.name())
            .finish()
    }
}

impl SessionPlayer {
    /// Create a new session player
    pub fn new(clock: impl Clock + 'static, scheduler: impl TickScheduler + 'static) -> Self {
        Self::with_config(PlayerConfig::default(), clock, scheduler)
    }

    /// Create with specific settings
    pub fn with_config(
        config: PlayerConfig,
        clock: impl Clock + 'static,
        scheduler: impl TickScheduler + 'static,
    ) -> Self {
        let speed = if config.default_speed.is_finite() {
            clamp_speed(config.default_speed)
        } else {
            1.0
        };

        Self {
            state: PlaybackState::Idle,
            config,
            recording: None,
            cursor: 0,
            virtual_time: 0.0,
            speed,
            last_tick: Duration::ZERO,
            pending_tick: None,
            clock: Box::new(clock),
            scheduler: Box::new(scheduler),
            handler: Box::new(NullPlaybackHandler),
        }
    }

    /// Get current state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Check if playing
    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// Check if a recording is loaded
    pub fn has_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Get the loaded recording
    pub fn recording(&self) -> Option<&SessionRecording> {
        self.recording.as_ref()
    }

    /// Whether a tick has been requested and not yet run or cancelled
    pub fn has_pending_tick(&self) -> bool {
        self.pending_tick.is_some()
    }

    /// Index of the next event to dispatch
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Get playback speed
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Virtual time in milliseconds
    pub fn current_time(&self) -> f64 {
        if self.recording.is_none() {
            return 0.0;
        }
        self.virtual_time
    }

    /// Get total duration in milliseconds
    pub fn duration(&self) -> u64 {
        self.recording
            .as_ref()
            .map(|r| r.duration())
            .unwrap_or(0)
    }

    /// Get playback progress (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        let duration = self.duration();
        if duration == 0 {
            return 0.0;
        }
        (self.virtual_time / duration as f64).min(1.0)
    }

    /// Markers of the loaded recording
    pub fn markers(&self) -> Vec<MarkerInfo> {
        self.recording
            .as_ref()
            .map(|r| r.markers())
            .unwrap_or_default()
    }

    /// Install the dispatch target; playback position is unaffected
    pub fn set_handler(&mut self, handler: impl PlaybackHandler + 'static) {
        self.handler = Box::new(handler);
    }

    /// Load a recording for playback
    pub fn load(&mut self, recording: SessionRecording) {
        self.cancel_pending_tick();
        info!(
            "Loaded recording {} ({} events, {} ms)",
            recording.metadata.id,
            recording.event_count(),
            recording.duration()
        );
        self.recording = Some(recording);
        self.cursor = 0;
        self.virtual_time = 0.0;
        self.set_state(PlaybackState::Idle);
    }

    /// Unload the current recording
    pub fn unload(&mut self) {
        self.cancel_pending_tick();
        self.recording = None;
        self.cursor = 0;
        self.virtual_time = 0.0;
        self.set_state(PlaybackState::Idle);
    }

    /// Start or resume playback
    pub fn play(&mut self) {
        if !self.require_recording("play") {
            return;
        }

        match self.state {
            PlaybackState::Playing => return,
            PlaybackState::Ended => {
                self.cursor = 0;
                self.virtual_time = 0.0;
            }
            PlaybackState::Idle | PlaybackState::Paused => {}
        }

        self.last_tick = self.clock.now();
        self.set_state(PlaybackState::Playing);
        self.schedule_tick();
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if !self.require_recording("pause") {
            return;
        }
        if self.state != PlaybackState::Playing {
            return;
        }

        self.cancel_pending_tick();
        self.set_state(PlaybackState::Paused);
    }

    /// Stop playback and reset to beginning
    pub fn stop(&mut self) {
        if !self.require_recording("stop") {
            return;
        }

        self.cancel_pending_tick();
        self.cursor = 0;
        self.virtual_time = 0.0;
        self.set_state(PlaybackState::Idle);
    }

    /// Set playback speed, clamped to the supported range
    ///
    /// Applies from the next tick on; virtual time is not adjusted.
    pub fn set_speed(&mut self, speed: f64) {
        if !speed.is_finite() {
            warn!("Ignoring non-finite playback speed {}", speed);
            return;
        }
        self.speed = clamp_speed(speed);
        debug!("Playback speed set to {}x", self.speed);
    }

    /// Jump to a time in milliseconds without dispatching skipped events
    ///
    /// Events at or before the landing time count as consumed.
    pub fn seek(&mut self, time_ms: f64) {
        let Some(recording) = self.recording.as_ref() else {
            warn!("Cannot seek: no recording loaded");
            return;
        };

        let duration = recording.duration();
        let time = if time_ms.is_nan() {
            0.0
        } else {
            time_ms.clamp(0.0, duration as f64)
        };

        self.virtual_time = time;
        self.cursor = recording.first_event_after(time.floor() as u64);

        if self.is_playing() {
            self.last_tick = self.clock.now();
        } else if self.state == PlaybackState::Ended && time < duration as f64 {
            self.set_state(PlaybackState::Paused);
        }

        debug!("Seeked to {} ms (cursor {})", time, self.cursor);
        self.emit_progress();
    }

    /// Seek by progress (0.0 to 1.0)
    pub fn seek_progress(&mut self, fraction: f64) {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        self.seek(self.duration() as f64 * fraction);
    }

    /// Seek to the first marker with the given label
    pub fn seek_to_marker(&mut self, label: &str) -> bool {
        let Some(recording) = self.recording.as_ref() else {
            warn!("Cannot seek to marker {:?}: no recording loaded", label);
            return false;
        };

        match recording.find_marker(label).map(|e| e.timestamp) {
            Some(timestamp) => {
                self.seek(timestamp as f64);
                true
            }
            None => false,
        }
    }

    /// Seek to the first marker after the current time
    pub fn seek_to_next_marker(&mut self) -> bool {
        let now = self.virtual_time;
        let target = self
            .markers()
            .into_iter()
            .find(|m| m.timestamp as f64 > now)
            .map(|m| m.timestamp);

        match target {
            Some(timestamp) => {
                self.seek(timestamp as f64);
                true
            }
            None => false,
        }
    }

    /// Seek to the last marker before the current time
    pub fn seek_to_previous_marker(&mut self) -> bool {
        let now = self.virtual_time;
        let target = self
            .markers()
            .into_iter()
            .rev()
            .find(|m| (m.timestamp as f64) < now)
            .map(|m| m.timestamp);

        match target {
            Some(timestamp) => {
                self.seek(timestamp as f64);
                true
            }
            None => false,
        }
    }

    /// Advance virtual time and dispatch due events
    ///
    /// Called by the host once per requested tick. Does nothing unless
    /// playing.
    pub fn tick(&mut self) {
        self.pending_tick = None;
        if self.state != PlaybackState::Playing {
            return;
        }
        let Some(recording) = self.recording.as_ref() else {
            return;
        };
        let duration = recording.duration();

        let now = self.clock.now();
        let wall_delta = now.saturating_sub(self.last_tick);
        self.last_tick = now;
        self.virtual_time += wall_delta.as_secs_f64() * 1000.0 * self.speed;

        self.dispatch_due();

        if self.virtual_time >= duration as f64 {
            self.virtual_time = duration as f64;
            self.emit_progress();

            if self.config.loop_playback {
                debug!("Looping playback");
                self.cursor = 0;
                self.virtual_time = 0.0;
                self.schedule_tick();
            } else {
                info!("Playback ended");
                self.set_state(PlaybackState::Ended);
            }
            return;
        }

        self.emit_progress();
        self.schedule_tick();
    }

    fn dispatch_due(&mut self) {
        let Some(recording) = self.recording.as_ref() else {
            return;
        };

        while let Some(event) = recording.events.get(self.cursor) {
            if event.timestamp as f64 > self.virtual_time {
                break;
            }
            self.cursor += 1;
            dispatch(self.handler.as_mut(), event);
        }
    }

    fn emit_progress(&mut self) {
        let duration = self.duration();
        let progress = if duration == 0 {
            1.0
        } else {
            (self.virtual_time / duration as f64).min(1.0)
        };
        self.handler.on_progress(PlaybackProgress {
            current_time: self.virtual_time,
            duration,
            progress,
        });
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state == state {
            return;
        }
        debug!(
            "Playback {} -> {}",
            self.state.display_name(),
            state.display_name()
        );
        self.state = state;
        self.handler.on_state_change(state);
    }

    fn schedule_tick(&mut self) {
        if self.pending_tick.is_none() {
            self.pending_tick = Some(self.scheduler.request_tick());
        }
    }

    fn cancel_pending_tick(&mut self) {
        if let Some(handle) = self.pending_tick.take() {
            self.scheduler.cancel_tick(handle);
        }
    }

    fn require_recording(&self, operation: &str) -> bool {
        if self.recording.is_none() {
            warn!("Cannot {}: no recording loaded", operation);
            return false;
        }
        true
    }
}

/// Route one event to the matching handler method
fn dispatch(handler: &mut dyn PlaybackHandler, event: &SessionEvent) {
    match &event.kind {
        EventKind::Transcription { segment, .. } => handler.on_transcription(segment),
        EventKind::Translation {
            signs, source_text, ..
        } => handler.on_translation(signs, source_text),
        EventKind::SignStart { sign, index } => handler.on_sign_start(sign, *index),
        EventKind::SignEnd { sign, index } => handler.on_sign_end(sign, *index),
        EventKind::Marker { label, notes, .. } => handler.on_marker(label, notes.as_deref()),
        EventKind::Error { code, message, .. } => handler.on_error(code, message),
        EventKind::SessionStart
        | EventKind::SessionEnd
        | EventKind::StatusChange { .. }
        | EventKind::ConfigChange(_)
        | EventKind::Unknown { .. } => {}
    }
}
