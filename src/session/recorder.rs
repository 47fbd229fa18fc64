//! Session recorder for capturing live interpretation sessions

use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::RecorderConfig;
use crate::types::{Sign, TranscriptSegment};

use super::listeners::{ListenerRegistry, SubscriptionId};
use super::stats::StatsAccumulator;
use super::types::{
    EventKind, RecorderState, SessionEvent, SessionMetadata, SessionRecording, SessionStats,
};

/// Status recorded when the session is paused
pub const STATUS_PAUSED: &str = "paused";

/// Status recorded when the session resumes
pub const STATUS_RESUMED: &str = "resumed";

/// Options for starting a session
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Session title (defaults to "Untitled Session")
    pub name: Option<String>,
    pub event_name: Option<String>,
    pub venue: Option<String>,
    /// Language tag (defaults to the configured language)
    pub language: Option<String>,
}

impl SessionOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_event_name(mut self, event_name: impl Into<String>) -> Self {
        self.event_name = Some(event_name.into());
        self
    }

    pub fn with_venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = Some(venue.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Records pipeline events into an append-only log
///
/// Record calls made while not recording are ignored, so late callbacks from
/// the speech, translation or avatar collaborators are harmless.
pub struct SessionRecorder {
    /// Current recording state
    state: RecorderState,
    config: RecorderConfig,
    clock: Box<dyn Clock>,
    /// Clock reading at `start()`
    origin: Duration,
    /// Clock reading at `pause()`, while paused
    paused_at: Option<Duration>,
    /// Paused time already folded out of timestamps
    paused_total: Duration,
    metadata: Option<SessionMetadata>,
    events: Vec<SessionEvent>,
    stats: StatsAccumulator,
    next_seq: u64,
    dropped: u64,
    listeners: ListenerRegistry,
}

impl Default for SessionRecorder {
    fn default() -> Self {
        Self::new(SystemClock::new())
    }
}

impl std::fmt::Debug for SessionRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecorder")
            .field("state", &self.state)
            .field("events", &self.events.len())
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl SessionRecorder {
    /// Create a new session recorder
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self::with_config(RecorderConfig::default(), clock)
    }

    /// Create with specific settings
    pub fn with_config(config: RecorderConfig, clock: impl Clock + 'static) -> Self {
        Self {
            state: RecorderState::Idle,
            config,
            clock: Box::new(clock),
            origin: Duration::ZERO,
            paused_at: None,
            paused_total: Duration::ZERO,
            metadata: None,
            events: Vec::new(),
            stats: StatsAccumulator::new(),
            next_seq: 0,
            dropped: 0,
            listeners: ListenerRegistry::new(),
        }
    }

    /// Get current state
    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Check if recording
    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Identifier of the open session
    pub fn session_id(&self) -> Option<&str> {
        self.metadata.as_ref().map(|m| m.id.as_str())
    }

    /// Events appended so far in the open session
    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    /// Get number of recorded events
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Events dropped because of `max_events`
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    /// Statistics of the open session
    pub fn current_stats(&self) -> SessionStats {
        self.stats.snapshot()
    }

    /// Session-relative time of the next event, in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        if !self.state.is_active() {
            return 0;
        }
        self.timestamp_now()
    }

    /// Register an observer for appended events
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&SessionEvent) -> anyhow::Result<()> + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Remove an observer
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Start a new session
    pub fn start(&mut self, options: SessionOptions) {
        if self.state.is_active() {
            warn!("Recording already in progress, ignoring start");
            return;
        }

        let id = uuid::Uuid::new_v4().to_string();
        let mut metadata = SessionMetadata::new(
            id,
            options
                .name
                .unwrap_or_else(|| "Untitled Session".to_string()),
            self.clock.wall_time_ms(),
        );
        metadata.event_name = options.event_name;
        metadata.venue = options.venue;
        metadata.language = options
            .language
            .unwrap_or_else(|| self.config.default_language.clone());

        info!("Starting recording session: {} ({})", metadata.name, metadata.id);

        self.origin = self.clock.now();
        self.paused_at = None;
        self.paused_total = Duration::ZERO;
        self.metadata = Some(metadata);
        self.events.clear();
        self.stats = StatsAccumulator::new();
        self.next_seq = 0;
        self.dropped = 0;
        self.state = RecorderState::Recording;

        self.append(EventKind::SessionStart);
    }

    /// Record a transcription result
    pub fn record_transcription(&mut self, segment: TranscriptSegment, latency: u64) {
        self.record(EventKind::Transcription { segment, latency });
    }

    /// Record a completed translation
    pub fn record_translation(
        &mut self,
        source_text: impl Into<String>,
        signs: Vec<Sign>,
        unmapped_words: Vec<String>,
        latency: u64,
    ) {
        self.record(EventKind::Translation {
            source_text: source_text.into(),
            signs,
            unmapped_words,
            latency,
        });
    }

    /// Record the avatar starting a sign
    pub fn record_sign_start(&mut self, sign: Sign, index: usize) {
        self.record(EventKind::SignStart { sign, index });
    }

    /// Record the avatar finishing a sign
    pub fn record_sign_end(&mut self, sign: Sign, index: usize) {
        self.record(EventKind::SignEnd { sign, index });
    }

    /// Record a pipeline error
    pub fn record_error(
        &mut self,
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<Value>,
    ) {
        self.record(EventKind::Error {
            code: code.into(),
            message: message.into(),
            details,
        });
    }

    /// Place an operator marker
    pub fn add_marker(
        &mut self,
        label: impl Into<String>,
        color: Option<String>,
        notes: Option<String>,
    ) {
        self.record(EventKind::Marker {
            label: label.into(),
            color,
            notes,
        });
    }

    /// Record an application status change
    pub fn record_status_change(&mut self, status: impl Into<String>) {
        self.record(EventKind::StatusChange {
            status: status.into(),
        });
    }

    /// Record a settings change
    pub fn record_config_change(&mut self, changes: Map<String, Value>) {
        self.record(EventKind::ConfigChange(changes));
    }

    /// Pause the session
    pub fn pause(&mut self) {
        if self.state != RecorderState::Recording {
            warn!("Cannot pause: recorder is {}", self.state.display_name());
            return;
        }

        self.append_capped(EventKind::StatusChange {
            status: STATUS_PAUSED.to_string(),
        });
        self.paused_at = Some(self.clock.now());
        self.state = RecorderState::Paused;
        info!("Recording paused");
    }

    /// Resume a paused session
    pub fn resume(&mut self) {
        if self.state != RecorderState::Paused {
            warn!("Cannot resume: recorder is {}", self.state.display_name());
            return;
        }

        self.fold_pause();
        self.state = RecorderState::Recording;
        self.append_capped(EventKind::StatusChange {
            status: STATUS_RESUMED.to_string(),
        });
        info!("Recording resumed");
    }

    /// Finish the session and return the recording
    ///
    /// Returns `None` if no session was open.
    pub fn stop(&mut self) -> Option<SessionRecording> {
        if !self.state.is_active() {
            warn!("Recording not active");
            return None;
        }

        self.fold_pause();
        self.append(EventKind::SessionEnd);

        let Some(mut metadata) = self.metadata.take() else {
            self.cancel();
            return None;
        };
        let duration = self.events.last().map(|e| e.timestamp).unwrap_or(0);
        metadata.end_time = Some(self.clock.wall_time_ms());
        metadata.duration = Some(duration);
        metadata.stats = self.stats.snapshot();

        let events = std::mem::take(&mut self.events);
        self.state = RecorderState::Idle;

        info!(
            "Recording session stopped: {} ({} events, {} ms)",
            metadata.id,
            events.len(),
            duration
        );
        if self.dropped > 0 {
            warn!("{} events were dropped (max_events = {})", self.dropped, self.config.max_events);
        }

        Some(SessionRecording::new(metadata, events))
    }

    /// Cancel recording (discard data)
    pub fn cancel(&mut self) {
        if self.state.is_active() {
            info!("Recording cancelled, {} events discarded", self.events.len());
        }
        self.metadata = None;
        self.events.clear();
        self.stats = StatsAccumulator::new();
        self.paused_at = None;
        self.state = RecorderState::Idle;
    }

    fn record(&mut self, kind: EventKind) {
        if self.state != RecorderState::Recording {
            debug!("Ignoring {} event while {}", kind.name(), self.state.display_name());
            return;
        }

        self.append_capped(kind);
    }

    /// Append unless `max_events` has been reached; `session_end` bypasses this
    fn append_capped(&mut self, kind: EventKind) {
        if self.config.max_events > 0 && self.events.len() >= self.config.max_events {
            self.dropped += 1;
            if self.dropped == 1 {
                warn!("Event limit of {} reached, dropping events", self.config.max_events);
            }
            return;
        }

        self.append(kind);
    }

    /// Move the current pause interval out of future timestamps
    fn fold_pause(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            if self.config.exclude_paused_time {
                self.paused_total += self.clock.now().saturating_sub(paused_at);
            }
        }
    }

    fn timestamp_now(&self) -> u64 {
        let elapsed = self
            .clock
            .now()
            .saturating_sub(self.origin)
            .saturating_sub(self.paused_total);
        let ts = elapsed.as_millis() as u64;
        let floor = self.events.last().map(|e| e.timestamp).unwrap_or(0);
        ts.max(floor)
    }

    fn append(&mut self, kind: EventKind) {
        let timestamp = if self.events.is_empty() {
            0
        } else {
            self.timestamp_now()
        };

        self.next_seq += 1;
        let event = SessionEvent::new(format!("evt-{:06}", self.next_seq), timestamp, kind);

        self.stats.apply(&event.kind);
        debug!("Recorded {} at {} ms", event.kind.name(), event.timestamp);

        self.listeners.notify(&event);
        self.events.push(event);
    }
}
