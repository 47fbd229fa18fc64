//! Session data types
//!
//! The event log is the source of truth: [`SessionStats`] can always be
//! rebuilt from [`SessionRecording::events`] alone.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{Sign, TranscriptSegment};

use super::stats::StatsAccumulator;

/// Version tag stored in every recording's metadata
pub const RECORDING_FORMAT_VERSION: &str = "1.0";

/// State of the live recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderState {
    /// No session in progress
    #[default]
    Idle,
    /// Appending events
    Recording,
    /// Session open, events are ignored
    Paused,
}

impl RecorderState {
    /// Whether a session is open (recording or paused)
    pub fn is_active(&self) -> bool {
        !matches!(self, RecorderState::Idle)
    }

    /// Display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            RecorderState::Idle => "Idle",
            RecorderState::Recording => "Recording",
            RecorderState::Paused => "Paused",
        }
    }
}

/// State of the replay engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Loaded (or empty) and not started
    #[default]
    Idle,
    /// Ticking
    Playing,
    /// Holding position
    Paused,
    /// Virtual time reached the end of the recording
    Ended,
}

impl PlaybackState {
    /// Check if currently playing
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }

    /// Check if paused
    pub fn is_paused(&self) -> bool {
        matches!(self, PlaybackState::Paused)
    }

    /// Check if playback finished
    pub fn is_ended(&self) -> bool {
        matches!(self, PlaybackState::Ended)
    }

    /// Display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "Idle",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
            PlaybackState::Ended => "Ended",
        }
    }
}

/// What happened, with one payload shape per kind
///
/// Kinds this version does not know are read into [`EventKind::Unknown`]
/// with their payload intact and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    remote = "Self",
    tag = "type",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum EventKind {
    SessionStart,
    SessionEnd,
    Transcription {
        segment: TranscriptSegment,
        latency: u64,
    },
    Translation {
        source_text: String,
        signs: Vec<Sign>,
        unmapped_words: Vec<String>,
        latency: u64,
    },
    SignStart {
        sign: Sign,
        index: usize,
    },
    SignEnd {
        sign: Sign,
        index: usize,
    },
    Error {
        code: String,
        message: String,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            deserialize_with = "present_value"
        )]
        details: Option<Value>,
    },
    Marker {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    StatusChange {
        status: String,
    },
    ConfigChange(Map<String, Value>),
    /// A kind written by a newer version
    #[serde(skip)]
    Unknown { kind: String, data: Option<Value> },
}

/// Wire tags of the kinds above, excluding `Unknown`
const KNOWN_KINDS: &[&str] = &[
    "session_start",
    "session_end",
    "transcription",
    "translation",
    "sign_start",
    "sign_end",
    "error",
    "marker",
    "status_change",
    "config_change",
];

/// Keep an explicit `null` as `Some(Value::Null)`; absence stays `None`
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Serialize for EventKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            EventKind::Unknown { kind, data } => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", kind)?;
                if let Some(data) = data {
                    map.serialize_entry("data", data)?;
                }
                map.end()
            }
            _ => EventKind::serialize(self, serializer),
        }
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut raw = Map::<String, Value>::deserialize(deserializer)?;
        let kind = match raw.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            Some(_) => return Err(de::Error::custom("event `type` must be a string")),
            None => return Err(de::Error::missing_field("type")),
        };

        if KNOWN_KINDS.contains(&kind.as_str()) {
            return EventKind::deserialize(Value::Object(raw)).map_err(de::Error::custom);
        }

        Ok(EventKind::Unknown {
            kind,
            data: raw.remove("data"),
        })
    }
}

impl EventKind {
    /// Wire name of the kind
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::SessionStart => "session_start",
            EventKind::SessionEnd => "session_end",
            EventKind::Transcription { .. } => "transcription",
            EventKind::Translation { .. } => "translation",
            EventKind::SignStart { .. } => "sign_start",
            EventKind::SignEnd { .. } => "sign_end",
            EventKind::Error { .. } => "error",
            EventKind::Marker { .. } => "marker",
            EventKind::StatusChange { .. } => "status_change",
            EventKind::ConfigChange(_) => "config_change",
            EventKind::Unknown { .. } => "unknown",
        }
    }

    /// Latency sample carried by transcription and translation events
    pub fn latency(&self) -> Option<u64> {
        match self {
            EventKind::Transcription { latency, .. } | EventKind::Translation { latency, .. } => {
                Some(*latency)
            }
            _ => None,
        }
    }
}

/// One entry of the append-only log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Identifier, unique within the recording
    pub id: String,
    /// Milliseconds since the session started
    pub timestamp: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl SessionEvent {
    pub fn new(id: impl Into<String>, timestamp: u64, kind: EventKind) -> Self {
        Self {
            id: id.into(),
            timestamp,
            kind,
        }
    }

    /// Marker label, if this is a marker event
    pub fn marker_label(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Marker { label, .. } => Some(label),
            _ => None,
        }
    }
}

/// Summary statistics derived from the event log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Words in final transcriptions
    pub total_words: u64,
    /// Signs across all translations
    pub total_signs: u64,
    /// Error events
    pub total_errors: u64,
    /// Mean of transcription and translation latencies (ms)
    pub average_latency: f64,
    /// Largest latency sample (ms)
    pub peak_latency: u64,
    /// Transcription events, partial and final
    pub transcription_count: u64,
}

/// Metadata for a recorded session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    /// Session identifier
    pub id: String,
    /// Name/title of the session
    pub name: String,
    /// Name of the interpreted event (conference, lecture, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    /// Wall-clock start, epoch milliseconds
    pub start_time: i64,
    /// Wall-clock end, epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    /// Session length in milliseconds (timestamp of `session_end`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Session language tag
    pub language: String,
    /// Recording format version
    pub version: String,
    pub stats: SessionStats,
}

impl SessionMetadata {
    /// Create metadata for a session starting at `start_time`
    pub fn new(id: impl Into<String>, name: impl Into<String>, start_time: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            event_name: None,
            venue: None,
            start_time,
            end_time: None,
            duration: None,
            language: crate::config::DEFAULT_LANGUAGE.to_string(),
            version: RECORDING_FORMAT_VERSION.to_string(),
            stats: SessionStats::default(),
        }
    }
}

/// A marker as seen by navigation and UI code
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerInfo {
    pub event_id: String,
    pub timestamp: u64,
    pub label: String,
    pub color: Option<String>,
    pub notes: Option<String>,
}

/// A complete recorded session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecording {
    /// Session metadata
    pub metadata: SessionMetadata,
    /// Events in log order (timestamps non-decreasing)
    pub events: Vec<SessionEvent>,
}

impl SessionRecording {
    pub fn new(metadata: SessionMetadata, events: Vec<SessionEvent>) -> Self {
        Self { metadata, events }
    }

    /// Total length in milliseconds
    ///
    /// Uses the stored duration, falling back to the last event's timestamp
    /// for recordings that were never stopped normally.
    pub fn duration(&self) -> u64 {
        self.metadata
            .duration
            .unwrap_or_else(|| self.events.last().map(|e| e.timestamp).unwrap_or(0))
    }

    /// Get the number of events
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Check if the recording has no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Index of the first event strictly after `time_ms`
    pub fn first_event_after(&self, time_ms: u64) -> usize {
        self.events.partition_point(|e| e.timestamp <= time_ms)
    }

    /// First marker event with the given label
    pub fn find_marker(&self, label: &str) -> Option<&SessionEvent> {
        self.events
            .iter()
            .find(|e| e.marker_label() == Some(label))
    }

    /// All markers in log order
    pub fn markers(&self) -> Vec<MarkerInfo> {
        self.events
            .iter()
            .filter_map(|e| match &e.kind {
                EventKind::Marker {
                    label,
                    color,
                    notes,
                } => Some(MarkerInfo {
                    event_id: e.id.clone(),
                    timestamp: e.timestamp,
                    label: label.clone(),
                    color: color.clone(),
                    notes: notes.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Rebuild statistics from the events alone
    pub fn recompute_stats(&self) -> SessionStats {
        let mut acc = StatsAccumulator::new();
        for event in &self.events {
            acc.apply(&event.kind);
        }
        acc.snapshot()
    }

    /// Whether stored stats match the event log
    pub fn stats_consistent(&self) -> bool {
        self.recompute_stats() == self.metadata.stats
    }

    /// Whether timestamps are non-decreasing
    pub fn is_ordered(&self) -> bool {
        self.events
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(id: &str, ts: u64, label: &str) -> SessionEvent {
        SessionEvent::new(
            id,
            ts,
            EventKind::Marker {
                label: label.to_string(),
                color: None,
                notes: None,
            },
        )
    }

    fn create_test_recording() -> SessionRecording {
        let events = vec![
            SessionEvent::new("evt-000001", 0, EventKind::SessionStart),
            marker("evt-000002", 1000, "intro"),
            marker("evt-000003", 3000, "q&a"),
            marker("evt-000004", 3000, "intro"),
            SessionEvent::new("evt-000005", 5000, EventKind::SessionEnd),
        ];
        let mut metadata = SessionMetadata::new("s-1", "Test", 1_700_000_000_000);
        metadata.duration = Some(5000);
        SessionRecording::new(metadata, events)
    }

    #[test]
    fn test_state_helpers() {
        assert!(PlaybackState::Playing.is_playing());
        assert!(PlaybackState::Paused.is_paused());
        assert!(PlaybackState::Ended.is_ended());
        assert!(RecorderState::Paused.is_active());
        assert!(!RecorderState::Idle.is_active());
        assert_eq!(RecorderState::Recording.display_name(), "Recording");
    }

    #[test]
    fn test_event_wire_shape() {
        let event = SessionEvent::new(
            "evt-000002",
            120,
            EventKind::Transcription {
                segment: TranscriptSegment::final_text("hello"),
                latency: 120,
            },
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["id"], "evt-000002");
        assert_eq!(value["type"], "transcription");
        assert_eq!(value["timestamp"], 120);
        assert_eq!(value["data"]["segment"]["text"], "hello");
        assert_eq!(value["data"]["segment"]["isFinal"], true);
        assert_eq!(value["data"]["latency"], 120);
    }

    #[test]
    fn test_translation_field_names() {
        let kind = EventKind::Translation {
            source_text: "hello".to_string(),
            signs: vec![Sign::new("HELLO")],
            unmapped_words: vec!["um".to_string()],
            latency: 80,
        };
        let value = serde_json::to_value(SessionEvent::new("e", 5, kind)).unwrap();
        assert_eq!(value["data"]["sourceText"], "hello");
        assert_eq!(value["data"]["unmappedWords"][0], "um");
        assert_eq!(value["data"]["signs"][0]["gloss"], "HELLO");
    }

    #[test]
    fn test_parse_unit_and_map_kinds() {
        let start: SessionEvent =
            serde_json::from_str(r#"{"id":"a","type":"session_start","timestamp":0}"#).unwrap();
        assert_eq!(start.kind, EventKind::SessionStart);

        let config: SessionEvent = serde_json::from_str(
            r#"{"id":"b","type":"config_change","timestamp":10,"data":{"avatar":"maya"}}"#,
        )
        .unwrap();
        match config.kind {
            EventKind::ConfigChange(map) => assert_eq!(map["avatar"], "maya"),
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_kind_names_match_wire_tags() {
        let event = SessionEvent::new(
            "e",
            0,
            EventKind::StatusChange {
                status: "paused".to_string(),
            },
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], event.kind.name());
    }

    #[test]
    fn test_unknown_kind_keeps_payload() {
        let text = r#"{"id":"c","timestamp":20,"type":"avatar_change","data":{"avatar":"maya"}}"#;
        let event: SessionEvent = serde_json::from_str(text).unwrap();
        match &event.kind {
            EventKind::Unknown { kind, data } => {
                assert_eq!(kind, "avatar_change");
                assert_eq!(data.as_ref().unwrap()["avatar"], "maya");
            }
            other => panic!("unexpected kind {:?}", other),
        }
        assert_eq!(event.kind.name(), "unknown");
        assert_eq!(event.kind.latency(), None);

        let value = serde_json::to_value(&event).unwrap();
        let original: Value = serde_json::from_str(text).unwrap();
        assert_eq!(value, original);
    }

    #[test]
    fn test_unknown_kind_without_data() {
        let event: SessionEvent =
            serde_json::from_str(r#"{"id":"d","timestamp":5,"type":"heartbeat"}"#).unwrap();
        assert_eq!(
            event.kind,
            EventKind::Unknown {
                kind: "heartbeat".to_string(),
                data: None
            }
        );
        let value = serde_json::to_value(&event).unwrap();
        assert!(value.get("data").is_none());
        assert_eq!(value["type"], "heartbeat");
    }

    #[test]
    fn test_malformed_known_kind_is_an_error() {
        let result: Result<SessionEvent, _> =
            serde_json::from_str(r#"{"id":"e","timestamp":0,"type":"marker","data":{}}"#);
        assert!(result.is_err());

        let result: Result<SessionEvent, _> =
            serde_json::from_str(r#"{"id":"e","timestamp":0,"type":7}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_error_details_null_survives() {
        let event = SessionEvent::new(
            "evt-000003",
            40,
            EventKind::Error {
                code: "asr".to_string(),
                message: "gap".to_string(),
                details: Some(Value::Null),
            },
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"details\":null"));
        let back: SessionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);

        let absent: SessionEvent = serde_json::from_str(
            r#"{"id":"f","timestamp":0,"type":"error","data":{"code":"x","message":"y"}}"#,
        )
        .unwrap();
        match absent.kind {
            EventKind::Error { details, .. } => assert_eq!(details, None),
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_first_event_after() {
        let recording = create_test_recording();
        assert_eq!(recording.first_event_after(0), 1);
        assert_eq!(recording.first_event_after(999), 1);
        assert_eq!(recording.first_event_after(1000), 2);
        assert_eq!(recording.first_event_after(3000), 4);
        assert_eq!(recording.first_event_after(5000), 5);
    }

    #[test]
    fn test_find_marker_returns_first() {
        let recording = create_test_recording();
        assert_eq!(recording.find_marker("intro").unwrap().timestamp, 1000);
        assert!(recording.find_marker("missing").is_none());
        assert_eq!(recording.markers().len(), 3);
    }

    #[test]
    fn test_duration_fallback() {
        let mut recording = create_test_recording();
        assert_eq!(recording.duration(), 5000);

        recording.metadata.duration = None;
        recording.events.pop();
        assert_eq!(recording.duration(), 3000);
        assert!(recording.is_ordered());
    }
}
