//! Test data builders for creating test recordings

use signstream_session::session::{EventKind, SessionEvent, SessionMetadata, SessionRecording};
use signstream_session::types::{Sign, TranscriptSegment};

/// Builder for creating finished recordings without running a recorder
///
/// `session_start` at 0 is added automatically; ids are sequential.
pub struct RecordingBuilder {
    metadata: SessionMetadata,
    events: Vec<SessionEvent>,
}

impl RecordingBuilder {
    pub fn new(name: &str) -> Self {
        let mut builder = Self {
            metadata: SessionMetadata::new("test-session", name, 1_700_000_000_000),
            events: Vec::new(),
        };
        builder.push(0, EventKind::SessionStart);
        builder
    }

    fn push(&mut self, timestamp: u64, kind: EventKind) {
        let id = format!("evt-{:06}", self.events.len() + 1);
        self.events.push(SessionEvent::new(id, timestamp, kind));
    }

    pub fn marker(mut self, timestamp: u64, label: &str) -> Self {
        self.push(
            timestamp,
            EventKind::Marker {
                label: label.to_string(),
                color: None,
                notes: None,
            },
        );
        self
    }

    pub fn transcription(mut self, timestamp: u64, text: &str, latency: u64) -> Self {
        self.push(
            timestamp,
            EventKind::Transcription {
                segment: TranscriptSegment::final_text(text),
                latency,
            },
        );
        self
    }

    pub fn translation(mut self, timestamp: u64, glosses: &[&str], latency: u64) -> Self {
        self.push(
            timestamp,
            EventKind::Translation {
                source_text: glosses.join(" ").to_lowercase(),
                signs: glosses.iter().map(|g| Sign::new(*g)).collect(),
                unmapped_words: Vec::new(),
                latency,
            },
        );
        self
    }

    pub fn error(mut self, timestamp: u64, code: &str) -> Self {
        self.push(
            timestamp,
            EventKind::Error {
                code: code.to_string(),
                message: format!("{} occurred", code),
                details: None,
            },
        );
        self
    }

    /// Close the recording with `session_end` at `timestamp`
    pub fn end(mut self, timestamp: u64) -> Self {
        self.push(timestamp, EventKind::SessionEnd);
        self.metadata.duration = Some(timestamp);
        self.metadata.end_time = Some(self.metadata.start_time + timestamp as i64);
        self
    }

    pub fn build(self) -> SessionRecording {
        let mut recording = SessionRecording::new(self.metadata, self.events);
        recording.metadata.stats = recording.recompute_stats();
        recording
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_builder() {
        let recording = RecordingBuilder::new("test")
            .marker(1000, "intro")
            .end(5000)
            .build();

        assert_eq!(recording.event_count(), 3);
        assert_eq!(recording.duration(), 5000);
        assert_eq!(recording.events[1].id, "evt-000002");
        assert!(recording.is_ordered());
    }
}
