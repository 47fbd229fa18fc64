//! Incremental session statistics
//!
//! [`StatsAccumulator`] is fed one event at a time. The recorder applies it
//! as events are appended and [`SessionRecording::recompute_stats`] replays
//! the same code path over a finished log, so both always agree.
//!
//! [`SessionRecording::recompute_stats`]: super::types::SessionRecording::recompute_stats

use super::types::{EventKind, SessionStats};

/// O(1) running statistics over the event log
#[derive(Debug, Clone, Default)]
pub struct StatsAccumulator {
    total_words: u64,
    total_signs: u64,
    total_errors: u64,
    transcription_count: u64,
    latency_sum: u64,
    latency_samples: u64,
    peak_latency: u64,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the statistics
    pub fn apply(&mut self, kind: &EventKind) {
        match kind {
            EventKind::Transcription { segment, latency } => {
                self.transcription_count += 1;
                if segment.is_final {
                    self.total_words += segment.word_count();
                }
                self.push_latency(*latency);
            }
            EventKind::Translation { signs, latency, .. } => {
                self.total_signs += signs.len() as u64;
                self.push_latency(*latency);
            }
            EventKind::Error { .. } => {
                self.total_errors += 1;
            }
            EventKind::SessionStart
            | EventKind::SessionEnd
            | EventKind::SignStart { .. }
            | EventKind::SignEnd { .. }
            | EventKind::Marker { .. }
            | EventKind::StatusChange { .. }
            | EventKind::ConfigChange(_)
            | EventKind::Unknown { .. } => {}
        }
    }

    #[inline]
    fn push_latency(&mut self, latency: u64) {
        self.latency_sum += latency;
        self.latency_samples += 1;
        self.peak_latency = self.peak_latency.max(latency);
    }

    /// Number of latency samples seen so far
    pub fn latency_samples(&self) -> u64 {
        self.latency_samples
    }

    /// Running mean latency (0 with no samples)
    pub fn average_latency(&self) -> f64 {
        if self.latency_samples == 0 {
            0.0
        } else {
            self.latency_sum as f64 / self.latency_samples as f64
        }
    }

    /// Current statistics
    pub fn snapshot(&self) -> SessionStats {
        SessionStats {
            total_words: self.total_words,
            total_signs: self.total_signs,
            total_errors: self.total_errors,
            average_latency: self.average_latency(),
            peak_latency: self.peak_latency,
            transcription_count: self.transcription_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Sign, TranscriptSegment};

    fn transcription(segment: TranscriptSegment, latency: u64) -> EventKind {
        EventKind::Transcription { segment, latency }
    }

    fn translation(signs: usize, latency: u64) -> EventKind {
        EventKind::Translation {
            source_text: String::new(),
            signs: (0..signs).map(|i| Sign::new(format!("SIGN-{}", i))).collect(),
            unmapped_words: Vec::new(),
            latency,
        }
    }

    #[test]
    fn test_empty_snapshot() {
        let stats = StatsAccumulator::new().snapshot();
        assert_eq!(stats, SessionStats::default());
        assert_eq!(stats.average_latency, 0.0);
    }

    #[test]
    fn test_partial_transcriptions_count_but_add_no_words() {
        let mut acc = StatsAccumulator::new();
        acc.apply(&transcription(TranscriptSegment::partial("good mor"), 50));
        acc.apply(&transcription(TranscriptSegment::final_text("good morning all"), 150));

        let stats = acc.snapshot();
        assert_eq!(stats.transcription_count, 2);
        assert_eq!(stats.total_words, 3);
        assert_eq!(stats.average_latency, 100.0);
        assert_eq!(stats.peak_latency, 150);
    }

    #[test]
    fn test_translation_and_errors() {
        let mut acc = StatsAccumulator::new();
        acc.apply(&translation(3, 40));
        acc.apply(&translation(0, 20));
        acc.apply(&EventKind::Error {
            code: "asr_timeout".to_string(),
            message: "no result".to_string(),
            details: None,
        });

        let stats = acc.snapshot();
        assert_eq!(stats.total_signs, 3);
        assert_eq!(stats.total_errors, 1);
        assert_eq!(stats.transcription_count, 0);
        assert_eq!(stats.average_latency, 30.0);
        assert_eq!(acc.latency_samples(), 2);
    }

    #[test]
    fn test_other_kinds_ignored() {
        let mut acc = StatsAccumulator::new();
        acc.apply(&EventKind::SessionStart);
        acc.apply(&EventKind::SignStart {
            sign: Sign::new("HELLO"),
            index: 0,
        });
        acc.apply(&EventKind::Marker {
            label: "intro".to_string(),
            color: None,
            notes: None,
        });
        assert_eq!(acc.snapshot(), SessionStats::default());
    }
}
