//! Core data types delivered by the live pipeline
//!
//! These are the payloads the recorder consumes from its upstream
//! collaborators and hands back to renderers during replay.
//!
//! # Main Types
//!
//! - [`TranscriptSegment`] - One speech-recognition result (partial or final)
//! - [`Sign`] - One translated sign, identified by its gloss
//!
//! Field names use camelCase on the wire so recordings stay readable by the
//! browser-side tooling that produced the original format.

use serde::{Deserialize, Serialize};

/// A single transcription result from the speech source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSegment {
    /// Recognized text
    pub text: String,

    /// Whether this is a final result (partials are superseded later)
    pub is_final: bool,

    /// Confidence score (0.0 to 1.0), if the recognizer reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Recognition language tag, if different from the session language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl TranscriptSegment {
    /// Create a final segment
    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
            confidence: None,
            language: None,
        }
    }

    /// Create a partial (interim) segment
    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            is_final: false,
            ..Self::final_text(text)
        }
    }

    /// Set the confidence score
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Number of whitespace-delimited words in the trimmed text
    pub fn word_count(&self) -> u64 {
        self.text.split_whitespace().count() as u64
    }
}

/// A translated sign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sign {
    /// Canonical name of the sign
    pub gloss: String,

    /// Animation length hint in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl Sign {
    pub fn new(gloss: impl Into<String>) -> Self {
        Self {
            gloss: gloss.into(),
            duration_ms: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}
