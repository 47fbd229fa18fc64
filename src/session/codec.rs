//! JSON encoding of recordings
//!
//! The format is the serde shape of [`SessionRecording`]: a `metadata`
//! object and an `events` array of `{ id, type, timestamp, data }` records.
//! Importing does no schema validation beyond what deserialization needs.

use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, ResultExt};

use super::types::SessionRecording;

/// Encode a recording as pretty-printed JSON
pub fn export_recording(recording: &SessionRecording) -> Result<String> {
    let json = serde_json::to_string_pretty(recording)?;
    debug!(
        "Exported recording {} ({} bytes)",
        recording.metadata.id,
        json.len()
    );
    Ok(json)
}

/// Decode a recording from JSON text
pub fn import_recording(json: &str) -> Result<SessionRecording> {
    let recording: SessionRecording = serde_json::from_str(json)?;
    debug!(
        "Imported recording {} ({} events)",
        recording.metadata.id,
        recording.event_count()
    );
    Ok(recording)
}

impl SessionRecording {
    /// Save recording to a file (JSON format)
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = export_recording(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write recording to {}", path.display()))?;
        info!("Saved recording {} to {:?}", self.metadata.id, path);
        Ok(())
    }

    /// Load recording from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read recording from {}", path.display()))?;
        import_recording(&json)
            .with_context(|| format!("Failed to parse recording in {}", path.display()))
    }
}
