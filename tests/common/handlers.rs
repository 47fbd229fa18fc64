//! Playback handlers that capture what the player dispatches

use std::cell::RefCell;
use std::rc::Rc;

use signstream_session::session::{PlaybackHandler, PlaybackProgress, PlaybackState};
use signstream_session::types::{Sign, TranscriptSegment};

/// One dispatched callback, flattened for easy comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    Transcription(String),
    Translation(Vec<String>),
    SignStart(String, usize),
    SignEnd(String, usize),
    Marker(String),
    Error(String),
}

/// Everything a [`CaptureHandler`] has seen
#[derive(Debug, Default)]
pub struct Captured {
    pub events: Vec<Dispatched>,
    pub states: Vec<PlaybackState>,
    pub progress: Vec<PlaybackProgress>,
}

impl Captured {
    pub fn markers(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Dispatched::Marker(label) => Some(label.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Handler writing into a shared [`Captured`]
pub struct CaptureHandler(pub Rc<RefCell<Captured>>);

impl CaptureHandler {
    /// Create a handler and the shared log it writes to
    pub fn new() -> (Self, Rc<RefCell<Captured>>) {
        let log = Rc::new(RefCell::new(Captured::default()));
        (Self(Rc::clone(&log)), log)
    }
}

impl PlaybackHandler for CaptureHandler {
    fn on_transcription(&mut self, segment: &TranscriptSegment) {
        self.0
            .borrow_mut()
            .events
            .push(Dispatched::Transcription(segment.text.clone()));
    }

    fn on_translation(&mut self, signs: &[Sign], _source_text: &str) {
        let glosses = signs.iter().map(|s| s.gloss.clone()).collect();
        self.0
            .borrow_mut()
            .events
            .push(Dispatched::Translation(glosses));
    }

    fn on_sign_start(&mut self, sign: &Sign, index: usize) {
        self.0
            .borrow_mut()
            .events
            .push(Dispatched::SignStart(sign.gloss.clone(), index));
    }

    fn on_sign_end(&mut self, sign: &Sign, index: usize) {
        self.0
            .borrow_mut()
            .events
            .push(Dispatched::SignEnd(sign.gloss.clone(), index));
    }

    fn on_marker(&mut self, label: &str, _notes: Option<&str>) {
        self.0
            .borrow_mut()
            .events
            .push(Dispatched::Marker(label.to_string()));
    }

    fn on_error(&mut self, code: &str, _message: &str) {
        self.0
            .borrow_mut()
            .events
            .push(Dispatched::Error(code.to_string()));
    }

    fn on_state_change(&mut self, state: PlaybackState) {
        self.0.borrow_mut().states.push(state);
    }

    fn on_progress(&mut self, progress: PlaybackProgress) {
        self.0.borrow_mut().progress.push(progress);
    }
}
