use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started,
    Done,
    Error(String),
}

pub type PlaybackCallback = Box<dyn FnMut(PlaybackEvent) + Send>;

/// Text-to-speech or audio playback. Implementations report progress through
/// the callback, possibly from another thread.
pub trait Speaker {
    fn speak(&self, text: &str, on_event: PlaybackCallback);
}

/// Tracks whether playback is in flight so navigation can wait for it.
#[derive(Clone, Debug, Default)]
pub struct PlaybackGate {
    playing: Arc<AtomicBool>,
}

impl PlaybackGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    /// Marks playback busy immediately; cleared when the speaker reports done or error.
    pub fn speak<S: Speaker + ?Sized>(&self, speaker: &S, text: &str) {
        self.playing.store(true, Ordering::SeqCst);
        let playing = Arc::clone(&self.playing);
        let word = text.to_string();
        speaker.speak(
            text,
            Box::new(move |event| match event {
                PlaybackEvent::Started => playing.store(true, Ordering::SeqCst),
                PlaybackEvent::Done => playing.store(false, Ordering::SeqCst),
                PlaybackEvent::Error(msg) => {
                    warn!(word = %word, error = %msg, "speech playback failed");
                    playing.store(false, Ordering::SeqCst);
                }
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Holds the callback so the test decides when playback ends.
    #[derive(Default)]
    struct ManualSpeaker {
        pending: Mutex<Option<PlaybackCallback>>,
        spoken: Mutex<Vec<String>>,
    }

    impl Speaker for ManualSpeaker {
        fn speak(&self, text: &str, mut on_event: PlaybackCallback) {
            on_event(PlaybackEvent::Started);
            self.spoken.lock().unwrap().push(text.to_string());
            *self.pending.lock().unwrap() = Some(on_event);
        }
    }

    impl ManualSpeaker {
        fn finish(&self, event: PlaybackEvent) {
            let mut callback = self.pending.lock().unwrap().take().unwrap();
            callback(event);
        }
    }

    #[test]
    fn test_gate_busy_until_done() {
        let gate = PlaybackGate::new();
        let speaker = ManualSpeaker::default();
        assert!(!gate.is_playing());

        gate.speak(&speaker, "apple");
        assert!(gate.is_playing());
        assert_eq!(speaker.spoken.lock().unwrap().as_slice(), ["apple"]);

        speaker.finish(PlaybackEvent::Done);
        assert!(!gate.is_playing());
    }

    #[test]
    fn test_gate_released_on_error() {
        let gate = PlaybackGate::new();
        let speaker = ManualSpeaker::default();
        gate.speak(&speaker, "anchor");
        speaker.finish(PlaybackEvent::Error("no voice installed".to_string()));
        assert!(!gate.is_playing());
    }

    #[test]
    fn test_clones_share_state() {
        let gate = PlaybackGate::new();
        let view = gate.clone();
        let speaker = ManualSpeaker::default();
        gate.speak(&speaker, "ant");
        assert!(view.is_playing());
    }
}
