//! Speech I/O adapter: microphone → text and text → speakers.
//!
//! [`SpeechIo`] is the narrow, blocking interface the router talks to:
//!
//! * [`speak`](SpeechIo::speak): synthesize and play, returning when audio
//!   has finished.
//! * [`listen`](SpeechIo::listen): capture one utterance and transcribe it.
//! * [`play_clip`](SpeechIo::play_clip): play a pre-recorded cue by id.
//!
//! All three block the calling thread; async callers hop onto
//! `tokio::task::spawn_blocking`.  [`LocalSpeech`] is the production
//! implementation wiring [`crate::audio`], [`crate::stt`] and [`GoogleTts`].

pub mod adapter;
pub mod tts;

pub use adapter::LocalSpeech;
pub use tts::GoogleTts;

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

/// Failures of the speech adapter.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// The microphone could not be opened or stopped delivering audio.
    #[error("microphone capture failed: {0}")]
    Capture(String),

    /// Audio was captured but no intelligible speech came out of it.
    #[error("could not recognise speech: {0}")]
    Recognition(String),

    /// The TTS endpoint failed or returned something unusable.
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),

    /// Rendering audio to the output device failed.
    #[error("audio playback failed: {0}")]
    Playback(String),

    /// No `.mp3` exists for the requested cue.
    #[error("audio clip not found: {}", .0.display())]
    ClipNotFound(PathBuf),

    /// A blocking task died before finishing.
    #[error("internal speech error: {0}")]
    Internal(String),
}

impl SpeechError {
    /// `true` for failures that happened while capturing or transcribing.
    pub fn is_recognition(&self) -> bool {
        matches!(self, SpeechError::Capture(_) | SpeechError::Recognition(_))
    }
}

// ---------------------------------------------------------------------------
// SpeechIo trait
// ---------------------------------------------------------------------------

/// Blocking speech input/output.
///
/// Implementors must be `Send + Sync` so they can sit behind an
/// `Arc<dyn SpeechIo>` and be called from the blocking thread pool.
pub trait SpeechIo: Send + Sync {
    /// Render `text` as speech; returns once playback has finished.
    fn speak(&self, text: &str) -> Result<(), SpeechError>;

    /// Block until one utterance has been captured and transcribed.
    fn listen(&self) -> Result<String, SpeechError>;

    /// Play the pre-recorded cue named `clip_id`; returns once finished.
    fn play_clip(&self, clip_id: &str) -> Result<(), SpeechError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechIo>) {}
};
