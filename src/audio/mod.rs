//! Audio in and out.
//!
//! # Listening
//!
//! ```text
//! Microphone → cpal callback → AudioChunk (mpsc) → downmix + resample_to_16k
//!           → Endpointer (VAD, trailing silence / max length) → trimmed clip
//! ```
//!
//! # Speaking
//!
//! ```text
//! MP3 bytes → decode_mp3 (minimp3) → resample_for_output (rubato)
//!           → AudioPlayback (cpal output stream, blocks until drained)
//! ```

pub mod capture;
pub mod playback;
pub mod resample;
pub mod vad;

pub use capture::{AudioCapture, AudioChunk, CaptureError, StreamHandle};
pub use playback::{decode_mp3, AudioPlayback, DecodedClip, PlaybackError};
pub use resample::{downmix, resample_for_output, resample_linear, resample_to_16k, STT_SAMPLE_RATE};
pub use vad::{Endpoint, Endpointer, VadDetector};
