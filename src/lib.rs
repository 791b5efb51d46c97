//! Push-to-talk voice command router.
//!
//! A trigger (mic button or global hotkey) starts one cycle: the microphone
//! is recorded until the speaker goes quiet, Whisper transcribes the
//! utterance, the keyword classifier picks an intent and the dispatch engine
//! runs it against the desktop, answering out loud.
//!
//! ```text
//! trigger ─▶ router::TriggerLoop ─▶ speech::LocalSpeech::listen
//!                                 ─▶ router::classify
//!                                 ─▶ router::DispatchEngine ─▶ providers / speech
//! ```

pub mod app;
pub mod audio;
pub mod config;
pub mod providers;
pub mod router;
pub mod speech;
pub mod stt;
pub mod trigger;
