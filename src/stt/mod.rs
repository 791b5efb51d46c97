//! Speech-to-text.
//!
//! ```text
//! 16 kHz mono f32 ──▶ SttEngine::transcribe ──▶ clean_transcript ──▶ text
//!                      (WhisperEngine)
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use voice_assistant::config::AppConfig;
//! use voice_assistant::stt::{SttEngine, TranscribeParams, WhisperEngine};
//!
//! let config = AppConfig::default();
//! let engine = WhisperEngine::load(config.model_path(), TranscribeParams::from_config(&config.stt))
//!     .expect("model missing");
//!
//! let audio: Vec<f32> = vec![0.0; 16_000];
//! let text = engine.transcribe(&audio).unwrap();
//! ```

pub mod engine;
pub mod transcribe;

pub use engine::{SttEngine, SttError, WhisperEngine};
pub use transcribe::{clean_transcript, SamplingStrategy, TranscribeParams};

#[cfg(test)]
pub use engine::MockSttEngine;
