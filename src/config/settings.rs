//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// SttConfig
// ---------------------------------------------------------------------------

/// Settings for the Whisper STT engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    /// GGML model file stem under the models directory (e.g. `"ggml-base.en"`).
    pub model: String,
    /// Speech language as an ISO-639-1 code, or `"auto"` for Whisper's
    /// built-in language detection.
    pub language: String,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: "ggml-base.en".into(),
            language: "en".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for microphone capture and end-of-utterance detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// RMS amplitude above which a 30 ms frame counts as speech.
    pub vad_threshold: f32,
    /// Seconds of trailing silence that end an utterance once speech has
    /// been heard.
    pub silence_secs: f32,
    /// Hard cap on a single capture, in seconds.
    pub max_listen_secs: f32,
    /// Utterances with less voiced audio than this are treated as noise.
    pub min_speech_secs: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            vad_threshold: 0.01,
            silence_secs: 1.0,
            max_listen_secs: 15.0,
            min_speech_secs: 0.3,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Text-to-speech and audio-cue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Language code sent to the TTS endpoint.
    pub language: String,
    /// Base URL of the translate-style TTS endpoint.
    pub tts_url: String,
    /// How many times each response is rendered.
    pub repeat: u32,
    /// Override for the directory holding `.mp3` cues.  `None` uses
    /// [`AppPaths::sounds_dir`].
    pub sounds_dir: Option<PathBuf>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            language: "en".into(),
            tts_url: "https://translate.google.com/translate_tts".into(),
            repeat: 3,
            sounds_dir: None,
        }
    }
}

impl SpeechConfig {
    /// Directory the assistant loads cue clips from.
    pub fn resolved_sounds_dir(&self) -> PathBuf {
        self.sounds_dir
            .clone()
            .unwrap_or_else(|| AppPaths::new().sounds_dir)
    }
}

// ---------------------------------------------------------------------------
// ProviderConfig
// ---------------------------------------------------------------------------

/// Endpoints used by the action providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Search engine results page; the query is appended as `q=`.
    pub search_url: String,
    /// Video-site results page; the query is appended as `search_query=`.
    pub video_search_url: String,
    /// Prefix for a single video, followed by the video id.
    pub video_watch_url: String,
    /// Repository host; the spoken path is appended verbatim.
    pub repository_url: String,
    /// Weather service base URL (wttr.in JSON API).
    pub weather_url: String,
    /// Page-summary endpoint; the topic is appended as a path segment.
    pub knowledge_url: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            search_url: "https://www.google.com/search".into(),
            video_search_url: "https://www.youtube.com/results".into(),
            video_watch_url: "https://www.youtube.com/watch?v=".into(),
            repository_url: "http://github.com/".into(),
            weather_url: "https://wttr.in".into(),
            knowledge_url: "https://en.wikipedia.org/api/rest_v1/page/summary/".into(),
            timeout_secs: 15,
        }
    }
}

// ---------------------------------------------------------------------------
// MessagingConfig
// ---------------------------------------------------------------------------

/// Instant-messaging settings (web client automation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Web client URL; `phone=` is appended.
    pub web_url: String,
    /// Body sent to the spoken contact.
    pub default_body: String,
    /// Seconds to wait for the web client to load before typing.
    pub delay_secs: u64,
    /// Close the browser tab once the message is sent.
    pub close_tab: bool,
    /// Seconds to wait after sending before closing the tab.
    pub close_after_secs: u64,
    /// Spoken contact name (lowercase) → phone number in `+CC…` format.
    pub contacts: BTreeMap<String, String>,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            web_url: "https://web.whatsapp.com/send".into(),
            default_body: "Hello! Sent from my voice assistant.".into(),
            delay_secs: 15,
            close_tab: true,
            close_after_secs: 4,
            contacts: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// PresentationConfig
// ---------------------------------------------------------------------------

/// Queries used by the scripted presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentationConfig {
    pub search_query: String,
    pub video_query: String,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            search_query: "Time in Oakville".into(),
            video_query: "David Debono Music".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// HotkeyConfig
// ---------------------------------------------------------------------------

/// Global hotkey bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotkeyConfig {
    /// Push-to-talk key name (e.g. `"F9"`).
    pub push_to_talk_key: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            push_to_talk_key: "F9".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Mic-button window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Last saved window position `(x, y)` in screen pixels.  `None` lets the
    /// window manager pick.
    pub window_position: Option<(f32, f32)>,
    /// Keep the window floating above all other windows.
    pub always_on_top: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_position: None,
            always_on_top: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voice_assistant::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub stt: SttConfig,
    pub audio: AudioConfig,
    pub speech: SpeechConfig,
    pub providers: ProviderConfig,
    pub messaging: MessagingConfig,
    pub presentation: PresentationConfig,
    pub hotkey: HotkeyConfig,
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path of the Whisper model file named by `stt.model`.
    pub fn model_path(&self) -> PathBuf {
        AppPaths::new()
            .models_dir
            .join(format!("{}.bin", self.stt.model))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
