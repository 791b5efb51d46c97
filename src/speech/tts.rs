//! Text-to-speech via the translate TTS endpoint.
//!
//! The endpoint accepts at most [`MAX_CHUNK_CHARS`] characters per request
//! and answers with MP3.  Longer text is split on sentence and word
//! boundaries and the MP3 parts are concatenated (MP3 frames are
//! self-delimiting, so the joined bytes decode as one stream).

use std::time::Duration;

use reqwest::Url;

use crate::config::SpeechConfig;

use super::SpeechError;

/// Per-request character limit of the endpoint.
pub const MAX_CHUNK_CHARS: usize = 200;

/// Async MP3 synthesizer.
#[derive(Debug, Clone)]
pub struct GoogleTts {
    client: reqwest::Client,
    base_url: String,
    language: String,
}

impl GoogleTts {
    pub fn from_config(config: &SpeechConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("Mozilla/5.0")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.tts_url.clone(),
            language: config.language.clone(),
        }
    }

    /// Synthesize `text` into one MP3 byte stream.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let chunks = split_for_tts(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SpeechError::Synthesis("nothing to say".into()));
        }

        let mut mp3 = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let url = request_url(&self.base_url, chunk, &self.language, idx, chunks.len())?;
            let resp = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| SpeechError::Synthesis(e.to_string()))?;

            if !resp.status().is_success() {
                return Err(SpeechError::Synthesis(format!(
                    "TTS endpoint returned HTTP {}",
                    resp.status().as_u16()
                )));
            }
            let bytes = resp
                .bytes()
                .await
                .map_err(|e| SpeechError::Synthesis(e.to_string()))?;
            mp3.extend_from_slice(&bytes);
        }

        log::debug!(
            "speech: synthesized {} chars into {} bytes",
            text.chars().count(),
            mp3.len()
        );
        Ok(mp3)
    }
}

/// Request URL for chunk `idx` of `total`.
pub fn request_url(
    base: &str,
    chunk: &str,
    language: &str,
    idx: usize,
    total: usize,
) -> Result<Url, SpeechError> {
    Url::parse_with_params(
        base,
        &[
            ("ie", "UTF-8"),
            ("q", chunk),
            ("tl", language),
            ("total", &total.to_string()),
            ("idx", &idx.to_string()),
            ("textlen", &chunk.chars().count().to_string()),
            ("client", "tw-ob"),
        ],
    )
    .map_err(|e| SpeechError::Synthesis(format!("bad TTS URL {base:?}: {e}")))
}

/// Split `text` into pieces of at most `max_chars` characters.
///
/// Sentence ends are preferred cut points, then word boundaries; a single
/// word longer than `max_chars` is hard-cut.
pub fn split_for_tts(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    let push_word = |word: &str, current: &mut String, chunks: &mut Vec<String>| {
        let extra = usize::from(!current.is_empty()) + word.chars().count();
        if current.chars().count() + extra > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(current));
        }
        if word.chars().count() > max_chars {
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            return;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    };

    for word in text.split_whitespace() {
        push_word(word, &mut current, &mut chunks);
        let ends_sentence = word.ends_with(['.', '!', '?']);
        if ends_sentence && current.chars().count() > max_chars / 2 {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
