//! Transcription parameters and transcript clean-up.
//!
//! [`TranscribeParams`] carries the settings for one Whisper run.
//! [`clean_transcript`] strips the non-speech annotations Whisper emits for
//! silence and background noise so that an utterance with no words comes
//! back as an empty string.

use crate::config::SttConfig;

// ---------------------------------------------------------------------------
// SamplingStrategy
// ---------------------------------------------------------------------------

/// Owned, `Clone` mirror of `whisper_rs::SamplingStrategy`.
///
/// Greedy decoding is plenty for short spoken commands.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplingStrategy {
    Greedy {
        best_of: i32,
    },
    BeamSearch {
        beam_size: i32,
        patience: f32,
    },
}

impl Default for SamplingStrategy {
    fn default() -> Self {
        Self::Greedy { best_of: 1 }
    }
}

// ---------------------------------------------------------------------------
// TranscribeParams
// ---------------------------------------------------------------------------

/// Parameters for a single Whisper transcription run.
///
/// ```
/// use voice_assistant::stt::TranscribeParams;
///
/// let params = TranscribeParams::default();
/// assert_eq!(params.language, "en");
/// ```
#[derive(Debug, Clone)]
pub struct TranscribeParams {
    /// ISO-639-1 code, or `"auto"` for detection.
    pub language: String,
    pub strategy: SamplingStrategy,
    /// CPU threads handed to Whisper; defaults to [`optimal_threads`].
    pub n_threads: i32,
    /// Commands are one sentence; decoding as a single segment avoids
    /// spurious splits.
    pub single_segment: bool,
    /// Keep Whisper's progress output off stderr.
    pub suppress_progress: bool,
}

impl Default for TranscribeParams {
    fn default() -> Self {
        Self {
            language: "en".into(),
            strategy: SamplingStrategy::default(),
            n_threads: optimal_threads(),
            single_segment: true,
            suppress_progress: true,
        }
    }
}

impl TranscribeParams {
    pub fn from_config(config: &SttConfig) -> Self {
        Self {
            language: config.language.clone(),
            ..Self::default()
        }
    }
}

/// Physical threads for inference, capped at 8.
pub(crate) fn optimal_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8) as i32)
        .unwrap_or(4)
}

// ---------------------------------------------------------------------------
// clean_transcript
// ---------------------------------------------------------------------------

/// Remove `[...]`, `(...)` and `*...*` annotations such as `[BLANK_AUDIO]`
/// or `(wind blowing)`, then collapse whitespace.
///
/// ```
/// use voice_assistant::stt::clean_transcript;
///
/// assert_eq!(clean_transcript(" [BLANK_AUDIO] "), "");
/// assert_eq!(clean_transcript(" Open calculator. (typing)"), "Open calculator.");
/// ```
pub fn clean_transcript(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut closer: Option<char> = None;

    for c in raw.chars() {
        match closer {
            Some(end) if c == end => closer = None,
            Some(_) => {}
            None => match c {
                '[' => closer = Some(']'),
                '(' => closer = Some(')'),
                '*' => closer = Some('*'),
                _ => out.push(c),
            },
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_only_trimmed() {
        assert_eq!(clean_transcript("  what time is it  "), "what time is it");
    }

    #[test]
    fn annotations_only_becomes_empty() {
        assert_eq!(clean_transcript("[Music] (silence) *coughs*"), "");
    }

    #[test]
    fn unterminated_annotation_drops_tail() {
        assert_eq!(clean_transcript("search cats [inaudible"), "search cats");
    }

    #[test]
    fn params_follow_config_language() {
        let cfg = SttConfig {
            language: "fr".into(),
            ..SttConfig::default()
        };
        let params = TranscribeParams::from_config(&cfg);
        assert_eq!(params.language, "fr");
        assert_eq!(params.strategy, SamplingStrategy::Greedy { best_of: 1 });
    }
}
