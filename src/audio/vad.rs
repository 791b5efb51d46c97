//! Energy-based voice activity detection.
//!
//! Audio is judged in 30 ms frames (480 samples at 16 kHz); a frame is
//! *voice* when its RMS exceeds the threshold.
//!
//! * [`VadDetector::trim_silence`] cuts leading and trailing silence off a
//!   finished clip before it goes to Whisper.
//! * [`Endpointer`] watches a live stream and decides when the speaker has
//!   finished: after speech has started, `silence_secs` of continuous
//!   silence ends the utterance; `max_secs` ends it unconditionally.

use crate::config::AudioConfig;

use super::resample::STT_SAMPLE_RATE;

/// 30 ms at 16 kHz.
pub const FRAME_SAMPLES: usize = 480;

// ---------------------------------------------------------------------------
// VadDetector
// ---------------------------------------------------------------------------

/// Energy-based frame classifier and silence trimmer.
///
/// ```rust
/// use voice_assistant::audio::VadDetector;
///
/// let vad = VadDetector::new(0.01);
/// let mut audio = vec![0.0_f32; 480];
/// audio.extend(vec![0.5_f32; 480]);
/// audio.extend(vec![0.0_f32; 480]);
///
/// assert_eq!(vad.trim_silence(&audio).len(), 480);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct VadDetector {
    rms_threshold: f32,
}

impl VadDetector {
    pub fn new(rms_threshold: f32) -> Self {
        Self { rms_threshold }
    }

    /// `true` when `frame` carries voice energy.
    pub fn is_voice(&self, frame: &[f32]) -> bool {
        if frame.is_empty() {
            return false;
        }
        let mean_sq = frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32;
        mean_sq.sqrt() > self.rms_threshold
    }

    /// Sub-slice from the first to the last voice frame; empty when the
    /// whole clip is silent.
    pub fn trim_silence<'a>(&self, audio: &'a [f32]) -> &'a [f32] {
        let frames: Vec<&[f32]> = audio.chunks(FRAME_SAMPLES).collect();

        let Some(first) = frames.iter().position(|f| self.is_voice(f)) else {
            return &audio[0..0];
        };
        let last = frames.iter().rposition(|f| self.is_voice(f)).unwrap_or(first);

        let start = first * FRAME_SAMPLES;
        let end = ((last + 1) * FRAME_SAMPLES).min(audio.len());
        &audio[start..end]
    }

    /// Seconds of voiced audio in `audio`.
    pub fn voiced_secs(&self, audio: &[f32]) -> f32 {
        let voiced = audio
            .chunks(FRAME_SAMPLES)
            .filter(|f| self.is_voice(f))
            .map(<[f32]>::len)
            .sum::<usize>();
        voiced as f32 / STT_SAMPLE_RATE as f32
    }
}

// ---------------------------------------------------------------------------
// Endpointer
// ---------------------------------------------------------------------------

/// What the stream looks like after the latest push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Keep listening.
    Continue,
    /// Speech was followed by enough trailing silence.
    Silence,
    /// The maximum capture length was reached.
    MaxDuration,
}

/// Streaming end-of-utterance detector over 16 kHz mono audio.
#[derive(Debug)]
pub struct Endpointer {
    vad: VadDetector,
    silence_frames: usize,
    max_samples: usize,
    audio: Vec<f32>,
    /// Samples not yet forming a whole frame.
    pending: usize,
    heard_speech: bool,
    trailing_silence: usize,
}

impl Endpointer {
    pub fn new(vad: VadDetector, silence_secs: f32, max_secs: f32) -> Self {
        let rate = STT_SAMPLE_RATE as f32;
        Self {
            vad,
            silence_frames: ((silence_secs * rate) as usize / FRAME_SAMPLES).max(1),
            max_samples: (max_secs * rate) as usize,
            audio: Vec::new(),
            pending: 0,
            heard_speech: false,
            trailing_silence: 0,
        }
    }

    pub fn from_config(config: &AudioConfig) -> Self {
        Self::new(
            VadDetector::new(config.vad_threshold),
            config.silence_secs,
            config.max_listen_secs,
        )
    }

    /// Append captured samples and report whether the utterance is over.
    pub fn push(&mut self, samples: &[f32]) -> Endpoint {
        self.audio.extend_from_slice(samples);
        self.pending += samples.len();

        while self.pending >= FRAME_SAMPLES {
            let start = self.audio.len() - self.pending;
            let frame = &self.audio[start..start + FRAME_SAMPLES];
            if self.vad.is_voice(frame) {
                self.heard_speech = true;
                self.trailing_silence = 0;
            } else if self.heard_speech {
                self.trailing_silence += 1;
            }
            self.pending -= FRAME_SAMPLES;
        }

        if self.audio.len() >= self.max_samples {
            Endpoint::MaxDuration
        } else if self.heard_speech && self.trailing_silence >= self.silence_frames {
            Endpoint::Silence
        } else {
            Endpoint::Continue
        }
    }

    /// Whether any voice frame has been seen.
    pub fn heard_speech(&self) -> bool {
        self.heard_speech
    }

    /// The captured utterance with silence trimmed off both ends.
    pub fn finish(self) -> Vec<f32> {
        self.vad.trim_silence(&self.audio).to_vec()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(silent_pre: usize, voice: usize, silent_post: usize) -> Vec<f32> {
        let mut v = vec![0.0_f32; silent_pre];
        v.extend(vec![0.5_f32; voice]);
        v.extend(vec![0.0_f32; silent_post]);
        v
    }

    #[test]
    fn trims_leading_and_trailing_silence() {
        let vad = VadDetector::new(0.01);
        assert_eq!(vad.trim_silence(&signal(480, 480, 480)).len(), 480);
    }

    #[test]
    fn all_silence_trims_to_empty() {
        let vad = VadDetector::new(0.01);
        assert!(vad.trim_silence(&[0.0; 1440]).is_empty());
        assert!(vad.trim_silence(&[]).is_empty());
    }

    #[test]
    fn voiced_seconds() {
        let vad = VadDetector::new(0.01);
        let secs = vad.voiced_secs(&signal(4_800, 8_160, 4_800));
        assert!((secs - 0.51).abs() < 1e-3, "{secs}");
    }

    #[test]
    fn silence_before_speech_does_not_end_utterance() {
        let mut ep = Endpointer::new(VadDetector::new(0.01), 0.3, 10.0);
        assert_eq!(ep.push(&vec![0.0; 16_000]), Endpoint::Continue);
        assert!(!ep.heard_speech());
    }

    #[test]
    fn trailing_silence_ends_utterance() {
        let mut ep = Endpointer::new(VadDetector::new(0.01), 0.3, 10.0);
        assert_eq!(ep.push(&vec![0.5; 8_000]), Endpoint::Continue);
        assert_eq!(ep.push(&vec![0.0; 2_400]), Endpoint::Continue);
        assert_eq!(ep.push(&vec![0.0; 4_800]), Endpoint::Silence);
        assert_eq!(ep.finish().len(), 8_160);
    }

    #[test]
    fn speech_resets_silence_counter() {
        let mut ep = Endpointer::new(VadDetector::new(0.01), 0.3, 10.0);
        ep.push(&vec![0.5; 960]);
        ep.push(&vec![0.0; 3_840]);
        assert_eq!(ep.push(&vec![0.5; 960]), Endpoint::Continue);
        assert_eq!(ep.push(&vec![0.0; 3_840]), Endpoint::Continue);
    }

    #[test]
    fn max_duration_stops_capture() {
        let mut ep = Endpointer::new(VadDetector::new(0.01), 1.0, 0.5);
        assert_eq!(ep.push(&vec![0.5; 8_000]), Endpoint::MaxDuration);
    }

    #[test]
    fn partial_frames_are_carried_over() {
        let mut ep = Endpointer::new(VadDetector::new(0.01), 0.03, 10.0);
        ep.push(&[0.5; 300]);
        assert!(!ep.heard_speech());
        ep.push(&[0.5; 180]);
        assert!(ep.heard_speech());
    }
}
