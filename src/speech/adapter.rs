//! [`LocalSpeech`]: the production [`SpeechIo`] built from the default
//! microphone, Whisper, the TTS endpoint and the default speakers.

use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use crate::audio::{
    decode_mp3, AudioCapture, AudioPlayback, CaptureError, Endpoint, Endpointer, VadDetector,
};
use crate::config::{AppConfig, AudioConfig};
use crate::stt::SttEngine;

use super::tts::GoogleTts;
use super::{SpeechError, SpeechIo};

/// How long `listen` waits for the next microphone buffer.
const CHUNK_TIMEOUT: Duration = Duration::from_secs(2);

pub struct LocalSpeech {
    stt: Arc<dyn SttEngine>,
    tts: GoogleTts,
    runtime: tokio::runtime::Handle,
    playback: AudioPlayback,
    audio: AudioConfig,
    repeat: u32,
    sounds_dir: PathBuf,
}

impl LocalSpeech {
    /// `runtime` drives the async TTS requests from the blocking calls.
    pub fn new(stt: Arc<dyn SttEngine>, config: &AppConfig, runtime: tokio::runtime::Handle) -> Self {
        let sounds_dir = config.speech.resolved_sounds_dir();
        log::info!("speech: clips from {}", sounds_dir.display());

        Self {
            stt,
            tts: GoogleTts::from_config(&config.speech),
            runtime,
            playback: AudioPlayback::new(),
            audio: config.audio.clone(),
            repeat: config.speech.repeat.max(1),
            sounds_dir,
        }
    }

    fn record_utterance(&self) -> Result<Vec<f32>, SpeechError> {
        let capture = AudioCapture::new().map_err(|e| SpeechError::Capture(e.to_string()))?;
        let (tx, rx) = mpsc::channel();
        let handle = capture
            .start(tx)
            .map_err(|e| SpeechError::Capture(e.to_string()))?;

        let mut endpointer = Endpointer::from_config(&self.audio);
        loop {
            let chunk = rx.recv_timeout(CHUNK_TIMEOUT).map_err(chunk_error)?;
            match endpointer.push(&chunk.to_mono_16k()) {
                Endpoint::Continue => {}
                Endpoint::Silence => break,
                Endpoint::MaxDuration => {
                    log::info!("speech: capture hit {} s limit", self.audio.max_listen_secs);
                    break;
                }
            }
        }
        drop(handle);

        if !endpointer.heard_speech() {
            return Err(SpeechError::Recognition("no speech detected".into()));
        }
        Ok(endpointer.finish())
    }
}

impl SpeechIo for LocalSpeech {
    fn speak(&self, text: &str) -> Result<(), SpeechError> {
        log::info!("speech: saying {text:?}");
        let mp3 = self.runtime.block_on(self.tts.synthesize(text))?;
        let clip = decode_mp3(&mp3).map_err(|e| SpeechError::Synthesis(e.to_string()))?;

        for _ in 0..self.repeat {
            self.playback
                .play(&clip)
                .map_err(|e| SpeechError::Playback(e.to_string()))?;
        }
        Ok(())
    }

    fn listen(&self) -> Result<String, SpeechError> {
        log::debug!("speech: listening");
        let audio = self.record_utterance()?;
        transcribe_utterance(self.stt.as_ref(), &audio, &self.audio)
    }

    fn play_clip(&self, clip_id: &str) -> Result<(), SpeechError> {
        let path = clip_path(&self.sounds_dir, clip_id);
        if !path.is_file() {
            return Err(SpeechError::ClipNotFound(path));
        }
        let bytes = std::fs::read(&path)
            .map_err(|e| SpeechError::Playback(format!("{}: {e}", path.display())))?;

        log::debug!("speech: clip {clip_id}");
        self.playback
            .play_mp3(&bytes)
            .map_err(|e| SpeechError::Playback(e.to_string()))
    }
}

/// Why no microphone buffer arrived.
fn chunk_error(error: mpsc::RecvTimeoutError) -> SpeechError {
    match error {
        mpsc::RecvTimeoutError::Timeout => SpeechError::Capture(format!(
            "microphone stalled for {} s",
            CHUNK_TIMEOUT.as_secs()
        )),
        mpsc::RecvTimeoutError::Disconnected => {
            SpeechError::Capture(CaptureError::Disconnected.to_string())
        }
    }
}

/// `{sounds_dir}/{clip_id}.mp3`
pub fn clip_path(sounds_dir: &Path, clip_id: &str) -> PathBuf {
    sounds_dir.join(format!("{clip_id}.mp3"))
}

/// Turn a trimmed 16 kHz utterance into text.
///
/// Too little voiced audio, an engine error and an empty transcript all
/// count as recognition failures.
pub fn transcribe_utterance(
    stt: &dyn SttEngine,
    audio: &[f32],
    config: &AudioConfig,
) -> Result<String, SpeechError> {
    let voiced = VadDetector::new(config.vad_threshold).voiced_secs(audio);
    if voiced < config.min_speech_secs {
        return Err(SpeechError::Recognition(format!(
            "only {voiced:.2} s of speech"
        )));
    }

    let text = stt
        .transcribe(audio)
        .map_err(|e| SpeechError::Recognition(e.to_string()))?;
    if text.trim().is_empty() {
        return Err(SpeechError::Recognition("empty transcript".into()));
    }
    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stt::{MockSttEngine, SttError};

    fn speech_secs(secs: f32) -> Vec<f32> {
        vec![0.3; (secs * 16_000.0) as usize]
    }

    #[test]
    fn transcript_is_returned_trimmed() {
        let stt = MockSttEngine::ok(" Open calculator. ");
        let text = transcribe_utterance(&stt, &speech_secs(1.0), &AudioConfig::default()).unwrap();
        assert_eq!(text, "Open calculator.");
    }

    #[test]
    fn too_little_speech_is_recognition_failure() {
        let stt = MockSttEngine::ok("uh");
        let err =
            transcribe_utterance(&stt, &speech_secs(0.1), &AudioConfig::default()).unwrap_err();
        assert!(err.is_recognition());
    }

    #[test]
    fn blank_transcript_is_recognition_failure() {
        let stt = MockSttEngine::ok("[BLANK_AUDIO]");
        let err =
            transcribe_utterance(&stt, &speech_secs(1.0), &AudioConfig::default()).unwrap_err();
        assert!(matches!(err, SpeechError::Recognition(_)));
    }

    #[test]
    fn engine_error_is_recognition_failure() {
        let stt = MockSttEngine::err(SttError::Transcription("decoder blew up".into()));
        let err =
            transcribe_utterance(&stt, &speech_secs(1.0), &AudioConfig::default()).unwrap_err();
        assert!(err.to_string().contains("decoder blew up"));
    }

    #[test]
    fn closed_microphone_channel_is_a_capture_failure() {
        let (tx, rx) = mpsc::channel::<crate::audio::AudioChunk>();
        drop(tx);
        let err = rx.recv_timeout(CHUNK_TIMEOUT).map_err(chunk_error).unwrap_err();

        assert!(err.is_recognition());
        assert!(err.to_string().contains("stopped delivering audio"));
    }

    #[test]
    fn stalled_microphone_is_a_capture_failure() {
        let err = chunk_error(mpsc::RecvTimeoutError::Timeout);
        assert!(matches!(err, SpeechError::Capture(ref m) if m.contains("stalled")));
    }

    #[test]
    fn clip_path_appends_mp3() {
        assert_eq!(
            clip_path(Path::new("/opt/sounds"), "intro_english"),
            PathBuf::from("/opt/sounds/intro_english.mp3")
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_clip_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.speech.sounds_dir = Some(dir.path().to_path_buf());
        let speech = LocalSpeech::new(
            Arc::new(MockSttEngine::ok("")),
            &config,
            tokio::runtime::Handle::current(),
        );

        match speech.play_clip("github") {
            Err(SpeechError::ClipNotFound(path)) => {
                assert_eq!(path, dir.path().join("github.mp3"));
            }
            other => panic!("expected ClipNotFound, got {other:?}"),
        }
    }
}
