//! Speaker output: MP3 decoding and blocking playback on the default
//! output device.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::resample::resample_for_output;

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no output device found on the default audio host")]
    NoDevice,

    #[error("failed to query default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("MP3 decode error: {0}")]
    Decode(String),

    #[error("resampling failed: {0}")]
    Resample(String),
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Mono PCM decoded from an MP3 stream.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedClip {
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

/// Decode MP3 bytes to mono `f32`.
pub fn decode_mp3(bytes: &[u8]) -> Result<DecodedClip, PlaybackError> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(bytes));
    let mut samples = Vec::new();
    let mut sample_rate = 0u32;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                sample_rate = frame.sample_rate as u32;
                let channels = frame.channels.max(1);
                samples.extend(frame.data.chunks(channels).map(|pcm| {
                    pcm.iter().map(|&s| f32::from(s) / 32768.0).sum::<f32>() / pcm.len() as f32
                }));
            }
            Err(minimp3::Error::Eof) => break,
            Err(minimp3::Error::SkippedData) => continue,
            Err(e) => return Err(PlaybackError::Decode(e.to_string())),
        }
    }

    if samples.is_empty() {
        return Err(PlaybackError::Decode("no audio frames".into()));
    }
    Ok(DecodedClip {
        samples,
        sample_rate,
    })
}

// ---------------------------------------------------------------------------
// AudioPlayback
// ---------------------------------------------------------------------------

/// Plays mono clips on the default output device, blocking until done.
///
/// The device is looked up per call so a headset plugged in after startup
/// is picked up.
#[derive(Debug, Default, Clone, Copy)]
pub struct AudioPlayback;

impl AudioPlayback {
    pub fn new() -> Self {
        Self
    }

    /// Decode and play MP3 bytes.
    pub fn play_mp3(&self, bytes: &[u8]) -> Result<(), PlaybackError> {
        let clip = decode_mp3(bytes)?;
        self.play(&clip)
    }

    /// Play `clip`, returning once the last sample has been handed to the
    /// device.
    pub fn play(&self, clip: &DecodedClip) -> Result<(), PlaybackError> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or(PlaybackError::NoDevice)?;
        let supported = device.default_output_config()?;
        let device_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let config: cpal::StreamConfig = supported.into();

        let samples = Arc::new(
            resample_for_output(&clip.samples, clip.sample_rate, device_rate)
                .map_err(PlaybackError::Resample)?,
        );
        let total = samples.len();
        let position = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let stream = {
            let samples = Arc::clone(&samples);
            let position = Arc::clone(&position);
            let finished = Arc::clone(&finished);
            device.build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut pos = position.load(Ordering::Relaxed);
                    for frame in data.chunks_mut(channels) {
                        let sample = samples.get(pos).copied().unwrap_or(0.0);
                        frame.fill(sample);
                        pos = (pos + 1).min(samples.len());
                    }
                    position.store(pos, Ordering::Relaxed);
                    if pos >= samples.len() {
                        finished.store(true, Ordering::Release);
                    }
                },
                |err: cpal::StreamError| log::error!("audio: output stream error: {err}"),
                None,
            )?
        };
        stream.play()?;

        let budget = Duration::from_secs_f64(total as f64 / device_rate as f64)
            + Duration::from_millis(500);
        let started = Instant::now();
        while !finished.load(Ordering::Acquire) {
            if started.elapsed() > budget {
                log::warn!("audio: playback did not drain in {budget:?}, stopping");
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        // Let the device flush its last buffer.
        std::thread::sleep(Duration::from_millis(80));

        drop(stream);
        log::debug!("audio: played {total} samples at {device_rate} Hz");
        Ok(())
    }
}
