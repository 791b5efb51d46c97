//! Channel mixing and sample-rate conversion.
//!
//! Two directions need conversion:
//!
//! * capture → Whisper: device rate/channels down to 16 kHz mono
//!   ([`downmix`] then [`resample_to_16k`], linear interpolation on short
//!   utterances);
//! * decoded MP3 → speakers: clip rate up or down to the output device rate
//!   ([`resample_for_output`], `rubato` FFT resampler).

use rubato::{FftFixedIn, Resampler};

/// Rate Whisper expects.
pub const STT_SAMPLE_RATE: u32 = 16_000;

/// Frames per rubato processing chunk.
const RUBATO_CHUNK: usize = 1024;

// ---------------------------------------------------------------------------
// downmix
// ---------------------------------------------------------------------------

/// Average interleaved `channels` down to mono.
///
/// ```rust
/// use voice_assistant::audio::downmix;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, 0.4]; // L R L R
/// let mono = downmix(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[1] - 0.3).abs() < 1e-6);
/// ```
pub fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// Linear resampling (capture path)
// ---------------------------------------------------------------------------

/// Resample mono `samples` from `source_rate` to 16 kHz.
pub fn resample_to_16k(samples: &[f32], source_rate: u32) -> Vec<f32> {
    resample_linear(samples, source_rate, STT_SAMPLE_RATE)
}

/// Linear-interpolation resampler.  Output length is
/// `ceil(len * to / from)`.
pub fn resample_linear(samples: &[f32], from: u32, to: u32) -> Vec<f32> {
    if from == to || samples.is_empty() || from == 0 {
        return samples.to_vec();
    }

    let ratio = to as f64 / from as f64;
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let src = i as f64 / ratio;
            let idx = src as usize;
            let frac = (src - idx as f64) as f32;
            match (samples.get(idx), samples.get(idx + 1)) {
                (Some(a), Some(b)) => a * (1.0 - frac) + b * frac,
                (Some(a), None) => *a,
                _ => 0.0,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// rubato resampling (playback path)
// ---------------------------------------------------------------------------

/// Resample a whole mono clip for the output device.
///
/// The final partial chunk is zero-padded and the padding trimmed from the
/// output, so no audio is lost from the tail.
pub fn resample_for_output(samples: &[f32], from: u32, to: u32) -> Result<Vec<f32>, String> {
    if from == to || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler = FftFixedIn::<f32>::new(from as usize, to as usize, RUBATO_CHUNK, 2, 1)
        .map_err(|e| format!("resampler init failed: {e}"))?;

    let expected = (samples.len() as f64 * to as f64 / from as f64).round() as usize;
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(expected + delay + RUBATO_CHUNK);

    for chunk in samples.chunks(RUBATO_CHUNK) {
        let mut frame = chunk.to_vec();
        frame.resize(RUBATO_CHUNK, 0.0);
        let out = resampler
            .process(&[frame], None)
            .map_err(|e| format!("resample failed: {e}"))?;
        output.extend_from_slice(&out[0]);
    }

    // Flush the filter delay with one chunk of silence.
    let out = resampler
        .process(&[vec![0.0; RUBATO_CHUNK]], None)
        .map_err(|e| format!("resample failed: {e}"))?;
    output.extend_from_slice(&out[0]);

    let start = delay.min(output.len());
    let end = (start + expected).min(output.len());
    Ok(output[start..end].to_vec())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
