// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! WAV decoding for triggered samples.
//!
//! Samples are decoded entirely into memory at load time for zero-latency
//! triggering: normalized to f32, widened to stereo, and resampled to the
//! engine rate with linear interpolation.

use std::path::Path;
use std::time::Duration;

use hound::{SampleFormat, WavReader};
use tracing::info;

use super::CHANNELS;

/// Typed error for WAV decode failures. A sample whose wave fails to
/// decode is skipped, not fatal.
#[derive(Debug, thiserror::Error)]
pub enum WaveError {
    #[error("unable to read WAV file: {0}")]
    Wav(#[from] hound::Error),

    #[error("WAV file has no channels")]
    NoChannels,

    #[error("WAV file has no audio data")]
    Empty,
}

/// A decoded sample: stereo interleaved f32 at the engine rate.
pub struct WaveData {
    data: Vec<f32>,
    sample_rate: u32,
}

impl WaveData {
    /// Gets the interleaved stereo samples.
    pub fn samples(&self) -> &[f32] {
        &self.data
    }

    /// Gets the number of stereo frames.
    pub fn frame_count(&self) -> usize {
        self.data.len() / usize::from(CHANNELS)
    }

    /// Gets the sample rate of the decoded data.
    #[allow(dead_code)]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Gets the playback duration.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_count() as f64 / f64::from(self.sample_rate))
    }

    /// Gets the memory size in bytes.
    pub fn memory_size(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }
}

#[cfg(test)]
impl WaveData {
    /// Creates wave data directly from samples (test only).
    pub fn from_samples(data: Vec<f32>, sample_rate: u32) -> WaveData {
        WaveData { data, sample_rate }
    }
}

/// Decodes a WAV file into memory at the given engine rate.
pub fn load(path: &Path, target_rate: u32) -> Result<WaveData, WaveError> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(WaveError::NoChannels);
    }

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            // Scale integer samples by the bit depth. i64 avoids overflow
            // for 32-bit samples.
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|sample| sample as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };
    if samples.is_empty() {
        return Err(WaveError::Empty);
    }

    let stereo = to_stereo(samples, spec.channels);
    let data = if spec.sample_rate == target_rate {
        stereo
    } else {
        resample(&stereo, spec.sample_rate, target_rate)
    };

    let wave = WaveData {
        data,
        sample_rate: target_rate,
    };
    info!(
        path = %path.display(),
        channels = spec.channels,
        source_rate = spec.sample_rate,
        duration_ms = wave.duration().as_millis(),
        memory_kb = wave.memory_size() / 1024,
        "Loaded sample."
    );
    Ok(wave)
}

/// Widens or narrows interleaved samples to stereo. Mono is duplicated to
/// both channels; channels past the second are dropped.
fn to_stereo(samples: Vec<f32>, channels: u16) -> Vec<f32> {
    let channels = usize::from(channels);
    match channels {
        2 => samples,
        1 => {
            let mut stereo = Vec::with_capacity(samples.len() * 2);
            for sample in samples {
                stereo.push(sample);
                stereo.push(sample);
            }
            stereo
        }
        _ => {
            let mut stereo = Vec::with_capacity(samples.len() / channels * 2);
            for frame in samples.chunks_exact(channels) {
                stereo.push(frame[0]);
                stereo.push(frame[1]);
            }
            stereo
        }
    }
}

/// Resamples stereo interleaved samples with linear interpolation.
fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    let channels = usize::from(CHANNELS);
    let ratio = f64::from(target_rate) / f64::from(source_rate);
    let source_frames = samples.len() / channels;
    let target_frames = (source_frames as f64 * ratio).ceil() as usize;

    let mut output = Vec::with_capacity(target_frames * channels);
    for target_frame in 0..target_frames {
        let source_pos = target_frame as f64 / ratio;
        let source_frame = source_pos.floor() as usize;
        let frac = source_pos.fract() as f32;

        for channel in 0..channels {
            let idx0 = source_frame * channels + channel;
            let idx1 = (source_frame + 1) * channels + channel;

            let s0 = samples.get(idx0).copied().unwrap_or(0.0);
            let s1 = samples.get(idx1).copied().unwrap_or(s0);
            output.push(s0 + (s1 - s0) * frac);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, spec: hound::WavSpec, samples: &[i16]) {
        let mut writer = hound::WavWriter::create(path, spec).expect("create WAV");
        for sample in samples {
            writer.write_sample(*sample).expect("write sample");
        }
        writer.finalize().expect("finalize WAV");
    }

    #[test]
    fn test_load_mono_duplicates_to_stereo() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("mono.wav");
        write_wav(
            &path,
            hound::WavSpec {
                channels: 1,
                sample_rate: 22050,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            },
            &[i16::MAX, 0, i16::MIN],
        );

        let wave = load(&path, 22050).expect("load");
        assert_eq!(wave.frame_count(), 3);
        assert_eq!(wave.samples()[0], wave.samples()[1]);
        assert!((wave.samples()[0] - 1.0).abs() < 0.001);
        assert!((wave.samples()[4] - (-1.0)).abs() < 0.001);
    }

    #[test]
    fn test_load_resamples_to_engine_rate() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("hi.wav");
        let samples: Vec<i16> = vec![1000; 4410];
        write_wav(
            &path,
            hound::WavSpec {
                channels: 1,
                sample_rate: 44100,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            },
            &samples,
        );

        let wave = load(&path, 22050).expect("load");
        assert_eq!(wave.frame_count(), 2205);
        assert_eq!(wave.sample_rate(), 22050);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load(Path::new("/nonexistent/kick.wav"), 22050);
        assert!(matches!(result, Err(WaveError::Wav(_))));
    }

    #[test]
    fn test_load_empty_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("empty.wav");
        write_wav(
            &path,
            hound::WavSpec {
                channels: 1,
                sample_rate: 22050,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            },
            &[],
        );

        let result = load(&path, 22050);
        assert!(matches!(result, Err(WaveError::Empty)));
    }

    #[test]
    fn test_duration() {
        let wave = WaveData::from_samples(vec![0.0; 44100], 22050);
        assert_eq!(wave.duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_resample_preserves_channel_order() {
        // L = 1.0, R = -1.0 throughout.
        let samples = vec![1.0f32, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
        let result = resample(&samples, 44100, 48000);

        assert!(result.len() >= 8);
        assert!((result[0] - 1.0).abs() < 0.1);
        assert!((result[1] - (-1.0)).abs() < 0.1);
    }
}
