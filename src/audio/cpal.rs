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

//! A cpal playback mixer.
//!
//! Voices are mixed directly in the output callback. The stream itself is
//! not Send, so it is created on a dedicated thread and kept alive there
//! for the life of the process.

use std::{error::Error, fmt, sync::Arc, thread, time::Duration};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::audio::{wave::WaveData, Mixer as AudioMixer, CHANNELS, MAX_VOICES};

/// A playback voice slot.
#[derive(Clone, Default)]
struct Voice {
    /// The wave being played, if any.
    wave: Option<Arc<WaveData>>,
    /// The playback position in frames.
    position: usize,
    /// Whether playback wraps at the end of the data.
    looping: bool,
    /// The voice gain.
    level: f32,
    /// The stereo pan.
    pan: f32,
    /// True while the voice produces audio.
    active: bool,
}

/// A mixer playing through a cpal output device.
pub struct Mixer {
    /// The name of the output device.
    name: String,
    /// The name of the host the device belongs to.
    host: String,
    /// The voice table, shared with the output callback.
    voices: Arc<Mutex<Vec<Voice>>>,
}

impl Mixer {
    /// Gets a mixer on the system output. If a device name is given, the
    /// device must exist.
    pub fn new(
        sample_rate: u32,
        buffer_size: u32,
        device_name: Option<&str>,
    ) -> Result<Mixer, Box<dyn Error>> {
        let (device, host) = match device_name {
            Some(name) => find_device(name)?,
            None => {
                let host = cpal::default_host();
                let device = host
                    .default_output_device()
                    .ok_or("no default audio output device found")?;
                (device, host.id().name().to_string())
            }
        };

        let name = device.name()?;
        let sample_format = device.default_output_config()?.sample_format();
        let voices = Arc::new(Mutex::new(vec![Voice::default(); MAX_VOICES]));

        info!(
            device = name,
            sample_rate = sample_rate,
            buffer_size = buffer_size,
            format = %sample_format,
            "Starting audio mixer."
        );

        let stream_voices = voices.clone();
        thread::spawn(move || {
            run_stream(device, sample_format, sample_rate, buffer_size, stream_voices)
        });

        Ok(Mixer { name, host, voices })
    }
}

/// Finds an output device by exact name across the available hosts.
fn find_device(name: &str) -> Result<(cpal::Device, String), Box<dyn Error>> {
    for host_id in cpal::available_hosts() {
        let host_devices = match cpal::host_from_id(host_id)?.output_devices() {
            Ok(host_devices) => host_devices,
            Err(e) => {
                error!(
                    err = e.to_string(),
                    host = host_id.name(),
                    "Unable to list devices for host"
                );
                continue;
            }
        };

        for device in host_devices {
            let device_name = match device.name() {
                Ok(device_name) => device_name,
                Err(_) => continue,
            };
            if device_name.trim() == name {
                return Ok((device, host_id.name().to_string()));
            }
        }
    }

    Err(format!("no device found with name {}", name).into())
}

/// Lists cpal output devices.
pub fn list_devices() -> Result<Vec<String>, Box<dyn Error>> {
    // Suppress noisy output here.
    let _shh_stdout = shh::stdout()?;
    let _shh_stderr = shh::stderr()?;

    let mut devices: Vec<String> = Vec::new();
    for host_id in cpal::available_hosts() {
        let host_devices = match cpal::host_from_id(host_id)?.devices() {
            Ok(host_devices) => host_devices,
            Err(e) => {
                error!(
                    err = e.to_string(),
                    host = host_id.name(),
                    "Unable to list devices for host"
                );
                continue;
            }
        };

        for device in host_devices {
            let mut max_channels = 0;

            let output_configs = device.supported_output_configs();
            if output_configs.is_err() {
                continue;
            }

            for output_config in device.supported_output_configs()? {
                if max_channels < output_config.channels() {
                    max_channels = output_config.channels();
                }
            }

            if max_channels > 0 {
                devices.push(format!(
                    "{} (Channels={}) ({})",
                    device.name()?,
                    max_channels,
                    host_id.name()
                ));
            }
        }
    }

    devices.sort();
    Ok(devices)
}

/// Creates the output stream and parks, keeping it alive. Falls back to the
/// device default buffer size if the configured one is rejected.
fn run_stream(
    device: cpal::Device,
    sample_format: cpal::SampleFormat,
    sample_rate: u32,
    buffer_size: u32,
    voices: Arc<Mutex<Vec<Voice>>>,
) {
    let config = cpal::StreamConfig {
        channels: CHANNELS,
        sample_rate,
        buffer_size: cpal::BufferSize::Fixed(buffer_size),
    };

    let stream = match build_stream(&device, sample_format, &config, voices.clone()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(
                err = e.to_string(),
                buffer_size = buffer_size,
                "Unable to open stream with the configured buffer size, using the device default."
            );
            let config = cpal::StreamConfig {
                buffer_size: cpal::BufferSize::Default,
                ..config
            };
            match build_stream(&device, sample_format, &config, voices) {
                Ok(stream) => stream,
                Err(e) => {
                    error!("Failed to create CPAL stream: {}", e);
                    return;
                }
            }
        }
    };

    if let Err(e) = stream.play() {
        error!("Failed to start CPAL stream: {}", e);
        return;
    }
    info!("CPAL output stream started successfully");

    // The stream stops when dropped, so never leave.
    loop {
        thread::sleep(Duration::from_millis(100));
    }
}

/// Builds the output stream for the device sample format.
fn build_stream(
    device: &cpal::Device,
    sample_format: cpal::SampleFormat,
    config: &cpal::StreamConfig,
    voices: Arc<Mutex<Vec<Voice>>>,
) -> Result<cpal::Stream, Box<dyn Error>> {
    let stream = match sample_format {
        cpal::SampleFormat::F32 => build_stream_for::<f32>(device, config, voices)?,
        cpal::SampleFormat::I16 => build_stream_for::<i16>(device, config, voices)?,
        cpal::SampleFormat::I32 => build_stream_for::<i32>(device, config, voices)?,
        cpal::SampleFormat::U16 => build_stream_for::<u16>(device, config, voices)?,
        sample_format => {
            return Err(format!("unsupported sample format {}", sample_format).into())
        }
    };
    Ok(stream)
}

fn build_stream_for<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    voices: Arc<Mutex<Vec<Voice>>>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample + FromSample<f32>,
{
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            write_frames(data, &voices);
        },
        |err| error!("CPAL output stream error: {}", err),
        None,
    )
}

/// Fills an output buffer from the voice table.
fn write_frames<T>(data: &mut [T], voices: &Mutex<Vec<Voice>>)
where
    T: SizedSample + FromSample<f32>,
{
    let mut voices = voices.lock();
    for frame in data.chunks_mut(usize::from(CHANNELS)) {
        let (left, right) = mix_frame(&mut voices);
        frame[0] = T::from_sample(left);
        if let Some(sample) = frame.get_mut(1) {
            *sample = T::from_sample(right);
        }
    }
}

/// Mixes one stereo frame, advancing every active voice. Voices that run
/// out of data are deactivated and release their wave.
fn mix_frame(voices: &mut [Voice]) -> (f32, f32) {
    let mut left = 0.0f32;
    let mut right = 0.0f32;

    for voice in voices.iter_mut() {
        if !voice.active {
            continue;
        }

        let frames = voice
            .wave
            .as_ref()
            .map(|wave| wave.frame_count())
            .unwrap_or(0);
        if voice.position >= frames {
            if voice.looping && frames > 0 {
                voice.position = 0;
            } else {
                voice.active = false;
                voice.wave = None;
                continue;
            }
        }

        if let Some(wave) = voice.wave.as_ref() {
            let samples = wave.samples();
            let index = voice.position * usize::from(CHANNELS);
            let left_gain = voice.level * (1.0 - voice.pan.max(0.0));
            let right_gain = voice.level * (1.0 + voice.pan.min(0.0));
            left += samples[index] * left_gain;
            right += samples[index + 1] * right_gain;
        }
        voice.position += 1;
    }

    (left.clamp(-1.0, 1.0), right.clamp(-1.0, 1.0))
}

impl AudioMixer for Mixer {
    fn voice_count(&self) -> usize {
        self.voices.lock().len()
    }

    fn play(&self, voice: usize, wave: Arc<WaveData>, looping: bool) {
        let mut voices = self.voices.lock();
        if let Some(voice) = voices.get_mut(voice) {
            voice.wave = Some(wave);
            voice.position = 0;
            voice.looping = looping;
            voice.active = true;
        }
    }

    fn stop(&self, voice: usize) {
        let mut voices = self.voices.lock();
        if let Some(voice) = voices.get_mut(voice) {
            voice.active = false;
            voice.wave = None;
            voice.position = 0;
        }
    }

    fn playing(&self, voice: usize) -> bool {
        self.voices
            .lock()
            .get(voice)
            .map(|voice| voice.active)
            .unwrap_or(false)
    }

    fn set_level(&self, voice: usize, level: f32) {
        let mut voices = self.voices.lock();
        if let Some(voice) = voices.get_mut(voice) {
            voice.level = level.clamp(0.0, 1.0);
        }
    }

    fn set_pan(&self, voice: usize, pan: f32) {
        let mut voices = self.voices.lock();
        if let Some(voice) = voices.get_mut(voice) {
            voice.pan = pan.clamp(-1.0, 1.0);
        }
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<super::mock::Mixer>, Box<dyn Error>> {
        Err("this is not a mock mixer".into())
    }
}

impl fmt::Display for Mixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Channels={}) ({})", self.name, CHANNELS, self.host)
    }
}
