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

//! Audio playback.
//!
//! The playback engine exposes a fixed table of voices. Samples claim a
//! voice when triggered and release it when they stop; the mixer sums all
//! active voices into the output stream.

use std::{error::Error, fmt, sync::Arc};

use crate::config::error::ConfigError;

pub mod cpal;
pub mod mock;
pub mod wave;

/// The number of simultaneous playback voices.
pub const MAX_VOICES: usize = 8;

/// The output channel count. All decoded waves are stereo.
pub const CHANNELS: u16 = 2;

/// An audio mixer with a fixed table of voices.
pub trait Mixer: fmt::Display + Send + Sync {
    /// Returns the number of voices.
    fn voice_count(&self) -> usize;

    /// Starts playback of the given wave on a voice, replacing whatever the
    /// voice was playing. The current level and pan are kept.
    fn play(&self, voice: usize, wave: Arc<wave::WaveData>, looping: bool);

    /// Stops playback on a voice and releases its wave data.
    fn stop(&self, voice: usize);

    /// Returns true if the voice is currently producing audio. Voices
    /// playing a non-looping wave stop on their own at the end of the data.
    fn playing(&self, voice: usize) -> bool;

    /// Sets the voice gain in [0.0, 1.0].
    fn set_level(&self, voice: usize, level: f32);

    /// Sets the stereo pan, -1.0 (full left) to 1.0 (full right).
    fn set_pan(&self, voice: usize, pan: f32);

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<mock::Mixer>, Box<dyn Error>>;
}

/// Lists the available audio output devices.
pub fn list_devices() -> Result<Vec<String>, Box<dyn Error>> {
    cpal::list_devices()
}

/// Gets the mixer for the configured output. Outputs prefixed with "mock"
/// produce a mock mixer.
pub fn get_mixer(
    output: &str,
    sample_rate: u32,
    buffer_size: u32,
    device_name: Option<&str>,
) -> Result<Arc<dyn Mixer>, Box<dyn Error>> {
    if output.starts_with("mock") {
        return Ok(Arc::new(mock::Mixer::get(output)));
    }

    match output {
        // Both map to the system output device. The distinction only matters
        // on boards where PWM and I2S are separate wirings.
        "pwm" | "i2s" => Ok(Arc::new(cpal::Mixer::new(
            sample_rate,
            buffer_size,
            device_name,
        )?)),
        _ => Err(Box::new(ConfigError::InvalidOutput(output.to_string()))),
    }
}

/// Validates an audio output kind without opening a device.
pub fn validate_output(output: &str) -> Result<(), ConfigError> {
    if output.starts_with("mock") || output == "pwm" || output == "i2s" {
        return Ok(());
    }
    Err(ConfigError::InvalidOutput(output.to_string()))
}
