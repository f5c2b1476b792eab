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
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::audio::{wave, Mixer};
use crate::color::Rgb;
use crate::config::patch::PatchConfig;
use crate::pads::{feedback::Feedback, Pads, MAX_PAD};
use crate::sample::Sample;

/// The most samples a single patch will load.
pub const MAX_SAMPLES: usize = 256;

/// The loaded drum kit. Routes note and pad triggers to the samples of
/// the current patch. Starts out unloaded.
#[derive(Default)]
pub struct Patch {
    samples: Vec<Sample>,
}

impl Patch {
    /// Creates an empty, unloaded patch.
    pub fn new() -> Patch {
        Patch {
            samples: Vec::new(),
        }
    }

    /// Loads a patch, fully unloading the previous one first. Samples
    /// whose audio cannot be decoded stay silent but keep their note and
    /// pad bindings. Writes the idle pad tints for the new patch. Fails
    /// without touching the current patch when the record has no sample
    /// list.
    pub fn load(
        &mut self,
        config: &PatchConfig,
        mixer: &dyn Mixer,
        pads: &mut dyn Pads,
        feedback: &mut Feedback,
        sample_rate: u32,
    ) -> bool {
        let sample_configs = match config.samples() {
            Some(samples) => samples,
            None => return false,
        };

        self.unload(mixer);

        for (index, sample_config) in sample_configs.iter().take(MAX_SAMPLES).enumerate() {
            let wave = match sample_config.file() {
                Some(file) => match wave::load(Path::new(file), sample_rate) {
                    Ok(wave) => Some(Arc::new(wave)),
                    Err(e) => {
                        warn!(err = e.to_string(), file, "Unable to load sample.");
                        None
                    }
                },
                None => None,
            };
            self.samples.push(Sample::new(index, sample_config, wave));
        }

        info!(
            name = config.name().unwrap_or(""),
            samples = self.samples.len(),
            "Loaded patch."
        );

        // Idle tints: half intensity for bound pads, off for the rest.
        for pad in 0..MAX_PAD as u8 {
            match self.pad_sample(pad) {
                Some(sample) => feedback.set(pads, pad, sample.color().half(), true),
                None => feedback.set(pads, pad, Rgb::OFF, true),
            }
        }

        true
    }

    /// Unloads every sample, releasing their voices and audio.
    pub fn unload(&mut self, mixer: &dyn Mixer) {
        for sample in &mut self.samples {
            sample.unload(mixer);
        }
        self.samples.clear();
    }

    /// Triggers the first sample bound to the given note.
    pub fn note_on(&mut self, mixer: &dyn Mixer, note: u8, velocity: f32, volume: f32) -> bool {
        match self
            .samples
            .iter_mut()
            .find(|sample| sample.note() == note)
        {
            Some(sample) => sample.note_on(mixer, velocity, volume),
            None => false,
        }
    }

    /// Routes a note off to the first sample bound to the given note.
    pub fn note_off(&mut self, mixer: &dyn Mixer, note: u8) -> bool {
        match self
            .samples
            .iter_mut()
            .find(|sample| sample.note() == note)
        {
            Some(sample) => sample.note_off(mixer),
            None => false,
        }
    }

    /// Triggers the sample bound to the given pad. Pads carry no velocity,
    /// so the trigger is at full scale.
    pub fn pad_on(&mut self, mixer: &dyn Mixer, pad: u8, volume: f32) -> bool {
        match self
            .samples
            .iter_mut()
            .find(|sample| sample.pad() == Some(pad))
        {
            Some(sample) => sample.note_on(mixer, 1.0, volume),
            None => false,
        }
    }

    /// Routes a note off to the sample bound to the given pad.
    pub fn pad_off(&mut self, mixer: &dyn Mixer, pad: u8) -> bool {
        match self
            .samples
            .iter_mut()
            .find(|sample| sample.pad() == Some(pad))
        {
            Some(sample) => sample.note_off(mixer),
            None => false,
        }
    }

    /// Gets the first sample bound to the given pad.
    pub fn pad_sample(&self, pad: u8) -> Option<&Sample> {
        self.samples
            .iter()
            .find(|sample| sample.pad() == Some(pad))
    }

    /// Gets the first sample bound to the given pad, mutably.
    pub fn pad_sample_mut(&mut self, pad: u8) -> Option<&mut Sample> {
        self.samples
            .iter_mut()
            .find(|sample| sample.pad() == Some(pad))
    }

    /// Gets the sample currently holding the given mixer voice.
    #[allow(dead_code)]
    pub fn voice_sample(&self, voice: usize) -> Option<&Sample> {
        self.samples
            .iter()
            .find(|sample| sample.voice() == Some(voice))
    }

    /// Returns the number of loaded samples.
    #[cfg(test)]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}
