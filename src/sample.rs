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
use std::sync::Arc;

use tracing::debug;

use crate::audio::{wave::WaveData, Mixer};
use crate::color::Rgb;
use crate::config::patch::SampleConfig;

/// One playable sample slot within a patch. A sample binds decoded audio
/// to a trigger note and optionally a pad, and tracks which mixer voice
/// it currently occupies.
pub struct Sample {
    index: usize,
    note: u8,
    pad: Option<u8>,
    color: Rgb,
    level: f32,
    min_level: f32,
    pan: f32,
    looping: bool,
    stop_on_note_off: bool,

    /// The claimed mixer voice while sounding.
    voice: Option<usize>,

    /// The decoded audio. A sample without audio keeps its note and pad
    /// bindings but never sounds.
    wave: Option<Arc<WaveData>>,
}

impl Sample {
    /// Creates a sample from its configuration and decoded audio.
    pub fn new(index: usize, config: &SampleConfig, wave: Option<Arc<WaveData>>) -> Sample {
        Sample {
            index,
            note: config.note(),
            pad: config.pad(),
            color: config
                .color()
                .map(Rgb::parse)
                .unwrap_or(Rgb::DEFAULT),
            level: config.level(),
            min_level: config.min_level(),
            pan: config.pan(),
            looping: config.looping(),
            stop_on_note_off: config.stop_on_note_off(),
            voice: None,
            wave,
        }
    }

    /// Gets the trigger note.
    pub fn note(&self) -> u8 {
        self.note
    }

    /// Gets the bound pad.
    pub fn pad(&self) -> Option<u8> {
        self.pad
    }

    /// Gets the pad LED color.
    pub fn color(&self) -> Rgb {
        self.color
    }

    /// Gets the claimed mixer voice while sounding.
    pub fn voice(&self) -> Option<usize> {
        self.voice
    }

    /// Triggers the sample. Stops any sounding instance of itself, then
    /// claims the lowest mixer voice not currently producing sound and
    /// starts playback on it at a gain scaled by velocity and the global
    /// volume. A velocity of zero acts as a note off. Returns whether new
    /// playback started.
    pub fn note_on(&mut self, mixer: &dyn Mixer, velocity: f32, volume: f32) -> bool {
        let wave = match &self.wave {
            Some(wave) => Arc::clone(wave),
            None => return false,
        };

        if velocity <= 0.0 {
            self.note_off(mixer);
            return false;
        }

        // At most one sounding instance per sample.
        self.stop(mixer);

        let voice = match (0..mixer.voice_count()).find(|&voice| !mixer.playing(voice)) {
            Some(voice) => voice,
            None => return false,
        };

        let gain =
            (velocity * (self.level - self.min_level) + self.min_level).clamp(0.0, 1.0) * volume;
        self.voice = Some(voice);
        mixer.play(voice, wave, self.looping);
        mixer.set_level(voice, gain);
        mixer.set_pan(voice, self.pan.clamp(-1.0, 1.0));
        debug!(
            sample = self.index,
            voice,
            gain = f64::from(gain),
            "Sample triggered."
        );
        true
    }

    /// Handles a note off. Only samples marked to stop on note off react.
    pub fn note_off(&mut self, mixer: &dyn Mixer) -> bool {
        if self.stop_on_note_off {
            return self.stop(mixer);
        }
        true
    }

    /// Releases the claimed voice, halting it if it still sounds. The
    /// released voice is left with zero level and pan.
    pub fn stop(&mut self, mixer: &dyn Mixer) -> bool {
        let voice = match self.voice.take() {
            Some(voice) => voice,
            None => return false,
        };

        if mixer.playing(voice) {
            mixer.stop(voice);
        }
        mixer.set_level(voice, 0.0);
        mixer.set_pan(voice, 0.0);
        true
    }

    /// Stops playback and drops the decoded audio.
    pub fn unload(&mut self, mixer: &dyn Mixer) {
        self.stop(mixer);
        self.wave = None;
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;
    use crate::audio;

    fn make_mixer() -> Result<Arc<dyn Mixer>, Box<dyn Error>> {
        audio::get_mixer("mock", 22050, 1024, None)
    }

    fn make_wave() -> Arc<WaveData> {
        Arc::new(WaveData::from_samples(vec![0.25, -0.25, 0.5, -0.5], 22050))
    }

    fn make_sample(index: usize, note: u8) -> Sample {
        Sample::new(
            index,
            &SampleConfig::simple("kick.wav", note, -1),
            Some(make_wave()),
        )
    }

    #[test]
    fn test_note_on_claims_lowest_free_voice() -> Result<(), Box<dyn Error>> {
        let mixer = make_mixer()?;
        let mock = mixer.to_mock()?;

        let mut kick = make_sample(0, 36);
        let mut snare = make_sample(1, 38);

        assert!(kick.note_on(mixer.as_ref(), 1.0, 1.0));
        assert_eq!(kick.voice(), Some(0));

        assert!(snare.note_on(mixer.as_ref(), 1.0, 1.0));
        assert_eq!(snare.voice(), Some(1));

        assert!(mock.playing(0));
        assert!(mock.playing(1));
        Ok(())
    }

    #[test]
    fn test_note_on_gain_and_pan() -> Result<(), Box<dyn Error>> {
        let mixer = make_mixer()?;
        let mock = mixer.to_mock()?;

        let config = SampleConfig::new(
            Some("kick.wav".to_string()),
            36,
            -1,
            None,
            0.8,
            0.2,
            -0.5,
            false,
            false,
        );
        let mut sample = Sample::new(0, &config, Some(make_wave()));

        assert!(sample.note_on(mixer.as_ref(), 0.5, 0.5));

        // 0.5 * (0.8 - 0.2) + 0.2 = 0.5, halved by the global volume.
        assert!((mock.level(0) - 0.25).abs() < 1e-6);
        assert!((mock.pan(0) - -0.5).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_note_on_zero_velocity_acts_as_note_off() -> Result<(), Box<dyn Error>> {
        let mixer = make_mixer()?;

        let config = SampleConfig::new(
            Some("hat.wav".to_string()),
            42,
            -1,
            None,
            1.0,
            0.0,
            0.0,
            false,
            true,
        );
        let mut sample = Sample::new(0, &config, Some(make_wave()));

        assert!(sample.note_on(mixer.as_ref(), 1.0, 1.0));
        assert!(!sample.note_on(mixer.as_ref(), 0.0, 1.0));
        assert_eq!(sample.voice(), None);
        assert!(!mixer.playing(0));
        Ok(())
    }

    #[test]
    fn test_retrigger_steals_own_voice() -> Result<(), Box<dyn Error>> {
        let mixer = make_mixer()?;

        let mut sample = make_sample(0, 36);
        assert!(sample.note_on(mixer.as_ref(), 1.0, 1.0));
        assert_eq!(sample.voice(), Some(0));

        // Retriggering frees voice 0 first, so it wins again.
        assert!(sample.note_on(mixer.as_ref(), 1.0, 1.0));
        assert_eq!(sample.voice(), Some(0));
        Ok(())
    }

    #[test]
    fn test_note_on_fails_when_no_voice_is_free() -> Result<(), Box<dyn Error>> {
        let mixer = make_mixer()?;

        let mut samples: Vec<Sample> = (0..mixer.voice_count())
            .map(|index| make_sample(index, 36 + index as u8))
            .collect();
        for sample in &mut samples {
            assert!(sample.note_on(mixer.as_ref(), 1.0, 1.0));
        }

        let mut extra = make_sample(99, 99);
        assert!(!extra.note_on(mixer.as_ref(), 1.0, 1.0));
        assert_eq!(extra.voice(), None);
        Ok(())
    }

    #[test]
    fn test_note_off_respects_flag() -> Result<(), Box<dyn Error>> {
        let mixer = make_mixer()?;

        let mut held = make_sample(0, 36);
        assert!(held.note_on(mixer.as_ref(), 1.0, 1.0));
        assert!(held.note_off(mixer.as_ref()));
        assert!(mixer.playing(0), "one-shot samples ignore note off");

        let config = SampleConfig::new(
            Some("pad.wav".to_string()),
            40,
            -1,
            None,
            1.0,
            0.0,
            0.0,
            true,
            true,
        );
        let mut gated = Sample::new(1, &config, Some(make_wave()));
        assert!(gated.note_on(mixer.as_ref(), 1.0, 1.0));
        assert_eq!(gated.voice(), Some(1));
        assert!(gated.note_off(mixer.as_ref()));
        assert!(!mixer.playing(1));
        assert_eq!(gated.voice(), None);
        Ok(())
    }

    #[test]
    fn test_stop_zeroes_the_released_voice() -> Result<(), Box<dyn Error>> {
        let mixer = make_mixer()?;
        let mock = mixer.to_mock()?;

        let config = SampleConfig::new(
            Some("tom.wav".to_string()),
            45,
            -1,
            None,
            1.0,
            0.0,
            0.75,
            false,
            false,
        );
        let mut sample = Sample::new(0, &config, Some(make_wave()));
        assert!(sample.note_on(mixer.as_ref(), 1.0, 1.0));
        assert!(sample.stop(mixer.as_ref()));

        assert_eq!(sample.voice(), None);
        assert!(!mock.playing(0));
        assert_eq!(mock.level(0), 0.0);
        assert_eq!(mock.pan(0), 0.0);

        // A second stop has nothing to release.
        assert!(!sample.stop(mixer.as_ref()));
        Ok(())
    }

    #[test]
    fn test_sample_without_audio_is_silent() -> Result<(), Box<dyn Error>> {
        let mixer = make_mixer()?;

        let mut sample = Sample::new(0, &SampleConfig::simple("missing.wav", 36, 3), None);
        assert!(!sample.note_on(mixer.as_ref(), 1.0, 1.0));
        assert_eq!(sample.voice(), None);
        assert_eq!(sample.pad(), Some(3));
        Ok(())
    }

    #[test]
    fn test_unload_releases_the_voice_and_audio() -> Result<(), Box<dyn Error>> {
        let mixer = make_mixer()?;
        let mock = mixer.to_mock()?;

        let mut sample = make_sample(0, 36);
        assert!(sample.note_on(mixer.as_ref(), 1.0, 1.0));
        sample.unload(mixer.as_ref());

        assert!(!mock.playing(0));
        assert!(mock.wave(0).is_none());
        assert!(!sample.note_on(mixer.as_ref(), 1.0, 1.0));
        Ok(())
    }
}
