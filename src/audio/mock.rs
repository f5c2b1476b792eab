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
use std::{fmt, sync::Arc};

use parking_lot::Mutex;

use crate::audio::{wave::WaveData, Mixer as AudioMixer, MAX_VOICES};

/// The state of one mock voice.
#[derive(Clone, Default)]
struct Voice {
    wave: Option<Arc<WaveData>>,
    looping: bool,
    level: f32,
    pan: f32,
    active: bool,
}

/// A mock mixer. Doesn't actually play anything.
#[derive(Clone)]
pub struct Mixer {
    name: String,
    voices: Arc<Mutex<Vec<Voice>>>,
}

impl Mixer {
    /// Gets the given mock mixer.
    pub fn get(name: &str) -> Mixer {
        Mixer {
            name: name.to_string(),
            voices: Arc::new(Mutex::new(vec![Voice::default(); MAX_VOICES])),
        }
    }

    /// Simulates a voice reaching the end of its data.
    #[cfg(test)]
    pub fn finish(&self, voice: usize) {
        let mut voices = self.voices.lock();
        if let Some(voice) = voices.get_mut(voice) {
            voice.active = false;
            voice.wave = None;
        }
    }

    /// Returns the wave a voice is playing.
    #[cfg(test)]
    pub fn wave(&self, voice: usize) -> Option<Arc<WaveData>> {
        self.voices.lock().get(voice).and_then(|voice| voice.wave.clone())
    }

    /// Returns the level of a voice.
    #[cfg(test)]
    pub fn level(&self, voice: usize) -> f32 {
        self.voices.lock().get(voice).map(|voice| voice.level).unwrap_or(0.0)
    }

    /// Returns the pan of a voice.
    #[cfg(test)]
    pub fn pan(&self, voice: usize) -> f32 {
        self.voices.lock().get(voice).map(|voice| voice.pan).unwrap_or(0.0)
    }

    /// Returns whether a voice is looping.
    #[cfg(test)]
    pub fn looping(&self, voice: usize) -> bool {
        self.voices
            .lock()
            .get(voice)
            .map(|voice| voice.looping)
            .unwrap_or(false)
    }
}

impl AudioMixer for Mixer {
    fn voice_count(&self) -> usize {
        self.voices.lock().len()
    }

    fn play(&self, voice: usize, wave: Arc<WaveData>, looping: bool) {
        let mut voices = self.voices.lock();
        if let Some(voice) = voices.get_mut(voice) {
            voice.wave = Some(wave);
            voice.looping = looping;
            voice.active = true;
        }
    }

    fn stop(&self, voice: usize) {
        let mut voices = self.voices.lock();
        if let Some(voice) = voices.get_mut(voice) {
            voice.active = false;
            voice.wave = None;
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
    fn to_mock(&self) -> Result<Arc<Mixer>, Box<dyn std::error::Error>> {
        Ok(Arc::new(self.clone()))
    }
}

impl fmt::Display for Mixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
