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
use serde::Deserialize;

/// A JSON representation of one patch, a loadable set of samples.
#[derive(Deserialize, Clone, Debug)]
pub struct PatchConfig {
    /// The display name shown in the patch selector.
    name: Option<String>,

    /// The MIDI program number that selects this patch.
    program: Option<u8>,

    /// The samples making up this patch.
    samples: Option<Vec<SampleConfig>>,
}

impl PatchConfig {
    /// Gets the display name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Gets the MIDI program number.
    #[allow(dead_code)]
    pub fn program(&self) -> Option<u8> {
        self.program
    }

    /// Gets the sample list. `None` when the document lacks one, which a
    /// patch load treats as a failure.
    pub fn samples(&self) -> Option<&[SampleConfig]> {
        self.samples.as_deref()
    }
}

#[cfg(test)]
impl PatchConfig {
    /// Creates a new patch config (test only).
    pub fn new(
        name: Option<String>,
        program: Option<u8>,
        samples: Option<Vec<SampleConfig>>,
    ) -> Self {
        Self {
            name,
            program,
            samples,
        }
    }
}

/// A JSON representation of one sample within a patch.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SampleConfig {
    /// The WAV file backing this sample.
    file: Option<String>,

    /// The MIDI note that triggers this sample.
    #[serde(default)]
    note: u8,

    /// The pad this sample is bound to, or -1 for unassigned.
    #[serde(default = "default_pad")]
    pad: i32,

    /// The pad LED color name.
    color: Option<String>,

    /// Gain multiplier at full velocity.
    #[serde(default = "default_level")]
    level: f32,

    /// Gain floor added to the velocity-scaled level.
    #[serde(default)]
    min_level: f32,

    /// Stereo position in [-1, 1].
    #[serde(default)]
    pan: f32,

    /// Whether playback loops until explicitly stopped.
    #[serde(default, rename = "loop")]
    looping: bool,

    /// Whether a Note Off stops playback.
    #[serde(default, rename = "noteOff")]
    stop_on_note_off: bool,
}

fn default_pad() -> i32 {
    -1
}

fn default_level() -> f32 {
    1.0
}

impl SampleConfig {
    /// Gets the backing file.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Gets the trigger note.
    pub fn note(&self) -> u8 {
        self.note
    }

    /// Gets the bound pad. Out-of-range document values mean unassigned.
    pub fn pad(&self) -> Option<u8> {
        if (0..=i32::from(u8::MAX)).contains(&self.pad) {
            Some(self.pad as u8)
        } else {
            None
        }
    }

    /// Gets the configured color name.
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    /// Gets the gain multiplier.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Gets the gain floor.
    pub fn min_level(&self) -> f32 {
        self.min_level
    }

    /// Gets the stereo position.
    pub fn pan(&self) -> f32 {
        self.pan
    }

    /// Gets whether playback loops.
    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Gets whether a Note Off stops playback.
    pub fn stop_on_note_off(&self) -> bool {
        self.stop_on_note_off
    }
}

#[cfg(test)]
impl SampleConfig {
    /// Creates a new sample config (test only).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        file: Option<String>,
        note: u8,
        pad: i32,
        color: Option<String>,
        level: f32,
        min_level: f32,
        pan: f32,
        looping: bool,
        stop_on_note_off: bool,
    ) -> Self {
        Self {
            file,
            note,
            pad,
            color,
            level,
            min_level,
            pan,
            looping,
            stop_on_note_off,
        }
    }

    /// Creates a minimal sample config bound to a note and pad (test only).
    pub fn simple(file: &str, note: u8, pad: i32) -> Self {
        Self::new(
            Some(file.to_string()),
            note,
            pad,
            None,
            1.0,
            0.0,
            0.0,
            false,
            false,
        )
    }
}
