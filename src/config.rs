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

//! The configuration store.
//!
//! Settings are read from layered JSON documents merged in a fixed priority
//! order: a local baseline first, then an optional removable-media overlay.
//! The merge is recursive and order-sensitive:
//!
//! - object keys merge recursively,
//! - array values from a later document are appended to the earlier ones,
//! - scalars from a later document overwrite.
//!
//! Reads go through typed getters with compiled-in defaults. The few
//! mutable settings (volume, MIDI channel, MIDI thru) have validated
//! setters that only touch paths the documents already define and never
//! persist back to disk.

use std::fs;
use std::path::Path;

use serde_json::{json, Map, Value};
use tracing::info;

pub mod error;
pub mod menu;
pub mod patch;

use self::error::ConfigError;
use self::patch::PatchConfig;

/// Default audio mix buffer size in frames.
pub const DEFAULT_BUFFER_SIZE: u32 = 1024;
/// Default audio engine sample rate.
pub const DEFAULT_RATE: u32 = 22050;
/// Default audio output type.
pub const DEFAULT_OUTPUT: &str = "i2s";
/// Default global volume.
pub const DEFAULT_VOLUME: f32 = 1.0;
/// Default MIDI channel (1-indexed).
pub const DEFAULT_MIDI_CHANNEL: u8 = 10;
/// Default MIDI thru behavior.
pub const DEFAULT_MIDI_THRU: bool = false;

/// The merged configuration store.
pub struct Store {
    data: Map<String, Value>,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Store {
        Store { data: Map::new() }
    }

    /// Reads a JSON document and merges it over the current contents. When
    /// a file prefix is given, every sample file reference in the document
    /// is rewritten relative to it before the merge, so overlay documents
    /// resolve their samples against their own mount point.
    pub fn read_file(&mut self, path: &Path, file_prefix: Option<&Path>) -> Result<(), ConfigError> {
        let document: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
        let mut document = match document {
            Value::Object(map) => map,
            _ => return Err(ConfigError::NotAnObject),
        };

        if let Some(prefix) = file_prefix {
            prefix_sample_files(&mut document, prefix);
        }

        self.merge_document(document);
        info!(path = %path.display(), "Merged configuration document.");
        Ok(())
    }

    /// Merges a parsed document over the current contents.
    pub fn merge_document(&mut self, document: Map<String, Value>) {
        merge(&mut self.data, document);
    }

    fn get(&self, group: &str, key: &str) -> Option<&Value> {
        self.data.get(group)?.get(key)
    }

    /// Sets a value on an existing `group.key` path. Refuses to create
    /// paths the documents never defined.
    fn set(&mut self, group: &str, key: &str, value: Value) -> bool {
        match self.data.get_mut(group).and_then(Value::as_object_mut) {
            Some(group) if group.contains_key(key) => {
                group.insert(key.to_string(), value);
                true
            }
            _ => false,
        }
    }

    /// Gets the audio mix buffer size in frames.
    pub fn audio_buffer_size(&self) -> u32 {
        self.get("audio", "bufferSize")
            .and_then(Value::as_u64)
            .map(|size| size as u32)
            .unwrap_or(DEFAULT_BUFFER_SIZE)
    }

    /// Gets the audio engine sample rate.
    pub fn audio_rate(&self) -> u32 {
        self.get("audio", "rate")
            .and_then(Value::as_u64)
            .map(|rate| rate as u32)
            .unwrap_or(DEFAULT_RATE)
    }

    /// Gets the configured audio output type.
    pub fn audio_output(&self) -> String {
        self.get("audio", "output")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_OUTPUT)
            .to_string()
    }

    /// Gets the global volume in [0, 1].
    pub fn audio_volume(&self) -> f32 {
        self.get("audio", "volume")
            .and_then(Value::as_f64)
            .map(|volume| volume as f32)
            .unwrap_or(DEFAULT_VOLUME)
    }

    /// Sets the global volume. Values outside [0, 1] are rejected and the
    /// stored volume is left unchanged.
    pub fn set_audio_volume(&mut self, volume: f32) -> bool {
        if !(0.0..=1.0).contains(&volume) {
            return false;
        }
        self.set("audio", "volume", json!(volume))
    }

    /// Gets the MIDI channel (1-indexed).
    pub fn midi_channel(&self) -> u8 {
        self.get("midi", "channel")
            .and_then(Value::as_u64)
            .map(|channel| channel as u8)
            .unwrap_or(DEFAULT_MIDI_CHANNEL)
    }

    /// Sets the MIDI channel. Values outside 1..=16 are rejected.
    pub fn set_midi_channel(&mut self, channel: u8) -> bool {
        if !(1..=16).contains(&channel) {
            return false;
        }
        self.set("midi", "channel", json!(channel))
    }

    /// Gets whether incoming MIDI is forwarded to the output.
    pub fn midi_thru(&self) -> bool {
        self.get("midi", "thru")
            .and_then(Value::as_bool)
            .unwrap_or(DEFAULT_MIDI_THRU)
    }

    /// Sets the MIDI thru behavior.
    pub fn set_midi_thru(&mut self, thru: bool) -> bool {
        self.set("midi", "thru", json!(thru))
    }

    fn patches(&self) -> &[Value] {
        match self.data.get("patches").and_then(Value::as_array) {
            Some(patches) => patches,
            None => &[],
        }
    }

    /// Gets the number of patches in the merged configuration.
    pub fn patch_count(&self) -> usize {
        self.patches().len()
    }

    /// Gets the patch at the given index as a typed record.
    pub fn patch(&self, index: usize) -> Result<PatchConfig, ConfigError> {
        let patch = self
            .patches()
            .get(index)
            .ok_or(ConfigError::NoSuchPatch(index))?;
        serde_json::from_value(patch.clone())
            .map_err(|source| ConfigError::InvalidPatch { index, source })
    }

    /// Finds the index of the patch declaring the given MIDI program
    /// number.
    pub fn program_index(&self, program: u8) -> Option<usize> {
        self.patches().iter().position(|patch| {
            patch.get("program").and_then(Value::as_u64) == Some(u64::from(program))
        })
    }

    /// Gets the patch selector items: each patch's name, or its index when
    /// unnamed.
    pub fn patch_names(&self) -> Vec<String> {
        self.patches()
            .iter()
            .enumerate()
            .map(|(index, patch)| match patch.get("name").and_then(Value::as_str) {
                Some(name) => name.to_string(),
                None => index.to_string(),
            })
            .collect()
    }
}

impl Default for Store {
    fn default() -> Self {
        Store::new()
    }
}

/// Merges one document level into another. Objects recurse, arrays append,
/// scalars overwrite. A container arriving over a scalar replaces it.
fn merge(target: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (key, value) in incoming {
        match value {
            Value::Object(map) => {
                let slot = target
                    .entry(key)
                    .or_insert_with(|| Value::Object(Map::new()));
                if !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                if let Value::Object(target_map) = slot {
                    merge(target_map, map);
                }
            }
            Value::Array(items) => {
                let slot = target.entry(key).or_insert_with(|| Value::Array(Vec::new()));
                match slot {
                    Value::Array(existing) => existing.extend(items),
                    slot => *slot = Value::Array(items),
                }
            }
            value => {
                target.insert(key, value);
            }
        }
    }
}

/// Rewrites every `patches[i].samples[j].file` with the given prefix.
fn prefix_sample_files(document: &mut Map<String, Value>, prefix: &Path) {
    let patches = match document.get_mut("patches").and_then(Value::as_array_mut) {
        Some(patches) => patches,
        None => return,
    };

    for patch in patches {
        let samples = match patch.get_mut("samples").and_then(Value::as_array_mut) {
            Some(samples) => samples,
            None => continue,
        };
        for sample in samples {
            if let Some(Value::String(file)) = sample.get_mut("file") {
                if !file.is_empty() {
                    *file = prefix.join(&*file).to_string_lossy().into_owned();
                }
            }
        }
    }
}
