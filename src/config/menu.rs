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
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::error::ConfigError;

/// The menu definition used when no menu document is present.
const DEFAULT_MENU: &str = r#"{
    "key": "root",
    "name": "drumpad",
    "type": "group",
    "items": [
        {"key": "patch", "name": "Patch", "type": "selector", "items": []},
        {"key": "volume", "name": "Volume", "type": "number", "value": 100, "min": 0, "max": 100},
        {"key": "midi", "name": "MIDI", "type": "group", "items": [
            {"key": "midi_channel", "name": "Channel", "type": "number", "value": 10, "min": 1, "max": 16},
            {"key": "midi_thru", "name": "Thru", "type": "bool", "value": false}
        ]}
    ]
}"#;

/// A JSON representation of one menu tree node. The `type` field selects
/// the variant; groups nest, everything else is a leaf.
#[derive(Deserialize, Clone, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemConfig {
    Group {
        key: String,
        name: String,
        #[serde(default)]
        items: Vec<ItemConfig>,
    },
    String {
        key: String,
        name: String,
        #[serde(default)]
        value: String,
    },
    Bool {
        key: String,
        name: String,
        #[serde(default)]
        value: bool,
    },
    Number {
        key: String,
        name: String,
        #[serde(default)]
        value: i64,
        min: Option<i64>,
        max: Option<i64>,
    },
    Selector {
        key: String,
        name: String,
        #[serde(default)]
        items: Vec<String>,
        value: Option<String>,
    },
}

impl ItemConfig {
    /// Returns the built-in menu definition.
    pub fn default_menu() -> ItemConfig {
        serde_json::from_str(DEFAULT_MENU).expect("built-in menu definition must parse")
    }
}

/// Reads a menu definition document. The root node must be a group.
pub fn read_menu(path: &Path) -> Result<ItemConfig, ConfigError> {
    let menu: ItemConfig = serde_json::from_str(&fs::read_to_string(path)?)?;
    match menu {
        ItemConfig::Group { .. } => Ok(menu),
        _ => Err(ConfigError::MenuRootNotGroup),
    }
}
