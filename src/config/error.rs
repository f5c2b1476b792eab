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

/// Typed error for configuration problems so callers can distinguish
/// recoverable document failures from the conditions that are fatal at
/// startup (no patches, unknown audio output).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("configuration root must be a JSON object")]
    NotAnObject,

    #[error("no patches or samples provided")]
    NoPatches,

    #[error("no patch at index {0}")]
    NoSuchPatch(usize),

    #[error("invalid patch at index {index}: {source}")]
    InvalidPatch {
        index: usize,
        source: serde_json::Error,
    },

    #[error("invalid audio output type: {0}")]
    InvalidOutput(String),

    #[error("menu definition root must be a group")]
    MenuRootNotGroup,
}
