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
use std::error::Error;

use tracing::info;

use crate::color::Rgb;

pub mod feedback;
pub mod mock;

/// The number of pads on the grid.
pub const MAX_PAD: usize = 16;

/// The edge of a pad transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    /// The pad was pressed.
    Rising,

    /// The pad was released.
    Falling,
}

/// A pad transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PadEvent {
    /// The pad index.
    pub pad: u8,

    /// The transition edge.
    pub edge: Edge,
}

/// A pad grid with addressable LEDs.
pub trait Pads: Send {
    /// Drains the pending pad transitions, oldest first.
    fn drain(&mut self) -> Vec<PadEvent>;

    /// Writes the color of one pad LED.
    fn set_pixel(&mut self, pad: u8, color: Rgb);
}

/// Pads backed by nothing. Used when no pad grid is attached.
struct NullPads {}

impl Pads for NullPads {
    fn drain(&mut self) -> Vec<PadEvent> {
        Vec::new()
    }

    fn set_pixel(&mut self, _: u8, _: Rgb) {}
}

/// Gets the pad grid with the given name. Names prefixed with "mock"
/// produce a mock grid.
pub fn get_pads(name: &str) -> Result<Box<dyn Pads>, Box<dyn Error>> {
    if name.starts_with("mock") {
        return Ok(Box::new(mock::Pads::get(name)));
    }

    match name {
        "none" => {
            info!("No pad grid attached.");
            Ok(Box::new(NullPads {}))
        }
        _ => Err(format!("no pad grid found with name {}", name).into()),
    }
}

#[cfg(test)]
pub mod test {
    pub use super::mock::Pads;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_pads() {
        assert!(get_pads("none").is_ok());
        assert!(get_pads("mock").is_ok());
        assert!(get_pads("trellis").is_err());
    }
}
