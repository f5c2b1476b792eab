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

//! Pad LED colors.

/// An 8-bit RGB triple as written to the pad LEDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const YELLOW: Rgb = Rgb(255, 150, 0);
    pub const GREEN: Rgb = Rgb(0, 255, 0);
    pub const CYAN: Rgb = Rgb(0, 255, 255);
    pub const BLUE: Rgb = Rgb(0, 0, 255);
    pub const PURPLE: Rgb = Rgb(180, 0, 255);
    pub const GRAY: Rgb = Rgb(150, 150, 150);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// The idle state of an unassigned pad.
    pub const OFF: Rgb = Rgb::BLACK;
    /// Samples with no configured color fall back to this.
    pub const DEFAULT: Rgb = Rgb::RED;
    /// Drawn over a pad while it is held down.
    pub const ACTIVE: Rgb = Rgb::WHITE;

    /// Parses a color name from a configuration document. Unrecognized
    /// names produce the default color.
    pub fn parse(name: &str) -> Rgb {
        match name.to_lowercase().as_str() {
            "black" => Rgb::BLACK,
            "red" => Rgb::RED,
            "yellow" => Rgb::YELLOW,
            "green" => Rgb::GREEN,
            "cyan" => Rgb::CYAN,
            "blue" => Rgb::BLUE,
            "purple" => Rgb::PURPLE,
            "gray" => Rgb::GRAY,
            "white" => Rgb::WHITE,
            _ => Rgb::DEFAULT,
        }
    }

    /// Returns the half-intensity tint used for idle pads.
    pub fn half(self) -> Rgb {
        Rgb(self.0 / 2, self.1 / 2, self.2 / 2)
    }
}
