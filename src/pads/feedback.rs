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

//! LED feedback for the pad grid.
//!
//! A held pad shows a white press overlay. The sample colors keep flowing
//! into a shadow buffer underneath, and the shadow is restored on release.

use crate::color::Rgb;
use crate::pads::{Pads, MAX_PAD};

/// The shadow state of the pad LEDs.
pub struct Feedback {
    /// The intended color of each pad.
    shadow: Vec<Rgb>,
    /// True while a press overlay hides the shadow.
    overlaid: Vec<bool>,
}

impl Feedback {
    pub fn new() -> Feedback {
        Feedback {
            shadow: vec![Rgb::OFF; MAX_PAD],
            overlaid: vec![false; MAX_PAD],
        }
    }

    /// Sets the color of a pad. The write is skipped while the pad shows a
    /// press overlay or when the color is unchanged. Forced writes go
    /// through regardless and clear the overlay.
    pub fn set(&mut self, pads: &mut dyn Pads, pad: u8, color: Rgb, force: bool) {
        let index = usize::from(pad);
        if index >= self.shadow.len() {
            return;
        }

        let changed = self.shadow[index] != color;
        self.shadow[index] = color;

        if force {
            self.overlaid[index] = false;
            pads.set_pixel(pad, color);
        } else if !self.overlaid[index] && changed {
            pads.set_pixel(pad, color);
        }
    }

    /// Shows the press overlay on a pad.
    pub fn press(&mut self, pads: &mut dyn Pads, pad: u8) {
        let index = usize::from(pad);
        if index >= self.shadow.len() {
            return;
        }

        self.overlaid[index] = true;
        pads.set_pixel(pad, Rgb::ACTIVE);
    }

    /// Removes the press overlay and restores the shadow color.
    pub fn release(&mut self, pads: &mut dyn Pads, pad: u8) {
        let index = usize::from(pad);
        if index >= self.shadow.len() {
            return;
        }

        self.overlaid[index] = false;
        pads.set_pixel(pad, self.shadow[index]);
    }
}

impl Default for Feedback {
    fn default() -> Feedback {
        Feedback::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pads::test;

    #[test]
    fn test_set_writes_through() {
        let mut pads = test::Pads::get("mock");
        let handle = pads.clone();
        let mut feedback = Feedback::new();

        feedback.set(&mut pads, 3, Rgb::RED, false);
        assert_eq!(handle.pixel(3), Rgb::RED);
    }

    #[test]
    fn test_set_skips_unchanged_color() {
        let mut pads = test::Pads::get("mock");
        let handle = pads.clone();
        let mut feedback = Feedback::new();

        feedback.set(&mut pads, 3, Rgb::RED, false);
        handle.pixels_reset();
        feedback.set(&mut pads, 3, Rgb::RED, false);
        assert_eq!(handle.pixel(3), Rgb::OFF);
    }

    #[test]
    fn test_overlay_suppresses_writes() {
        let mut pads = test::Pads::get("mock");
        let handle = pads.clone();
        let mut feedback = Feedback::new();

        feedback.set(&mut pads, 5, Rgb::RED, false);
        feedback.press(&mut pads, 5);
        assert_eq!(handle.pixel(5), Rgb::ACTIVE);

        // Shadow keeps updating underneath the overlay.
        feedback.set(&mut pads, 5, Rgb::GREEN, false);
        assert_eq!(handle.pixel(5), Rgb::ACTIVE);

        feedback.release(&mut pads, 5);
        assert_eq!(handle.pixel(5), Rgb::GREEN);
    }

    #[test]
    fn test_forced_set_clears_overlay() {
        let mut pads = test::Pads::get("mock");
        let handle = pads.clone();
        let mut feedback = Feedback::new();

        feedback.press(&mut pads, 2);
        feedback.set(&mut pads, 2, Rgb::BLUE, true);
        assert_eq!(handle.pixel(2), Rgb::BLUE);

        // The overlay is gone, so plain sets write again.
        feedback.set(&mut pads, 2, Rgb::CYAN, false);
        assert_eq!(handle.pixel(2), Rgb::CYAN);
    }

    #[test]
    fn test_out_of_range_pad_is_ignored() {
        let mut pads = test::Pads::get("mock");
        let mut feedback = Feedback::new();

        feedback.set(&mut pads, 200, Rgb::RED, true);
        feedback.press(&mut pads, 200);
        feedback.release(&mut pads, 200);
    }
}
