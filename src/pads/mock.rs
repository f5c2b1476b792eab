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
use std::{collections::VecDeque, sync::Arc};

use parking_lot::Mutex;

use crate::color::Rgb;
use crate::pads::{Edge, PadEvent, MAX_PAD};

/// A mock pad grid. Emits only what tests queue and records LED writes.
#[derive(Clone)]
pub struct Pads {
    events: Arc<Mutex<VecDeque<PadEvent>>>,
    pixels: Arc<Mutex<Vec<Rgb>>>,
}

impl Pads {
    /// Gets the given mock pad grid.
    pub fn get(_name: &str) -> Pads {
        Pads {
            events: Arc::new(Mutex::new(VecDeque::new())),
            pixels: Arc::new(Mutex::new(vec![Rgb::OFF; MAX_PAD])),
        }
    }

    /// Queues a pad press.
    #[cfg(test)]
    pub fn press(&self, pad: u8) {
        self.events.lock().push_back(PadEvent {
            pad,
            edge: Edge::Rising,
        });
    }

    /// Queues a pad release.
    #[cfg(test)]
    pub fn release(&self, pad: u8) {
        self.events.lock().push_back(PadEvent {
            pad,
            edge: Edge::Falling,
        });
    }

    /// Clears all recorded LED writes back to off.
    #[cfg(test)]
    pub fn pixels_reset(&self) {
        let mut pixels = self.pixels.lock();
        pixels.iter_mut().for_each(|pixel| *pixel = Rgb::OFF);
    }

    /// Returns the last written color of a pad LED.
    #[cfg(test)]
    pub fn pixel(&self, pad: u8) -> Rgb {
        self.pixels
            .lock()
            .get(usize::from(pad))
            .copied()
            .unwrap_or(Rgb::OFF)
    }
}

impl super::Pads for Pads {
    fn drain(&mut self) -> Vec<PadEvent> {
        self.events.lock().drain(..).collect()
    }

    fn set_pixel(&mut self, pad: u8, color: Rgb) {
        let mut pixels = self.pixels.lock();
        if let Some(pixel) = pixels.get_mut(usize::from(pad)) {
            *pixel = color;
        }
    }
}
