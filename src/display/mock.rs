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
use std::{error::Error, sync::Arc};

use parking_lot::Mutex;

use crate::display::{Row, ROWS};

/// A mock display. Records splashes and the last drawn frame.
#[derive(Clone)]
pub struct Display {
    splashes: Arc<Mutex<Vec<String>>>,
    frame: Arc<Mutex<Option<[Option<Row>; ROWS]>>>,
    draws: Arc<Mutex<usize>>,
}

impl Display {
    /// Gets the given mock display.
    pub fn get(_name: &str) -> Display {
        Display {
            splashes: Arc::new(Mutex::new(Vec::new())),
            frame: Arc::new(Mutex::new(None)),
            draws: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns the splash messages shown so far.
    #[cfg(test)]
    pub fn splashes(&self) -> Vec<String> {
        self.splashes.lock().clone()
    }

    /// Returns the last drawn frame.
    #[cfg(test)]
    pub fn frame(&self) -> Option<[Option<Row>; ROWS]> {
        self.frame.lock().clone()
    }

    /// Returns one row of the last drawn frame.
    #[cfg(test)]
    pub fn row(&self, index: usize) -> Option<Row> {
        self.frame
            .lock()
            .as_ref()
            .and_then(|frame| frame.get(index).cloned().flatten())
    }

    /// Returns the number of frames drawn so far.
    #[cfg(test)]
    pub fn draw_count(&self) -> usize {
        *self.draws.lock()
    }
}

impl super::Display for Display {
    fn splash(&mut self, text: &str) -> Result<(), Box<dyn Error>> {
        self.splashes.lock().push(text.to_string());
        Ok(())
    }

    fn draw(&mut self, rows: &[Option<Row>; ROWS]) -> Result<(), Box<dyn Error>> {
        *self.frame.lock() = Some(rows.clone());
        *self.draws.lock() += 1;
        Ok(())
    }
}
