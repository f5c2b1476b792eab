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

pub mod console;
pub mod mock;

/// The number of menu rows the display shows at once.
pub const ROWS: usize = 3;

/// One rendered menu row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    /// The item name, drawn on the left.
    pub name: String,

    /// The item value, drawn on the right.
    pub value: String,

    /// Whether the row is drawn inverted.
    pub inverted: bool,
}

/// The menu display.
pub trait Display: Send {
    /// Shows a boot message, replacing the menu contents.
    fn splash(&mut self, text: &str) -> Result<(), Box<dyn Error>>;

    /// Draws the menu window. Empty slots are cleared.
    fn draw(&mut self, rows: &[Option<Row>; ROWS]) -> Result<(), Box<dyn Error>>;
}

/// A display backed by nothing.
struct NullDisplay {}

impl Display for NullDisplay {
    fn splash(&mut self, _: &str) -> Result<(), Box<dyn Error>> {
        Ok(())
    }

    fn draw(&mut self, _: &[Option<Row>; ROWS]) -> Result<(), Box<dyn Error>> {
        Ok(())
    }
}

/// Gets the display with the given name. Names prefixed with "mock"
/// produce a mock display.
pub fn get_display(name: &str) -> Result<Box<dyn Display>, Box<dyn Error>> {
    if name.starts_with("mock") {
        return Ok(Box::new(mock::Display::get(name)));
    }

    match name {
        "console" => Ok(Box::new(console::Display::new())),
        "none" => Ok(Box::new(NullDisplay {})),
        _ => Err(format!("no display found with name {}", name).into()),
    }
}
