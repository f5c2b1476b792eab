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

pub mod keyboard;
pub mod mock;

/// The control panel: a detented rotary encoder and a push button.
pub trait Panel: Send {
    /// Returns the cumulative encoder position in detents.
    fn position(&mut self) -> i64;

    /// Takes a pending button release, if one occurred.
    fn take_release(&mut self) -> bool;
}

/// A panel backed by nothing.
struct NullPanel {}

impl Panel for NullPanel {
    fn position(&mut self) -> i64 {
        0
    }

    fn take_release(&mut self) -> bool {
        false
    }
}

/// Gets the panel with the given name. Names prefixed with "mock" produce
/// a mock panel.
pub fn get_panel(name: &str) -> Result<Box<dyn Panel>, Box<dyn Error>> {
    if name.starts_with("mock") {
        return Ok(Box::new(mock::Panel::get(name)));
    }

    match name {
        "keyboard" => Ok(Box::new(keyboard::Panel::new())),
        "none" => Ok(Box::new(NullPanel {})),
        _ => Err(format!("no panel found with name {}", name).into()),
    }
}

#[cfg(test)]
pub mod test {
    pub use super::mock::Panel;
}
