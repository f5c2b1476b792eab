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
use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

use parking_lot::Mutex;

/// A mock panel, driven explicitly from tests.
#[derive(Clone)]
pub struct Panel {
    position: Arc<AtomicI64>,
    releases: Arc<Mutex<usize>>,
}

impl Panel {
    /// Gets the given mock panel.
    pub fn get(_name: &str) -> Panel {
        Panel {
            position: Arc::new(AtomicI64::new(0)),
            releases: Arc::new(Mutex::new(0)),
        }
    }

    /// Turns the encoder by the given number of detents.
    #[cfg(test)]
    pub fn turn(&self, detents: i64) {
        self.position.fetch_add(detents, Ordering::Relaxed);
    }

    /// Queues a button push.
    #[cfg(test)]
    pub fn push(&self) {
        *self.releases.lock() += 1;
    }
}

impl super::Panel for Panel {
    fn position(&mut self) -> i64 {
        self.position.load(Ordering::Relaxed)
    }

    fn take_release(&mut self) -> bool {
        let mut releases = self.releases.lock();
        if *releases > 0 {
            *releases -= 1;
            true
        } else {
            false
        }
    }
}
