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
use std::{
    collections::VecDeque,
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use tracing::debug;

use crate::config::DEFAULT_MIDI_CHANNEL;
use crate::midi::Message;

/// A mock transport. Receives only what was queued and records every send.
#[derive(Clone)]
pub struct Transport {
    name: String,
    channel: Arc<AtomicU8>,
    incoming: Arc<Mutex<VecDeque<(u8, Message)>>>,
    sent: Arc<Mutex<Vec<Message>>>,
}

impl Transport {
    /// Gets the given mock transport.
    pub fn get(name: &str) -> Transport {
        Transport {
            name: name.to_string(),
            channel: Arc::new(AtomicU8::new(DEFAULT_MIDI_CHANNEL)),
            incoming: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues an incoming message on the given channel (1-16).
    #[cfg(test)]
    pub fn push(&self, channel: u8, message: Message) {
        self.incoming.lock().push_back((channel, message));
    }

    /// Returns the messages sent so far.
    #[cfg(test)]
    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().clone()
    }
}

impl super::Transport for Transport {
    fn receive(&self) -> Option<Message> {
        let channel = self.channel.load(Ordering::Relaxed);
        let mut incoming = self.incoming.lock();
        while let Some((event_channel, message)) = incoming.pop_front() {
            if event_channel == channel {
                return Some(message);
            }
        }
        None
    }

    fn send(&self, message: &Message) -> Result<(), Box<dyn Error>> {
        debug!(
            device = self.name,
            event = format!("{:?}", message),
            "Sending event."
        );
        self.sent.lock().push(message.clone());
        Ok(())
    }

    fn set_channel(&self, channel: u8) {
        self.channel.store(channel.clamp(1, 16), Ordering::Relaxed);
    }

    fn channel(&self) -> u8 {
        self.channel.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<Transport>, Box<dyn Error>> {
        Ok(Arc::new(self.clone()))
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
