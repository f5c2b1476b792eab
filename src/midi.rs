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
use std::{error::Error, fmt, sync::Arc};

use midly::{live::LiveEvent, num::u4, num::u7, MidiMessage};

mod midir;
mod mock;

/// A MIDI message the machine reacts to. Everything else is carried as raw
/// bytes so that thru can forward it untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    ProgramChange { program: u8 },
    Other(Vec<u8>),
}

/// A MIDI transport bound to one device. Incoming traffic is filtered to
/// the configured channel; everything on other channels is dropped.
pub trait Transport: fmt::Display + Send + Sync {
    /// Receives the next message on the configured channel, if any.
    fn receive(&self) -> Option<Message>;

    /// Sends a message on the configured channel.
    fn send(&self, message: &Message) -> Result<(), Box<dyn Error>>;

    /// Sets the MIDI channel (1-16).
    fn set_channel(&self, channel: u8);

    /// Returns the MIDI channel (1-16).
    fn channel(&self) -> u8;

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<mock::Transport>, Box<dyn Error>>;
}

/// Lists devices known to midir.
pub fn list_devices() -> Result<Vec<String>, Box<dyn Error>> {
    midir::list()
}

/// Gets a transport for the device with the given name. Names prefixed with
/// "mock" produce a mock transport.
pub fn get_transport(name: &str) -> Result<Arc<dyn Transport>, Box<dyn Error>> {
    if name.starts_with("mock") {
        return Ok(Arc::new(mock::Transport::get(name)));
    }

    Ok(Arc::new(midir::get(name)?))
}

/// Decodes a raw MIDI event into its channel (0-15) and message. Events
/// without a channel are dropped.
fn decode(raw: &[u8]) -> Option<(u8, Message)> {
    let (channel, message) = match LiveEvent::parse(raw) {
        Ok(LiveEvent::Midi { channel, message }) => (channel, message),
        _ => return None,
    };

    let message = match message {
        MidiMessage::NoteOn { key, vel } => Message::NoteOn {
            note: key.as_int(),
            velocity: vel.as_int(),
        },
        MidiMessage::NoteOff { key, .. } => Message::NoteOff { note: key.as_int() },
        MidiMessage::ProgramChange { program } => Message::ProgramChange {
            program: program.as_int(),
        },
        _ => Message::Other(raw.to_vec()),
    };

    Some((channel.as_int(), message))
}

/// Encodes a message for the given channel (0-15) into raw MIDI bytes.
fn encode(channel: u8, message: &Message) -> Result<Vec<u8>, Box<dyn Error>> {
    let message = match message {
        Message::NoteOn { note, velocity } => MidiMessage::NoteOn {
            key: u7::from_int_lossy(*note),
            vel: u7::from_int_lossy(*velocity),
        },
        Message::NoteOff { note } => MidiMessage::NoteOff {
            key: u7::from_int_lossy(*note),
            vel: u7::from(0),
        },
        Message::ProgramChange { program } => MidiMessage::ProgramChange {
            program: u7::from_int_lossy(*program),
        },
        // Raw events already carry their channel.
        Message::Other(raw) => return Ok(raw.clone()),
    };
    let event = LiveEvent::Midi {
        channel: u4::from_int_lossy(channel),
        message,
    };

    let mut buf: Vec<u8> = Vec::with_capacity(8);
    event.write(&mut buf)?;
    Ok(buf)
}
