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
    collections::HashMap,
    error::Error,
    fmt,
    sync::atomic::{AtomicU8, Ordering},
};

use crossbeam_channel::Receiver;
use midir::{MidiInput, MidiInputConnection, MidiInputPort, MidiOutput, MidiOutputConnection, MidiOutputPort};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::DEFAULT_MIDI_CHANNEL;
use crate::midi::Message;

/// A transport over a midir device.
pub struct Transport {
    name: String,
    channel: AtomicU8,
    has_input: bool,
    receiver: Receiver<(u8, Message)>,
    output: Mutex<Option<MidiOutputConnection>>,
    // Dropping the connection stops the input callback. The Mutex is only
    // there to keep the transport Sync.
    _input: Mutex<Option<MidiInputConnection<()>>>,
}

/// The input and output ports sharing one device name.
struct Ports {
    name: String,
    input: Option<MidiInputPort>,
    output: Option<MidiOutputPort>,
}

impl fmt::Display for Ports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut capabilities: Vec<String> = Vec::new();
        if self.input.is_some() {
            capabilities.push(String::from("Input"));
        }
        if self.output.is_some() {
            capabilities.push(String::from("Output"));
        }

        write!(f, "{} ({})", self.name, capabilities.join("/"))
    }
}

/// Lists midir devices.
pub fn list() -> Result<Vec<String>, Box<dyn Error>> {
    let input = MidiInput::new("drumpad input listing")?;
    let output = MidiOutput::new("drumpad output listing")?;
    Ok(merge_ports(&input, &output)?
        .into_iter()
        .map(|ports| ports.to_string())
        .collect())
}

/// Merges input and output ports by device name.
fn merge_ports(input: &MidiInput, output: &MidiOutput) -> Result<Vec<Ports>, Box<dyn Error>> {
    let mut devices: HashMap<String, Ports> = HashMap::new();

    for port in input.ports() {
        let name = input.port_name(&port)?;
        devices.entry(name.clone()).or_insert(Ports {
            name,
            input: None,
            output: None,
        }).input = Some(port);
    }

    for port in output.ports() {
        let name = output.port_name(&port)?;
        devices.entry(name.clone()).or_insert(Ports {
            name,
            input: None,
            output: None,
        }).output = Some(port);
    }

    let mut sorted_devices = devices
        .into_iter()
        .map(|entry| entry.1)
        .collect::<Vec<Ports>>();
    sorted_devices.sort_by_key(|ports| ports.name.clone());
    Ok(sorted_devices)
}

/// Gets a transport for the given midir device.
pub fn get(name: &str) -> Result<Transport, Box<dyn Error>> {
    let input = MidiInput::new("drumpad input")?;
    let output = MidiOutput::new("drumpad output")?;

    let mut matches = merge_ports(&input, &output)?
        .into_iter()
        .filter(|ports| ports.name.contains(name))
        .collect::<Vec<Ports>>();

    if matches.is_empty() {
        return Err(format!("no device found with name {}", name).into());
    }
    if matches.len() > 1 {
        return Err(format!(
            "found too many devices that match ({}), use a less ambiguous device name",
            matches
                .iter()
                .map(|ports| ports.name.clone())
                .collect::<Vec<String>>()
                .join(", ")
        )
        .into());
    }

    let ports = matches.swap_remove(0);
    let (sender, receiver) = crossbeam_channel::unbounded();

    let input_connection = match ports.input.as_ref() {
        Some(port) => Some(input.connect(
            port,
            "drumpad input watcher",
            move |_, raw_event, _| {
                if let Some((channel, message)) = super::decode(raw_event) {
                    debug!(
                        event = format!("{:?}", message),
                        channel = channel + 1,
                        "Received MIDI event."
                    );
                    if let Err(e) = sender.send((channel, message)) {
                        error!(
                            err = format!("{:?}", e),
                            "Error sending MIDI event to receiver."
                        );
                    }
                }
            },
            (),
        )?),
        None => {
            warn!(
                device = ports.name,
                "No MIDI input port, events will not be received."
            );
            None
        }
    };

    let output_connection = match ports.output.as_ref() {
        Some(port) => Some(output.connect(port, "drumpad output")?),
        None => {
            warn!(device = ports.name, "No MIDI output port, cannot send events.");
            None
        }
    };

    info!(device = ports.name, "Connected MIDI device.");

    Ok(Transport {
        name: ports.name,
        channel: AtomicU8::new(DEFAULT_MIDI_CHANNEL),
        has_input: input_connection.is_some(),
        receiver,
        output: Mutex::new(output_connection),
        _input: Mutex::new(input_connection),
    })
}

impl super::Transport for Transport {
    fn receive(&self) -> Option<Message> {
        let channel = self.channel.load(Ordering::Relaxed).saturating_sub(1);
        while let Ok((event_channel, message)) = self.receiver.try_recv() {
            if event_channel == channel {
                return Some(message);
            }
        }
        None
    }

    fn send(&self, message: &Message) -> Result<(), Box<dyn Error>> {
        let mut output = self.output.lock();
        let connection = match output.as_mut() {
            Some(connection) => connection,
            None => {
                warn!("No MIDI output port configured, cannot send event.");
                return Ok(());
            }
        };

        let channel = self.channel.load(Ordering::Relaxed).saturating_sub(1);
        let buf = super::encode(channel, message)?;
        connection.send(&buf)?;
        Ok(())
    }

    fn set_channel(&self, channel: u8) {
        self.channel.store(channel.clamp(1, 16), Ordering::Relaxed);
    }

    fn channel(&self) -> u8 {
        self.channel.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<std::sync::Arc<super::mock::Transport>, Box<dyn Error>> {
        Err("this is not a mock transport".into())
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut capabilities: Vec<String> = Vec::new();
        if self.has_input {
            capabilities.push(String::from("Input"));
        }
        if self.output.lock().is_some() {
            capabilities.push(String::from("Output"));
        }

        write!(f, "{} ({})", self.name, capabilities.join("/"))
    }
}
