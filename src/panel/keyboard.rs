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
use std::{io, mem, thread};

use crossbeam_channel::{Receiver, Sender};
use tracing::{error, info, warn};

const CLOCKWISE: &str = "+";
const COUNTER_CLOCKWISE: &str = "-";

/// A panel emulated on the keyboard. A line turns the encoder, an empty
/// line pushes the button.
pub struct Panel {
    receiver: Receiver<Event>,
    position: i64,
    release: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Event {
    Step(i64),
    Release,
}

impl Panel {
    pub fn new() -> Panel {
        let (sender, receiver) = crossbeam_channel::unbounded();
        thread::spawn(move || {
            info!("Keyboard panel started.");

            loop {
                if let Err(e) = Panel::monitor_io(&sender, io::stdin().lock(), io::stdout()) {
                    error!("Error reading panel input: {}", e);
                    return;
                }
            }
        });

        Panel {
            receiver,
            position: 0,
            release: false,
        }
    }

    fn monitor_io<R, W>(events_tx: &Sender<Event>, mut reader: R, mut writer: W) -> Result<(), io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(
            writer,
            "Menu ({} clockwise, {} counter-clockwise, empty line pushes): ",
            CLOCKWISE, COUNTER_CLOCKWISE,
        )?;
        writer.flush()?;
        let mut input: String = String::default();
        if reader.read_line(&mut input)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
        }

        let event = match input.trim() {
            "" => Event::Release,
            CLOCKWISE => Event::Step(1),
            COUNTER_CLOCKWISE => Event::Step(-1),
            token => match token.parse::<i64>() {
                Ok(steps) => Event::Step(steps),
                Err(_) => {
                    warn!(input = token, "Unrecognized input");
                    return Ok(());
                }
            },
        };

        events_tx
            .send(event)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(())
    }

    /// Folds pending input events into the panel state.
    fn pump(&mut self) {
        while let Ok(event) = self.receiver.try_recv() {
            match event {
                Event::Step(steps) => self.position += steps,
                Event::Release => self.release = true,
            }
        }
    }
}

impl super::Panel for Panel {
    fn position(&mut self) -> i64 {
        self.pump();
        self.position
    }

    fn take_release(&mut self) -> bool {
        self.pump();
        mem::take(&mut self.release)
    }
}
