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

//! The drum machine itself.
//!
//! [Machine] owns every collaborator and runs the poll loop. Each tick,
//! in fixed order: pad edges, menu input, the full pending MIDI backlog,
//! then LED reconciliation. All queued MIDI is applied before the LEDs
//! recompute, so a tick never shows a half-applied batch.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::audio::Mixer;
use crate::config::{menu::ItemConfig, Store};
use crate::display::Display;
use crate::menu::{self, Menu};
use crate::midi::{Message, Transport};
use crate::pads::{feedback::Feedback, Edge, Pads, MAX_PAD};
use crate::panel::Panel;
use crate::patch::Patch;

/// The poll interval.
const TICK: Duration = Duration::from_millis(20);

/// The application context. Owns the configuration, the loaded patch and
/// every device, and drives them from a single thread.
pub struct Machine {
    store: Store,
    mixer: Arc<dyn Mixer>,
    transport: Arc<dyn Transport>,
    pads: Box<dyn Pads>,
    panel: Box<dyn Panel>,
    display: Box<dyn Display>,
    menu: Menu,
    feedback: Feedback,
    patch: Patch,

    /// Whether any voice was sounding at the end of the last tick.
    playing: bool,
}

impl Machine {
    /// Creates a machine from its collaborators.
    pub fn new(
        store: Store,
        mixer: Arc<dyn Mixer>,
        transport: Arc<dyn Transport>,
        pads: Box<dyn Pads>,
        panel: Box<dyn Panel>,
        display: Box<dyn Display>,
        menu_config: &ItemConfig,
    ) -> Machine {
        Machine {
            store,
            mixer,
            transport,
            pads,
            panel,
            display,
            menu: Menu::new(menu_config),
            feedback: Feedback::new(),
            patch: Patch::new(),
            playing: false,
        }
    }

    /// Finishes startup: binds the transport channel, loads the first
    /// patch, seeds the menu with the session state and draws it.
    pub fn boot(&mut self) -> Result<(), Box<dyn Error>> {
        self.transport.set_channel(self.store.midi_channel());

        self.display.splash("Loading Default")?;
        self.load_patch(0);

        self.menu
            .set_selector_items("patch", self.store.patch_names());
        self.menu.set_selector_index("patch", 0);
        self.menu.set_number(
            "volume",
            (f64::from(self.store.audio_volume()) * 100.0).round() as i64,
        );
        self.menu
            .set_number("midi_channel", i64::from(self.store.midi_channel()));
        self.menu.set_bool("midi_thru", self.store.midi_thru());

        self.display.splash("Initialization Complete")?;
        self.menu.render(self.display.as_mut())?;
        info!("Initialization complete.");
        Ok(())
    }

    /// Runs the poll loop forever.
    pub fn run(&mut self) -> ! {
        loop {
            if let Err(e) = self.tick() {
                error!(err = e.to_string(), "Error in poll loop.");
            }
            spin_sleep::sleep(TICK);
        }
    }

    /// Runs one iteration of the poll loop.
    pub fn tick(&mut self) -> Result<(), Box<dyn Error>> {
        let volume = self.store.audio_volume();
        for event in self.pads.drain() {
            debug!(pad = event.pad, edge = format!("{:?}", event.edge), "Pad edge.");
            match event.edge {
                Edge::Rising => {
                    self.patch.pad_on(self.mixer.as_ref(), event.pad, volume);
                    self.feedback.press(self.pads.as_mut(), event.pad);
                }
                Edge::Falling => {
                    self.patch.pad_off(self.mixer.as_ref(), event.pad);
                    self.feedback.release(self.pads.as_mut(), event.pad);
                }
            }
        }

        let changes = self.menu.update(self.panel.as_mut());
        for change in changes {
            self.apply_change(&change);
        }
        self.menu.render(self.display.as_mut())?;

        while let Some(message) = self.transport.receive() {
            debug!(message = format!("{:?}", message), "Received MIDI message.");
            if self.store.midi_thru() {
                if let Err(e) = self.transport.send(&message) {
                    warn!(err = e.to_string(), "Unable to forward MIDI message.");
                }
            }
            match message {
                Message::NoteOn { note, velocity } => {
                    self.patch.note_on(
                        self.mixer.as_ref(),
                        note,
                        f32::from(velocity) / 127.0,
                        self.store.audio_volume(),
                    );
                }
                Message::NoteOff { note } => {
                    self.patch.note_off(self.mixer.as_ref(), note);
                }
                Message::ProgramChange { program } => self.change_program(program),
                Message::Other(_) => {}
            }
        }

        self.reconcile_pads();

        let playing = (0..self.mixer.voice_count()).any(|voice| self.mixer.playing(voice));
        if playing != self.playing {
            self.playing = playing;
            debug!(playing, "Playback activity changed.");
        }

        Ok(())
    }

    /// Applies one committed menu change.
    fn apply_change(&mut self, change: &menu::Change) {
        match (change.key.as_str(), change.value) {
            ("patch", menu::Value::Number(index)) => {
                if index >= 0 {
                    self.load_patch(index as usize);
                }
            }
            ("volume", menu::Value::Number(value)) => {
                self.store.set_audio_volume(value as f32 / 100.0);
            }
            ("midi_channel", menu::Value::Number(channel)) => {
                if self.store.set_midi_channel(channel as u8) {
                    self.transport.set_channel(self.store.midi_channel());
                    info!(channel, "MIDI channel changed.");
                }
            }
            ("midi_thru", menu::Value::Bool(thru)) => {
                self.store.set_midi_thru(thru);
                info!(thru, "MIDI thru changed.");
            }
            _ => {}
        }
    }

    /// Loads the patch at the given index and keeps the patch selector in
    /// step with it.
    fn load_patch(&mut self, index: usize) {
        let config = match self.store.patch(index) {
            Ok(config) => config,
            Err(e) => {
                warn!(err = e.to_string(), index, "Unable to load patch.");
                return;
            }
        };

        if !self.patch.load(
            &config,
            self.mixer.as_ref(),
            self.pads.as_mut(),
            &mut self.feedback,
            self.store.audio_rate(),
        ) {
            warn!(index, "Patch has no samples.");
            return;
        }

        self.menu.set_selector_index("patch", index as i64);
    }

    /// Handles a MIDI program change by patch lookup on the stored program
    /// numbers. Unknown programs are ignored.
    fn change_program(&mut self, program: u8) {
        match self.store.program_index(program) {
            Some(index) => self.load_patch(index),
            None => warn!(program, "No patch with that program number."),
        }
    }

    /// Reconciles pad LEDs against the voices actually sounding. Pads
    /// whose sample still sounds show the full color; pads whose voice
    /// ended are dimmed and their sample's stale claim is released.
    fn reconcile_pads(&mut self) {
        for pad in 0..MAX_PAD as u8 {
            let sample = match self.patch.pad_sample_mut(pad) {
                Some(sample) => sample,
                None => continue,
            };
            let voice = match sample.voice() {
                Some(voice) => voice,
                None => continue,
            };

            if self.mixer.playing(voice) {
                let color = sample.color();
                self.feedback.set(self.pads.as_mut(), pad, color, false);
            } else {
                let color = sample.color().half();
                self.feedback.set(self.pads.as_mut(), pad, color, false);
                sample.stop(self.mixer.as_ref());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::json;

    use super::*;
    use crate::color::Rgb;
    use crate::{audio, display, midi, pads, panel};

    struct Handles {
        mixer: Arc<audio::test::Mixer>,
        transport: Arc<midi::test::Transport>,
        pads: pads::test::Pads,
        panel: panel::test::Panel,
        display: display::test::Display,
    }

    fn write_wave(dir: &Path, name: &str) -> String {
        let path = dir.join(name);
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).expect("create wav");
        for value in [4000i16, -4000, 8000, -8000] {
            writer.write_sample(value).expect("write sample");
        }
        writer.finalize().expect("finalize wav");
        path.to_string_lossy().into_owned()
    }

    fn make_machine(
        dir: &Path,
        volume: f64,
        thru: bool,
    ) -> Result<(Machine, Handles), Box<dyn Error>> {
        let document = json!({
            "audio": {"rate": 22050, "bufferSize": 1024, "output": "i2s", "volume": volume},
            "midi": {"channel": 10, "thru": thru},
            "patches": [
                {"name": "One", "program": 1, "samples": [
                    {"file": write_wave(dir, "kick.wav"), "note": 36, "pad": 3, "color": "blue"},
                    {"file": write_wave(dir, "snare.wav"), "note": 38, "pad": 4, "color": "green", "noteOff": true}
                ]},
                {"name": "Two", "program": 7, "samples": [
                    {"file": write_wave(dir, "clap.wav"), "note": 39, "pad": 0, "color": "yellow"}
                ]}
            ]
        });
        let mut store = Store::new();
        store.merge_document(document.as_object().cloned().expect("object document"));

        let mixer = audio::get_mixer("mock", 22050, 1024, None)?;
        let transport = midi::get_transport("mock")?;
        let mock_pads = pads::test::Pads::get("mock");
        let mock_panel = panel::test::Panel::get("mock");
        let mock_display = display::test::Display::get("mock");

        let handles = Handles {
            mixer: mixer.to_mock()?,
            transport: transport.to_mock()?,
            pads: mock_pads.clone(),
            panel: mock_panel.clone(),
            display: mock_display.clone(),
        };

        let mut machine = Machine::new(
            store,
            mixer,
            transport,
            Box::new(mock_pads),
            Box::new(mock_panel),
            Box::new(mock_display),
            &ItemConfig::default_menu(),
        );
        machine.boot()?;
        Ok((machine, handles))
    }

    #[test]
    fn test_boot_loads_the_first_patch() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (_, handles) = make_machine(dir.path(), 1.0, false)?;

        assert_eq!(handles.pads.pixel(3), Rgb::BLUE.half());
        assert_eq!(handles.pads.pixel(4), Rgb::GREEN.half());
        assert_eq!(handles.pads.pixel(0), Rgb::OFF);
        assert_eq!(handles.transport.channel(), 10);
        assert_eq!(
            handles.display.splashes(),
            vec!["Loading Default", "Initialization Complete"]
        );

        // The menu window shows the patch selector on the loaded patch.
        let row = handles.display.row(1).expect("cursor row");
        assert_eq!(row.name, "Patch");
        assert_eq!(row.value, "One");
        Ok(())
    }

    #[test]
    fn test_boot_seeds_the_menu_from_the_store() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (_, handles) = make_machine(dir.path(), 0.5, false)?;

        let row = handles.display.row(2).expect("volume row");
        assert_eq!(row.name, "Volume");
        assert_eq!(row.value, "50");
        Ok(())
    }

    #[test]
    fn test_pad_press_triggers_and_lights() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (mut machine, handles) = make_machine(dir.path(), 1.0, false)?;

        handles.pads.press(3);
        machine.tick()?;
        assert!(handles.mixer.playing(0));
        assert_eq!(handles.pads.pixel(3), Rgb::ACTIVE);

        handles.pads.release(3);
        machine.tick()?;
        assert!(handles.mixer.playing(0), "kick has no stop on note off");
        assert_eq!(handles.pads.pixel(3), Rgb::BLUE);

        // The voice running out dims the pad and frees the claim.
        handles.mixer.finish(0);
        machine.tick()?;
        assert_eq!(handles.pads.pixel(3), Rgb::BLUE.half());
        assert_eq!(handles.mixer.level(0), 0.0);
        Ok(())
    }

    #[test]
    fn test_midi_notes_drive_the_patch() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (mut machine, handles) = make_machine(dir.path(), 1.0, false)?;

        handles
            .transport
            .push(10, Message::NoteOn { note: 38, velocity: 127 });
        machine.tick()?;
        assert!(handles.mixer.playing(0));
        assert!((handles.mixer.level(0) - 1.0).abs() < 1e-6);

        handles.transport.push(10, Message::NoteOff { note: 38 });
        machine.tick()?;
        assert!(!handles.mixer.playing(0), "snare stops on note off");

        // Velocity scales the gain.
        handles
            .transport
            .push(10, Message::NoteOn { note: 36, velocity: 64 });
        machine.tick()?;
        assert!((handles.mixer.level(0) - 64.0 / 127.0).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_midi_thru_forwards_everything() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (mut machine, handles) = make_machine(dir.path(), 1.0, true)?;

        let note = Message::NoteOn { note: 36, velocity: 100 };
        let other = Message::Other(vec![0xB9, 0x07, 0x40]);
        handles.transport.push(10, note.clone());
        handles.transport.push(10, other.clone());
        machine.tick()?;

        assert_eq!(handles.transport.sent(), vec![note, other]);
        Ok(())
    }

    #[test]
    fn test_program_change_swaps_the_patch() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (mut machine, handles) = make_machine(dir.path(), 1.0, false)?;

        handles.transport.push(10, Message::ProgramChange { program: 7 });
        machine.tick()?;

        // Patch Two is live: new tints, old note gone, new note sounds.
        assert_eq!(handles.pads.pixel(0), Rgb::YELLOW.half());
        assert_eq!(handles.pads.pixel(3), Rgb::OFF);
        handles.transport.push(10, Message::NoteOn { note: 36, velocity: 127 });
        handles.transport.push(10, Message::NoteOn { note: 39, velocity: 127 });
        machine.tick()?;
        assert!(handles.mixer.playing(0));
        assert!(handles.mixer.wave(1).is_none());

        // The selector follows, drawn on the next tick.
        machine.tick()?;
        let row = handles.display.row(1).expect("cursor row");
        assert_eq!(row.value, "Two");

        // Unknown programs are ignored.
        handles.transport.push(10, Message::ProgramChange { program: 99 });
        machine.tick()?;
        assert_eq!(handles.pads.pixel(0), Rgb::YELLOW.half());
        Ok(())
    }

    #[test]
    fn test_menu_volume_change_scales_later_triggers() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (mut machine, handles) = make_machine(dir.path(), 1.0, false)?;

        // Edit the volume down to 40.
        handles.panel.turn(1);
        handles.panel.push();
        machine.tick()?;
        handles.panel.turn(-60);
        machine.tick()?;
        handles.panel.push();
        machine.tick()?;

        handles.transport.push(10, Message::NoteOn { note: 36, velocity: 127 });
        machine.tick()?;
        assert!((handles.mixer.level(0) - 0.4).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_menu_channel_change_rebinds_the_transport() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (mut machine, handles) = make_machine(dir.path(), 1.0, false)?;

        // Descend into MIDI, edit the channel up to 11.
        handles.panel.turn(2);
        handles.panel.push();
        machine.tick()?;
        handles.panel.turn(1);
        handles.panel.push();
        machine.tick()?;
        handles.panel.turn(1);
        machine.tick()?;

        assert_eq!(handles.transport.channel(), 11);

        // Traffic on the old channel no longer lands.
        handles.transport.push(10, Message::NoteOn { note: 36, velocity: 127 });
        machine.tick()?;
        assert!(!handles.mixer.playing(0));

        handles.transport.push(11, Message::NoteOn { note: 36, velocity: 127 });
        machine.tick()?;
        assert!(handles.mixer.playing(0));
        Ok(())
    }
}
