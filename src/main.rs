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
mod audio;
mod color;
mod config;
mod display;
mod machine;
mod menu;
mod midi;
mod pads;
mod panel;
mod patch;
mod sample;

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{crate_version, Parser, Subcommand};
use tracing::{info, warn};

use crate::config::error::ConfigError;
use crate::config::menu::ItemConfig;
use crate::config::Store;
use crate::machine::Machine;

const SYSTEMD_SERVICE: &str = r#"
[Unit]
Description=sample playback drum machine

[Service]
Type=simple
Restart=on-failure
EnvironmentFile=-/etc/default/drumpad
ExecStart=/usr/local/bin/drumpad run "$DRUMPAD_CONFIG"
ExecReload=/bin/kill -HUP $MAINPID

[Install]
WantedBy=multi-user.target
Alias=drumpad.service
"#;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A sample playback drum machine."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the drum machine.
    Run {
        /// The path to the configuration.
        config: PathBuf,
        /// The path to an overlay configuration. Its sample paths are
        /// resolved relative to its own directory before merging.
        #[arg(short, long)]
        overlay: Option<PathBuf>,
        /// The path to a menu definition. Defaults to the built-in menu.
        #[arg(short, long)]
        menu: Option<PathBuf>,
        /// The audio output device name. Defaults to the system output.
        #[arg(long)]
        audio_device: Option<String>,
        /// The MIDI device name. Without one, MIDI is disabled.
        #[arg(long)]
        midi_device: Option<String>,
        /// The pad grid to use.
        #[arg(long, default_value = "none")]
        pads: String,
        /// The panel to use.
        #[arg(long, default_value = "keyboard")]
        panel: String,
        /// The display to use.
        #[arg(long, default_value = "console")]
        display: String,
    },
    /// Validates a configuration and every sample file it references.
    Check {
        /// The path to the configuration.
        config: PathBuf,
        /// The path to an overlay configuration.
        #[arg(short, long)]
        overlay: Option<PathBuf>,
    },
    /// Lists the available audio output devices.
    ListAudioDevices {},
    /// Lists the available MIDI input/output devices.
    ListMidiDevices {},
    /// Prints a systemd service definition to stdout.
    Systemd {},
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            overlay,
            menu,
            audio_device,
            midi_device,
            pads,
            panel,
            display,
        } => {
            let mut display = display::get_display(&display)?;
            display.splash(&format!("drumpad {}", crate_version!()))?;

            display.splash("Reading Configuration")?;
            let mut store = Store::new();
            read_config(&mut store, &config, None);
            if let Some(overlay) = overlay.as_deref() {
                display.splash("Reading Overlay")?;
                read_config(&mut store, overlay, overlay.parent());
            }
            if store.patch_count() == 0 {
                display.splash("No Patches Found")?;
                return Err(Box::new(ConfigError::NoPatches));
            }
            info!(patches = store.patch_count(), "Configuration read.");

            display.splash("Initializing Audio")?;
            let mixer = audio::get_mixer(
                &store.audio_output(),
                store.audio_rate(),
                store.audio_buffer_size(),
                audio_device.as_deref(),
            )?;

            display.splash("Initializing MIDI")?;
            let transport = match midi_device {
                Some(name) => midi::get_transport(&name)?,
                None => {
                    warn!("No MIDI device given, MIDI is disabled.");
                    midi::get_transport("mock")?
                }
            };

            display.splash("Initializing Interface")?;
            let pads = pads::get_pads(&pads)?;
            let panel = panel::get_panel(&panel)?;
            let menu_config = read_menu_config(menu.as_deref());

            let mut machine = Machine::new(
                store,
                mixer,
                transport,
                pads,
                panel,
                display,
                &menu_config,
            );
            machine.boot()?;
            machine.run();
        }
        Commands::Check {
            config,
            overlay,
        } => {
            let mut store = Store::new();
            read_config(&mut store, &config, None);
            if let Some(overlay) = overlay.as_deref() {
                read_config(&mut store, overlay, overlay.parent());
            }
            check_store(&store)?;
        }
        Commands::ListAudioDevices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::ListMidiDevices {} => {
            let devices = midi::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Systemd {} => {
            println!("{}", SYSTEMD_SERVICE)
        }
    }

    Ok(())
}

/// Merges one configuration document into the store. A document that
/// cannot be read is logged and skipped; the merged result decides what
/// is fatal.
fn read_config(store: &mut Store, path: &Path, prefix: Option<&Path>) {
    if let Err(e) = store.read_file(path, prefix) {
        warn!(
            err = e.to_string(),
            path = path.display().to_string(),
            "Unable to read the configuration."
        );
    }
}

/// Reads a menu definition, falling back to the built-in one.
fn read_menu_config(path: Option<&Path>) -> ItemConfig {
    let path = match path {
        Some(path) => path,
        None => return ItemConfig::default_menu(),
    };
    match config::menu::read_menu(path) {
        Ok(menu) => menu,
        Err(e) => {
            warn!(err = e.to_string(), "Unable to read the menu definition, using the built-in menu.");
            ItemConfig::default_menu()
        }
    }
}

/// Validates the merged configuration offline: the audio output kind, the
/// patch records and every referenced sample file. Any problem fails the
/// check.
fn check_store(store: &Store) -> Result<(), Box<dyn Error>> {
    let mut problems: Vec<String> = Vec::new();

    if let Err(e) = audio::validate_output(&store.audio_output()) {
        problems.push(e.to_string());
    }

    if store.patch_count() == 0 {
        problems.push(ConfigError::NoPatches.to_string());
    }

    println!("Patches (count: {}):", store.patch_count());
    for index in 0..store.patch_count() {
        let patch = match store.patch(index) {
            Ok(patch) => patch,
            Err(e) => {
                problems.push(format!("patch {}: {}", index, e));
                continue;
            }
        };

        let samples = match patch.samples() {
            Some(samples) => samples,
            None => {
                problems.push(format!("patch {}: no sample list", index));
                continue;
            }
        };

        println!(
            "- {} (samples: {})",
            patch.name().unwrap_or("unnamed"),
            samples.len()
        );

        for sample in samples {
            let file = match sample.file() {
                Some(file) => file,
                None => continue,
            };
            if let Err(e) = audio::wave::load(Path::new(file), store.audio_rate()) {
                problems.push(format!("{}: {}", file, e));
            }
        }
    }

    if problems.is_empty() {
        println!("\nConfiguration OK.");
        return Ok(());
    }

    println!("\nProblems (count: {}):", problems.len());
    for problem in problems.iter() {
        println!("- {}", problem);
    }
    Err(format!("found {} problems", problems.len()).into())
}
