//! HyprControl - tabbed GTK4 control panel for WiFi, Bluetooth, audio and
//! screen brightness, backed by nmcli, bluetoothctl, pactl and brightnessctl.

mod services;
mod widgets;

use clap::Parser;
use gtk4::prelude::*;
use gtk4::{Application, glib};
use hyprcontrol_core::{Config, Tab, logging};

const APP_ID: &str = "dev.hyprcontrol.HyprControl";

#[derive(Parser, Debug)]
#[command(name = "hyprcontrol", version, about)]
struct Args {
    /// Open directly to the WiFi tab
    #[arg(short = 'w', long)]
    wifi: bool,

    /// Open directly to the Bluetooth tab
    #[arg(short = 'b', long)]
    bluetooth: bool,

    /// Open directly to the Audio tab
    #[arg(short = 'a', long)]
    audio: bool,

    /// Open directly to the Brightness tab
    #[arg(short = 'r', long)]
    brightness: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn tab(&self) -> Option<Tab> {
        if self.wifi {
            Some(Tab::Wifi)
        } else if self.bluetooth {
            Some(Tab::Bluetooth)
        } else if self.audio {
            Some(Tab::Audio)
        } else if self.brightness {
            Some(Tab::Brightness)
        } else {
            None
        }
    }
}

fn main() -> glib::ExitCode {
    // Exit 0 for --help/--version, 1 for an unknown flag.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    logging::init(args.verbose);

    let config = Config::load();

    // CLI flag beats the last session's tab beats the configured default.
    let initial = args
        .tab()
        .or_else(|| services::state::load().last_tab.and_then(Tab::from_index))
        .or_else(|| config.default_tab())
        .unwrap_or(Tab::Wifi);

    let app = Application::builder().application_id(APP_ID).build();

    app.connect_activate(move |app| {
        widgets::window::build(app, &config, initial);
    });

    // GTK must not see our flags.
    app.run_with_args::<&str>(&[])
}
