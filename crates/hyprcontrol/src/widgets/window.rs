//! Main window: notebook with the four panels.

use gtk4::prelude::*;
use gtk4::{
    Application, ApplicationWindow, Box as GtkBox, ButtonsType, Label, MessageDialog,
    MessageType, Notebook, Orientation,
};
use hyprcontrol_core::{Config, Tab};
use tracing::warn;

use super::{audio_panel, bluetooth_panel, brightness_panel, css, wifi_panel};
use crate::services::{command, state};

/// Build and present the main window.
pub fn build(app: &Application, config: &Config, initial: Tab) {
    css::install();

    let window = ApplicationWindow::builder()
        .application(app)
        .title("HyprControl")
        .default_width(config.window.width)
        .default_height(config.window.height)
        .build();

    let main_box = GtkBox::new(Orientation::Vertical, 10);
    window.set_child(Some(&main_box));

    let notebook = Notebook::new();
    notebook.set_scrollable(true);
    notebook.set_vexpand(true);
    main_box.append(&notebook);

    let wifi = wifi_panel::build(&window);
    notebook.append_page(&wifi.root, Some(&Label::new(Some("WiFi"))));

    let bluetooth = bluetooth_panel::build(&window);
    notebook.append_page(&bluetooth.root, Some(&Label::new(Some("Bluetooth"))));

    let audio = audio_panel::build();
    notebook.append_page(&audio.root, Some(&Label::new(Some("Audio"))));

    let brightness = brightness_panel::build();
    notebook.append_page(&brightness.root, Some(&Label::new(Some("Brightness"))));

    notebook.set_current_page(Some(initial.index()));

    // Remember the visible tab for the next launch.
    notebook.connect_switch_page(|_, _, page_num| {
        let mut persisted = state::load();
        if persisted.last_tab != Some(page_num) {
            persisted.last_tab = Some(page_num);
            state::save(&persisted);
        }
    });

    window.present();

    report_missing_tools(&window);
}

/// Warn about external tools missing from `$PATH`; the affected panels
/// will show placeholder state until the tools are installed.
fn report_missing_tools(window: &ApplicationWindow) {
    let missing = command::missing_tools();
    if missing.is_empty() {
        return;
    }

    for tool in &missing {
        warn!("Required tool not found on $PATH: {}", tool);
    }

    let dialog = MessageDialog::builder()
        .transient_for(window)
        .modal(true)
        .destroy_with_parent(true)
        .message_type(MessageType::Warning)
        .buttons(ButtonsType::Ok)
        .text("Missing dependencies")
        .secondary_text(format!(
            "The following tools were not found:\n\n{}\n\nThe corresponding panels will not work until they are installed.",
            missing.join("\n")
        ))
        .build();

    dialog.connect_response(|dialog, _| dialog.close());
    dialog.present();
}
