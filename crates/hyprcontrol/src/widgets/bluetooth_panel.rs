//! Bluetooth panel: adapter power toggle and the paired device list with
//! per-device connect/disconnect buttons.

use std::cell::Cell;
use std::rc::Rc;

use gtk4::glib::{self, WeakRef};
use gtk4::prelude::*;
use gtk4::{
    ApplicationWindow, Box as GtkBox, Button, ButtonsType, Label, ListBox, ListBoxRow,
    MessageDialog, MessageType, Orientation, ScrolledWindow, SelectionMode, Switch,
};

use crate::services::bluetooth::{
    BluetoothDevice, BluetoothFailure, BluetoothService, BluetoothSnapshot,
};

/// The Bluetooth notebook page.
pub struct BluetoothPanel {
    pub root: ScrolledWindow,
}

struct BluetoothPanelState {
    window: WeakRef<ApplicationWindow>,
    list_box: ListBox,
    refresh_button: Button,
    toggle: Switch,
    updating_toggle: Cell<bool>,
}

/// Build the Bluetooth panel and wire it to the service.
pub fn build(window: &ApplicationWindow) -> BluetoothPanel {
    let panel_box = GtkBox::new(Orientation::Vertical, 10);
    panel_box.set_margin_top(10);
    panel_box.set_margin_bottom(10);
    panel_box.set_margin_start(10);
    panel_box.set_margin_end(10);

    let header_box = GtkBox::new(Orientation::Horizontal, 10);
    let title = Label::new(Some("Bluetooth"));
    title.set_hexpand(true);
    title.set_xalign(0.0);
    header_box.append(&title);

    let toggle = Switch::new();
    toggle.set_valign(gtk4::Align::Center);
    header_box.append(&toggle);
    panel_box.append(&header_box);

    let refresh_button = Button::with_label("Refresh Devices");
    panel_box.append(&refresh_button);

    let devices_label = Label::new(Some("Devices"));
    devices_label.set_xalign(0.0);
    devices_label.set_margin_top(10);
    panel_box.append(&devices_label);

    let list_box = ListBox::new();
    list_box.set_selection_mode(SelectionMode::Single);
    list_box.set_vexpand(true);
    panel_box.append(&list_box);

    let root = ScrolledWindow::new();
    root.set_policy(gtk4::PolicyType::Automatic, gtk4::PolicyType::Automatic);
    root.set_child(Some(&panel_box));

    let state = Rc::new(BluetoothPanelState {
        window: window.downgrade(),
        list_box,
        refresh_button,
        toggle,
        updating_toggle: Cell::new(false),
    });

    {
        let state_clone = state.clone();
        state.toggle.connect_state_set(move |_, powered| {
            if !state_clone.updating_toggle.get() {
                BluetoothService::global().set_powered(powered);
            }
            glib::Propagation::Proceed
        });
    }
    state
        .refresh_button
        .connect_clicked(|_| BluetoothService::global().refresh());

    {
        let state_clone = state.clone();
        BluetoothService::global().connect(move |snapshot| {
            on_snapshot(&state_clone, snapshot);
        });
    }
    {
        let state_clone = state.clone();
        BluetoothService::global().on_failure(move |failure| {
            show_action_error(&state_clone, failure);
        });
    }

    BluetoothService::global().refresh();

    BluetoothPanel { root }
}

fn on_snapshot(state: &Rc<BluetoothPanelState>, snapshot: &BluetoothSnapshot) {
    let powered = snapshot.powered.unwrap_or(false);

    if state.toggle.is_active() != powered {
        state.updating_toggle.set(true);
        state.toggle.set_active(powered);
        state.updating_toggle.set(false);
    }

    state.refresh_button.set_sensitive(!snapshot.refreshing);

    populate_list(state, snapshot);
}

fn populate_list(state: &Rc<BluetoothPanelState>, snapshot: &BluetoothSnapshot) {
    while let Some(child) = state.list_box.first_child() {
        state.list_box.remove(&child);
    }

    if let Some(text) = list_placeholder(snapshot) {
        let row = ListBoxRow::new();
        row.set_activatable(false);
        let label = Label::new(Some(text));
        label.add_css_class("placeholder-row");
        row.set_child(Some(&label));
        state.list_box.append(&row);
        return;
    }

    for device in &snapshot.devices {
        state.list_box.append(&create_device_row(device));
    }
}

/// One device row: name, address, connect/disconnect buttons.
fn create_device_row(device: &BluetoothDevice) -> ListBoxRow {
    let row = ListBoxRow::new();
    row.set_activatable(false);
    let row_box = GtkBox::new(Orientation::Horizontal, 10);
    row_box.set_margin_top(5);
    row_box.set_margin_bottom(5);
    row_box.set_margin_start(5);
    row_box.set_margin_end(5);

    let name_label = Label::new(Some(&device.name));
    name_label.set_hexpand(true);
    name_label.set_xalign(0.0);
    row_box.append(&name_label);

    let mac_label = Label::new(Some(&device.mac));
    mac_label.add_css_class("placeholder-row");
    row_box.append(&mac_label);

    let connect_button = Button::with_label("Connect");
    {
        let mac = device.mac.clone();
        connect_button.connect_clicked(move |_| {
            BluetoothService::global().connect_device(&mac);
        });
    }
    row_box.append(&connect_button);

    let disconnect_button = Button::with_label("Disconnect");
    {
        let mac = device.mac.clone();
        disconnect_button.connect_clicked(move |_| {
            BluetoothService::global().disconnect_device(&mac);
        });
    }
    row_box.append(&disconnect_button);

    row.set_child(Some(&row_box));
    row
}

fn show_action_error(state: &Rc<BluetoothPanelState>, failure: &BluetoothFailure) {
    let Some(window) = state.window.upgrade() else {
        return;
    };

    let dialog = MessageDialog::builder()
        .transient_for(&window)
        .modal(true)
        .destroy_with_parent(true)
        .message_type(MessageType::Error)
        .buttons(ButtonsType::Ok)
        .text("Bluetooth Error")
        .secondary_text(failure.output.trim())
        .build();

    dialog.connect_response(|dialog, _| dialog.close());
    dialog.present();
}

fn list_placeholder(snapshot: &BluetoothSnapshot) -> Option<&'static str> {
    if snapshot.powered == Some(false) {
        Some("Bluetooth is disabled")
    } else if !snapshot.is_ready {
        Some("Loading devices...")
    } else if snapshot.devices.is_empty() {
        Some("No devices found")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_when_powered_off() {
        let snapshot = BluetoothSnapshot {
            powered: Some(false),
            is_ready: true,
            ..Default::default()
        };
        assert_eq!(list_placeholder(&snapshot), Some("Bluetooth is disabled"));
    }

    #[test]
    fn test_placeholder_when_empty() {
        let snapshot = BluetoothSnapshot {
            powered: Some(true),
            is_ready: true,
            ..Default::default()
        };
        assert_eq!(list_placeholder(&snapshot), Some("No devices found"));
    }

    #[test]
    fn test_no_placeholder_with_devices() {
        let snapshot = BluetoothSnapshot {
            powered: Some(true),
            is_ready: true,
            devices: vec![BluetoothDevice {
                mac: "AA:BB:CC:DD:EE:FF".to_string(),
                name: "Headphones".to_string(),
            }],
            ..Default::default()
        };
        assert_eq!(list_placeholder(&snapshot), None);
    }
}
