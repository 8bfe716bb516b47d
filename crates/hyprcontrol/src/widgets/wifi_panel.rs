//! WiFi panel.
//!
//! This module contains:
//! - The panel layout (toggle, status label, action buttons, network list)
//! - Network list population from [`WifiSnapshot`]
//! - The connect workflow dialogs (confirmation, password, error)
//!
//! Row activation resolves the selected network from a panel-owned list
//! keyed by row index; nothing is read back out of display widgets.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gtk4::glib::{self, WeakRef};
use gtk4::prelude::*;
use gtk4::{
    ApplicationWindow, Box as GtkBox, Button, ButtonsType, Dialog, DialogFlags, Label, ListBox,
    ListBoxRow, MessageDialog, MessageType, Orientation, PasswordEntry, ResponseType,
    ScrolledWindow, SelectionMode, Switch,
};
use tracing::debug;

use crate::services::wifi::{
    ConnectEvent, ConnectOutcome, WifiNetwork, WifiService, WifiSnapshot,
};

/// The WiFi notebook page.
pub struct WifiPanel {
    pub root: ScrolledWindow,
}

/// An open password prompt, kept so the connect result can close it or
/// re-enable its button.
struct PasswordPrompt {
    dialog: Dialog,
    ssid: String,
}

struct WifiPanelState {
    window: WeakRef<ApplicationWindow>,
    status_label: Label,
    list_box: ListBox,
    refresh_button: Button,
    toggle: Switch,
    disconnect_button: Button,
    /// Blocks the toggle handler while the switch is updated from a snapshot.
    updating_toggle: Cell<bool>,
    password_prompt: RefCell<Option<PasswordPrompt>>,
    /// Networks backing the current list rows, in row order. Row activation
    /// looks the network up by row index rather than reading widget text.
    networks: RefCell<Vec<WifiNetwork>>,
}

/// Build the WiFi panel and wire it to the service.
pub fn build(window: &ApplicationWindow) -> WifiPanel {
    let panel_box = GtkBox::new(Orientation::Vertical, 10);
    panel_box.set_margin_top(10);
    panel_box.set_margin_bottom(10);
    panel_box.set_margin_start(10);
    panel_box.set_margin_end(10);

    // Header with the radio toggle.
    let header_box = GtkBox::new(Orientation::Horizontal, 10);
    let title = Label::new(Some("WiFi"));
    title.set_hexpand(true);
    title.set_xalign(0.0);
    header_box.append(&title);

    let toggle = Switch::new();
    toggle.set_valign(gtk4::Align::Center);
    header_box.append(&toggle);
    panel_box.append(&header_box);

    let status_label = Label::new(None);
    status_label.set_xalign(0.0);
    status_label.set_margin_bottom(10);
    panel_box.append(&status_label);

    // Action buttons.
    let action_box = GtkBox::new(Orientation::Horizontal, 10);
    let disconnect_button = Button::with_label("Disconnect");
    action_box.append(&disconnect_button);
    let refresh_button = Button::with_label("Refresh Networks");
    refresh_button.set_hexpand(true);
    action_box.append(&refresh_button);
    panel_box.append(&action_box);

    let networks_label = Label::new(Some("Available Networks"));
    networks_label.set_xalign(0.0);
    networks_label.set_margin_top(10);
    panel_box.append(&networks_label);

    let list_box = ListBox::new();
    list_box.set_selection_mode(SelectionMode::Single);
    list_box.set_vexpand(true);
    panel_box.append(&list_box);

    let root = ScrolledWindow::new();
    root.set_policy(gtk4::PolicyType::Automatic, gtk4::PolicyType::Automatic);
    root.set_child(Some(&panel_box));

    let state = Rc::new(WifiPanelState {
        window: window.downgrade(),
        status_label,
        list_box,
        refresh_button,
        toggle,
        disconnect_button,
        updating_toggle: Cell::new(false),
        password_prompt: RefCell::new(None),
        networks: RefCell::new(Vec::new()),
    });

    // Signals.
    {
        let state_clone = state.clone();
        state.toggle.connect_state_set(move |_, enabled| {
            if !state_clone.updating_toggle.get() {
                WifiService::global().set_enabled(enabled);
            }
            glib::Propagation::Proceed
        });
    }
    state
        .refresh_button
        .connect_clicked(|_| WifiService::global().refresh());
    state
        .disconnect_button
        .connect_clicked(|_| WifiService::global().disconnect());
    {
        let state_clone = state.clone();
        state.list_box.connect_row_activated(move |_, row| {
            let index = row.index();
            if index < 0 {
                return;
            }
            let net = state_clone.networks.borrow().get(index as usize).cloned();
            if let Some(net) = net {
                show_connect_dialog(&state_clone, &net);
            }
        });
    }

    // Service subscriptions.
    {
        let state_clone = state.clone();
        WifiService::global().connect(move |snapshot| {
            on_snapshot(&state_clone, snapshot);
        });
    }
    {
        let state_clone = state.clone();
        WifiService::global().on_connect_event(move |event| {
            on_connect_event(&state_clone, event);
        });
    }

    // Initial refresh.
    WifiService::global().refresh();

    WifiPanel { root }
}

/// Reflect a snapshot into the panel widgets.
fn on_snapshot(state: &Rc<WifiPanelState>, snapshot: &WifiSnapshot) {
    let enabled = snapshot.enabled.unwrap_or(false);

    if state.toggle.is_active() != enabled {
        state.updating_toggle.set(true);
        state.toggle.set_active(enabled);
        state.updating_toggle.set(false);
    }

    state.status_label.set_text(&snapshot.status_text());
    state.disconnect_button.set_visible(snapshot.connected());
    state.refresh_button.set_sensitive(!snapshot.refreshing);

    populate_list(state, snapshot);
}

/// Rebuild the network list from a snapshot.
fn populate_list(state: &Rc<WifiPanelState>, snapshot: &WifiSnapshot) {
    clear_list_box(&state.list_box);

    if let Some(text) = list_placeholder(snapshot) {
        state.networks.borrow_mut().clear();
        add_placeholder_row(&state.list_box, text);
        return;
    }

    *state.networks.borrow_mut() = snapshot.networks.clone();
    for net in &snapshot.networks {
        let row = create_network_row(net);
        state.list_box.append(&row);
    }
}

/// Build one activatable network row: SSID, connected check, signal label.
fn create_network_row(net: &WifiNetwork) -> ListBoxRow {
    let row = ListBoxRow::new();
    let row_box = GtkBox::new(Orientation::Horizontal, 10);
    row_box.set_margin_top(5);
    row_box.set_margin_bottom(5);
    row_box.set_margin_start(5);
    row_box.set_margin_end(5);

    let ssid_label = Label::new(Some(&net.ssid));
    ssid_label.set_hexpand(true);
    ssid_label.set_xalign(0.0);
    row_box.append(&ssid_label);

    if net.active {
        let connected_label = Label::new(Some("\u{2713}"));
        connected_label.add_css_class("success");
        row_box.append(&connected_label);
    }

    let strength_label = Label::new(Some(&format!("{}%", net.strength)));
    strength_label.set_xalign(1.0);
    strength_label.add_css_class(signal_class(net.strength));
    row_box.append(&strength_label);

    row.set_child(Some(&row_box));
    row
}

/// Confirmation dialog shown on row activation.
fn show_connect_dialog(state: &Rc<WifiPanelState>, net: &WifiNetwork) {
    let Some(window) = state.window.upgrade() else {
        return;
    };

    // Re-connecting to the active network is a no-op.
    if net.active {
        debug!("Already connected to '{}'", net.ssid);
        return;
    }

    let dialog = Dialog::with_buttons(
        Some("WiFi Connection"),
        Some(&window),
        DialogFlags::MODAL | DialogFlags::DESTROY_WITH_PARENT,
        &[("Cancel", ResponseType::Cancel), ("Connect", ResponseType::Accept)],
    );
    dialog.set_default_width(350);
    dialog.set_default_response(ResponseType::Accept);

    let content_area = dialog.content_area();
    content_area.set_margin_top(20);
    content_area.set_margin_bottom(20);
    content_area.set_margin_start(20);
    content_area.set_margin_end(20);

    let message = Label::new(None);
    message.set_markup(&format!(
        "<span size='large'>Connect to <b>{}</b>?</span>\n\n\
         Do you want to connect to this WiFi network?",
        glib::markup_escape_text(&net.ssid)
    ));
    message.set_wrap(true);
    message.set_xalign(0.0);
    content_area.append(&message);

    let ssid = net.ssid.clone();
    dialog.connect_response(move |dialog, response| {
        if response == ResponseType::Accept {
            // The worker decides whether a password prompt is needed.
            WifiService::global().connect_to_network(&ssid, None);
        }
        dialog.close();
    });

    dialog.present();
}

/// Password dialog, opened when the worker reports the network needs one.
fn show_password_dialog(state: &Rc<WifiPanelState>, ssid: &str) {
    let Some(window) = state.window.upgrade() else {
        return;
    };

    let dialog = Dialog::with_buttons(
        Some("WiFi Password"),
        Some(&window),
        DialogFlags::MODAL | DialogFlags::DESTROY_WITH_PARENT,
        &[("Cancel", ResponseType::Cancel), ("Connect", ResponseType::Accept)],
    );
    dialog.set_default_width(350);
    dialog.set_default_response(ResponseType::Accept);

    let content_area = dialog.content_area();
    content_area.set_margin_top(20);
    content_area.set_margin_bottom(20);
    content_area.set_margin_start(20);
    content_area.set_margin_end(20);

    let message = Label::new(None);
    message.set_markup(&format!(
        "<span size='large'>Enter password for <b>{}</b></span>",
        glib::markup_escape_text(ssid)
    ));
    message.set_wrap(true);
    message.set_xalign(0.0);
    content_area.append(&message);

    let entry = PasswordEntry::new();
    entry.set_show_peek_icon(true);
    entry.set_margin_top(10);
    entry.set_margin_bottom(10);
    content_area.append(&entry);

    {
        let dialog_clone = dialog.clone();
        entry.connect_activate(move |_| {
            dialog_clone.response(ResponseType::Accept);
        });
    }

    {
        let state_clone = state.clone();
        let ssid = ssid.to_string();
        let entry_clone = entry.clone();
        dialog.connect_response(move |dialog, response| {
            if response == ResponseType::Accept {
                let password = entry_clone.text().to_string();
                // Keep the dialog open until the attempt finishes; just
                // block a second click.
                if let Some(button) = dialog.widget_for_response(ResponseType::Accept) {
                    button.set_sensitive(false);
                }
                WifiService::global().connect_to_network(&ssid, Some(&password));
            } else {
                *state_clone.password_prompt.borrow_mut() = None;
                dialog.close();
            }
        });
    }

    *state.password_prompt.borrow_mut() = Some(PasswordPrompt {
        dialog: dialog.clone(),
        ssid: ssid.to_string(),
    });

    dialog.present();
}

/// React to connection workflow events from the service.
fn on_connect_event(state: &Rc<WifiPanelState>, event: &ConnectEvent) {
    match event {
        ConnectEvent::PasswordRequired { ssid } => {
            show_password_dialog(state, ssid);
        }
        ConnectEvent::Finished {
            ssid,
            outcome: ConnectOutcome::Activated,
            ..
        } => {
            let matches = state
                .password_prompt
                .borrow()
                .as_ref()
                .is_some_and(|p| p.ssid == *ssid);
            if matches
                && let Some(prompt) = state.password_prompt.borrow_mut().take()
            {
                debug!("Closing password dialog for '{}'", ssid);
                prompt.dialog.close();
            }
        }
        ConnectEvent::Finished {
            ssid,
            outcome: ConnectOutcome::Failed,
            output,
        } => {
            // Leave an open password dialog up for a retry.
            if let Some(prompt) = state.password_prompt.borrow().as_ref()
                && prompt.ssid == *ssid
                && let Some(button) = prompt.dialog.widget_for_response(ResponseType::Accept)
            {
                button.set_sensitive(true);
            }
            show_connection_error(state, output);
        }
    }
}

/// Error dialog showing the raw tool output.
fn show_connection_error(state: &Rc<WifiPanelState>, error_message: &str) {
    let Some(window) = state.window.upgrade() else {
        return;
    };

    let message = if error_message.trim().is_empty() {
        "Failed to connect to network"
    } else {
        error_message
    };

    let dialog = MessageDialog::builder()
        .transient_for(&window)
        .modal(true)
        .destroy_with_parent(true)
        .message_type(MessageType::Error)
        .buttons(ButtonsType::Ok)
        .text("WiFi Connection Error")
        .secondary_text(message.trim())
        .build();

    dialog.connect_response(|dialog, _| dialog.close());
    dialog.present();
}

fn clear_list_box(list_box: &ListBox) {
    while let Some(child) = list_box.first_child() {
        list_box.remove(&child);
    }
}

fn add_placeholder_row(list_box: &ListBox, text: &str) {
    let row = ListBoxRow::new();
    row.set_activatable(false);
    let label = Label::new(Some(text));
    label.add_css_class("placeholder-row");
    row.set_child(Some(&label));
    list_box.append(&row);
}

/// Placeholder text for the list, or `None` when real rows should show.
fn list_placeholder(snapshot: &WifiSnapshot) -> Option<&'static str> {
    if snapshot.enabled == Some(false) {
        Some("WiFi is disabled")
    } else if !snapshot.is_ready {
        Some("Scanning for networks...")
    } else if snapshot.networks.is_empty() {
        Some("No networks found")
    } else {
        None
    }
}

/// CSS class expressing signal strength.
fn signal_class(strength: i32) -> &'static str {
    if strength > 70 {
        "good-signal"
    } else if strength > 30 {
        "medium-signal"
    } else {
        "weak-signal"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::wifi::SecurityType;

    fn network(ssid: &str) -> WifiNetwork {
        WifiNetwork {
            ssid: ssid.to_string(),
            strength: 50,
            security: SecurityType::Secured,
            active: false,
        }
    }

    #[test]
    fn test_signal_class_thresholds() {
        assert_eq!(signal_class(100), "good-signal");
        assert_eq!(signal_class(71), "good-signal");
        assert_eq!(signal_class(70), "medium-signal");
        assert_eq!(signal_class(31), "medium-signal");
        assert_eq!(signal_class(30), "weak-signal");
        assert_eq!(signal_class(0), "weak-signal");
    }

    #[test]
    fn test_placeholder_when_disabled() {
        let snapshot = WifiSnapshot {
            enabled: Some(false),
            is_ready: true,
            ..Default::default()
        };
        assert_eq!(list_placeholder(&snapshot), Some("WiFi is disabled"));
    }

    #[test]
    fn test_placeholder_before_first_refresh() {
        let snapshot = WifiSnapshot::default();
        assert_eq!(list_placeholder(&snapshot), Some("Scanning for networks..."));
    }

    #[test]
    fn test_placeholder_when_no_networks() {
        let snapshot = WifiSnapshot {
            enabled: Some(true),
            is_ready: true,
            ..Default::default()
        };
        assert_eq!(list_placeholder(&snapshot), Some("No networks found"));
    }

    #[test]
    fn test_no_placeholder_with_networks() {
        let snapshot = WifiSnapshot {
            enabled: Some(true),
            is_ready: true,
            networks: vec![network("HomeNet")],
            ..Default::default()
        };
        assert_eq!(list_placeholder(&snapshot), None);
    }
}
