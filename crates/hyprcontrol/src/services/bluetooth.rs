//! BluetoothService - adapter power and device control via bluetoothctl.
//!
//! Same shape as the WiFi service: a dedicated worker thread runs the
//! `bluetoothctl` calls from a request channel and publishes results to the
//! main loop with `glib::idle_add_once()`. Device lists are rebuilt
//! wholesale on every refresh.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use gtk4::glib;
use tracing::{debug, warn};

use super::callbacks::Callbacks;
use super::command;

/// A paired or discovered device from `bluetoothctl devices`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BluetoothDevice {
    pub mac: String,
    pub name: String,
}

/// Canonical snapshot of Bluetooth state.
#[derive(Debug, Clone, Default)]
pub struct BluetoothSnapshot {
    /// Adapter power state; `None` until the first refresh completes.
    pub powered: Option<bool>,
    pub devices: Vec<BluetoothDevice>,
    /// Whether the first refresh has completed.
    pub is_ready: bool,
    /// Whether a refresh cycle is in flight.
    pub refreshing: bool,
}

/// A device action that failed; panels surface the raw output in a dialog.
#[derive(Debug, Clone)]
pub struct BluetoothFailure {
    pub action: String,
    pub output: String,
}

#[derive(Debug)]
enum BluetoothRequest {
    Refresh,
    SetPowered(bool),
    Connect(String),
    Disconnect(String),
}

#[derive(Debug)]
enum BluetoothUpdate {
    Refreshed {
        powered: bool,
        devices: Vec<BluetoothDevice>,
    },
    ActionFailed {
        action: String,
        output: String,
    },
}

/// Shared, process-wide Bluetooth service.
pub struct BluetoothService {
    snapshot: RefCell<BluetoothSnapshot>,
    callbacks: Callbacks<BluetoothSnapshot>,
    failures: Callbacks<BluetoothFailure>,
    refresh_in_flight: Cell<bool>,
    request_tx: Sender<BluetoothRequest>,
}

impl BluetoothService {
    fn new() -> Rc<Self> {
        let (request_tx, request_rx) = mpsc::channel::<BluetoothRequest>();

        let service = Rc::new(Self {
            snapshot: RefCell::new(BluetoothSnapshot::default()),
            callbacks: Callbacks::new(),
            failures: Callbacks::new(),
            refresh_in_flight: Cell::new(false),
            request_tx,
        });

        thread::spawn(move || {
            bluetooth_worker(request_rx);
        });

        service
    }

    /// Get the global BluetoothService singleton.
    pub fn global() -> Rc<Self> {
        thread_local! {
            static INSTANCE: Rc<BluetoothService> = BluetoothService::new();
        }

        INSTANCE.with(|s| s.clone())
    }

    /// Register a callback invoked whenever the snapshot changes.
    /// Called immediately with the current snapshot.
    pub fn connect<F>(&self, callback: F)
    where
        F: Fn(&BluetoothSnapshot) + 'static,
    {
        self.callbacks.register(callback);
        let snapshot = self.snapshot.borrow().clone();
        self.callbacks.notify(&snapshot);
    }

    /// Register a callback for failed device actions.
    pub fn on_failure<F>(&self, callback: F)
    where
        F: Fn(&BluetoothFailure) + 'static,
    {
        self.failures.register(callback);
    }

    /// Trigger a device list refresh. A no-op while one is in flight.
    pub fn refresh(&self) {
        if self.refresh_in_flight.get() {
            debug!("BluetoothService: refresh already in flight, ignoring");
            return;
        }
        self.refresh_in_flight.set(true);
        self.notify_snapshot(|s| s.refreshing = true);
        let _ = self.request_tx.send(BluetoothRequest::Refresh);
    }

    /// Power the adapter on or off; the worker refreshes afterwards.
    pub fn set_powered(&self, powered: bool) {
        self.refresh_in_flight.set(true);
        self.notify_snapshot(|s| {
            s.refreshing = true;
            s.powered = Some(powered);
            if !powered {
                s.devices = Vec::new();
            }
        });
        let _ = self.request_tx.send(BluetoothRequest::SetPowered(powered));
    }

    pub fn connect_device(&self, mac: &str) {
        let _ = self
            .request_tx
            .send(BluetoothRequest::Connect(mac.to_string()));
    }

    pub fn disconnect_device(&self, mac: &str) {
        let _ = self
            .request_tx
            .send(BluetoothRequest::Disconnect(mac.to_string()));
    }

    fn notify_snapshot(&self, f: impl FnOnce(&mut BluetoothSnapshot)) {
        let mut snapshot = self.snapshot.borrow_mut();
        f(&mut snapshot);
        let clone = snapshot.clone();
        drop(snapshot);
        self.callbacks.notify(&clone);
    }

    fn apply_update(&self, update: BluetoothUpdate) {
        match update {
            BluetoothUpdate::Refreshed { powered, devices } => {
                self.refresh_in_flight.set(false);
                self.notify_snapshot(|s| {
                    s.powered = Some(powered);
                    s.devices = devices;
                    s.is_ready = true;
                    s.refreshing = false;
                });
            }
            BluetoothUpdate::ActionFailed { action, output } => {
                warn!("bluetoothctl {} failed: {}", action, output.trim());
                self.failures.notify(&BluetoothFailure { action, output });
            }
        }
    }
}

fn send_bluetooth_update(update: BluetoothUpdate) {
    glib::idle_add_once(move || {
        BluetoothService::global().apply_update(update);
    });
}

// ── Worker ───────────────────────────────────────────────────────────

fn bluetooth_worker(request_rx: Receiver<BluetoothRequest>) {
    loop {
        match request_rx.recv() {
            Ok(request) => handle_request(request),
            Err(mpsc::RecvError) => {
                debug!("BluetoothService: request channel disconnected");
                break;
            }
        }
    }
}

fn handle_request(request: BluetoothRequest) {
    match request {
        BluetoothRequest::Refresh => {
            let (powered, devices) = run_refresh();
            send_bluetooth_update(BluetoothUpdate::Refreshed { powered, devices });
        }
        BluetoothRequest::SetPowered(powered) => {
            let arg = if powered { "on" } else { "off" };
            command::run("bluetoothctl", &["power", arg]);
            let (powered, devices) = run_refresh();
            send_bluetooth_update(BluetoothUpdate::Refreshed { powered, devices });
        }
        BluetoothRequest::Connect(mac) => {
            run_device_action("connect", &mac);
        }
        BluetoothRequest::Disconnect(mac) => {
            run_device_action("disconnect", &mac);
        }
    }
}

fn run_device_action(action: &str, mac: &str) {
    let output = command::run("bluetoothctl", &[action, mac])
        .unwrap_or_else(|| "failed to run bluetoothctl".to_string());

    if !device_action_succeeded(&output) {
        send_bluetooth_update(BluetoothUpdate::ActionFailed {
            action: format!("{} {}", action, mac),
            output,
        });
    }

    let (powered, devices) = run_refresh();
    send_bluetooth_update(BluetoothUpdate::Refreshed { powered, devices });
}

/// Query adapter power state and the device list.
fn run_refresh() -> (bool, Vec<BluetoothDevice>) {
    let powered = command::run("bluetoothctl", &["show"]).is_some_and(|out| parse_powered(&out));

    if !powered {
        return (false, Vec::new());
    }

    let devices = match command::run("bluetoothctl", &["devices"]) {
        Some(output) => parse_device_list(&output),
        None => Vec::new(),
    };

    (true, devices)
}

// ── Parsers ──────────────────────────────────────────────────────────

/// Whether `bluetoothctl show` output reports the adapter as powered.
pub(crate) fn parse_powered(output: &str) -> bool {
    output
        .lines()
        .any(|line| line.trim_start().starts_with("Powered:") && line.contains("yes"))
}

/// Parse `bluetoothctl devices` output.
///
/// Lines look like `Device AA:BB:CC:DD:EE:FF Some Device Name`; the name is
/// everything after the address, spaces included.
pub(crate) fn parse_device_list(output: &str) -> Vec<BluetoothDevice> {
    output.lines().filter_map(parse_device_line).collect()
}

fn parse_device_line(line: &str) -> Option<BluetoothDevice> {
    let rest = line.strip_prefix("Device ")?;
    let (mac, name) = rest.split_once(' ')?;
    if mac.is_empty() || name.is_empty() {
        return None;
    }
    Some(BluetoothDevice {
        mac: mac.to_string(),
        name: name.to_string(),
    })
}

/// Whether a `connect`/`disconnect` invocation reported success.
pub(crate) fn device_action_succeeded(output: &str) -> bool {
    output.contains("successful")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_powered() {
        let shown = "Controller 00:11:22:33:44:55 (public)\n\tPowered: yes\n\tDiscoverable: no\n";
        assert!(parse_powered(shown));

        let off = "Controller 00:11:22:33:44:55 (public)\n\tPowered: no\n";
        assert!(!parse_powered(off));
        assert!(!parse_powered(""));
    }

    #[test]
    fn test_parse_device_list_keeps_spaced_names() {
        let output = "Device AA:BB:CC:DD:EE:FF JBL Flip 5\nDevice 11:22:33:44:55:66 Keyboard\n";
        let devices = parse_device_list(output);
        assert_eq!(
            devices,
            vec![
                BluetoothDevice {
                    mac: "AA:BB:CC:DD:EE:FF".to_string(),
                    name: "JBL Flip 5".to_string(),
                },
                BluetoothDevice {
                    mac: "11:22:33:44:55:66".to_string(),
                    name: "Keyboard".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_device_list_skips_malformed_lines() {
        let output = "Device AA:BB:CC:DD:EE:FF\nnot a device line\n\n";
        assert!(parse_device_list(output).is_empty());
    }

    #[test]
    fn test_device_action_succeeded() {
        assert!(device_action_succeeded(
            "Attempting to connect to AA:BB:CC:DD:EE:FF\nConnection successful\n"
        ));
        assert!(!device_action_succeeded("Failed to connect: org.bluez.Error.Failed\n"));
    }
}
