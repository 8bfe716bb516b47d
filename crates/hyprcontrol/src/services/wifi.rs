//! WifiService - WiFi state and control via nmcli.
//!
//! Architecture:
//! - A dedicated worker thread owns every `nmcli`/`iwconfig` call, driven by
//!   an `mpsc` request channel
//! - Results are marshaled back to the GTK main loop via `glib::idle_add_once()`
//! - The snapshot lives on the main thread; panels subscribe via `Callbacks`
//!
//! The worker is serial: one refresh cycle at a time, and a busy flag on the
//! main thread suppresses a second refresh while one is in flight.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use gtk4::glib;
use tracing::{debug, info, warn};

use super::callbacks::Callbacks;
use super::command;

/// Settle delay after toggling the radio, before state is re-queried.
const RADIO_SETTLE: Duration = Duration::from_millis(500);

/// Interface used when detection via `nmcli device status` fails.
const FALLBACK_IFACE: &str = "wlan0";

/// nmcli's placeholder for an empty field in terse (`-t`) output.
const NMCLI_PLACEHOLDER: &str = "--";

/// Whether a network requires authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityType {
    Open,
    Secured,
}

impl SecurityType {
    #[allow(dead_code)]
    pub fn is_secured(self) -> bool {
        self == Self::Secured
    }
}

/// A network visible in the scan results. Rebuilt wholesale on each refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiNetwork {
    pub ssid: String,
    /// Signal strength percentage (0-100).
    pub strength: i32,
    pub security: SecurityType,
    /// Whether this is the currently connected network.
    pub active: bool,
}

/// Canonical snapshot of WiFi state, owned by the service on the main thread.
#[derive(Debug, Clone, Default)]
pub struct WifiSnapshot {
    /// Radio state; `None` until the first refresh completes.
    pub enabled: Option<bool>,
    /// Name of the active connection, if any.
    pub current: Option<String>,
    pub networks: Vec<WifiNetwork>,
    /// Whether the first refresh has completed.
    pub is_ready: bool,
    /// Whether a refresh cycle is in flight.
    pub refreshing: bool,
    /// SSID of an in-flight connection attempt.
    pub connecting_ssid: Option<String>,
}

impl WifiSnapshot {
    pub fn connected(&self) -> bool {
        self.current.is_some()
    }

    /// Text for the panel's status label.
    pub fn status_text(&self) -> String {
        if let Some(ref ssid) = self.connecting_ssid {
            return format!("Connecting to {}...", ssid);
        }
        status_text(self.enabled.unwrap_or(false), self.current.as_deref())
    }
}

/// Outcome of a connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Activated,
    Failed,
}

/// Connection workflow events delivered to panels.
#[derive(Debug, Clone)]
pub enum ConnectEvent {
    /// The network is secured and has no saved profile; prompt for a password.
    PasswordRequired { ssid: String },
    /// A connect command finished; `output` is the raw tool output.
    Finished {
        ssid: String,
        outcome: ConnectOutcome,
        output: String,
    },
}

/// Requests sent from the main thread to the worker.
#[derive(Debug)]
enum WifiRequest {
    Refresh,
    SetEnabled(bool),
    Connect {
        ssid: String,
        password: Option<String>,
    },
    Disconnect,
}

/// Results sent from the worker back to the main loop.
#[derive(Debug)]
enum WifiUpdate {
    Refreshed {
        enabled: bool,
        current: Option<String>,
        networks: Vec<WifiNetwork>,
    },
    PasswordRequired {
        ssid: String,
    },
    ConnectFinished {
        ssid: String,
        outcome: ConnectOutcome,
        output: String,
    },
}

/// Shared, process-wide WiFi service.
pub struct WifiService {
    snapshot: RefCell<WifiSnapshot>,
    callbacks: Callbacks<WifiSnapshot>,
    connect_events: Callbacks<ConnectEvent>,
    /// Busy flag gating refresh requests; lives on the main thread only.
    refresh_in_flight: Cell<bool>,
    request_tx: Sender<WifiRequest>,
}

impl WifiService {
    fn new() -> Rc<Self> {
        let (request_tx, request_rx) = mpsc::channel::<WifiRequest>();

        let service = Rc::new(Self {
            snapshot: RefCell::new(WifiSnapshot::default()),
            callbacks: Callbacks::new(),
            connect_events: Callbacks::new(),
            refresh_in_flight: Cell::new(false),
            request_tx,
        });

        thread::spawn(move || {
            wifi_worker(request_rx);
        });

        service
    }

    /// Get the global WifiService singleton.
    pub fn global() -> Rc<Self> {
        thread_local! {
            static INSTANCE: Rc<WifiService> = WifiService::new();
        }

        INSTANCE.with(|s| s.clone())
    }

    /// Register a callback invoked whenever the snapshot changes.
    /// Called immediately with the current snapshot.
    pub fn connect<F>(&self, callback: F)
    where
        F: Fn(&WifiSnapshot) + 'static,
    {
        self.callbacks.register(callback);
        let snapshot = self.snapshot.borrow().clone();
        self.callbacks.notify(&snapshot);
    }

    /// Register a callback for connection workflow events.
    pub fn on_connect_event<F>(&self, callback: F)
    where
        F: Fn(&ConnectEvent) + 'static,
    {
        self.connect_events.register(callback);
    }

    #[allow(dead_code)]
    pub fn snapshot(&self) -> WifiSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Trigger a full list refresh. A no-op while one is already in flight.
    pub fn refresh(&self) {
        if self.refresh_in_flight.get() {
            debug!("WifiService: refresh already in flight, ignoring");
            return;
        }
        self.refresh_in_flight.set(true);
        self.notify_snapshot(|s| s.refreshing = true);
        let _ = self.request_tx.send(WifiRequest::Refresh);
    }

    /// Enable or disable the radio. The worker re-queries state after a
    /// settle delay and publishes a fresh snapshot.
    pub fn set_enabled(&self, enabled: bool) {
        self.refresh_in_flight.set(true);
        self.notify_snapshot(|s| {
            s.refreshing = true;
            s.enabled = Some(enabled);
            if !enabled {
                s.networks = Vec::new();
                s.current = None;
            }
        });
        let _ = self.request_tx.send(WifiRequest::SetEnabled(enabled));
    }

    /// Connect to a network by SSID.
    ///
    /// Without a password the worker first checks whether one is needed
    /// (saved profile or open network connect directly); if so it emits
    /// [`ConnectEvent::PasswordRequired`] instead of attempting to connect.
    pub fn connect_to_network(&self, ssid: &str, password: Option<&str>) {
        let ssid = ssid.trim().to_string();
        if ssid.is_empty() {
            return;
        }
        self.notify_snapshot(|s| s.connecting_ssid = Some(ssid.clone()));
        let _ = self.request_tx.send(WifiRequest::Connect {
            ssid,
            password: password.map(str::to_string),
        });
    }

    /// Disconnect the WiFi interface. The worker refreshes afterwards.
    pub fn disconnect(&self) {
        let _ = self.request_tx.send(WifiRequest::Disconnect);
    }

    /// Mutate the snapshot and notify all callbacks.
    fn notify_snapshot(&self, f: impl FnOnce(&mut WifiSnapshot)) {
        let mut snapshot = self.snapshot.borrow_mut();
        f(&mut snapshot);
        let clone = snapshot.clone();
        drop(snapshot);
        self.callbacks.notify(&clone);
    }

    fn apply_update(&self, update: WifiUpdate) {
        match update {
            WifiUpdate::Refreshed {
                enabled,
                current,
                networks,
            } => {
                self.refresh_in_flight.set(false);
                self.notify_snapshot(|s| {
                    s.enabled = Some(enabled);
                    s.current = current;
                    s.networks = networks;
                    s.is_ready = true;
                    s.refreshing = false;
                });
            }
            WifiUpdate::PasswordRequired { ssid } => {
                self.notify_snapshot(|s| s.connecting_ssid = None);
                self.connect_events
                    .notify(&ConnectEvent::PasswordRequired { ssid });
            }
            WifiUpdate::ConnectFinished {
                ssid,
                outcome,
                output,
            } => {
                if outcome == ConnectOutcome::Activated {
                    info!("Connected to '{}'", ssid);
                    self.notify_snapshot(|s| {
                        s.connecting_ssid = None;
                        s.current = Some(ssid.clone());
                    });
                } else {
                    warn!("Connection to '{}' failed: {}", ssid, output.trim());
                    self.notify_snapshot(|s| s.connecting_ssid = None);
                }
                self.connect_events.notify(&ConnectEvent::Finished {
                    ssid,
                    outcome,
                    output,
                });
                if outcome == ConnectOutcome::Activated {
                    self.refresh();
                }
            }
        }
    }
}

/// Send an update from the worker thread to the main GLib loop.
fn send_wifi_update(update: WifiUpdate) {
    glib::idle_add_once(move || {
        WifiService::global().apply_update(update);
    });
}

// ── Worker ───────────────────────────────────────────────────────────

fn wifi_worker(request_rx: Receiver<WifiRequest>) {
    // Interface name is detected once and cached for the worker's lifetime.
    let mut iface: Option<String> = None;

    loop {
        match request_rx.recv() {
            Ok(request) => handle_request(request, &mut iface),
            Err(mpsc::RecvError) => {
                debug!("WifiService: request channel disconnected");
                break;
            }
        }
    }
}

fn handle_request(request: WifiRequest, iface: &mut Option<String>) {
    match request {
        WifiRequest::Refresh => {
            let (enabled, current, networks) = run_refresh(iface);
            send_wifi_update(WifiUpdate::Refreshed {
                enabled,
                current,
                networks,
            });
        }
        WifiRequest::SetEnabled(enabled) => {
            let arg = if enabled { "on" } else { "off" };
            command::run("nmcli", &["radio", "wifi", arg]);
            // Give the daemon time to settle before re-querying.
            thread::sleep(RADIO_SETTLE);
            let (enabled, current, networks) = run_refresh(iface);
            send_wifi_update(WifiUpdate::Refreshed {
                enabled,
                current,
                networks,
            });
        }
        WifiRequest::Connect { ssid, password } => {
            if password.is_none() {
                let saved = command::run("nmcli", &["-t", "-f", "NAME", "connection", "show"])
                    .is_some_and(|out| saved_profile_exists(&out, &ssid));
                let secured = command::run(
                    "nmcli",
                    &["-t", "-f", "SSID,SECURITY", "device", "wifi", "list"],
                )
                .and_then(|out| security_for_ssid(&out, &ssid));

                if needs_password(saved, secured) {
                    send_wifi_update(WifiUpdate::PasswordRequired { ssid });
                    return;
                }
            }

            let mut args = vec!["device", "wifi", "connect", ssid.as_str()];
            if let Some(ref pw) = password {
                args.push("password");
                args.push(pw.as_str());
            }

            let output =
                command::run("nmcli", &args).unwrap_or_else(|| "failed to run nmcli".to_string());
            let outcome = classify_connect_output(&output);
            send_wifi_update(WifiUpdate::ConnectFinished {
                ssid,
                outcome,
                output,
            });
        }
        WifiRequest::Disconnect => {
            let iface_name = wifi_interface(iface);
            command::run("nmcli", &["device", "disconnect", &iface_name]);
            let (enabled, current, networks) = run_refresh(iface);
            send_wifi_update(WifiUpdate::Refreshed {
                enabled,
                current,
                networks,
            });
        }
    }
}

/// Run one full refresh cycle: radio state, current connection, scan list.
///
/// Never fails: a disabled radio or an unusable scan yields an empty list
/// (the panel renders the matching placeholder row).
fn run_refresh(iface: &mut Option<String>) -> (bool, Option<String>, Vec<WifiNetwork>) {
    let enabled = command::run("nmcli", &["radio", "wifi"])
        .is_some_and(|out| parse_radio_enabled(&out));

    if !enabled {
        return (false, None, Vec::new());
    }

    let iface_name = wifi_interface(iface);
    let current = current_connection(&iface_name);

    let networks = match command::run(
        "nmcli",
        &["-t", "-f", "SSID,SIGNAL,SECURITY", "device", "wifi", "list"],
    ) {
        Some(output) => parse_scan_output(&output, current.as_deref()),
        None => Vec::new(),
    };

    (true, current, networks)
}

/// Detect (and cache) the WiFi interface name.
fn wifi_interface(cache: &mut Option<String>) -> String {
    if let Some(name) = cache.as_deref() {
        return name.to_string();
    }

    let detected = command::run("nmcli", &["-t", "-f", "DEVICE,TYPE", "device", "status"])
        .and_then(|out| interface_from_device_status(&out))
        .unwrap_or_else(|| {
            debug!("WifiService: no wifi interface detected, using {}", FALLBACK_IFACE);
            FALLBACK_IFACE.to_string()
        });

    *cache = Some(detected.clone());
    detected
}

/// Resolve the name of the active connection on `iface`.
///
/// Three strategies are tried in order until one yields a usable name:
/// the device's GENERAL.CONNECTION field, the active-connection table,
/// and finally iwconfig's ESSID.
fn current_connection(iface: &str) -> Option<String> {
    if let Some(output) = command::run(
        "nmcli",
        &["-t", "-f", "GENERAL.CONNECTION", "device", "show", iface],
    ) && let Some(name) = connection_from_device_show(&output)
    {
        return Some(name);
    }

    if let Some(output) = command::run(
        "nmcli",
        &["-t", "-f", "NAME,DEVICE", "connection", "show", "--active"],
    ) && let Some(name) = connection_from_active_table(&output, iface)
    {
        return Some(name);
    }

    if let Some(output) = command::run("iwconfig", &[iface])
        && let Some(essid) = essid_from_iwconfig(&output)
    {
        return Some(essid);
    }

    None
}

// ── Parsers ──────────────────────────────────────────────────────────

/// Whether `nmcli radio wifi` output reports the radio as enabled.
pub(crate) fn parse_radio_enabled(output: &str) -> bool {
    output.contains("enabled")
}

/// Parse `nmcli -t -f SSID,SIGNAL,SECURITY device wifi list` output.
///
/// Blank SSIDs are skipped, repeated SSIDs keep their first occurrence,
/// a non-numeric signal field yields 0, and a security field that is empty
/// or `--` classifies the network as open.
pub(crate) fn parse_scan_output(output: &str, current: Option<&str>) -> Vec<WifiNetwork> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut networks = Vec::new();

    for line in output.lines() {
        let mut fields = line.splitn(3, ':');
        let ssid = fields.next().unwrap_or("");
        let Some(signal) = fields.next() else {
            continue;
        };
        if ssid.is_empty() || !seen.insert(ssid) {
            continue;
        }

        let strength = signal.trim().parse::<i32>().unwrap_or(0);
        let security = match fields.next() {
            Some(s) if !s.is_empty() && s != NMCLI_PLACEHOLDER => SecurityType::Secured,
            _ => SecurityType::Open,
        };

        networks.push(WifiNetwork {
            ssid: ssid.to_string(),
            strength,
            security,
            active: current == Some(ssid),
        });
    }

    networks
}

/// Extract the connection name from `nmcli -t -f GENERAL.CONNECTION device show`.
pub(crate) fn connection_from_device_show(output: &str) -> Option<String> {
    for line in output.lines() {
        if let Some(value) = line.strip_prefix("GENERAL.CONNECTION:") {
            let value = value.trim();
            if !value.is_empty() && value != NMCLI_PLACEHOLDER {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Find the connection for `iface` in `nmcli -t -f NAME,DEVICE connection
/// show --active` output (rows of `NAME:DEVICE`).
pub(crate) fn connection_from_active_table(output: &str, iface: &str) -> Option<String> {
    for line in output.lines() {
        if let Some((name, device)) = line.rsplit_once(':')
            && device == iface
            && !name.is_empty()
        {
            return Some(name.to_string());
        }
    }
    None
}

/// Extract the ESSID from iwconfig output, rejecting the `off/any` state.
pub(crate) fn essid_from_iwconfig(output: &str) -> Option<String> {
    let start = output.find("ESSID:\"")? + "ESSID:\"".len();
    let rest = &output[start..];
    let end = rest.find('"')?;
    let essid = &rest[..end];
    if essid.is_empty() || essid == "off/any" {
        None
    } else {
        Some(essid.to_string())
    }
}

/// First wifi-typed device in `nmcli -t -f DEVICE,TYPE device status` output.
pub(crate) fn interface_from_device_status(output: &str) -> Option<String> {
    for line in output.lines() {
        let mut fields = line.split(':');
        if let (Some(device), Some(kind)) = (fields.next(), fields.next())
            && kind == "wifi"
            && !device.is_empty()
        {
            return Some(device.to_string());
        }
    }
    None
}

/// Whether a saved connection profile named exactly `ssid` exists in
/// `nmcli -t -f NAME connection show` output.
pub(crate) fn saved_profile_exists(output: &str, ssid: &str) -> bool {
    output.lines().any(|line| line == ssid)
}

/// Look up whether `ssid` is secured in `nmcli -t -f SSID,SECURITY device
/// wifi list` output. `None` when the SSID is not present in the scan.
pub(crate) fn security_for_ssid(output: &str, ssid: &str) -> Option<bool> {
    for line in output.lines() {
        if let Some((name, security)) = line.rsplit_once(':')
            && name == ssid
        {
            return Some(!security.is_empty() && security != NMCLI_PLACEHOLDER);
        }
    }
    None
}

/// Whether a connection attempt must prompt for a password first.
///
/// Saved profiles and open networks connect directly; when the scan does
/// not report the SSID at all, assume it is secured.
pub(crate) fn needs_password(saved: bool, secured: Option<bool>) -> bool {
    !saved && secured.unwrap_or(true)
}

/// Classify nmcli connect output.
///
/// nmcli reports activation in prose, so detection is substring-based to
/// match its observed output. Swapping this for exit-code checking only
/// requires changing this function; callers see [`ConnectOutcome`].
pub(crate) fn classify_connect_output(output: &str) -> ConnectOutcome {
    if output.contains("successfully") {
        ConnectOutcome::Activated
    } else {
        ConnectOutcome::Failed
    }
}

/// Status label text for the panel header.
pub(crate) fn status_text(enabled: bool, current: Option<&str>) -> String {
    match current {
        Some(name) => format!("Connected to: {}", name),
        None if enabled => "Not connected to any network".to_string(),
        None => "WiFi is turned off".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCAN: &str = "\
HomeNet:82:WPA2
:47:WPA2
CafeOpen:65:
HomeNet:40:WPA2
Printer:abc:--
Guest:55:WPA1 WPA2\n";

    #[test]
    fn test_scan_dedupes_by_first_occurrence() {
        let networks = parse_scan_output(SCAN, None);
        let home: Vec<_> = networks.iter().filter(|n| n.ssid == "HomeNet").collect();
        assert_eq!(home.len(), 1);
        // First occurrence's signal wins.
        assert_eq!(home[0].strength, 82);
    }

    #[test]
    fn test_scan_skips_empty_ssid() {
        let networks = parse_scan_output(SCAN, None);
        assert!(networks.iter().all(|n| !n.ssid.is_empty()));
        assert_eq!(networks.len(), 4);
    }

    #[test]
    fn test_scan_non_numeric_signal_is_zero() {
        let networks = parse_scan_output(SCAN, None);
        let printer = networks.iter().find(|n| n.ssid == "Printer").unwrap();
        assert_eq!(printer.strength, 0);
    }

    #[test]
    fn test_scan_security_placeholder_is_open() {
        let networks = parse_scan_output(SCAN, None);
        let printer = networks.iter().find(|n| n.ssid == "Printer").unwrap();
        assert_eq!(printer.security, SecurityType::Open);
        let cafe = networks.iter().find(|n| n.ssid == "CafeOpen").unwrap();
        assert_eq!(cafe.security, SecurityType::Open);
        let guest = networks.iter().find(|n| n.ssid == "Guest").unwrap();
        assert_eq!(guest.security, SecurityType::Secured);
    }

    #[test]
    fn test_scan_marks_active_network() {
        let networks = parse_scan_output(SCAN, Some("HomeNet"));
        assert!(networks.iter().find(|n| n.ssid == "HomeNet").unwrap().active);
        assert!(!networks.iter().find(|n| n.ssid == "Guest").unwrap().active);
    }

    #[test]
    fn test_scan_line_without_signal_field_is_skipped() {
        let networks = parse_scan_output("JustAnSsid\n", None);
        assert!(networks.is_empty());
    }

    #[test]
    fn test_radio_enabled() {
        assert!(parse_radio_enabled("enabled\n"));
        assert!(!parse_radio_enabled("disabled\n"));
        assert!(!parse_radio_enabled(""));
    }

    #[test]
    fn test_connection_from_device_show() {
        assert_eq!(
            connection_from_device_show("GENERAL.CONNECTION:HomeNet\n"),
            Some("HomeNet".to_string())
        );
        assert_eq!(connection_from_device_show("GENERAL.CONNECTION:--\n"), None);
        assert_eq!(connection_from_device_show("GENERAL.CONNECTION:\n"), None);
        assert_eq!(connection_from_device_show(""), None);
    }

    #[test]
    fn test_connection_from_active_table() {
        let output = "Wired connection 1:enp3s0\nHomeNet:wlan0\n";
        assert_eq!(
            connection_from_active_table(output, "wlan0"),
            Some("HomeNet".to_string())
        );
        assert_eq!(connection_from_active_table(output, "wlan1"), None);
    }

    #[test]
    fn test_essid_from_iwconfig() {
        let connected = "wlan0     IEEE 802.11  ESSID:\"HomeNet\"  \n";
        assert_eq!(essid_from_iwconfig(connected), Some("HomeNet".to_string()));

        let off = "wlan0     IEEE 802.11  ESSID:off/any  \n";
        assert_eq!(essid_from_iwconfig(off), None);
    }

    #[test]
    fn test_interface_from_device_status() {
        let output = "lo:loopback:unmanaged:\nenp3s0:ethernet:connected:Wired\nwlp2s0:wifi:connected:HomeNet\n";
        assert_eq!(
            interface_from_device_status(output),
            Some("wlp2s0".to_string())
        );
        assert_eq!(interface_from_device_status("lo:loopback\n"), None);
    }

    #[test]
    fn test_saved_profile_exists_matches_exactly() {
        let output = "HomeNet\nHomeNet 5G\nWired connection 1\n";
        assert!(saved_profile_exists(output, "HomeNet"));
        assert!(!saved_profile_exists(output, "Home"));
    }

    #[test]
    fn test_security_for_ssid() {
        let output = "HomeNet:WPA2\nCafeOpen:\nPrinter:--\n";
        assert_eq!(security_for_ssid(output, "HomeNet"), Some(true));
        assert_eq!(security_for_ssid(output, "CafeOpen"), Some(false));
        assert_eq!(security_for_ssid(output, "Printer"), Some(false));
        assert_eq!(security_for_ssid(output, "Elsewhere"), None);
    }

    #[test]
    fn test_needs_password() {
        // Saved profiles connect directly regardless of security.
        assert!(!needs_password(true, Some(true)));
        // Open networks connect directly.
        assert!(!needs_password(false, Some(false)));
        // Secured and unsaved prompts.
        assert!(needs_password(false, Some(true)));
        // Not in scan results: assume secured.
        assert!(needs_password(false, None));
    }

    #[test]
    fn test_classify_connect_output() {
        assert_eq!(
            classify_connect_output(
                "Device 'wlan0' successfully activated with 'e0a1...'.\n"
            ),
            ConnectOutcome::Activated
        );
        assert_eq!(
            classify_connect_output("Error: Connection activation failed: (7) Secrets were required\n"),
            ConnectOutcome::Failed
        );
        assert_eq!(classify_connect_output(""), ConnectOutcome::Failed);
    }

    #[test]
    fn test_status_text() {
        assert_eq!(status_text(true, Some("HomeNet")), "Connected to: HomeNet");
        assert_eq!(status_text(true, None), "Not connected to any network");
        assert_eq!(status_text(false, None), "WiFi is turned off");
    }
}
