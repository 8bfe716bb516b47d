//! AudioService - sink/source volume and mute control via pactl.
//!
//! Unlike the list-refreshing services, every audio operation is a single
//! fast `pactl` call and runs synchronously on the main thread, matching
//! the panel's slider-driven interaction. State is re-read after each
//! mutation rather than trusted to have taken effect.

use std::cell::RefCell;
use std::rc::Rc;

use super::callbacks::Callbacks;
use super::command;

const DEFAULT_SINK: &str = "@DEFAULT_SINK@";
const DEFAULT_SOURCE: &str = "@DEFAULT_SOURCE@";

/// Canonical snapshot of audio state.
#[derive(Debug, Clone, Default)]
pub struct AudioSnapshot {
    /// Sink (speaker) volume percentage.
    pub volume: u32,
    pub muted: bool,
    /// Source (microphone) volume percentage.
    pub mic_volume: u32,
    pub mic_muted: bool,
    /// Whether pactl answered at least one query.
    pub available: bool,
}

/// Shared, process-wide audio service.
pub struct AudioService {
    snapshot: RefCell<AudioSnapshot>,
    callbacks: Callbacks<AudioSnapshot>,
}

impl AudioService {
    fn new() -> Rc<Self> {
        let service = Rc::new(Self {
            snapshot: RefCell::new(AudioSnapshot::default()),
            callbacks: Callbacks::new(),
        });
        service.refresh();
        service
    }

    /// Get the global AudioService singleton.
    pub fn global() -> Rc<Self> {
        thread_local! {
            static INSTANCE: Rc<AudioService> = AudioService::new();
        }

        INSTANCE.with(|s| s.clone())
    }

    /// Register a callback invoked whenever the snapshot changes.
    /// Called immediately with the current snapshot.
    pub fn connect<F>(&self, callback: F)
    where
        F: Fn(&AudioSnapshot) + 'static,
    {
        self.callbacks.register(callback);
        let snapshot = self.snapshot.borrow().clone();
        self.callbacks.notify(&snapshot);
    }

    #[allow(dead_code)]
    pub fn snapshot(&self) -> AudioSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Re-query volume and mute state for sink and source.
    pub fn refresh(&self) {
        let volume = query_volume("get-sink-volume", DEFAULT_SINK);
        let muted = query_mute("get-sink-mute", DEFAULT_SINK);
        let mic_volume = query_volume("get-source-volume", DEFAULT_SOURCE);
        let mic_muted = query_mute("get-source-mute", DEFAULT_SOURCE);

        let available =
            volume.is_some() || muted.is_some() || mic_volume.is_some() || mic_muted.is_some();

        self.notify_snapshot(|s| {
            s.volume = volume.unwrap_or(0);
            s.muted = muted.unwrap_or(false);
            s.mic_volume = mic_volume.unwrap_or(0);
            s.mic_muted = mic_muted.unwrap_or(false);
            s.available = available;
        });
    }

    /// Set sink volume as a percentage (clamped to 0-100).
    pub fn set_volume(&self, percent: u32) {
        let percent = percent.min(100);
        command::run(
            "pactl",
            &["set-sink-volume", DEFAULT_SINK, &format!("{}%", percent)],
        );
        self.notify_snapshot(|s| s.volume = percent);
    }

    /// Set source (microphone) volume as a percentage (clamped to 0-100).
    pub fn set_mic_volume(&self, percent: u32) {
        let percent = percent.min(100);
        command::run(
            "pactl",
            &["set-source-volume", DEFAULT_SOURCE, &format!("{}%", percent)],
        );
        self.notify_snapshot(|s| s.mic_volume = percent);
    }

    /// Toggle sink mute: read the current state, set the inverse.
    pub fn toggle_mute(&self) {
        let Some(muted) = query_mute("get-sink-mute", DEFAULT_SINK) else {
            return;
        };
        command::run(
            "pactl",
            &["set-sink-mute", DEFAULT_SINK, mute_target(muted)],
        );
        self.notify_snapshot(|s| s.muted = !muted);
    }

    /// Toggle source (microphone) mute.
    pub fn toggle_mic_mute(&self) {
        let Some(muted) = query_mute("get-source-mute", DEFAULT_SOURCE) else {
            return;
        };
        command::run(
            "pactl",
            &["set-source-mute", DEFAULT_SOURCE, mute_target(muted)],
        );
        self.notify_snapshot(|s| s.mic_muted = !muted);
    }

    fn notify_snapshot(&self, f: impl FnOnce(&mut AudioSnapshot)) {
        let mut snapshot = self.snapshot.borrow_mut();
        f(&mut snapshot);
        let clone = snapshot.clone();
        drop(snapshot);
        self.callbacks.notify(&clone);
    }
}

fn query_volume(subcommand: &str, target: &str) -> Option<u32> {
    command::run("pactl", &[subcommand, target]).and_then(|out| parse_volume_percent(&out))
}

fn query_mute(subcommand: &str, target: &str) -> Option<bool> {
    command::run("pactl", &[subcommand, target]).map(|out| parse_mute(&out))
}

/// The `set-…-mute` argument that inverts the given state.
pub(crate) fn mute_target(currently_muted: bool) -> &'static str {
    if currently_muted { "0" } else { "1" }
}

/// Whether `pactl get-…-mute` output reports a muted state.
pub(crate) fn parse_mute(output: &str) -> bool {
    output.contains("yes")
}

/// First percentage in `pactl get-…-volume` output.
///
/// The output lists one value per channel; the first channel's percentage
/// stands in for the device volume.
pub(crate) fn parse_volume_percent(output: &str) -> Option<u32> {
    output
        .split_whitespace()
        .find_map(|token| token.strip_suffix('%'))
        .and_then(|digits| digits.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOLUME_OUTPUT: &str = "Volume: front-left: 42598 /  65% / -11.22 dB,   front-right: 42598 /  65% / -11.22 dB\n        balance 0.00\n";

    #[test]
    fn test_parse_volume_percent() {
        assert_eq!(parse_volume_percent(VOLUME_OUTPUT), Some(65));
        assert_eq!(parse_volume_percent("Volume: mono: 0 / 0% / -inf dB\n"), Some(0));
        assert_eq!(parse_volume_percent("no percentages here"), None);
        assert_eq!(parse_volume_percent(""), None);
    }

    #[test]
    fn test_parse_mute() {
        assert!(parse_mute("Mute: yes\n"));
        assert!(!parse_mute("Mute: no\n"));
    }

    #[test]
    fn test_mute_target_inverts() {
        assert_eq!(mute_target(true), "0");
        assert_eq!(mute_target(false), "1");
    }
}
