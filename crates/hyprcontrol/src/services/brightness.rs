//! BrightnessService - screen backlight control via brightnessctl.
//!
//! Synchronous like the audio service: a single `brightnessctl` call per
//! operation, state read back from `get`/`max` rather than assumed.

use std::cell::RefCell;
use std::rc::Rc;

use super::callbacks::Callbacks;
use super::command;

/// Canonical snapshot of brightness state.
#[derive(Debug, Clone, Default)]
pub struct BrightnessSnapshot {
    /// Current brightness as a percentage (0-100).
    pub percent: u32,
    /// Whether brightnessctl answered the initial query.
    pub available: bool,
}

/// Shared, process-wide brightness service.
pub struct BrightnessService {
    snapshot: RefCell<BrightnessSnapshot>,
    callbacks: Callbacks<BrightnessSnapshot>,
}

impl BrightnessService {
    fn new() -> Rc<Self> {
        let service = Rc::new(Self {
            snapshot: RefCell::new(BrightnessSnapshot::default()),
            callbacks: Callbacks::new(),
        });
        service.refresh();
        service
    }

    /// Get the global BrightnessService singleton.
    pub fn global() -> Rc<Self> {
        thread_local! {
            static INSTANCE: Rc<BrightnessService> = BrightnessService::new();
        }

        INSTANCE.with(|s| s.clone())
    }

    /// Register a callback invoked whenever the snapshot changes.
    /// Called immediately with the current snapshot.
    pub fn connect<F>(&self, callback: F)
    where
        F: Fn(&BrightnessSnapshot) + 'static,
    {
        self.callbacks.register(callback);
        let snapshot = self.snapshot.borrow().clone();
        self.callbacks.notify(&snapshot);
    }

    /// Re-read the current brightness from brightnessctl.
    pub fn refresh(&self) {
        let raw = query_value(&["get"]);
        let max = query_value(&["max"]);

        match (raw, max) {
            (Some(raw), Some(max)) => {
                let percent = percent_from_raw(raw, max);
                self.notify_snapshot(|s| {
                    s.percent = percent;
                    s.available = true;
                });
            }
            _ => {
                self.notify_snapshot(|s| {
                    s.percent = 0;
                    s.available = false;
                });
            }
        }
    }

    /// Set brightness as a percentage (clamped to 0-100).
    pub fn set_percent(&self, percent: u32) {
        let percent = percent.min(100);
        command::run("brightnessctl", &["set", &format!("{}%", percent)]);
        self.notify_snapshot(|s| s.percent = percent);
    }

    fn notify_snapshot(&self, f: impl FnOnce(&mut BrightnessSnapshot)) {
        let mut snapshot = self.snapshot.borrow_mut();
        f(&mut snapshot);
        let clone = snapshot.clone();
        drop(snapshot);
        self.callbacks.notify(&clone);
    }
}

fn query_value(args: &[&str]) -> Option<u32> {
    command::run("brightnessctl", args).and_then(|out| out.trim().parse().ok())
}

/// Convert a raw backlight value to a percentage of the device maximum.
pub(crate) fn percent_from_raw(raw: u32, max: u32) -> u32 {
    if max == 0 {
        return 0;
    }
    (((raw as f64) * 100.0 / (max as f64)).round() as u32).min(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_from_raw() {
        assert_eq!(percent_from_raw(0, 255), 0);
        assert_eq!(percent_from_raw(255, 255), 100);
        assert_eq!(percent_from_raw(128, 255), 50);
    }

    #[test]
    fn test_percent_from_raw_zero_max() {
        assert_eq!(percent_from_raw(10, 0), 0);
    }

    #[test]
    fn test_percent_is_clamped() {
        // Raw above max (seen transiently on some devices) must not exceed 100.
        assert_eq!(percent_from_raw(300, 255), 100);
    }
}
