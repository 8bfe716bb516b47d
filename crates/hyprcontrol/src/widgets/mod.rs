//! Panels and window chrome.

pub mod audio_panel;
pub mod bluetooth_panel;
pub mod brightness_panel;
pub mod css;
pub mod wifi_panel;
pub mod window;
