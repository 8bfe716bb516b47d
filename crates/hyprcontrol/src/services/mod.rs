//! Domain services backing the panels.
//!
//! Each service owns its snapshot on the GTK main thread and notifies
//! widgets through a callback registry. Services that refresh lists
//! (WiFi, Bluetooth) run their subprocess calls on a dedicated worker
//! thread fed by a request channel; results come back through
//! `glib::idle_add_once`.

pub mod audio;
pub mod bluetooth;
pub mod brightness;
pub mod callbacks;
pub mod command;
pub mod state;
pub mod wifi;
