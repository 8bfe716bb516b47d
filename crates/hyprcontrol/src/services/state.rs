//! State persistence for HyprControl.
//!
//! Persists runtime state to `$XDG_STATE_HOME/hyprcontrol/state.json`.
//! Currently this is just the last visible tab, restored on the next
//! launch when no CLI flag selects one.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root state structure containing all persisted state.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    /// Notebook page index of the last visible tab.
    #[serde(default)]
    pub last_tab: Option<u32>,
}

/// Returns the path to the state file.
///
/// Location: `$XDG_STATE_HOME/hyprcontrol/state.json`
/// Default: `~/.local/state/hyprcontrol/state.json`
fn state_file_path() -> PathBuf {
    let state_home = std::env::var("XDG_STATE_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        format!("{}/.local/state", home)
    });
    PathBuf::from(state_home)
        .join("hyprcontrol")
        .join("state.json")
}

/// Load persisted state from disk.
///
/// Returns `PersistedState::default()` if the file doesn't exist or is invalid.
pub fn load() -> PersistedState {
    let path = state_file_path();
    match std::fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(state) => {
                tracing::debug!("Loaded state from {:?}", path);
                state
            }
            Err(e) => {
                tracing::warn!("Failed to parse state file {:?}: {}", path, e);
                PersistedState::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No state file found at {:?}, using defaults", path);
            PersistedState::default()
        }
        Err(e) => {
            tracing::warn!("Failed to read state file {:?}: {}", path, e);
            PersistedState::default()
        }
    }
}

/// Save persisted state to disk.
///
/// Creates the parent directory if it doesn't exist.
pub fn save(state: &PersistedState) {
    let path = state_file_path();

    if let Some(parent) = path.parent()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        tracing::warn!("Failed to create state directory {:?}: {}", parent, e);
        return;
    }

    match serde_json::to_string_pretty(state) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&path, json) {
                tracing::warn!("Failed to save state to {:?}: {}", path, e);
            }
        }
        Err(e) => {
            tracing::warn!("Failed to serialize state: {}", e);
        }
    }
}
