//! Application configuration.
//!
//! Loaded from `$XDG_CONFIG_HOME/hyprcontrol/config.toml` (default
//! `~/.config/hyprcontrol/config.toml`). Every field is optional; a missing
//! or unreadable file yields the defaults.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default configuration shipped with the application, also used as
/// documentation for the available keys.
pub const DEFAULT_CONFIG_TOML: &str = r#"# HyprControl configuration

[window]
width = 1000
height = 700

[general]
# Tab shown at startup when no CLI flag is given and no previous
# session state exists: "wifi", "bluetooth", "audio" or "brightness".
# default_tab = "wifi"
"#;

/// The four settings panels, in notebook page order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Wifi,
    Bluetooth,
    Audio,
    Brightness,
}

impl Tab {
    /// Notebook page index of this tab.
    pub fn index(self) -> u32 {
        match self {
            Self::Wifi => 0,
            Self::Bluetooth => 1,
            Self::Audio => 2,
            Self::Brightness => 3,
        }
    }

    /// Inverse of [`Tab::index`]. Out-of-range values yield `None`.
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::Wifi),
            1 => Some(Self::Bluetooth),
            2 => Some(Self::Audio),
            3 => Some(Self::Brightness),
            _ => None,
        }
    }

    /// Parse a tab name as used in the config file.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "wifi" => Ok(Self::Wifi),
            "bluetooth" => Ok(Self::Bluetooth),
            "audio" => Ok(Self::Audio),
            "brightness" => Ok(Self::Brightness),
            other => Err(Error::UnknownTab(other.to_string())),
        }
    }
}

/// Window geometry settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: i32,
    pub height: i32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 700,
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Tab shown at startup when neither a CLI flag nor persisted state
    /// selects one.
    pub default_tab: Option<String>,
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub general: GeneralConfig,
}

impl Config {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        // Fail early on a bad tab name rather than at first use.
        if let Some(ref name) = config.general.default_tab {
            Tab::from_name(name)?;
        }
        Ok(config)
    }

    /// Load the configuration from disk, falling back to defaults.
    ///
    /// A missing file is normal and logged at debug; a malformed file is
    /// logged at warn and otherwise ignored.
    pub fn load() -> Self {
        let path = config_file_path();
        match std::fs::read_to_string(&path) {
            Ok(text) => match Self::from_toml(&text) {
                Ok(config) => {
                    tracing::debug!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config file at {:?}, using defaults", path);
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// The configured default tab, if any and valid.
    pub fn default_tab(&self) -> Option<Tab> {
        self.general
            .default_tab
            .as_deref()
            .and_then(|name| Tab::from_name(name).ok())
    }
}

/// Returns the path to the config file.
///
/// Location: `$XDG_CONFIG_HOME/hyprcontrol/config.toml`
/// Default: `~/.config/hyprcontrol/config.toml`
fn config_file_path() -> PathBuf {
    let config_home = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        format!("{}/.config", home)
    });
    PathBuf::from(config_home)
        .join("hyprcontrol")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = Config::from_toml(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(config.window.width, 1000);
        assert_eq!(config.window.height, 700);
        assert_eq!(config.default_tab(), None);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.window.width, 1000);
        assert_eq!(config.window.height, 700);
    }

    #[test]
    fn test_default_tab_parses() {
        let config = Config::from_toml("[general]\ndefault_tab = \"audio\"\n").unwrap();
        assert_eq!(config.default_tab(), Some(Tab::Audio));
    }

    #[test]
    fn test_unknown_tab_is_rejected() {
        let err = Config::from_toml("[general]\ndefault_tab = \"displays\"\n").unwrap_err();
        assert!(matches!(err, Error::UnknownTab(_)));
    }

    #[test]
    fn test_tab_index_roundtrip() {
        for tab in [Tab::Wifi, Tab::Bluetooth, Tab::Audio, Tab::Brightness] {
            assert_eq!(Tab::from_index(tab.index()), Some(tab));
        }
        assert_eq!(Tab::from_index(4), None);
    }
}
