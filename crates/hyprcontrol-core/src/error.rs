//! Error types for hyprcontrol-core.

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in hyprcontrol-core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    ConfigRead(#[from] std::io::Error),

    /// Failed to parse TOML configuration.
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Unknown tab name in configuration.
    #[error("unknown tab name in config: {0}")]
    UnknownTab(String),
}
