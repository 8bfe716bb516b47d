//! Core types, configuration, and utilities for the HyprControl panel.
//!
//! This crate provides:
//! - Configuration parsing from TOML
//! - Logging setup
//! - Shared error types

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, DEFAULT_CONFIG_TOML, Tab};
pub use error::{Error, Result};
