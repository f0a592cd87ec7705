//! # Beamzone I/O
//!
//! File-backed settings persistence and config loading for the beamzone
//! manager. Both use human-readable JSON.

pub mod config;
pub mod settings;

pub use config::{load_config, save_config};
pub use settings::{JsonSettingsStore, SettingsError};
