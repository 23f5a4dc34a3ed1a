pub mod records;
pub mod settings;

pub use records::RecordStore;
pub use settings::{SettingsStore, SettingsUpdate, Theme, UserSettings};

use std::path::PathBuf;

use crate::error::CoreError;

/// Returns `~/.config/focusmonitor[-dev]/` based on FOCUSMONITOR_ENV.
///
/// Set FOCUSMONITOR_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, CoreError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FOCUSMONITOR_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focusmonitor-dev")
    } else {
        base_dir.join("focusmonitor")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
