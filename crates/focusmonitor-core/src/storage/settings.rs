//! TOML-based user settings.
//!
//! One settings instance exists per installation, stored whole at
//! `~/.config/focusmonitor/settings.toml`. Partial updates are merged in
//! memory via [`SettingsUpdate`] before the store replaces the file;
//! the storage layer itself is last-write-wins.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{CoreError, SettingsError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

/// User preferences, persisted as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default = "default_duration")]
    pub default_duration_min: u32,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_true")]
    pub notification_enabled: bool,
    #[serde(default = "default_theme")]
    pub theme: Theme,
    #[serde(default = "default_daily_goal")]
    pub daily_goal_min: u32,
}

fn default_duration() -> u32 {
    25
}
fn default_true() -> bool {
    true
}
fn default_theme() -> Theme {
    Theme::Light
}
fn default_daily_goal() -> u32 {
    120
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            default_duration_min: default_duration(),
            sound_enabled: true,
            notification_enabled: true,
            theme: default_theme(),
            daily_goal_min: default_daily_goal(),
        }
    }
}

/// Partial update merged into an existing [`UserSettings`] in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub default_duration_min: Option<u32>,
    pub sound_enabled: Option<bool>,
    pub notification_enabled: Option<bool>,
    pub theme: Option<Theme>,
    pub daily_goal_min: Option<u32>,
}

impl UserSettings {
    /// Merge a partial update into this instance.
    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(v) = update.default_duration_min {
            self.default_duration_min = v;
        }
        if let Some(v) = update.sound_enabled {
            self.sound_enabled = v;
        }
        if let Some(v) = update.notification_enabled {
            self.notification_enabled = v;
        }
        if let Some(v) = update.theme {
            self.theme = v;
        }
        if let Some(v) = update.daily_goal_min {
            self.daily_goal_min = v;
        }
    }

    /// Get a settings value as a string by field name.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a settings value by field name, parsing the string according
    /// to the field's existing type.
    ///
    /// # Errors
    /// `UnknownKey` for a field that doesn't exist, `InvalidValue` when
    /// the string cannot be parsed for the field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| SettingsError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        let obj = json
            .as_object_mut()
            .ok_or_else(|| SettingsError::UnknownKey(key.to_string()))?;
        let existing = obj
            .get(key)
            .ok_or_else(|| SettingsError::UnknownKey(key.to_string()))?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => {
                let parsed = value.parse::<bool>().map_err(|_| SettingsError::InvalidValue {
                    key: key.to_string(),
                    message: format!("cannot parse '{value}' as bool"),
                })?;
                serde_json::Value::Bool(parsed)
            }
            serde_json::Value::Number(_) => {
                let parsed = value.parse::<u64>().map_err(|_| SettingsError::InvalidValue {
                    key: key.to_string(),
                    message: format!("cannot parse '{value}' as number"),
                })?;
                serde_json::Value::Number(parsed.into())
            }
            _ => serde_json::Value::String(value.to_string()),
        };

        obj.insert(key.to_string(), new_value);
        *self = serde_json::from_value(json).map_err(|e| SettingsError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

/// Whole-object settings persistence.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store at `~/.config/focusmonitor/settings.toml`.
    pub fn open() -> Result<Self, CoreError> {
        Ok(Self {
            path: data_dir()?.join("settings.toml"),
        })
    }

    /// Store at an explicit path (used by tests).
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load from disk. A missing file yields the defaults, which are
    /// written back so the file exists for hand-editing.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed, or if
    /// the defaults cannot be written.
    pub fn load(&self) -> Result<UserSettings, SettingsError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| SettingsError::LoadFailed {
                    path: self.path.clone(),
                    message: e.to_string(),
                })
            }
            Err(_) => {
                let settings = UserSettings::default();
                self.save(&settings)?;
                Ok(settings)
            }
        }
    }

    /// Replace the persisted instance. Last write wins.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, settings: &UserSettings) -> Result<(), SettingsError> {
        let content = toml::to_string_pretty(settings).map_err(|e| SettingsError::SaveFailed {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&self.path, content).map_err(|e| SettingsError::SaveFailed {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}
