//! User preference persistence.
//!
//! A single flag, model-assisted mode, stored in
//! `~/.config/improver/preferences.json`. Missing or unreadable files load
//! as defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub model_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self { model_enabled: true }
    }
}

/// Full path to the preferences file.
pub fn preferences_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("improver")
        .join("preferences.json")
}

pub fn load() -> Preferences {
    load_from(&preferences_path())
}

pub fn save(prefs: &Preferences) -> Result<(), String> {
    save_to(&preferences_path(), prefs)
}

pub fn load_from(path: &Path) -> Preferences {
    match std::fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            log::warn!("[SETTINGS] Ignoring invalid {}: {}", path.display(), e);
            Preferences::default()
        }),
        Err(_) => Preferences::default(),
    }
}

/// Persist preferences, creating the parent directory if needed.
pub fn save_to(path: &Path, prefs: &Preferences) -> Result<(), String> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create config dir: {}", e))?;
    }
    let json = serde_json::to_string_pretty(prefs)
        .map_err(|e| format!("Failed to serialize preferences: {}", e))?;
    std::fs::write(path, json).map_err(|e| format!("Failed to write preferences: {}", e))?;
    log::info!("[SETTINGS] Model-assisted mode {}", if prefs.model_enabled { "on" } else { "off" });
    Ok(())
}
