//! Application settings persistence for Marknotes.
//!
//! Stores user preferences (data directory, export directory, dark-mode
//! preference) in a JSON file at an OS-appropriate location.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// File name of the key-value store inside the data directory.
pub const STORE_FILE_NAME: &str = "marknotes.db";

/// Persisted application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    /// Directory holding the notes store.
    pub data_directory: String,
    /// Directory exported files are written to.
    pub export_directory: String,
    /// Platform dark-mode signal used when no theme has been chosen yet.
    pub prefers_dark: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            data_directory: default_data_directory().to_string_lossy().to_string(),
            export_directory: default_export_directory().to_string_lossy().to_string(),
            prefers_dark: false,
        }
    }
}

impl AppSettings {
    /// Path of the notes store under `data_directory`.
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(&self.data_directory).join(STORE_FILE_NAME)
    }
}

/// Returns the path to the settings JSON file.
///
/// - macOS / Linux: `~/.config/marknotes/settings.json`
/// - Windows: `%APPDATA%/Marknotes/settings.json`
pub fn settings_file_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("Marknotes").join("settings.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("marknotes").join("settings.json")
    }
}

/// Returns the default data directory, e.g. `~/.local/share/marknotes`.
pub fn default_data_directory() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local")
                .join("share")
        })
        .join("marknotes")
}

/// Returns the default export directory: the user's downloads folder.
pub fn default_export_directory() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Downloads")
    })
}

/// Loads settings from disk; returns defaults if the file is missing or corrupt.
pub fn load_settings() -> AppSettings {
    let path = settings_file_path();
    match fs::read_to_string(&path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Ignoring corrupt settings file {}: {e}", path.display());
            AppSettings::default()
        }),
        Err(_) => AppSettings::default(),
    }
}

/// Saves settings to disk, creating parent directories as needed.
pub fn save_settings(settings: &AppSettings) -> Result<(), String> {
    let path = settings_file_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create settings directory: {e}"))?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {e}"))?;
    fs::write(&path, json)
        .map_err(|e| format!("Failed to write settings: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_fill_in_defaults() {
        let parsed: AppSettings = serde_json::from_str(r#"{"prefersDark":true}"#).unwrap();
        assert!(parsed.prefers_dark);
        assert_eq!(parsed.data_directory, AppSettings::default().data_directory);
    }

    #[test]
    fn test_settings_serialize_camel_case() {
        let json = serde_json::to_string(&AppSettings::default()).unwrap();
        assert!(json.contains("dataDirectory"));
        assert!(json.contains("exportDirectory"));
        assert!(json.contains("prefersDark"));
    }

    #[test]
    fn test_store_lives_in_data_directory() {
        let settings = AppSettings {
            data_directory: "/tmp/notes".to_string(),
            ..AppSettings::default()
        };
        assert_eq!(settings.store_path(), PathBuf::from("/tmp/notes/marknotes.db"));
    }
}
