//! Persistent activation and ordering state.
//!
//! User choices (which packages are enabled, how they are ordered) survive
//! restarts through an INI file with one section per group:
//!
//! ```text
//! [mods]
//! Winter Overhaul.Enabled=1
//! Winter Overhaul.Order=0
//! Terrain Plus.Enabled=0
//! Terrain Plus.Order=1
//! ```
//!
//! A missing file is an empty store. A corrupt file is logged and treated as
//! empty so a damaged settings file never blocks startup.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;
use tracing::warn;

/// Errors that can occur while persisting settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be written.
    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Activation and ordering state backed by an INI file.
pub struct SettingsStore {
    path: PathBuf,
    ini: Ini,
}

impl SettingsStore {
    /// Open the store at `path`, reading existing state if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ini = if path.exists() {
            match Ini::load_from_file(&path) {
                Ok(ini) => ini,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "settings file unreadable, starting empty");
                    Ini::new()
                }
            }
        } else {
            Ini::new()
        };
        Self { path, ini }
    }

    /// Default settings location under the platform config directory.
    ///
    /// Falls back to `modlayer_settings.ini` in the working directory when no
    /// config directory is available.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("modlayer").join("settings.ini"))
            .unwrap_or_else(|| PathBuf::from("modlayer_settings.ini"))
    }

    /// File this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persisted enabled flag for a package, if one was saved.
    pub fn enabled(&self, group: &str, package: &str) -> Option<bool> {
        self.ini
            .get_from(Some(group), &format!("{}.Enabled", package))
            .map(|v| v.trim() == "1")
    }

    /// Record the enabled flag for a package.
    pub fn set_enabled(&mut self, group: &str, package: &str, enabled: bool) {
        self.ini
            .with_section(Some(group))
            .set(format!("{}.Enabled", package), if enabled { "1" } else { "0" });
    }

    /// Persisted precedence index for a package, if one was saved and parses.
    pub fn order(&self, group: &str, package: &str) -> Option<i64> {
        self.ini
            .get_from(Some(group), &format!("{}.Order", package))
            .and_then(|v| v.trim().parse().ok())
    }

    /// Record the precedence index for a package.
    pub fn set_order(&mut self, group: &str, package: &str, order: i64) {
        self.ini
            .with_section(Some(group))
            .set(format!("{}.Order", package), order.to_string());
    }

    /// Drop all persisted keys for a package.
    pub fn forget(&mut self, group: &str, package: &str) {
        if let Some(section) = self.ini.section_mut(Some(group)) {
            section.remove(format!("{}.Enabled", package));
            section.remove(format!("{}.Order", package));
        }
    }

    /// Write the store back to its file, creating parent directories.
    pub fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }
        self.ini
            .write_to_file(&self.path)
            .map_err(|source| SettingsError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::open(dir.path().join("settings.ini"));
        assert!(store.enabled("mods", "X").is_none());
        assert!(store.order("mods", "X").is_none());
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.ini");

        let mut store = SettingsStore::open(&path);
        store.set_enabled("mods", "Winter Overhaul", true);
        store.set_enabled("mods", "Terrain Plus", false);
        store.set_order("mods", "Winter Overhaul", 0);
        store.set_order("mods", "Terrain Plus", 1);
        store.save().unwrap();

        let reloaded = SettingsStore::open(&path);
        assert_eq!(reloaded.enabled("mods", "Winter Overhaul"), Some(true));
        assert_eq!(reloaded.enabled("mods", "Terrain Plus"), Some(false));
        assert_eq!(reloaded.order("mods", "Winter Overhaul"), Some(0));
        assert_eq!(reloaded.order("mods", "Terrain Plus"), Some(1));
    }

    #[test]
    fn test_groups_are_isolated() {
        let dir = TempDir::new().unwrap();
        let mut store = SettingsStore::open(dir.path().join("settings.ini"));
        store.set_enabled("base", "Pack", true);
        assert!(store.enabled("mods", "Pack").is_none());
        assert_eq!(store.enabled("base", "Pack"), Some(true));
    }

    #[test]
    fn test_forget_removes_keys() {
        let dir = TempDir::new().unwrap();
        let mut store = SettingsStore::open(dir.path().join("settings.ini"));
        store.set_enabled("mods", "Pack", true);
        store.set_order("mods", "Pack", 3);
        store.forget("mods", "Pack");
        assert!(store.enabled("mods", "Pack").is_none());
        assert!(store.order("mods", "Pack").is_none());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.ini");
        std::fs::write(&path, "[unclosed\n???").unwrap();
        let store = SettingsStore::open(&path);
        assert!(store.enabled("mods", "X").is_none());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/settings.ini");
        let mut store = SettingsStore::open(&path);
        store.set_enabled("mods", "Pack", true);
        store.save().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_unparseable_order_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.ini");
        std::fs::write(&path, "[mods]\nPack.Order=abc\n").unwrap();
        let store = SettingsStore::open(&path);
        assert!(store.order("mods", "Pack").is_none());
    }
}
