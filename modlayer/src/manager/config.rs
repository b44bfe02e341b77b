//! Manager configuration.
//!
//! Configuration is assembled with builder methods and handed to
//! [`ModManager::new`](crate::manager::ModManager::new) once. Groups are
//! declared up front with their policy; search roots map directories on disk
//! to a group each.

use std::path::PathBuf;

use crate::settings::SettingsStore;

/// A directory scanned for packages, feeding one group.
#[derive(Debug, Clone)]
pub struct SearchRoot {
    /// Directory whose immediate children are candidate packages.
    pub path: PathBuf,
    /// Name of the group discovered packages join.
    pub group: String,
}

/// Declared policy for one group.
#[derive(Debug, Clone)]
pub struct GroupSpec {
    /// Group name, unique across the configuration.
    pub name: String,
    /// Whether members may be disabled by the user.
    pub user_can_disable: bool,
    /// Whether members may be reordered by the user.
    pub user_can_reorder: bool,
}

/// Configuration for a [`ModManager`](crate::manager::ModManager).
///
/// # Example
///
/// ```ignore
/// let config = ManagerConfig::new()
///     .with_group("base", false, false)
///     .with_group("mods", true, true)
///     .with_root("/game/base", "base")
///     .with_root("/game/mods", "mods")
///     .with_settings_path("/game/settings.ini");
/// ```
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Search roots, scanned in declaration order.
    pub roots: Vec<SearchRoot>,
    /// Group declarations, precedence follows declaration order.
    pub groups: Vec<GroupSpec>,
    /// Settings file location.
    pub settings_path: PathBuf,
}

impl ManagerConfig {
    /// Empty configuration with the platform default settings path.
    pub fn new() -> Self {
        Self {
            roots: Vec::new(),
            groups: Vec::new(),
            settings_path: SettingsStore::default_path(),
        }
    }

    /// Declare a group. Declaration order is precedence order between
    /// groups: members of earlier groups shadow members of later ones.
    pub fn with_group(
        mut self,
        name: impl Into<String>,
        user_can_disable: bool,
        user_can_reorder: bool,
    ) -> Self {
        self.groups.push(GroupSpec {
            name: name.into(),
            user_can_disable,
            user_can_reorder,
        });
        self
    }

    /// Add a search root feeding `group`.
    ///
    /// A root naming an undeclared group implicitly declares it with
    /// permissive policy (disable and reorder both allowed).
    pub fn with_root(mut self, path: impl Into<PathBuf>, group: impl Into<String>) -> Self {
        self.roots.push(SearchRoot {
            path: path.into(),
            group: group.into(),
        });
        self
    }

    /// Override the settings file location.
    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = path.into();
        self
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::new()
    }
}
