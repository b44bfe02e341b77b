//! Manager error type.

use thiserror::Error;

/// Errors returned by [`ModManager`](crate::manager::ModManager) operations.
///
/// Resolution misses are not errors; `load` and the raw reads return
/// `Option`. Errors cover requests that name unknown packages or violate a
/// group's policy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManagerError {
    /// No package with the given name is registered.
    #[error("unknown package: {0}")]
    UnknownPackage(String),

    /// No group with the given name is configured.
    #[error("unknown group: {0}")]
    UnknownGroup(String),

    /// The package's group does not allow disabling members.
    #[error("group '{0}' does not allow disabling members")]
    DisableLocked(String),

    /// The package's group does not allow reordering members.
    #[error("group '{0}' does not allow reordering members")]
    ReorderLocked(String),
}
