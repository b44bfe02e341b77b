//! CLI error type.

use std::fmt;

use modlayer::manager::ManagerError;

/// Errors surfaced to the terminal user.
#[derive(Debug)]
pub enum CliError {
    /// Malformed command-line input, such as a bad `--root` spec.
    Usage(String),

    /// The manager rejected the request.
    Manager(ManagerError),

    /// Logging could not be initialized.
    Logging(std::io::Error),

    /// Persisting settings failed.
    Settings(String),

    /// The requested resource did not resolve.
    NotFound(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "usage error: {msg}"),
            CliError::Manager(err) => write!(f, "{err}"),
            CliError::Logging(err) => write!(f, "failed to initialize logging: {err}"),
            CliError::Settings(msg) => write!(f, "failed to save settings: {msg}"),
            CliError::NotFound(logical) => write!(f, "no package provides '{logical}'"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ManagerError> for CliError {
    fn from(err: ManagerError) -> Self {
        CliError::Manager(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = CliError::Usage("expected GROUP=PATH".into());
        assert!(err.to_string().contains("GROUP=PATH"));

        let err = CliError::from(ManagerError::UnknownPackage("X".into()));
        assert_eq!(err.to_string(), "unknown package: X");

        let err = CliError::NotFound("textures/grass".into());
        assert!(err.to_string().contains("textures/grass"));
    }
}
