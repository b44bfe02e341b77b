//! Package metadata and manifest parsing.
//!
//! Every package carries a manifest file at its root, named
//! [`MANIFEST_FILENAME`]. The manifest is a line-oriented `Key: Value` text
//! format:
//!
//! ```text
//! Name: Winter Overhaul
//! Author: Jane Doe
//! Description: Replaces summer foliage with snow
//! Version: 1.2.0
//! Persistence: simple
//! Script: scripts/init.lua
//! Script: scripts/weather.lua
//! ```
//!
//! `Script` may repeat; unknown keys are ignored so older runtimes can read
//! newer manifests. Metadata is parsed once at discovery and is immutable
//! afterward.

use std::fmt;
use std::str::FromStr;

use semver::Version;
use thiserror::Error;

/// Fixed manifest filename at the root of every package.
pub const MANIFEST_FILENAME: &str = "modlayer_package.txt";

/// Errors that can occur while parsing a package manifest.
#[derive(Debug, Error, Clone)]
pub enum ManifestError {
    /// A required key is missing.
    #[error("missing required key: {0}")]
    MissingKey(&'static str),

    /// The version string is not valid semver.
    #[error("invalid version '{value}': {reason}")]
    InvalidVersion { value: String, reason: String },

    /// The persistence mode is not one of none/simple/full.
    #[error("invalid persistence mode: {0}")]
    InvalidPersistence(String),

    /// A line is not a `Key: Value` pair.
    #[error("malformed line {line}: {content}")]
    MalformedLine { line: usize, content: String },
}

/// How long a package's script interpreter lives after its scripts run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistenceMode {
    /// Interpreter is torn down right after initial execution.
    #[default]
    None,

    /// Interpreter stays alive, no per-frame hooking.
    Simple,

    /// Interpreter stays alive and a per-frame dispatcher is created
    /// before execution so scripts may register recurring callbacks.
    Full,
}

impl FromStr for PersistenceMode {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(PersistenceMode::None),
            "simple" => Ok(PersistenceMode::Simple),
            "full" => Ok(PersistenceMode::Full),
            other => Err(ManifestError::InvalidPersistence(other.to_string())),
        }
    }
}

impl fmt::Display for PersistenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceMode::None => write!(f, "none"),
            PersistenceMode::Simple => write!(f, "simple"),
            PersistenceMode::Full => write!(f, "full"),
        }
    }
}

/// Metadata describing a single content package.
///
/// The `name` is the unique key for a package across all groups. Loaded once
/// at discovery; immutable afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    /// Unique package name.
    pub name: String,

    /// Author display string.
    pub author: String,

    /// Free-form description.
    pub description: String,

    /// Package version.
    pub version: Version,

    /// Script interpreter lifetime after script execution.
    pub persistence: PersistenceMode,

    /// Logical paths of companion scripts inside the package.
    pub scripts: Vec<String>,
}

impl PackageMetadata {
    /// Create metadata with empty author/description and no scripts.
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            author: String::new(),
            description: String::new(),
            version,
            persistence: PersistenceMode::None,
            scripts: Vec::new(),
        }
    }

    /// Set the author (builder pattern).
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Set the description (builder pattern).
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the persistence mode (builder pattern).
    pub fn with_persistence(mut self, persistence: PersistenceMode) -> Self {
        self.persistence = persistence;
        self
    }

    /// Add a script entry path (builder pattern).
    pub fn with_script(mut self, path: impl Into<String>) -> Self {
        self.scripts.push(path.into());
        self
    }
}

impl fmt::Display for PackageMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.name, self.version)
    }
}

/// Parse a package manifest from its text content.
///
/// Required keys: `Name`, `Version`. `Author`, `Description` default to
/// empty, `Persistence` to `none`, `Script` may repeat. Blank lines and
/// `#` comments are skipped; unknown keys are ignored.
pub fn parse_package_manifest(content: &str) -> Result<PackageMetadata, ManifestError> {
    let mut name = None;
    let mut author = String::new();
    let mut description = String::new();
    let mut version = None;
    let mut persistence = PersistenceMode::None;
    let mut scripts = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = line.split_once(':').ok_or(ManifestError::MalformedLine {
            line: idx + 1,
            content: line.to_string(),
        })?;
        let key = key.trim();
        let value = value.trim();

        match key {
            "Name" => name = Some(value.to_string()),
            "Author" => author = value.to_string(),
            "Description" => description = value.to_string(),
            "Version" => {
                let parsed =
                    Version::parse(value).map_err(|e| ManifestError::InvalidVersion {
                        value: value.to_string(),
                        reason: e.to_string(),
                    })?;
                version = Some(parsed);
            }
            "Persistence" => persistence = value.parse()?,
            "Script" => scripts.push(value.to_string()),
            _ => {} // Unknown keys are ignored
        }
    }

    let name = name
        .filter(|n| !n.is_empty())
        .ok_or(ManifestError::MissingKey("Name"))?;
    let version = version.ok_or(ManifestError::MissingKey("Version"))?;

    Ok(PackageMetadata {
        name,
        author,
        description,
        version,
        persistence,
        scripts,
    })
}

/// Serialize metadata back into manifest text.
///
/// Round-trips with [`parse_package_manifest`].
pub fn serialize_package_manifest(metadata: &PackageMetadata) -> String {
    let mut out = String::new();

    out.push_str(&format!("Name: {}\n", metadata.name));
    if !metadata.author.is_empty() {
        out.push_str(&format!("Author: {}\n", metadata.author));
    }
    if !metadata.description.is_empty() {
        out.push_str(&format!("Description: {}\n", metadata.description));
    }
    out.push_str(&format!("Version: {}\n", metadata.version));
    out.push_str(&format!("Persistence: {}\n", metadata.persistence));
    for script in &metadata.scripts {
        out.push_str(&format!("Script: {}\n", script));
    }

    out
}
