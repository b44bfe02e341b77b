//! The content provider trait and its supporting types.
//!
//! A [`Package`] exposes a virtual path space over some backing store. All
//! packages answer the same questions (which entries match a logical path,
//! what are the bytes/text of an entry) so callers never care whether content
//! lives in a loose directory, a zip archive, or a binary bundle.
//!
//! # Dyn Compatibility
//!
//! Packages are held behind `Box<dyn Package>`, so async reads use
//! `Pin<Box<dyn Future>>` via [`BoxFuture`]. The default async methods wrap
//! the blocking reads; backends with genuinely async I/O override them.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use crate::package::PackageMetadata;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A concrete entry inside some package, produced by [`Package::find_files`].
///
/// The `path` is backend-specific: an absolute filesystem path for directory
/// packages, an archive entry name for zip packages, a namespaced entry name
/// for bundles. It is only meaningful when handed back to the package that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FoundFile {
    /// Backend-specific concrete location of the entry.
    pub path: PathBuf,
}

impl FoundFile {
    /// Wrap a concrete path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File extension of the concrete entry, lowercased, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }
}

/// A content provider with a uniform virtual path space.
///
/// Logical paths are relative, forward-slash style paths such as
/// `textures/grass.png`. A final component without an extension is a stem
/// query: `textures/grass` matches every entry in `textures/` whose stem is
/// `grass`, case-insensitively. Matches are returned in backend enumeration
/// order.
///
/// Reads return `None` on any failure (missing entry, decode error, released
/// backend). Packages never panic on bad input.
pub trait Package: Send + Sync {
    /// Parsed manifest metadata for this package.
    fn metadata(&self) -> &PackageMetadata;

    /// Filesystem location the package was loaded from.
    fn root(&self) -> &Path;

    /// All concrete entries matching a logical path.
    ///
    /// An exact match (logical path names an existing entry verbatim) returns
    /// that entry alone. Otherwise, if the final component has no extension,
    /// every entry in the logical parent whose stem matches case-insensitively
    /// is returned. No match yields an empty vector.
    fn find_files(&self, logical: &Path) -> Vec<FoundFile>;

    /// Read an entry as UTF-8 text. `None` on any failure.
    fn read_text(&self, entry: &FoundFile) -> Option<String>;

    /// Read an entry as raw bytes. `None` on any failure.
    fn read_bytes(&self, entry: &FoundFile) -> Option<Vec<u8>>;

    /// Async twin of [`read_text`](Package::read_text).
    ///
    /// Defaults to the blocking read; backends with real async I/O override.
    fn read_text_async<'a>(&'a self, entry: &'a FoundFile) -> BoxFuture<'a, Option<String>> {
        Box::pin(async move { self.read_text(entry) })
    }

    /// Async twin of [`read_bytes`](Package::read_bytes).
    fn read_bytes_async<'a>(&'a self, entry: &'a FoundFile) -> BoxFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move { self.read_bytes(entry) })
    }

    /// Release native resources held by the backing store.
    ///
    /// After release every read returns `None`. Idempotent.
    fn release(&mut self);
}

/// Split a logical path into its parent folder and final component.
///
/// Both halves are returned as forward-slash strings; the folder is empty for
/// top-level paths.
pub(crate) fn split_logical(logical: &Path) -> (String, String) {
    let file = logical
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let folder = logical
        .parent()
        .map(normalize_logical)
        .unwrap_or_default();
    (folder, file)
}

/// Normalize a logical path to forward slashes with no leading separator.
pub(crate) fn normalize_logical(path: &Path) -> String {
    let joined = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    joined.trim_start_matches('/').to_string()
}

/// Whether `candidate` is a stem match for `stem` (same parent assumed).
///
/// Case-insensitive comparison of the candidate's stem against the query.
pub(crate) fn stem_matches(candidate: &str, stem: &str) -> bool {
    let candidate_stem = match candidate.rsplit_once('.') {
        Some((s, _)) => s,
        None => candidate,
    };
    candidate_stem.eq_ignore_ascii_case(stem)
}
