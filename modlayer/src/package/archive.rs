//! Zip archive packages.
//!
//! A `.zip` file whose internal layout is the virtual path space. The central
//! directory is read once at open time into a name index, so lookups never
//! touch the file; reads seek into the archive through a shared handle.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;
use zip::ZipArchive;

use crate::package::store::{split_logical, stem_matches, BoxFuture, FoundFile, Package};
use crate::package::PackageMetadata;

/// A package backed by a zip archive.
///
/// Concrete entries are archive entry names. The archive handle is released
/// by [`Package::release`], after which reads return `None`.
pub struct ArchivePackage {
    metadata: PackageMetadata,
    root: PathBuf,
    archive: Mutex<Option<ZipArchive<File>>>,
    names: Vec<String>,
}

impl ArchivePackage {
    /// Open a zip archive as a package.
    ///
    /// Returns `None` if the file cannot be opened or is not a readable zip.
    /// The manifest is expected at the archive root; callers parse it through
    /// the returned package.
    pub fn open(metadata: PackageMetadata, path: impl Into<PathBuf>) -> Option<Self> {
        let root = path.into();
        let file = File::open(&root).ok()?;
        let archive = ZipArchive::new(file).ok()?;

        let names: Vec<String> = archive
            .file_names()
            .filter(|n| !n.ends_with('/'))
            .map(|n| n.trim_start_matches('/').to_string())
            .collect();

        Some(Self {
            metadata,
            root,
            archive: Mutex::new(Some(archive)),
            names,
        })
    }

    /// Read the raw bytes of an entry by archive name.
    pub(crate) fn read_entry(root: &Path, name: &str) -> Option<Vec<u8>> {
        let file = File::open(root).ok()?;
        let mut archive = ZipArchive::new(file).ok()?;
        let mut entry = archive.by_name(name).ok()?;
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut buf).ok()?;
        Some(buf)
    }

    fn read_raw(&self, entry: &FoundFile) -> Option<Vec<u8>> {
        let name = entry.path.to_string_lossy();
        let mut guard = self.archive.lock();
        let archive = guard.as_mut()?;
        let mut file = match archive.by_name(&name) {
            Ok(file) => file,
            Err(e) => {
                debug!(archive = %self.root.display(), entry = %name, error = %e, "archive read failed");
                return None;
            }
        };
        let mut buf = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buf).ok()?;
        Some(buf)
    }
}

impl Package for ArchivePackage {
    fn metadata(&self) -> &PackageMetadata {
        &self.metadata
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn find_files(&self, logical: &Path) -> Vec<FoundFile> {
        if self.archive.lock().is_none() {
            return Vec::new();
        }

        let (folder, file) = split_logical(logical);
        let exact = if folder.is_empty() {
            file.clone()
        } else {
            format!("{}/{}", folder, file)
        };

        if self.names.iter().any(|n| n == &exact) {
            return vec![FoundFile::new(exact)];
        }
        if file.is_empty() || file.contains('.') {
            return Vec::new();
        }

        let prefix = if folder.is_empty() {
            String::new()
        } else {
            format!("{}/", folder)
        };
        self.names
            .iter()
            .filter(|n| {
                n.strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.contains('/') && stem_matches(rest, &file))
            })
            .map(FoundFile::new)
            .collect()
    }

    fn read_text(&self, entry: &FoundFile) -> Option<String> {
        String::from_utf8(self.read_raw(entry)?).ok()
    }

    fn read_bytes(&self, entry: &FoundFile) -> Option<Vec<u8>> {
        self.read_raw(entry)
    }

    fn read_text_async<'a>(&'a self, entry: &'a FoundFile) -> BoxFuture<'a, Option<String>> {
        Box::pin(async move { self.read_text(entry) })
    }

    fn read_bytes_async<'a>(&'a self, entry: &'a FoundFile) -> BoxFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move { self.read_bytes(entry) })
    }

    fn release(&mut self) {
        *self.archive.lock() = None;
    }
}
