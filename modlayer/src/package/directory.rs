//! Directory-backed packages.
//!
//! The simplest backend: a plain directory on disk whose relative layout is
//! the virtual path space. Concrete entries are absolute filesystem paths, so
//! reads are ordinary file I/O. This is the only backend with genuinely async
//! reads (`tokio::fs`), the others serve from in-process state.

use std::path::{Path, PathBuf};

use glob::MatchOptions;
use tracing::debug;

use crate::package::store::{split_logical, BoxFuture, FoundFile, Package};
use crate::package::PackageMetadata;

/// A package backed by a plain directory tree.
pub struct DirectoryPackage {
    metadata: PackageMetadata,
    root: PathBuf,
    released: bool,
}

impl DirectoryPackage {
    /// Create a directory package rooted at `root`.
    pub fn new(metadata: PackageMetadata, root: impl Into<PathBuf>) -> Self {
        Self {
            metadata,
            root: root.into(),
            released: false,
        }
    }

    fn resolve(&self, entry: &FoundFile) -> Option<PathBuf> {
        if self.released {
            return None;
        }
        Some(entry.path.clone())
    }
}

impl Package for DirectoryPackage {
    fn metadata(&self) -> &PackageMetadata {
        &self.metadata
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn find_files(&self, logical: &Path) -> Vec<FoundFile> {
        if self.released {
            return Vec::new();
        }

        let exact = self.root.join(logical);
        if exact.is_file() {
            return vec![FoundFile::new(exact)];
        }

        let (folder, file) = split_logical(logical);
        if file.is_empty() || file.contains('.') {
            return Vec::new();
        }

        // Stem query: enumerate `{folder}/{stem}.*` case-insensitively.
        let pattern = if folder.is_empty() {
            format!("{}/{}.*", self.root.display(), glob_escape(&file))
        } else {
            format!(
                "{}/{}/{}.*",
                self.root.display(),
                folder,
                glob_escape(&file)
            )
        };
        let options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::default()
        };

        let paths = match glob::glob_with(&pattern, options) {
            Ok(paths) => paths,
            Err(e) => {
                debug!(pattern = %pattern, error = %e, "bad lookup pattern");
                return Vec::new();
            }
        };

        let mut found: Vec<FoundFile> = paths
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .map(FoundFile::new)
            .collect();
        found.sort_by(|a, b| a.path.cmp(&b.path));
        found
    }

    fn read_text(&self, entry: &FoundFile) -> Option<String> {
        let path = self.resolve(entry)?;
        std::fs::read_to_string(path).ok()
    }

    fn read_bytes(&self, entry: &FoundFile) -> Option<Vec<u8>> {
        let path = self.resolve(entry)?;
        std::fs::read(path).ok()
    }

    fn read_text_async<'a>(&'a self, entry: &'a FoundFile) -> BoxFuture<'a, Option<String>> {
        Box::pin(async move {
            let path = self.resolve(entry)?;
            tokio::fs::read_to_string(path).await.ok()
        })
    }

    fn read_bytes_async<'a>(&'a self, entry: &'a FoundFile) -> BoxFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move {
            let path = self.resolve(entry)?;
            tokio::fs::read(path).await.ok()
        })
    }

    fn release(&mut self) {
        self.released = true;
    }
}

/// Escape glob metacharacters in a literal path component.
fn glob_escape(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for ch in component.chars() {
        match ch {
            '*' | '?' | '[' | ']' => {
                out.push('[');
                out.push(ch);
                out.push(']');
            }
            other => out.push(other),
        }
    }
    out
}
