//! Binary asset bundle packages.
//!
//! A bundle is a single `.bundle` file holding many entries behind a
//! checksummed name table:
//!
//! ```text
//! [magic "MLBD"] [index_len: u64 LE] [sha256 of index bytes: 32 bytes]
//! [index: bincode] [entry blobs...]
//! ```
//!
//! The index maps entry names to absolute `(offset, len)` ranges in the file.
//! Content entries live under the `assets/` namespace; the manifest is the
//! sole unprefixed entry so runtimes can identify a bundle before exposing
//! its content. [`BundleWriter`] produces the format, [`BundlePackage`]
//! serves it.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::package::store::{split_logical, stem_matches, BoxFuture, FoundFile, Package};
use crate::package::{PackageMetadata, MANIFEST_FILENAME};

/// Magic bytes at offset 0 of every bundle.
pub const BUNDLE_MAGIC: &[u8; 4] = b"MLBD";

/// Bundle format version written by [`BundleWriter`].
pub const BUNDLE_VERSION: u16 = 1;

/// Namespace prefix for content entries inside a bundle.
const ASSET_NAMESPACE: &str = "assets/";

/// Errors reading or writing a bundle file.
#[derive(Debug, Error)]
pub enum BundleError {
    /// I/O failure on the underlying file.
    #[error("bundle I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not start with the bundle magic.
    #[error("not a bundle: bad magic")]
    BadMagic,

    /// The stored index digest does not match the index bytes.
    #[error("bundle index corrupt: digest mismatch")]
    DigestMismatch,

    /// The index could not be decoded.
    #[error("bundle index corrupt: {0}")]
    Index(String),

    /// The format version is newer than this runtime understands.
    #[error("unsupported bundle version {0}")]
    UnsupportedVersion(u16),
}

#[derive(Debug, Serialize, Deserialize)]
struct BundleEntry {
    name: String,
    offset: u64,
    len: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct BundleIndex {
    version: u16,
    entries: Vec<BundleEntry>,
}

const HEADER_LEN: u64 = 4 + 8 + 32;

/// Streaming writer for the bundle format.
///
/// Entries are buffered in memory and laid out on [`finish`](Self::finish).
/// Content entry names are given without the namespace prefix; the manifest
/// is added through [`set_manifest`](Self::set_manifest).
///
/// # Example
///
/// ```ignore
/// let mut writer = BundleWriter::new();
/// writer.set_manifest(&metadata);
/// writer.add_entry("textures/grass.png", png_bytes);
/// writer.finish(&path)?;
/// ```
#[derive(Default)]
pub struct BundleWriter {
    entries: Vec<(String, Vec<u8>)>,
}

impl BundleWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the package manifest, serialized from `metadata`.
    ///
    /// Replaces any previously set manifest.
    pub fn set_manifest(&mut self, metadata: &PackageMetadata) {
        let text = crate::package::serialize_package_manifest(metadata);
        self.entries
            .retain(|(name, _)| name != MANIFEST_FILENAME);
        self.entries
            .insert(0, (MANIFEST_FILENAME.to_string(), text.into_bytes()));
    }

    /// Add a content entry under the asset namespace.
    pub fn add_entry(&mut self, logical: impl AsRef<str>, data: Vec<u8>) {
        let name = format!("{}{}", ASSET_NAMESPACE, logical.as_ref());
        self.entries.push((name, data));
    }

    /// Write the bundle to `path`.
    pub fn finish(self, path: &Path) -> Result<(), BundleError> {
        let mut index = BundleIndex {
            version: BUNDLE_VERSION,
            entries: Vec::with_capacity(self.entries.len()),
        };

        // Offsets depend on the index size, so size the index first with
        // placeholder offsets. Default bincode integer encoding is fixed
        // width, so the placeholder pass is exact.
        for (name, data) in &self.entries {
            index.entries.push(BundleEntry {
                name: name.clone(),
                offset: u64::MAX,
                len: data.len() as u64,
            });
        }
        let index_len = bincode::serialized_size(&index)
            .map_err(|e| BundleError::Index(e.to_string()))? as u64;

        let mut offset = HEADER_LEN + index_len;
        for (entry, (_, data)) in index.entries.iter_mut().zip(&self.entries) {
            entry.offset = offset;
            offset += data.len() as u64;
        }

        let index_bytes =
            bincode::serialize(&index).map_err(|e| BundleError::Index(e.to_string()))?;
        debug_assert_eq!(index_bytes.len() as u64, index_len);
        let digest = Sha256::digest(&index_bytes);

        let mut file = File::create(path)?;
        file.write_all(BUNDLE_MAGIC)?;
        file.write_all(&index_len.to_le_bytes())?;
        file.write_all(&digest)?;
        file.write_all(&index_bytes)?;
        for (_, data) in &self.entries {
            file.write_all(data)?;
        }
        file.flush()?;
        Ok(())
    }
}

/// A package backed by a bundle file.
pub struct BundlePackage {
    metadata: PackageMetadata,
    root: PathBuf,
    file: Mutex<Option<File>>,
    table: HashMap<String, (u64, u64)>,
    names: Vec<String>,
}

impl BundlePackage {
    /// Open a bundle file as a package.
    ///
    /// Validates the magic, the index digest, and the format version.
    pub fn open(metadata: PackageMetadata, path: impl Into<PathBuf>) -> Result<Self, BundleError> {
        let root = path.into();
        let mut file = File::open(&root)?;
        let index = read_index(&mut file)?;

        let mut table = HashMap::with_capacity(index.entries.len());
        let mut names = Vec::with_capacity(index.entries.len());
        for entry in index.entries {
            names.push(entry.name.clone());
            table.insert(entry.name, (entry.offset, entry.len));
        }

        Ok(Self {
            metadata,
            root,
            file: Mutex::new(Some(file)),
            table,
            names,
        })
    }

    /// Read the manifest text out of a bundle file without keeping it open.
    pub(crate) fn read_manifest(path: &Path) -> Result<String, BundleError> {
        let mut file = File::open(path)?;
        let index = read_index(&mut file)?;
        let entry = index
            .entries
            .iter()
            .find(|e| e.name == MANIFEST_FILENAME)
            .ok_or_else(|| BundleError::Index(format!("missing {}", MANIFEST_FILENAME)))?;
        let bytes = read_range(&mut file, entry.offset, entry.len)?;
        String::from_utf8(bytes).map_err(|e| BundleError::Index(e.to_string()))
    }

    fn read_raw(&self, entry: &FoundFile) -> Option<Vec<u8>> {
        let name = entry.path.to_string_lossy();
        let &(offset, len) = self.table.get(name.as_ref())?;
        let mut guard = self.file.lock();
        let file = guard.as_mut()?;
        match read_range(file, offset, len) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!(bundle = %self.root.display(), entry = %name, error = %e, "bundle read failed");
                None
            }
        }
    }
}

fn read_index(file: &mut File) -> Result<BundleIndex, BundleError> {
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)?;
    if &magic != BUNDLE_MAGIC {
        return Err(BundleError::BadMagic);
    }

    let mut len_bytes = [0u8; 8];
    file.read_exact(&mut len_bytes)?;
    let index_len = u64::from_le_bytes(len_bytes);

    let mut stored_digest = [0u8; 32];
    file.read_exact(&mut stored_digest)?;

    let mut index_bytes = vec![0u8; index_len as usize];
    file.read_exact(&mut index_bytes)?;
    if Sha256::digest(&index_bytes)[..] != stored_digest {
        return Err(BundleError::DigestMismatch);
    }

    let index: BundleIndex =
        bincode::deserialize(&index_bytes).map_err(|e| BundleError::Index(e.to_string()))?;
    if index.version > BUNDLE_VERSION {
        return Err(BundleError::UnsupportedVersion(index.version));
    }
    Ok(index)
}

fn read_range(file: &mut File, offset: u64, len: u64) -> Result<Vec<u8>, std::io::Error> {
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; len as usize];
    file.read_exact(&mut buf)?;
    Ok(buf)
}

impl Package for BundlePackage {
    fn metadata(&self) -> &PackageMetadata {
        &self.metadata
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn find_files(&self, logical: &Path) -> Vec<FoundFile> {
        if self.file.lock().is_none() {
            return Vec::new();
        }

        let (folder, file) = split_logical(logical);
        let relative = if folder.is_empty() {
            file.clone()
        } else {
            format!("{}/{}", folder, file)
        };

        // The manifest is the one entry outside the asset namespace.
        if relative == MANIFEST_FILENAME {
            return vec![FoundFile::new(MANIFEST_FILENAME)];
        }

        let exact = format!("{}{}", ASSET_NAMESPACE, relative);
        if self.table.contains_key(&exact) {
            return vec![FoundFile::new(exact)];
        }
        if file.is_empty() || file.contains('.') {
            return Vec::new();
        }

        let prefix = if folder.is_empty() {
            ASSET_NAMESPACE.to_string()
        } else {
            format!("{}{}/", ASSET_NAMESPACE, folder)
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
        *self.file.lock() = None;
    }
}
