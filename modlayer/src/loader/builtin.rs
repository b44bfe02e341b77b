//! The built-in recognizers, one per backing store.

use std::path::Path;

use tracing::warn;

use crate::loader::PackageLoader;
use crate::package::{
    parse_package_manifest, ArchivePackage, BundlePackage, DirectoryPackage, Package,
    MANIFEST_FILENAME,
};

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Claims directories containing a manifest file at their root.
///
/// Directory entries are checked before file-based loaders, so a directory
/// whose name ends in `.zip` or `.bundle` is still a directory package.
pub struct DirectoryLoader;

impl PackageLoader for DirectoryLoader {
    fn name(&self) -> &'static str {
        "directory"
    }

    fn load(&self, path: &Path) -> Option<Box<dyn Package>> {
        if !path.is_dir() {
            return None;
        }
        let manifest_path = path.join(MANIFEST_FILENAME);
        let content = std::fs::read_to_string(&manifest_path).ok()?;
        let metadata = match parse_package_manifest(&content) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping directory with bad manifest");
                return None;
            }
        };
        Some(Box::new(DirectoryPackage::new(metadata, path)))
    }
}

/// Claims `.zip` files whose archive root holds a manifest entry.
pub struct ArchiveLoader;

impl PackageLoader for ArchiveLoader {
    fn name(&self) -> &'static str {
        "archive"
    }

    fn load(&self, path: &Path) -> Option<Box<dyn Package>> {
        if !path.is_file() || !has_extension(path, "zip") {
            return None;
        }
        let content = ArchivePackage::read_entry(path, MANIFEST_FILENAME)?;
        let content = String::from_utf8(content).ok()?;
        let metadata = match parse_package_manifest(&content) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping archive with bad manifest");
                return None;
            }
        };
        ArchivePackage::open(metadata, path).map(|p| Box::new(p) as Box<dyn Package>)
    }
}

/// Claims `.bundle` files with a valid index and manifest entry.
pub struct BundleLoader;

impl PackageLoader for BundleLoader {
    fn name(&self) -> &'static str {
        "bundle"
    }

    fn load(&self, path: &Path) -> Option<Box<dyn Package>> {
        if !path.is_file() || !has_extension(path, "bundle") {
            return None;
        }
        let content = match BundlePackage::read_manifest(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable bundle");
                return None;
            }
        };
        let metadata = match parse_package_manifest(&content) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping bundle with bad manifest");
                return None;
            }
        };
        match BundlePackage::open(metadata, path) {
            Ok(pkg) => Some(Box::new(pkg)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable bundle");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{serialize_package_manifest, BundleWriter, PackageMetadata};
    use semver::Version;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    #[test]
    fn test_directory_loader_requires_manifest() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("NotAPackage");
        std::fs::create_dir_all(&root).unwrap();

        assert!(DirectoryLoader.load(&root).is_none());
    }

    #[test]
    fn test_directory_loader_declines_bad_manifest() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("Broken");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join(MANIFEST_FILENAME), "Version: 1.0.0\n").unwrap();

        assert!(DirectoryLoader.load(&root).is_none());
    }

    #[test]
    fn test_directory_loader_claims_valid_package() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("Good");
        std::fs::create_dir_all(&root).unwrap();
        let meta = PackageMetadata::new("Good", Version::new(1, 2, 3));
        std::fs::write(
            root.join(MANIFEST_FILENAME),
            serialize_package_manifest(&meta),
        )
        .unwrap();

        let pkg = DirectoryLoader.load(&root).unwrap();
        assert_eq!(pkg.metadata().name, "Good");
        assert_eq!(pkg.metadata().version, Version::new(1, 2, 3));
    }

    #[test]
    fn test_archive_loader_requires_zip_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pack.rar");
        std::fs::write(&path, b"whatever").unwrap();
        assert!(ArchiveLoader.load(&path).is_none());
    }

    #[test]
    fn test_archive_loader_requires_manifest_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bare.zip");
        let file = std::fs::File::create(&path).unwrap();
        let mut zip = ZipWriter::new(file);
        zip.start_file("data.txt", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"no manifest here").unwrap();
        zip.finish().unwrap();

        assert!(ArchiveLoader.load(&path).is_none());
    }

    #[test]
    fn test_archive_loader_claims_valid_zip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pack.zip");
        let file = std::fs::File::create(&path).unwrap();
        let mut zip = ZipWriter::new(file);
        zip.start_file(MANIFEST_FILENAME, SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"Name: Zipped\nVersion: 0.5.0\n").unwrap();
        zip.finish().unwrap();

        let pkg = ArchiveLoader.load(&path).unwrap();
        assert_eq!(pkg.metadata().name, "Zipped");
    }

    #[test]
    fn test_bundle_loader_requires_bundle_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pack.zip");
        std::fs::write(&path, b"whatever").unwrap();
        assert!(BundleLoader.load(&path).is_none());
    }

    #[test]
    fn test_bundle_loader_declines_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk.bundle");
        std::fs::write(&path, b"XXXX not a bundle, lots of padding bytes here").unwrap();
        assert!(BundleLoader.load(&path).is_none());
    }

    #[test]
    fn test_bundle_loader_claims_valid_bundle() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pack.bundle");
        let meta = PackageMetadata::new("Bundled", Version::new(3, 0, 0));
        let mut writer = BundleWriter::new();
        writer.set_manifest(&meta);
        writer.add_entry("data.txt", b"payload".to_vec());
        writer.finish(&path).unwrap();

        let pkg = BundleLoader.load(&path).unwrap();
        assert_eq!(pkg.metadata().name, "Bundled");
        assert_eq!(pkg.metadata().version, Version::new(3, 0, 0));
    }
}
