//! Content packages and their backing stores.
//!
//! A package is a named, versioned unit of game content exposing a virtual
//! path space. All backends answer the same [`Package`] interface and differ
//! only in where bytes come from:
//!
//! - [`DirectoryPackage`]: a plain directory tree, paths map 1:1.
//! - [`ArchivePackage`]: a zip archive, entries addressed by name.
//! - [`BundlePackage`]: a single binary file with a checksummed name table.
//!
//! Every package carries a manifest ([`MANIFEST_FILENAME`]) parsed into
//! [`PackageMetadata`] at discovery time.
//!
//! # Example
//!
//! ```ignore
//! use modlayer::package::{DirectoryPackage, Package, PackageMetadata};
//!
//! let pkg = DirectoryPackage::new(metadata, "/mods/winter");
//! for entry in pkg.find_files(Path::new("textures/snow")) {
//!     if let Some(bytes) = pkg.read_bytes(&entry) {
//!         // decode...
//!     }
//! }
//! ```

mod archive;
mod bundle;
mod directory;
mod metadata;
mod store;

pub use archive::ArchivePackage;
pub use bundle::{BundleError, BundlePackage, BundleWriter, BUNDLE_MAGIC, BUNDLE_VERSION};
pub use directory::DirectoryPackage;
pub use metadata::{
    parse_package_manifest, serialize_package_manifest, ManifestError, PackageMetadata,
    PersistenceMode, MANIFEST_FILENAME,
};
pub use store::{BoxFuture, FoundFile, Package};
