//! Package recognizers and the loader chain.
//!
//! A [`PackageLoader`] inspects one filesystem entry and either claims it by
//! producing a [`Package`] or declines with `None`. Loaders never error:
//! unreadable or malformed entries are logged and declined so one broken
//! download cannot abort a discovery pass.
//!
//! The [`LoaderChain`] holds loaders in a fixed order (directory, archive,
//! bundle by default) and the first to claim an entry wins. An entry no
//! loader claims is simply not a package.

mod builtin;

pub use builtin::{ArchiveLoader, BundleLoader, DirectoryLoader};

use std::path::Path;

use crate::package::Package;

/// Recognizes one kind of filesystem entry as a package.
pub trait PackageLoader: Send + Sync {
    /// Short stable name, used in logs.
    fn name(&self) -> &'static str;

    /// Claim `path` by producing a package, or decline with `None`.
    fn load(&self, path: &Path) -> Option<Box<dyn Package>>;
}

/// Ordered chain of loaders; first claim wins.
pub struct LoaderChain {
    loaders: Vec<Box<dyn PackageLoader>>,
}

impl LoaderChain {
    /// Chain with the built-in loaders in their fixed order: directory,
    /// archive, bundle.
    pub fn new() -> Self {
        Self {
            loaders: vec![
                Box::new(DirectoryLoader),
                Box::new(ArchiveLoader),
                Box::new(BundleLoader),
            ],
        }
    }

    /// An empty chain, for callers composing their own loader set.
    pub fn empty() -> Self {
        Self {
            loaders: Vec::new(),
        }
    }

    /// Append a loader after the existing ones.
    pub fn register(&mut self, loader: Box<dyn PackageLoader>) {
        self.loaders.push(loader);
    }

    /// Run the chain over one entry. The first loader to claim it wins.
    pub fn load(&self, path: &Path) -> Option<Box<dyn Package>> {
        for loader in &self.loaders {
            if let Some(package) = loader.load(path) {
                tracing::debug!(
                    loader = loader.name(),
                    path = %path.display(),
                    package = %package.metadata().name,
                    "entry claimed"
                );
                return Some(package);
            }
        }
        None
    }
}

impl Default for LoaderChain {
    fn default() -> Self {
        Self::new()
    }
}
