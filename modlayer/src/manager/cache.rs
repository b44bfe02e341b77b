//! The resource cache.
//!
//! Loaded values are shared through `Arc`s handed to callers; the cache only
//! holds weak references, so a value lives exactly as long as someone uses
//! it. Every insertion carries a generation tag from a monotonic counter.
//! A [`ResourceHandle`] remembers the tag it was issued with, and staleness
//! is a tag comparison: unloads and replacements install a new tag, so old
//! handles report stale regardless of whether the old value is still alive.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

/// Cache key: one semantic type requested at one logical path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    type_id: TypeId,
    logical: String,
}

impl CacheKey {
    /// Key for type `T` at a logical path.
    pub fn new<T: Any>(logical: &Path) -> Self {
        Self::for_type(TypeId::of::<T>(), logical)
    }

    /// Key for a runtime type id at a logical path.
    pub fn for_type(type_id: TypeId, logical: &Path) -> Self {
        let logical = logical
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        Self { type_id, logical }
    }

    /// The logical path this key addresses.
    pub fn logical(&self) -> &str {
        &self.logical
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.logical, self.type_id)
    }
}

/// A loaded resource with its staleness tag.
///
/// The handle keeps the value alive; dropping every handle (and every other
/// `Arc` clone) expires the cache entry. [`is_current`](Self::is_current)
/// asks the owning manager whether this handle still reflects the cached
/// state.
#[derive(Clone)]
pub struct ResourceHandle<T> {
    value: Arc<T>,
    key: CacheKey,
    generation: u64,
}

impl<T> ResourceHandle<T> {
    pub(crate) fn new(value: Arc<T>, key: CacheKey, generation: u64) -> Self {
        Self {
            value,
            key,
            generation,
        }
    }

    /// The shared value.
    pub fn value(&self) -> &Arc<T> {
        &self.value
    }

    /// The cache key this handle was issued for.
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Generation tag issued with this handle.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<T> std::ops::Deref for ResourceHandle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

pub(crate) struct CacheEntry {
    pub weak: Weak<dyn Any + Send + Sync>,
    pub generation: u64,
    pub package: String,
    pub concrete: PathBuf,
    pub parser: &'static str,
}

/// Weak-reference cache with hit/miss accounting.
#[derive(Default)]
pub(crate) struct ResourceCache {
    entries: HashMap<CacheKey, CacheEntry>,
    pub hits: u64,
    pub misses: u64,
}

impl ResourceCache {
    /// Live value for a key, if the entry exists and someone still holds it.
    ///
    /// Counts a hit or a miss; dead entries are purged on the way.
    pub fn lookup(&mut self, key: &CacheKey) -> Option<(Arc<dyn Any + Send + Sync>, u64)> {
        match self.entries.get(key) {
            Some(entry) => match entry.weak.upgrade() {
                Some(value) => {
                    self.hits += 1;
                    Some((value, entry.generation))
                }
                None => {
                    self.entries.remove(key);
                    self.misses += 1;
                    None
                }
            },
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(
        &mut self,
        key: CacheKey,
        value: &Arc<dyn Any + Send + Sync>,
        generation: u64,
        package: String,
        concrete: PathBuf,
        parser: &'static str,
    ) {
        self.entries.insert(
            key,
            CacheEntry {
                weak: Arc::downgrade(value),
                generation,
                package,
                concrete,
                parser,
            },
        );
    }

    /// Remove one entry, returning it if it existed.
    pub fn remove(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    /// Remove every entry owned by `package`, returning the removed keys.
    pub fn remove_package(&mut self, package: &str) -> Vec<CacheKey> {
        let keys: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, e)| e.package == package)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &keys {
            self.entries.remove(key);
        }
        keys
    }

    /// Find the entry holding exactly this allocation, by pointer identity.
    pub fn find_by_identity(&self, value: &Arc<dyn Any + Send + Sync>) -> Option<CacheKey> {
        let target = Arc::as_ptr(value) as *const ();
        self.entries.iter().find_map(|(key, entry)| {
            let live = entry.weak.upgrade()?;
            if Arc::as_ptr(&live) as *const () == target {
                Some(key.clone())
            } else {
                None
            }
        })
    }

    /// Whether a handle's key and generation still match a live entry.
    pub fn is_current(&self, key: &CacheKey, generation: u64) -> bool {
        self.entries
            .get(key)
            .map(|e| e.generation == generation && e.weak.strong_count() > 0)
            .unwrap_or(false)
    }

    /// Number of entries whose value is still alive.
    pub fn live_entries(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.weak.strong_count() > 0)
            .count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
