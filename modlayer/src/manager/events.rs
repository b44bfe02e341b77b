//! Resource lifecycle events.

use std::path::PathBuf;

use crate::manager::cache::CacheKey;

/// Notification of a cache state change.
///
/// Events fire after the cache lock is released, so subscribers may call
/// back into the manager.
#[derive(Debug, Clone)]
pub enum ResourceEvent {
    /// A value was resolved and inserted into the cache.
    Loaded {
        /// Key the value was cached under.
        key: CacheKey,
        /// Package that supplied the winning entry.
        package: String,
        /// Concrete entry the value was decoded from.
        concrete: PathBuf,
        /// Parser that produced the value.
        parser: &'static str,
    },

    /// A load request was served from a live cache entry.
    Reused {
        /// Key that was hit.
        key: CacheKey,
    },

    /// A cache entry was removed.
    Unloaded {
        /// Key that was removed.
        key: CacheKey,
        /// Package that had supplied the value.
        package: String,
    },
}

/// Boxed subscriber callback.
pub type EventSubscriber = Box<dyn Fn(&ResourceEvent) + Send + Sync>;
