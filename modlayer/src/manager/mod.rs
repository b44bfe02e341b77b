//! The mod manager, the crate's orchestrator.
//!
//! # Overview
//!
//! [`ModManager`] ties the other modules together. Built from a
//! [`ManagerConfig`], it walks the configured search roots, mounts every
//! package a [`LoaderChain`](crate::loader::LoaderChain) claims, applies
//! persisted ordering and activation from a
//! [`SettingsStore`](crate::settings::SettingsStore), and then serves typed
//! resource loads against the resulting precedence stack.
//!
//! Loaded values are cached weakly under a [`CacheKey`] and handed out as
//! [`ResourceHandle`]s carrying generation tags, so staleness survives
//! unloads and replacements. Cache transitions are announced through
//! [`ResourceEvent`]s, and packages with companion scripts are driven
//! through the [`scripting`] hook.
//!
//! # Example
//!
//! ```no_run
//! use modlayer::{ManagerConfig, ModManager};
//!
//! let config = ManagerConfig::new()
//!     .with_group("base", false, false)
//!     .with_group("mods", true, true)
//!     .with_root("game/base", "base")
//!     .with_root("game/mods", "mods");
//!
//! let manager = ModManager::new(config);
//! if let Some(text) = manager.read_text(std::path::Path::new("config/game.txt")) {
//!     println!("{text}");
//! }
//! ```

mod cache;
mod config;
mod core;
mod error;
mod events;
pub mod scripting;

pub use cache::{CacheKey, ResourceHandle};
pub use config::{GroupSpec, ManagerConfig, SearchRoot};
pub use core::{ManagerStats, ModManager};
pub use error::ManagerError;
pub use events::{EventSubscriber, ResourceEvent};
pub use scripting::{
    DispatcherHandle, FrameDispatcher, LoggingScriptHost, ScriptError, ScriptHost,
    ScriptInterpreter,
};
