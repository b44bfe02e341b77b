//! The `ModManager` orchestrator.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::group::Group;
use crate::loader::LoaderChain;
use crate::manager::cache::{CacheKey, ResourceCache, ResourceHandle};
use crate::manager::config::ManagerConfig;
use crate::manager::error::ManagerError;
use crate::manager::events::{EventSubscriber, ResourceEvent};
use crate::manager::scripting::{FrameDispatcher, ScriptHost, ScriptSession};
use crate::package::{Package, PackageMetadata, PersistenceMode};
use crate::parser::{resolve_with_parsers, resolve_with_parsers_async, ParserRegistry};
use crate::settings::SettingsStore;

/// Counters describing the manager's current state.
#[derive(Debug, Clone, Default)]
pub struct ManagerStats {
    /// Registered packages across all groups.
    pub packages: usize,
    /// Packages currently in the active precedence list.
    pub active: usize,
    /// Load requests served from a live cache entry.
    pub cache_hits: u64,
    /// Load requests that walked the package stack.
    pub cache_misses: u64,
    /// Cache entries whose value is still held somewhere.
    pub live_entries: usize,
}

impl fmt::Display for ManagerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} packages ({} active), cache: {} hits / {} misses, {} live entries",
            self.packages, self.active, self.cache_hits, self.cache_misses, self.live_entries
        )
    }
}

struct PackageSlot {
    package: Box<dyn Package>,
    group: String,
    enabled: bool,
}

enum MoveOp {
    Up,
    Down,
    Top,
    Bottom,
}

/// The orchestrator: discovery, precedence, persistence, the resolve/cache
/// API and the scripting hook.
///
/// Game code holds one `ModManager` and consumes content exclusively through
/// it. Construction runs discovery over the configured search roots; from
/// then on the manager maintains an active precedence list that every
/// resolution walks front to back, first match winning.
pub struct ModManager {
    loaders: LoaderChain,
    parsers: ParserRegistry,
    packages: HashMap<String, PackageSlot>,
    groups: Vec<Group>,
    active: Vec<String>,
    cache: Mutex<ResourceCache>,
    generation: AtomicU64,
    settings: SettingsStore,
    subscribers: Vec<EventSubscriber>,
    sessions: Mutex<Vec<ScriptSession>>,
}

impl ModManager {
    /// Build a manager with the built-in loader chain and parsers.
    pub fn new(config: ManagerConfig) -> Self {
        Self::with_components(config, LoaderChain::new(), crate::parser::builtin_registry())
    }

    /// Build a manager with a custom loader chain and parser registry.
    pub fn with_components(
        config: ManagerConfig,
        loaders: LoaderChain,
        parsers: ParserRegistry,
    ) -> Self {
        let mut settings = SettingsStore::open(&config.settings_path);

        let mut groups: Vec<Group> = config
            .groups
            .iter()
            .map(|spec| Group::new(&spec.name, spec.user_can_disable, spec.user_can_reorder))
            .collect();
        for root in &config.roots {
            if !groups.iter().any(|g| g.name == root.group) {
                groups.push(Group::new(&root.group, true, true));
            }
        }

        let mut packages: HashMap<String, PackageSlot> = HashMap::new();
        for root in &config.roots {
            for entry in sorted_entries(&root.path) {
                let Some(package) = loaders.load(&entry) else {
                    continue;
                };
                let name = package.metadata().name.clone();
                if packages.contains_key(&name) {
                    warn!(
                        package = %name,
                        path = %entry.display(),
                        "duplicate package name, keeping the first"
                    );
                    continue;
                }
                let Some(group) = groups.iter_mut().find(|g| g.name == root.group) else {
                    continue;
                };
                let enabled = if group.user_can_disable {
                    settings.enabled(&root.group, &name).unwrap_or(true)
                } else {
                    true
                };
                group.push(name.clone());
                info!(package = %name, group = %root.group, enabled, "package registered");
                packages.insert(
                    name,
                    PackageSlot {
                        package,
                        group: root.group.clone(),
                        enabled,
                    },
                );
            }
        }

        // Apply persisted order per reorderable group. Discovery order is
        // reversed first so packages without a saved index (new installs)
        // end up at the highest precedence, newest first; the stable sort
        // then slots everything with a saved index into place.
        for group in &mut groups {
            if !group.user_can_reorder {
                continue;
            }
            let mut members = group.members().to_vec();
            members.reverse();
            members.sort_by_key(|name| settings.order(&group.name, name).unwrap_or(i64::MIN));
            group.set_members(members);
            for (idx, name) in group.members().iter().enumerate() {
                settings.set_order(&group.name, name, idx as i64);
            }
        }
        if let Err(e) = settings.save() {
            warn!(error = %e, "failed to persist settings");
        }

        let mut manager = Self {
            loaders,
            parsers,
            packages,
            groups,
            active: Vec::new(),
            cache: Mutex::new(ResourceCache::default()),
            generation: AtomicU64::new(0),
            settings,
            subscribers: Vec::new(),
            sessions: Mutex::new(Vec::new()),
        };
        manager.recompute_active();
        manager
    }

    /// Register a callback invoked on every [`ResourceEvent`].
    pub fn subscribe(&mut self, subscriber: impl Fn(&ResourceEvent) + Send + Sync + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    fn emit(&self, event: &ResourceEvent) {
        for subscriber in &self.subscribers {
            subscriber(event);
        }
    }

    /// Active package names in precedence order, highest first.
    pub fn active_packages(&self) -> &[String] {
        &self.active
    }

    /// Configured groups in precedence order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Metadata of a registered package.
    pub fn package_metadata(&self, name: &str) -> Option<&PackageMetadata> {
        self.packages.get(name).map(|slot| slot.package.metadata())
    }

    /// Whether a registered package is enabled.
    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.packages.get(name).map(|slot| slot.enabled)
    }

    /// Members of a group with their enabled flags, precedence order.
    pub fn mod_order(&self, group: &str) -> Result<Vec<(String, bool)>, ManagerError> {
        let group = self
            .groups
            .iter()
            .find(|g| g.name == group)
            .ok_or_else(|| ManagerError::UnknownGroup(group.to_string()))?;
        Ok(group
            .members()
            .iter()
            .map(|name| {
                let enabled = self
                    .packages
                    .get(name)
                    .map(|slot| slot.enabled)
                    .unwrap_or(false);
                (name.clone(), enabled)
            })
            .collect())
    }

    fn recompute_active(&mut self) {
        self.active = self
            .groups
            .iter()
            .flat_map(|g| g.members().iter())
            .filter(|name| {
                self.packages
                    .get(name.as_str())
                    .map(|slot| slot.enabled)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        debug!(active = self.active.len(), "active list recomputed");
    }

    fn save_settings(&self) {
        if let Err(e) = self.settings.save() {
            warn!(error = %e, "failed to persist settings");
        }
    }

    // ------------------------------------------------------------------
    // Activation
    // ------------------------------------------------------------------

    fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<(), ManagerError> {
        let group_name = self
            .packages
            .get(name)
            .ok_or_else(|| ManagerError::UnknownPackage(name.to_string()))?
            .group
            .clone();
        let can_disable = self
            .groups
            .iter()
            .find(|g| g.name == group_name)
            .map(|g| g.user_can_disable)
            .unwrap_or(false);
        if !can_disable {
            return Err(ManagerError::DisableLocked(group_name));
        }
        if let Some(slot) = self.packages.get_mut(name) {
            slot.enabled = enabled;
        }
        self.settings.set_enabled(&group_name, name, enabled);
        self.save_settings();
        self.recompute_active();
        Ok(())
    }

    /// Enable a package.
    pub fn enable_mod(&mut self, name: &str) -> Result<(), ManagerError> {
        self.set_enabled(name, true)
    }

    /// Disable a package. Cached values resolved through it stay alive for
    /// current holders but the package stops answering new resolutions.
    pub fn disable_mod(&mut self, name: &str) -> Result<(), ManagerError> {
        self.set_enabled(name, false)
    }

    /// Flip a package's enabled flag, returning the new state.
    pub fn toggle_mod(&mut self, name: &str) -> Result<bool, ManagerError> {
        let enabled = self
            .is_enabled(name)
            .ok_or_else(|| ManagerError::UnknownPackage(name.to_string()))?;
        self.set_enabled(name, !enabled)?;
        Ok(!enabled)
    }

    // ------------------------------------------------------------------
    // Ordering
    // ------------------------------------------------------------------

    fn move_mod(&mut self, name: &str, op: MoveOp) -> Result<bool, ManagerError> {
        let group_name = self
            .packages
            .get(name)
            .ok_or_else(|| ManagerError::UnknownPackage(name.to_string()))?
            .group
            .clone();
        let group = self
            .groups
            .iter_mut()
            .find(|g| g.name == group_name)
            .ok_or_else(|| ManagerError::UnknownGroup(group_name.clone()))?;
        if !group.user_can_reorder {
            return Err(ManagerError::ReorderLocked(group_name));
        }

        let changed = match op {
            MoveOp::Up => group.move_up(name),
            MoveOp::Down => group.move_down(name),
            MoveOp::Top => group.move_to_top(name),
            MoveOp::Bottom => group.move_to_bottom(name),
        };
        if changed {
            let members = group.members().to_vec();
            for (idx, member) in members.iter().enumerate() {
                self.settings.set_order(&group_name, member, idx as i64);
            }
            self.save_settings();
            self.recompute_active();
        }
        Ok(changed)
    }

    /// Move a package one step toward the highest precedence.
    pub fn move_mod_up(&mut self, name: &str) -> Result<bool, ManagerError> {
        self.move_mod(name, MoveOp::Up)
    }

    /// Move a package one step toward the lowest precedence.
    pub fn move_mod_down(&mut self, name: &str) -> Result<bool, ManagerError> {
        self.move_mod(name, MoveOp::Down)
    }

    /// Move a package to the highest precedence in its group.
    pub fn move_mod_to_top(&mut self, name: &str) -> Result<bool, ManagerError> {
        self.move_mod(name, MoveOp::Top)
    }

    /// Move a package to the lowest precedence in its group.
    pub fn move_mod_to_bottom(&mut self, name: &str) -> Result<bool, ManagerError> {
        self.move_mod(name, MoveOp::Bottom)
    }

    // ------------------------------------------------------------------
    // Resolution and cache
    // ------------------------------------------------------------------

    /// Resolve a logical path to a shared value of type `T`.
    ///
    /// Served from the cache when a live entry exists; otherwise the active
    /// package list is walked front to back and the first package whose
    /// candidates decode to `T` wins. `None` means no active package can
    /// supply the resource, which is a normal outcome, not an error.
    pub fn load<T: Any + Send + Sync>(
        &self,
        logical: impl AsRef<Path>,
    ) -> Option<ResourceHandle<T>> {
        let logical = logical.as_ref();
        let key = CacheKey::new::<T>(logical);

        let hit = self.cache.lock().lookup(&key);
        if let Some((value, generation)) = hit {
            let value = value.downcast::<T>().ok()?;
            self.emit(&ResourceEvent::Reused { key: key.clone() });
            return Some(ResourceHandle::new(value, key, generation));
        }

        for name in &self.active {
            let Some(slot) = self.packages.get(name) else {
                continue;
            };
            let Some(resolution) = resolve_with_parsers(
                slot.package.as_ref(),
                &self.parsers,
                TypeId::of::<T>(),
                logical,
            ) else {
                continue;
            };
            let Ok(value) = Arc::clone(&resolution.value).downcast::<T>() else {
                warn!(parser = resolution.parser, "parser produced mismatched type");
                continue;
            };

            let generation = self.generation.fetch_add(1, Ordering::Relaxed);
            self.cache.lock().insert(
                key.clone(),
                &resolution.value,
                generation,
                name.clone(),
                resolution.concrete.clone(),
                resolution.parser,
            );
            self.emit(&ResourceEvent::Loaded {
                key: key.clone(),
                package: name.clone(),
                concrete: resolution.concrete,
                parser: resolution.parser,
            });
            return Some(ResourceHandle::new(value, key, generation));
        }
        None
    }

    /// Async twin of [`load`](Self::load), reading through the packages'
    /// async methods.
    pub async fn load_async<T: Any + Send + Sync>(
        &self,
        logical: impl AsRef<Path>,
    ) -> Option<ResourceHandle<T>> {
        let logical = logical.as_ref();
        let key = CacheKey::new::<T>(logical);

        let hit = self.cache.lock().lookup(&key);
        if let Some((value, generation)) = hit {
            let value = value.downcast::<T>().ok()?;
            self.emit(&ResourceEvent::Reused { key: key.clone() });
            return Some(ResourceHandle::new(value, key, generation));
        }

        for name in &self.active {
            let Some(slot) = self.packages.get(name) else {
                continue;
            };
            let Some(resolution) = resolve_with_parsers_async(
                slot.package.as_ref(),
                &self.parsers,
                TypeId::of::<T>(),
                logical,
            )
            .await
            else {
                continue;
            };
            let Ok(value) = Arc::clone(&resolution.value).downcast::<T>() else {
                warn!(parser = resolution.parser, "parser produced mismatched type");
                continue;
            };

            let generation = self.generation.fetch_add(1, Ordering::Relaxed);
            self.cache.lock().insert(
                key.clone(),
                &resolution.value,
                generation,
                name.clone(),
                resolution.concrete.clone(),
                resolution.parser,
            );
            self.emit(&ResourceEvent::Loaded {
                key: key.clone(),
                package: name.clone(),
                concrete: resolution.concrete,
                parser: resolution.parser,
            });
            return Some(ResourceHandle::new(value, key, generation));
        }
        None
    }

    /// Whether a handle still reflects the current cached state.
    ///
    /// Stale after the entry was unloaded or replaced, even if the old value
    /// is still alive in other holders.
    pub fn is_current<T>(&self, handle: &ResourceHandle<T>) -> bool {
        self.cache.lock().is_current(handle.key(), handle.generation())
    }

    /// Drop the cache entry for a key. Returns whether one existed.
    pub fn unload(&self, key: &CacheKey) -> bool {
        let removed = self.cache.lock().remove(key);
        match removed {
            Some(entry) => {
                debug!(
                    key = %key,
                    concrete = %entry.concrete.display(),
                    parser = entry.parser,
                    "unloading cached resource"
                );
                self.emit(&ResourceEvent::Unloaded {
                    key: key.clone(),
                    package: entry.package,
                });
                true
            }
            None => false,
        }
    }

    /// Drop the cache entry holding exactly this value, by identity.
    pub fn unload_resource<T: Any + Send + Sync>(&self, value: &Arc<T>) -> bool {
        let any: Arc<dyn Any + Send + Sync> = Arc::clone(value) as Arc<dyn Any + Send + Sync>;
        let key = self.cache.lock().find_by_identity(&any);
        match key {
            Some(key) => self.unload(&key),
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Raw reads
    // ------------------------------------------------------------------

    /// Read the first matching entry as text, walking precedence order.
    ///
    /// Uses each package's first candidate only and bypasses the cache and
    /// events. A package whose candidate fails to read does not shadow the
    /// ones below it.
    pub fn read_text(&self, logical: impl AsRef<Path>) -> Option<String> {
        let logical = logical.as_ref();
        for name in &self.active {
            let Some(slot) = self.packages.get(name) else {
                continue;
            };
            if let Some(entry) = slot.package.find_files(logical).into_iter().next() {
                if let Some(text) = slot.package.read_text(&entry) {
                    return Some(text);
                }
            }
        }
        None
    }

    /// Read the first matching entry as bytes, walking precedence order.
    pub fn read_bytes(&self, logical: impl AsRef<Path>) -> Option<Vec<u8>> {
        let logical = logical.as_ref();
        for name in &self.active {
            let Some(slot) = self.packages.get(name) else {
                continue;
            };
            if let Some(entry) = slot.package.find_files(logical).into_iter().next() {
                if let Some(bytes) = slot.package.read_bytes(&entry) {
                    return Some(bytes);
                }
            }
        }
        None
    }

    /// Async twin of [`read_text`](Self::read_text).
    pub async fn read_text_async(&self, logical: impl AsRef<Path>) -> Option<String> {
        let logical = logical.as_ref();
        for name in &self.active {
            let Some(slot) = self.packages.get(name) else {
                continue;
            };
            if let Some(entry) = slot.package.find_files(logical).into_iter().next() {
                if let Some(text) = slot.package.read_text_async(&entry).await {
                    return Some(text);
                }
            }
        }
        None
    }

    /// Async twin of [`read_bytes`](Self::read_bytes).
    pub async fn read_bytes_async(&self, logical: impl AsRef<Path>) -> Option<Vec<u8>> {
        let logical = logical.as_ref();
        for name in &self.active {
            let Some(slot) = self.packages.get(name) else {
                continue;
            };
            if let Some(entry) = slot.package.find_files(logical).into_iter().next() {
                if let Some(bytes) = slot.package.read_bytes_async(&entry).await {
                    return Some(bytes);
                }
            }
        }
        None
    }

    /// Whether any active package has an entry matching the logical path.
    pub fn exists(&self, logical: impl AsRef<Path>) -> bool {
        let logical = logical.as_ref();
        self.active.iter().any(|name| {
            self.packages
                .get(name)
                .map(|slot| !slot.package.find_files(logical).is_empty())
                .unwrap_or(false)
        })
    }

    // ------------------------------------------------------------------
    // Package lifecycle
    // ------------------------------------------------------------------

    /// Remove a package entirely: cache entries, script session, group
    /// membership, persisted order keys.
    pub fn unload_package(&mut self, name: &str) -> Result<(), ManagerError> {
        let mut slot = self
            .packages
            .remove(name)
            .ok_or_else(|| ManagerError::UnknownPackage(name.to_string()))?;

        let keys = self.cache.lock().remove_package(name);
        for key in keys {
            self.emit(&ResourceEvent::Unloaded {
                key,
                package: name.to_string(),
            });
        }
        self.sessions.lock().retain(|s| s.package != name);
        slot.package.release();

        if let Some(group) = self.groups.iter_mut().find(|g| g.name == slot.group) {
            group.remove(name);
            if group.user_can_reorder {
                let members = group.members().to_vec();
                self.settings.forget(&slot.group, name);
                for (idx, member) in members.iter().enumerate() {
                    self.settings.set_order(&slot.group, member, idx as i64);
                }
                self.save_settings();
            }
        }
        self.recompute_active();
        info!(package = %name, "package unloaded");
        Ok(())
    }

    /// Release everything: script sessions, cache, package backends.
    ///
    /// The manager is inert afterwards; every resolution misses.
    pub fn shutdown(&mut self) {
        self.sessions.lock().clear();
        self.cache.lock().clear();
        for slot in self.packages.values_mut() {
            slot.package.release();
        }
        self.packages.clear();
        for group in &mut self.groups {
            group.set_members(Vec::new());
        }
        self.active.clear();
        self.save_settings();
        info!("manager shut down");
    }

    /// Current counters.
    pub fn stats(&self) -> ManagerStats {
        let cache = self.cache.lock();
        ManagerStats {
            packages: self.packages.len(),
            active: self.active.len(),
            cache_hits: cache.hits,
            cache_misses: cache.misses,
            live_entries: cache.live_entries(),
        }
    }

    // ------------------------------------------------------------------
    // Scripting
    // ------------------------------------------------------------------

    /// Run every active package's companion scripts in precedence order.
    ///
    /// One interpreter per package, created by `host`. A failing script is
    /// logged and skipped. Interpreters of packages with simple or full
    /// persistence are kept as sessions; full persistence additionally binds
    /// a frame dispatcher before execution. Any sessions from a previous
    /// pass are dropped first.
    pub fn run_scripts(&mut self, host: &dyn ScriptHost) {
        self.sessions.lock().clear();

        let order = self.active.clone();
        for name in order {
            let Some(slot) = self.packages.get(&name) else {
                continue;
            };
            let metadata = slot.package.metadata();
            if metadata.scripts.is_empty() {
                continue;
            }
            let persistence = metadata.persistence;
            let scripts = metadata.scripts.clone();

            let mut interpreter = host.create_interpreter(&name);
            let dispatcher = if persistence == PersistenceMode::Full {
                let dispatcher = FrameDispatcher::new();
                interpreter.bind_dispatcher(dispatcher.handle());
                Some(dispatcher)
            } else {
                None
            };

            for script in &scripts {
                let path = Path::new(script);
                let source = slot
                    .package
                    .find_files(path)
                    .into_iter()
                    .next()
                    .and_then(|entry| slot.package.read_text(&entry));
                match source {
                    Some(source) => {
                        if let Err(e) = interpreter.execute(path, &source) {
                            warn!(package = %name, script = %script, error = %e, "script failed");
                        }
                    }
                    None => {
                        warn!(package = %name, script = %script, "script source missing");
                    }
                }
            }

            match persistence {
                PersistenceMode::None => {}
                PersistenceMode::Simple | PersistenceMode::Full => {
                    self.sessions.lock().push(ScriptSession {
                        package: name.clone(),
                        interpreter,
                        dispatcher,
                    });
                }
            }
        }
    }

    /// Tick every live frame dispatcher once.
    pub fn dispatch_frame(&self) {
        let sessions = self.sessions.lock();
        for session in sessions.iter() {
            if let Some(dispatcher) = &session.dispatcher {
                dispatcher.tick();
            }
        }
    }

    /// Names of packages with a live script session, precedence order.
    pub fn script_sessions(&self) -> Vec<String> {
        self.sessions
            .lock()
            .iter()
            .map(|s| s.package.clone())
            .collect()
    }

    /// Register an additional loader behind the built-in chain.
    pub fn register_loader(&mut self, loader: Box<dyn crate::loader::PackageLoader>) {
        self.loaders.register(loader);
    }

    /// Register an additional parser behind the existing ones.
    pub fn register_parser(&mut self, parser: Arc<dyn crate::parser::ResourceParser>) {
        self.parsers.register(parser);
    }
}

fn sorted_entries(root: &Path) -> Vec<std::path::PathBuf> {
    let reader = match std::fs::read_dir(root) {
        Ok(reader) => reader,
        Err(e) => {
            warn!(root = %root.display(), error = %e, "search root unreadable");
            return Vec::new();
        }
    };
    let mut entries: Vec<std::path::PathBuf> =
        reader.filter_map(Result::ok).map(|e| e.path()).collect();
    entries.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{serialize_package_manifest, MANIFEST_FILENAME};
    use semver::Version;
    use std::sync::Mutex as StdMutex;
    use tempfile::TempDir;

    fn write_package(root: &Path, name: &str, files: &[(&str, &str)]) {
        write_package_with(root, name, PersistenceMode::None, &[], files);
    }

    fn write_package_with(
        root: &Path,
        name: &str,
        persistence: PersistenceMode,
        scripts: &[&str],
        files: &[(&str, &str)],
    ) {
        std::fs::create_dir_all(root).unwrap();
        let mut meta = PackageMetadata::new(name, Version::new(1, 0, 0))
            .with_persistence(persistence);
        for script in scripts {
            meta = meta.with_script(*script);
        }
        std::fs::write(
            root.join(MANIFEST_FILENAME),
            serialize_package_manifest(&meta),
        )
        .unwrap();
        for (rel, content) in files {
            let path = root.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
    }

    fn manager_for(dir: &TempDir, packages: &[(&str, &[(&str, &str)])]) -> ModManager {
        let mods = dir.path().join("mods");
        std::fs::create_dir_all(&mods).unwrap();
        for (name, files) in packages {
            write_package(&mods.join(name), name, files);
        }
        let config = ManagerConfig::new()
            .with_group("mods", true, true)
            .with_root(&mods, "mods")
            .with_settings_path(dir.path().join("settings.ini"));
        ModManager::new(config)
    }

    #[test]
    fn test_discovery_registers_packages() {
        let dir = TempDir::new().unwrap();
        let mgr = manager_for(&dir, &[("Alpha", &[]), ("Beta", &[])]);
        assert_eq!(mgr.stats().packages, 2);
        assert!(mgr.package_metadata("Alpha").is_some());
        assert!(mgr.package_metadata("Beta").is_some());
    }

    #[test]
    fn test_default_order_is_reverse_discovery() {
        let dir = TempDir::new().unwrap();
        let mgr = manager_for(&dir, &[("Alpha", &[]), ("Beta", &[]), ("Gamma", &[])]);
        // Discovery is alphabetical, so defaults put the last-discovered
        // package at the highest precedence.
        assert_eq!(mgr.active_packages(), &["Gamma", "Beta", "Alpha"]);
    }

    #[test]
    fn test_persisted_order_survives_restart() {
        let dir = TempDir::new().unwrap();
        {
            let mut mgr = manager_for(&dir, &[("Alpha", &[]), ("Beta", &[])]);
            assert_eq!(mgr.active_packages(), &["Beta", "Alpha"]);
            assert!(mgr.move_mod_to_top("Alpha").unwrap());
            assert_eq!(mgr.active_packages(), &["Alpha", "Beta"]);
        }
        let mgr = manager_for(&dir, &[("Alpha", &[]), ("Beta", &[])]);
        assert_eq!(mgr.active_packages(), &["Alpha", "Beta"]);
    }

    #[test]
    fn test_new_package_enters_at_top() {
        let dir = TempDir::new().unwrap();
        {
            let mgr = manager_for(&dir, &[("Alpha", &[]), ("Beta", &[])]);
            assert_eq!(mgr.active_packages(), &["Beta", "Alpha"]);
        }
        // Gamma appears with no saved index and lands above both.
        let mgr = manager_for(&dir, &[("Alpha", &[]), ("Beta", &[]), ("Gamma", &[])]);
        assert_eq!(mgr.active_packages(), &["Gamma", "Beta", "Alpha"]);
    }

    #[test]
    fn test_disable_persists_and_excludes() {
        let dir = TempDir::new().unwrap();
        {
            let mut mgr = manager_for(&dir, &[("Alpha", &[]), ("Beta", &[])]);
            mgr.disable_mod("Beta").unwrap();
            assert_eq!(mgr.active_packages(), &["Alpha"]);
            assert_eq!(mgr.is_enabled("Beta"), Some(false));
        }
        let mgr = manager_for(&dir, &[("Alpha", &[]), ("Beta", &[])]);
        assert_eq!(mgr.active_packages(), &["Alpha"]);
    }

    #[test]
    fn test_reenable_restores_persisted_position() {
        let dir = TempDir::new().unwrap();
        let mut mgr = manager_for(&dir, &[("Alpha", &[]), ("Beta", &[]), ("Gamma", &[])]);
        assert_eq!(mgr.active_packages(), &["Gamma", "Beta", "Alpha"]);

        mgr.disable_mod("Beta").unwrap();
        assert_eq!(mgr.active_packages(), &["Gamma", "Alpha"]);

        // Disabling keeps the order slot, so the package comes back to the
        // middle rather than the end.
        mgr.enable_mod("Beta").unwrap();
        assert_eq!(mgr.active_packages(), &["Gamma", "Beta", "Alpha"]);
    }

    #[test]
    fn test_reenable_position_survives_restart() {
        let dir = TempDir::new().unwrap();
        {
            let mut mgr = manager_for(&dir, &[("Alpha", &[]), ("Beta", &[]), ("Gamma", &[])]);
            mgr.disable_mod("Beta").unwrap();
        }
        let mut mgr = manager_for(&dir, &[("Alpha", &[]), ("Beta", &[]), ("Gamma", &[])]);
        assert_eq!(mgr.active_packages(), &["Gamma", "Alpha"]);
        mgr.enable_mod("Beta").unwrap();
        assert_eq!(mgr.active_packages(), &["Gamma", "Beta", "Alpha"]);
    }

    #[test]
    fn test_toggle_returns_new_state() {
        let dir = TempDir::new().unwrap();
        let mut mgr = manager_for(&dir, &[("Alpha", &[])]);
        assert_eq!(mgr.toggle_mod("Alpha").unwrap(), false);
        assert_eq!(mgr.toggle_mod("Alpha").unwrap(), true);
    }

    #[test]
    fn test_locked_group_rejects_disable_and_reorder() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("base");
        std::fs::create_dir_all(&base).unwrap();
        write_package(&base.join("Core"), "Core", &[]);
        write_package(&base.join("Extra"), "Extra", &[]);

        let config = ManagerConfig::new()
            .with_group("base", false, false)
            .with_root(&base, "base")
            .with_settings_path(dir.path().join("settings.ini"));
        let mut mgr = ModManager::new(config);

        assert!(matches!(
            mgr.disable_mod("Core"),
            Err(ManagerError::DisableLocked(_))
        ));
        assert!(matches!(
            mgr.move_mod_up("Extra"),
            Err(ManagerError::ReorderLocked(_))
        ));
        // Locked groups keep discovery order.
        assert_eq!(mgr.active_packages(), &["Core", "Extra"]);
    }

    #[test]
    fn test_unknown_package_errors() {
        let dir = TempDir::new().unwrap();
        let mut mgr = manager_for(&dir, &[]);
        assert!(matches!(
            mgr.enable_mod("Nope"),
            Err(ManagerError::UnknownPackage(_))
        ));
        assert!(matches!(
            mgr.unload_package("Nope"),
            Err(ManagerError::UnknownPackage(_))
        ));
    }

    #[test]
    fn test_duplicate_name_keeps_first() {
        let dir = TempDir::new().unwrap();
        let mods = dir.path().join("mods");
        write_package(&mods.join("ADir"), "Same", &[("marker.txt", "first")]);
        write_package(&mods.join("BDir"), "Same", &[("marker.txt", "second")]);

        let config = ManagerConfig::new()
            .with_group("mods", true, true)
            .with_root(&mods, "mods")
            .with_settings_path(dir.path().join("settings.ini"));
        let mgr = ModManager::new(config);

        assert_eq!(mgr.stats().packages, 1);
        assert_eq!(mgr.read_text("marker.txt").as_deref(), Some("first"));
    }

    #[test]
    fn test_load_shares_identity_and_counts_hits() {
        let dir = TempDir::new().unwrap();
        let mgr = manager_for(&dir, &[("Alpha", &[("data/note.txt", "hello")])]);

        let first: ResourceHandle<String> = mgr.load("data/note.txt").unwrap();
        let second: ResourceHandle<String> = mgr.load("data/note.txt").unwrap();

        assert!(Arc::ptr_eq(first.value(), second.value()));
        assert_eq!(first.generation(), second.generation());
        let stats = mgr.stats();
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.live_entries, 1);
    }

    #[test]
    fn test_cache_expires_when_all_holders_drop() {
        let dir = TempDir::new().unwrap();
        let mgr = manager_for(&dir, &[("Alpha", &[("data/note.txt", "hello")])]);

        let first: ResourceHandle<String> = mgr.load("data/note.txt").unwrap();
        let gen_first = first.generation();
        drop(first);

        let second: ResourceHandle<String> = mgr.load("data/note.txt").unwrap();
        assert_ne!(gen_first, second.generation());
        assert_eq!(mgr.stats().cache_hits, 0);
    }

    #[test]
    fn test_precedence_front_wins() {
        let dir = TempDir::new().unwrap();
        let mgr = manager_for(
            &dir,
            &[
                ("Alpha", &[("data/note.txt", "from alpha")]),
                ("Beta", &[("data/note.txt", "from beta")]),
            ],
        );
        // Beta is at the top by default.
        let handle: ResourceHandle<String> = mgr.load("data/note.txt").unwrap();
        assert_eq!(&**handle.value(), "from beta");
        assert_eq!(mgr.read_text("data/note.txt").as_deref(), Some("from beta"));
    }

    #[test]
    fn test_reorder_changes_winner_for_new_loads() {
        let dir = TempDir::new().unwrap();
        let mut mgr = manager_for(
            &dir,
            &[
                ("Alpha", &[("data/note.txt", "from alpha")]),
                ("Beta", &[("data/note.txt", "from beta")]),
            ],
        );
        mgr.move_mod_to_top("Alpha").unwrap();
        assert_eq!(mgr.read_text("data/note.txt").as_deref(), Some("from alpha"));
    }

    #[test]
    fn test_disabled_package_stops_resolving() {
        let dir = TempDir::new().unwrap();
        let mut mgr = manager_for(
            &dir,
            &[
                ("Alpha", &[("data/note.txt", "from alpha")]),
                ("Beta", &[("data/note.txt", "from beta")]),
            ],
        );
        mgr.disable_mod("Beta").unwrap();
        assert_eq!(mgr.read_text("data/note.txt").as_deref(), Some("from alpha"));
        mgr.disable_mod("Alpha").unwrap();
        assert!(mgr.read_text("data/note.txt").is_none());
        assert!(!mgr.exists("data/note.txt"));
    }

    #[test]
    fn test_disable_then_unload_falls_back_to_lower_package() {
        let dir = TempDir::new().unwrap();
        let mut mgr = manager_for(
            &dir,
            &[
                ("Alpha", &[("data/note.txt", "from alpha")]),
                ("Beta", &[("data/note.txt", "from beta")]),
            ],
        );
        let handle: ResourceHandle<String> = mgr.load("data/note.txt").unwrap();
        assert_eq!(&**handle.value(), "from beta");

        // The key omits the owning package, so the cached value keeps
        // serving after the disable until the entry is invalidated.
        mgr.disable_mod("Beta").unwrap();
        let cached: ResourceHandle<String> = mgr.load("data/note.txt").unwrap();
        assert_eq!(&**cached.value(), "from beta");

        mgr.unload(handle.key());
        let fallback: ResourceHandle<String> = mgr.load("data/note.txt").unwrap();
        assert_eq!(&**fallback.value(), "from alpha");
    }

    #[test]
    fn test_unload_invalidates_handles() {
        let dir = TempDir::new().unwrap();
        let mgr = manager_for(&dir, &[("Alpha", &[("data/note.txt", "hello")])]);

        let handle: ResourceHandle<String> = mgr.load("data/note.txt").unwrap();
        assert!(mgr.is_current(&handle));
        assert!(mgr.unload(handle.key()));
        assert!(!mgr.is_current(&handle));
        // The value itself is still usable by its holder.
        assert_eq!(&**handle.value(), "hello");
    }

    #[test]
    fn test_unload_resource_by_identity() {
        let dir = TempDir::new().unwrap();
        let mgr = manager_for(&dir, &[("Alpha", &[("data/note.txt", "hello")])]);

        let handle: ResourceHandle<String> = mgr.load("data/note.txt").unwrap();
        assert!(mgr.unload_resource(handle.value()));
        assert!(!mgr.is_current(&handle));
        assert!(!mgr.unload_resource(handle.value()));
    }

    #[test]
    fn test_events_fire_in_lifecycle_order() {
        let dir = TempDir::new().unwrap();
        let mut mgr = manager_for(&dir, &[("Alpha", &[("data/note.txt", "hello")])]);
        let events: Arc<StdMutex<Vec<String>>> = Arc::default();
        {
            let events = Arc::clone(&events);
            mgr.subscribe(move |event| {
                let tag = match event {
                    ResourceEvent::Loaded { package, .. } => format!("loaded:{package}"),
                    ResourceEvent::Reused { .. } => "reused".to_string(),
                    ResourceEvent::Unloaded { package, .. } => format!("unloaded:{package}"),
                };
                events.lock().unwrap().push(tag);
            });
        }

        let handle: ResourceHandle<String> = mgr.load("data/note.txt").unwrap();
        let _again: ResourceHandle<String> = mgr.load("data/note.txt").unwrap();
        mgr.unload(handle.key());

        assert_eq!(
            *events.lock().unwrap(),
            vec!["loaded:Alpha", "reused", "unloaded:Alpha"]
        );
    }

    #[test]
    fn test_unload_package_removes_everything() {
        let dir = TempDir::new().unwrap();
        let mut mgr = manager_for(
            &dir,
            &[
                ("Alpha", &[
                    ("data/note.txt", "from alpha"),
                    ("alpha/only.txt", "keep me"),
                ]),
                ("Beta", &[("data/note.txt", "from beta")]),
            ],
        );
        let shadowed: ResourceHandle<String> = mgr.load("data/note.txt").unwrap();
        let untouched: ResourceHandle<String> = mgr.load("alpha/only.txt").unwrap();

        mgr.unload_package("Beta").unwrap();
        assert!(!mgr.is_current(&shadowed));
        // Entries owned by other packages are untouched.
        assert!(mgr.is_current(&untouched));
        assert_eq!(mgr.stats().packages, 1);
        assert_eq!(mgr.active_packages(), &["Alpha"]);
        assert_eq!(mgr.read_text("data/note.txt").as_deref(), Some("from alpha"));
    }

    #[test]
    fn test_shutdown_makes_manager_inert() {
        let dir = TempDir::new().unwrap();
        let mut mgr = manager_for(&dir, &[("Alpha", &[("data/note.txt", "hello")])]);
        mgr.shutdown();
        assert_eq!(mgr.stats().packages, 0);
        assert!(mgr.read_text("data/note.txt").is_none());
        assert!(mgr.load::<String>("data/note.txt").is_none());
    }

    #[test]
    fn test_mod_order_reports_enabled_flags() {
        let dir = TempDir::new().unwrap();
        let mut mgr = manager_for(&dir, &[("Alpha", &[]), ("Beta", &[])]);
        mgr.disable_mod("Alpha").unwrap();
        let order = mgr.mod_order("mods").unwrap();
        assert_eq!(
            order,
            vec![("Beta".to_string(), true), ("Alpha".to_string(), false)]
        );
        assert!(matches!(
            mgr.mod_order("nope"),
            Err(ManagerError::UnknownGroup(_))
        ));
    }

    #[tokio::test]
    async fn test_load_async_matches_sync() {
        let dir = TempDir::new().unwrap();
        let mgr = manager_for(&dir, &[("Alpha", &[("data/note.txt", "hello")])]);
        let handle = mgr.load_async::<String>("data/note.txt").await.unwrap();
        assert_eq!(&**handle.value(), "hello");
        assert_eq!(
            mgr.read_text_async("data/note.txt").await.as_deref(),
            Some("hello")
        );
        assert_eq!(
            mgr.read_bytes_async("data/note.txt").await.unwrap(),
            b"hello"
        );
    }

    mod scripting {
        use super::*;
        use crate::manager::scripting::{
            DispatcherHandle, ScriptError, ScriptHost, ScriptInterpreter,
        };
        use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

        #[derive(Default)]
        struct RecordingHost {
            executed: Arc<StdMutex<Vec<String>>>,
            ticks: Arc<AtomicUsize>,
            fail_on: Option<&'static str>,
        }

        struct RecordingInterpreter {
            package: String,
            executed: Arc<StdMutex<Vec<String>>>,
            ticks: Arc<AtomicUsize>,
            dispatcher: Option<DispatcherHandle>,
            fail_on: Option<&'static str>,
        }

        impl ScriptHost for RecordingHost {
            fn create_interpreter(&self, package: &str) -> Box<dyn ScriptInterpreter> {
                Box::new(RecordingInterpreter {
                    package: package.to_string(),
                    executed: Arc::clone(&self.executed),
                    ticks: Arc::clone(&self.ticks),
                    dispatcher: None,
                    fail_on: self.fail_on,
                })
            }
        }

        impl ScriptInterpreter for RecordingInterpreter {
            fn bind_dispatcher(&mut self, dispatcher: DispatcherHandle) {
                self.dispatcher = Some(dispatcher);
            }

            fn execute(&mut self, script: &Path, _source: &str) -> Result<(), ScriptError> {
                let label = format!("{}:{}", self.package, script.display());
                if let Some(fail) = self.fail_on {
                    if script.to_string_lossy().contains(fail) {
                        return Err(ScriptError::Execution(label));
                    }
                }
                self.executed.lock().unwrap().push(label);
                if let Some(dispatcher) = self.dispatcher.take() {
                    let ticks = Arc::clone(&self.ticks);
                    dispatcher.register(move || {
                        ticks.fetch_add(1, AtomicOrdering::SeqCst);
                    });
                }
                Ok(())
            }
        }

        fn scripted_manager(dir: &TempDir, persistence: PersistenceMode) -> ModManager {
            let mods = dir.path().join("mods");
            write_package_with(
                &mods.join("Scripted"),
                "Scripted",
                persistence,
                &["scripts/init.lua", "scripts/more.lua"],
                &[
                    ("scripts/init.lua", "-- init"),
                    ("scripts/more.lua", "-- more"),
                ],
            );
            let config = ManagerConfig::new()
                .with_group("mods", true, true)
                .with_root(&mods, "mods")
                .with_settings_path(dir.path().join("settings.ini"));
            ModManager::new(config)
        }

        #[test]
        fn test_scripts_run_in_manifest_order() {
            let dir = TempDir::new().unwrap();
            let mut mgr = scripted_manager(&dir, PersistenceMode::None);
            let host = RecordingHost::default();
            mgr.run_scripts(&host);

            assert_eq!(
                *host.executed.lock().unwrap(),
                vec!["Scripted:scripts/init.lua", "Scripted:scripts/more.lua"]
            );
            assert!(mgr.script_sessions().is_empty());
        }

        #[test]
        fn test_simple_persistence_keeps_session_without_dispatcher() {
            let dir = TempDir::new().unwrap();
            let mut mgr = scripted_manager(&dir, PersistenceMode::Simple);
            let host = RecordingHost::default();
            mgr.run_scripts(&host);

            assert_eq!(mgr.script_sessions(), vec!["Scripted"]);
            mgr.dispatch_frame();
            assert_eq!(host.ticks.load(AtomicOrdering::SeqCst), 0);
        }

        #[test]
        fn test_full_persistence_dispatches_frames() {
            let dir = TempDir::new().unwrap();
            let mut mgr = scripted_manager(&dir, PersistenceMode::Full);
            let host = RecordingHost::default();
            mgr.run_scripts(&host);

            assert_eq!(mgr.script_sessions(), vec!["Scripted"]);
            mgr.dispatch_frame();
            mgr.dispatch_frame();
            assert_eq!(host.ticks.load(AtomicOrdering::SeqCst), 2);
        }

        #[test]
        fn test_failing_script_does_not_abort_siblings() {
            let dir = TempDir::new().unwrap();
            let mut mgr = scripted_manager(&dir, PersistenceMode::None);
            let host = RecordingHost {
                fail_on: Some("init"),
                ..RecordingHost::default()
            };
            mgr.run_scripts(&host);

            assert_eq!(
                *host.executed.lock().unwrap(),
                vec!["Scripted:scripts/more.lua"]
            );
        }

        #[test]
        fn test_disabled_package_scripts_do_not_run() {
            let dir = TempDir::new().unwrap();
            let mut mgr = scripted_manager(&dir, PersistenceMode::Simple);
            mgr.disable_mod("Scripted").unwrap();
            let host = RecordingHost::default();
            mgr.run_scripts(&host);

            assert!(host.executed.lock().unwrap().is_empty());
            assert!(mgr.script_sessions().is_empty());
        }
    }
}
