//! The package scripting hook.
//!
//! The manager does not embed a script engine. Games supply a [`ScriptHost`]
//! that creates one interpreter per package; the manager feeds it the
//! package's companion scripts in precedence order and keeps the interpreter
//! alive according to the package's declared persistence mode. A failing
//! script is logged and skipped, it never aborts the pass or its siblings.
//!
//! Packages declaring full persistence get a [`FrameDispatcher`] bound
//! before any of their scripts run, so scripts may register callbacks that
//! [`ModManager::dispatch_frame`](crate::manager::ModManager::dispatch_frame)
//! ticks once per game frame.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::info;

/// Errors surfaced by script interpreters.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script source could not be read from its package.
    #[error("script source unavailable: {0}")]
    MissingSource(String),

    /// The interpreter rejected or failed the script.
    #[error("script failed: {0}")]
    Execution(String),
}

type FrameCallback = Box<dyn FnMut() + Send>;

/// Per-frame callback dispatcher shared with one package's interpreter.
#[derive(Clone, Default)]
pub struct FrameDispatcher {
    callbacks: Arc<Mutex<Vec<FrameCallback>>>,
}

impl FrameDispatcher {
    /// A dispatcher with no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for interpreters to register callbacks through.
    pub fn handle(&self) -> DispatcherHandle {
        DispatcherHandle {
            callbacks: Arc::clone(&self.callbacks),
        }
    }

    /// Run every registered callback once.
    pub fn tick(&self) {
        let mut callbacks = self.callbacks.lock();
        for callback in callbacks.iter_mut() {
            callback();
        }
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.callbacks.lock().len()
    }

    /// Whether no callbacks are registered.
    pub fn is_empty(&self) -> bool {
        self.callbacks.lock().is_empty()
    }
}

/// Registration side of a [`FrameDispatcher`].
#[derive(Clone)]
pub struct DispatcherHandle {
    callbacks: Arc<Mutex<Vec<FrameCallback>>>,
}

impl DispatcherHandle {
    /// Register a callback to run every frame.
    pub fn register(&self, callback: impl FnMut() + Send + 'static) {
        self.callbacks.lock().push(Box::new(callback));
    }
}

/// One script interpreter, owned by one package.
pub trait ScriptInterpreter: Send {
    /// Attach the per-frame dispatcher. Called at most once, before any
    /// [`execute`](Self::execute), and only for packages with full
    /// persistence.
    fn bind_dispatcher(&mut self, dispatcher: DispatcherHandle);

    /// Run one script. `script` is the logical path inside the package,
    /// `source` its text content.
    fn execute(&mut self, script: &Path, source: &str) -> Result<(), ScriptError>;
}

/// Factory for per-package interpreters, supplied by the embedding game.
pub trait ScriptHost: Send + Sync {
    /// Create a fresh interpreter for the named package.
    fn create_interpreter(&self, package: &str) -> Box<dyn ScriptInterpreter>;
}

/// A host whose interpreters log each script instead of executing it.
///
/// Useful for dry runs and as a reference implementation of the collaborator
/// contract.
pub struct LoggingScriptHost;

impl ScriptHost for LoggingScriptHost {
    fn create_interpreter(&self, package: &str) -> Box<dyn ScriptInterpreter> {
        Box::new(LoggingInterpreter {
            package: package.to_string(),
        })
    }
}

struct LoggingInterpreter {
    package: String,
}

impl ScriptInterpreter for LoggingInterpreter {
    fn bind_dispatcher(&mut self, _dispatcher: DispatcherHandle) {
        info!(package = %self.package, "frame dispatcher bound");
    }

    fn execute(&mut self, script: &Path, source: &str) -> Result<(), ScriptError> {
        info!(
            package = %self.package,
            script = %script.display(),
            bytes = source.len(),
            "script executed (dry run)"
        );
        Ok(())
    }
}

/// A live interpreter kept past its initial run.
pub(crate) struct ScriptSession {
    pub package: String,
    #[allow(dead_code)]
    pub interpreter: Box<dyn ScriptInterpreter>,
    pub dispatcher: Option<FrameDispatcher>,
}
