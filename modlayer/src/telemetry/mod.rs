//! Logging and diagnostics for the mod layer.
//!
//! # Overview
//!
//! Structured logging with dual output:
//!
//! - Writes to a session log file (cleared on startup)
//! - Also prints to stdout for terminal tailing
//! - Filter configurable via the `RUST_LOG` environment variable
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! embedding application's job. [`init_logging`] is the ready-made installer
//! the CLI uses.
//!
//! # Example
//!
//! ```no_run
//! use modlayer::telemetry::{default_log_dir, default_log_file, init_logging};
//!
//! let _guard = init_logging(default_log_dir(), default_log_file())
//!     .expect("logging init");
//! tracing::info!("mod layer starting");
//! ```

mod logging;

pub use logging::{default_log_dir, default_log_file, init_logging, LoggingGuard};
