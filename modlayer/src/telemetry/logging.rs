//! Tracing subscriber installation.

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the background log writer alive.
///
/// Dropping the guard flushes and closes the log file. Hold it for the
/// lifetime of the process.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Install the global tracing subscriber.
///
/// Creates `log_dir` if needed, truncates any previous session's log file,
/// and wires two outputs: the file (plain text, no ANSI) and stdout
/// (colored). The filter comes from `RUST_LOG`, defaulting to `info`.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or the log file
/// cannot be truncated. Calling this twice in one process panics, since the
/// global subscriber can only be set once.
pub fn init_logging(log_dir: &str, log_file: &str) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;

    // Truncate rather than delete so an open tail keeps working.
    let log_path = Path::new(log_dir).join(log_file);
    fs::write(&log_path, "")?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true)
        .compact();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Default log directory, relative to the working directory.
pub fn default_log_dir() -> &'static str {
    "logs"
}

/// Default log file name.
pub fn default_log_file() -> &'static str {
    "modlayer.log"
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // init_logging itself sets the process-global subscriber, which can only
    // happen once per process, so these tests cover the file plumbing.

    #[test]
    fn test_default_paths() {
        assert_eq!(default_log_dir(), "logs");
        assert_eq!(default_log_file(), "modlayer.log");
    }

    #[test]
    fn test_truncates_previous_session_log() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("modlayer.log");
        fs::write(&log_path, "stale session output").unwrap();

        fs::write(&log_path, "").unwrap();
        assert_eq!(fs::read_to_string(&log_path).unwrap(), "");
    }

    #[test]
    fn test_creates_nested_log_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("deep/logs");

        fs::create_dir_all(&nested).unwrap();
        let log_path = nested.join("modlayer.log");
        fs::write(&log_path, "").unwrap();

        assert!(log_path.exists());
    }

    #[test]
    fn test_guard_holds_worker() {
        let (writer, guard) = tracing_appender::non_blocking(std::io::sink());
        drop(writer);
        let _logging_guard = LoggingGuard { _file_guard: guard };
    }
}
