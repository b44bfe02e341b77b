//! Dry-run package scripts through the logging host.

use modlayer::manager::LoggingScriptHost;

use super::common::{build_manager, StackArgs};
use crate::error::CliError;

/// Arguments for the run-scripts command.
#[derive(Debug, clap::Args)]
pub struct ScriptArgs {
    /// Number of frames to dispatch after the script pass
    #[arg(long, default_value = "0")]
    pub frames: u32,
}

/// Run every active package's scripts with the dry-run host, then tick the
/// requested number of frames for fully persistent packages.
pub fn run(stack: &StackArgs, args: &ScriptArgs) -> Result<(), CliError> {
    let mut manager = build_manager(stack)?;

    manager.run_scripts(&LoggingScriptHost);

    let sessions = manager.script_sessions();
    if sessions.is_empty() {
        println!("No packages kept a script session alive");
    } else {
        println!("Live script sessions:");
        for package in &sessions {
            println!("  {package}");
        }
    }

    for frame in 0..args.frames {
        tracing::debug!(frame, "dispatching frame");
        manager.dispatch_frame();
    }
    if args.frames > 0 {
        println!("Dispatched {} frame(s)", args.frames);
    }

    manager.shutdown();
    Ok(())
}
