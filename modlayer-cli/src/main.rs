//! Modlayer CLI - inspect and manage stacked content packages.

use clap::{Parser, Subcommand};
use std::process;

mod commands;
mod error;

use commands::common::StackArgs;
use commands::order::OrderAction;
use commands::resolve::ResolveArgs;
use commands::scripts::ScriptArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "modlayer")]
#[command(about = "Stacked content packages for moddable games", long_about = None)]
struct Cli {
    #[command(flatten)]
    stack: StackArgs,

    /// Skip logging setup (library events are dropped)
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List groups and their packages in precedence order
    List,

    /// Show one package's manifest details
    Info {
        /// Package name
        name: String,
    },

    /// Enable, disable, toggle, or move packages
    #[command(subcommand)]
    Stack(OrderAction),

    /// Resolve a logical path and report which package wins
    Resolve(ResolveArgs),

    /// Dry-run package scripts
    RunScripts(ScriptArgs),
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => commands::list::run(&cli.stack),
        Command::Info { name } => commands::list::info(&cli.stack, &name),
        Command::Stack(action) => commands::order::run(&cli.stack, action),
        Command::Resolve(args) => commands::resolve::run(&cli.stack, &args),
        Command::RunScripts(args) => commands::scripts::run(&cli.stack, &args),
    }
}

fn main() {
    let cli = Cli::parse();

    let _guard = if cli.quiet {
        None
    } else {
        use modlayer::telemetry::{default_log_dir, default_log_file, init_logging};
        match init_logging(default_log_dir(), default_log_file()) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("Warning: {}", CliError::Logging(e));
                None
            }
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
