//! Activation and precedence commands.

use clap::{Subcommand, ValueEnum};

use super::common::{build_manager, StackArgs};
use crate::error::CliError;

/// Where to move a package within its group.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MoveDirection {
    /// One step toward the highest precedence
    Up,
    /// One step toward the lowest precedence
    Down,
    /// Highest precedence in the group
    Top,
    /// Lowest precedence in the group
    Bottom,
}

/// Stack mutation subcommands.
#[derive(Debug, Subcommand)]
pub enum OrderAction {
    /// Enable a package
    Enable {
        /// Package name
        name: String,
    },
    /// Disable a package
    Disable {
        /// Package name
        name: String,
    },
    /// Flip a package's enabled state
    Toggle {
        /// Package name
        name: String,
    },
    /// Move a package within its group
    Move {
        /// Package name
        name: String,
        /// Target position
        #[arg(value_enum)]
        direction: MoveDirection,
    },
}

/// Run a stack mutation. Changes persist to the settings file immediately.
pub fn run(stack: &StackArgs, action: OrderAction) -> Result<(), CliError> {
    let mut manager = build_manager(stack)?;

    match action {
        OrderAction::Enable { name } => {
            manager.enable_mod(&name)?;
            println!("Enabled {name}");
        }
        OrderAction::Disable { name } => {
            manager.disable_mod(&name)?;
            println!("Disabled {name}");
        }
        OrderAction::Toggle { name } => {
            let enabled = manager.toggle_mod(&name)?;
            let state = if enabled { "enabled" } else { "disabled" };
            println!("{name} is now {state}");
        }
        OrderAction::Move { name, direction } => {
            let moved = match direction {
                MoveDirection::Up => manager.move_mod_up(&name)?,
                MoveDirection::Down => manager.move_mod_down(&name)?,
                MoveDirection::Top => manager.move_mod_to_top(&name)?,
                MoveDirection::Bottom => manager.move_mod_to_bottom(&name)?,
            };
            if moved {
                println!("Moved {name} {direction:?}");
            } else {
                println!("{name} did not move (already at the boundary)");
            }
        }
    }
    Ok(())
}
