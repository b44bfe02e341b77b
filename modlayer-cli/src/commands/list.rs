//! List and inspect the discovered package stack.

use super::common::{build_manager, StackArgs};
use crate::error::CliError;

/// Print every group with its members in precedence order.
pub fn run(stack: &StackArgs) -> Result<(), CliError> {
    let manager = build_manager(stack)?;

    for group in manager.groups() {
        let policy = match (group.user_can_disable, group.user_can_reorder) {
            (true, true) => "",
            (false, false) => " [locked]",
            (false, true) => " [no-disable]",
            (true, false) => " [no-reorder]",
        };
        println!("{}{}", group.name, policy);

        let order = manager.mod_order(&group.name)?;
        if order.is_empty() {
            println!("  (no packages)");
            continue;
        }
        for (index, (name, enabled)) in order.iter().enumerate() {
            let marker = if *enabled { "*" } else { " " };
            let version = manager
                .package_metadata(name)
                .map(|m| format!(" v{}", m.version))
                .unwrap_or_default();
            println!("  {index:>3} [{marker}] {name}{version}");
        }
    }

    let stats = manager.stats();
    println!();
    println!("{stats}");
    Ok(())
}

/// Print one package's manifest details.
pub fn info(stack: &StackArgs, name: &str) -> Result<(), CliError> {
    let manager = build_manager(stack)?;
    let metadata = manager
        .package_metadata(name)
        .ok_or_else(|| CliError::Manager(modlayer::manager::ManagerError::UnknownPackage(
            name.to_string(),
        )))?;

    println!("Name:        {}", metadata.name);
    println!("Version:     {}", metadata.version);
    if !metadata.author.is_empty() {
        println!("Author:      {}", metadata.author);
    }
    if !metadata.description.is_empty() {
        println!("Description: {}", metadata.description);
    }
    println!("Persistence: {}", metadata.persistence);
    if !metadata.scripts.is_empty() {
        println!("Scripts:");
        for script in &metadata.scripts {
            println!("  {script}");
        }
    }
    match manager.is_enabled(name) {
        Some(true) => println!("Status:      enabled"),
        Some(false) => println!("Status:      disabled"),
        None => {}
    }
    Ok(())
}
