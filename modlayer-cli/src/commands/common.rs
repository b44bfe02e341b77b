//! Shared helpers for CLI commands.

use std::path::PathBuf;

use modlayer::{ManagerConfig, ModManager};

use crate::error::CliError;

/// Global arguments shared by every subcommand.
#[derive(Debug, Clone, clap::Args)]
pub struct StackArgs {
    /// Search root as GROUP=PATH (repeatable, highest precedence first)
    #[arg(long = "root", value_name = "GROUP=PATH")]
    pub roots: Vec<String>,

    /// Mark a group as locked: members cannot be disabled or reordered
    #[arg(long = "lock", value_name = "GROUP")]
    pub locked: Vec<String>,

    /// Settings file path (defaults to the per-user config directory)
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,
}

/// Parse one `GROUP=PATH` root spec.
pub fn parse_root_spec(spec: &str) -> Result<(String, PathBuf), CliError> {
    match spec.split_once('=') {
        Some((group, path)) if !group.is_empty() && !path.is_empty() => {
            Ok((group.to_string(), PathBuf::from(path)))
        }
        _ => Err(CliError::Usage(format!(
            "invalid --root '{spec}', expected GROUP=PATH"
        ))),
    }
}

/// Build a [`ManagerConfig`] from the global arguments.
pub fn build_config(args: &StackArgs) -> Result<ManagerConfig, CliError> {
    if args.roots.is_empty() {
        return Err(CliError::Usage(
            "at least one --root GROUP=PATH is required".into(),
        ));
    }

    let mut config = ManagerConfig::new();
    for group in &args.locked {
        config = config.with_group(group.clone(), false, false);
    }
    for spec in &args.roots {
        let (group, path) = parse_root_spec(spec)?;
        config = config.with_root(path, group);
    }
    if let Some(path) = &args.settings {
        config = config.with_settings_path(path.clone());
    }
    Ok(config)
}

/// Discover the package stack described by the global arguments.
pub fn build_manager(args: &StackArgs) -> Result<ModManager, CliError> {
    Ok(ModManager::new(build_config(args)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_root_spec() {
        let (group, path) = parse_root_spec("mods=game/mods").unwrap();
        assert_eq!(group, "mods");
        assert_eq!(path, PathBuf::from("game/mods"));

        assert!(parse_root_spec("no-equals").is_err());
        assert!(parse_root_spec("=path").is_err());
        assert!(parse_root_spec("group=").is_err());
    }

    #[test]
    fn test_build_config_requires_roots() {
        let args = StackArgs {
            roots: vec![],
            locked: vec![],
            settings: None,
        };
        assert!(matches!(build_config(&args), Err(CliError::Usage(_))));
    }

    #[test]
    fn test_build_config_applies_locks_and_settings() {
        let args = StackArgs {
            roots: vec!["base=game/base".into(), "mods=game/mods".into()],
            locked: vec!["base".into()],
            settings: Some(PathBuf::from("custom.ini")),
        };
        let config = build_config(&args).unwrap();

        assert_eq!(config.roots.len(), 2);
        assert_eq!(config.groups.len(), 1);
        assert!(!config.groups[0].user_can_disable);
        assert_eq!(config.settings_path, PathBuf::from("custom.ini"));
    }
}
