//! Resolve a logical path through the stack and report the outcome.

use std::any::Any;
use std::path::Path;

use clap::ValueEnum;
use modlayer::{ModManager, ResourceEvent};

use super::common::{build_manager, StackArgs};
use crate::error::CliError;

/// Semantic type to request.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ResolveType {
    /// UTF-8 text (String)
    Text,
    /// Parsed JSON document
    Json,
    /// Raw bytes
    Bytes,
    /// Decoded image
    Image,
}

/// Arguments for the resolve command.
#[derive(Debug, clap::Args)]
pub struct ResolveArgs {
    /// Logical path to resolve, such as `textures/grass`
    pub logical: String,

    /// Semantic type to request
    #[arg(long = "type", value_enum, default_value = "bytes")]
    pub resolve_type: ResolveType,
}

fn describe<T: Any + Send + Sync>(
    manager: &ModManager,
    logical: &Path,
    summary: impl Fn(&T) -> String,
) -> Option<String> {
    let handle = manager.load::<T>(logical)?;
    Some(summary(&handle))
}

/// Run the resolve command.
pub fn run(stack: &StackArgs, args: &ResolveArgs) -> Result<(), CliError> {
    let mut manager = build_manager(stack)?;

    // Announce cache transitions as they happen.
    manager.subscribe(|event| match event {
        ResourceEvent::Loaded {
            key,
            package,
            concrete,
            parser,
        } => {
            println!(
                "loaded  {} <- {} ({}, parser: {})",
                key.logical(),
                package,
                concrete.display(),
                parser
            );
        }
        ResourceEvent::Reused { key } => println!("reused  {}", key.logical()),
        ResourceEvent::Unloaded { key, package } => {
            println!("unloaded {} (was from {})", key.logical(), package);
        }
    });

    let logical = Path::new(&args.logical);
    let summary = match args.resolve_type {
        ResolveType::Text => describe::<String>(&manager, logical, |text| {
            format!("{} chars of text", text.chars().count())
        }),
        ResolveType::Json => describe::<serde_json::Value>(&manager, logical, |value| {
            format!("JSON: {value}")
        }),
        ResolveType::Bytes => {
            describe::<Vec<u8>>(&manager, logical, |bytes| format!("{} bytes", bytes.len()))
        }
        ResolveType::Image => describe::<image::DynamicImage>(&manager, logical, |img| {
            format!("image {}x{}", img.width(), img.height())
        }),
    };

    match summary {
        Some(line) => {
            println!("{line}");
            println!("{}", manager.stats());
            Ok(())
        }
        None => Err(CliError::NotFound(args.logical.clone())),
    }
}
