//! CLI command implementations.
//!
//! Each submodule owns one subcommand: its clap argument types and a `run`
//! function returning [`CliError`](crate::error::CliError) on failure.
//! [`common`] holds the shared stack arguments every command takes.

pub mod common;
pub mod list;
pub mod order;
pub mod resolve;
pub mod scripts;
