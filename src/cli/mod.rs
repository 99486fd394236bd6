//! Implementation of the `qarc` command-line tool.

pub mod commands;
pub mod config;

pub use config::{load_config, resolve_config, CliConfig};
