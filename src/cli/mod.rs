//! Command-line interface
//!
//! CLI commands and argument parsing for the registry binary.

pub mod commands;

pub use commands::{Command, Opt};
