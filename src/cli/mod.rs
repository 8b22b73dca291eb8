//! Command-line interface for testchain.
//!
//! # Architecture
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, ConfigArgs, DemoArgs, OrderArgs, Scenario};
pub use commands::{Command, CommandDispatcher, CommandResult};
