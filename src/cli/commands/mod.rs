//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results. Commands are
//! routed by [`CommandDispatcher`].

pub mod config;
pub mod demo;
pub mod dispatcher;
pub mod order;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
