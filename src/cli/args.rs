//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// testchain - Ordered test chains with shared output and failure history.
#[derive(Debug, Parser)]
#[command(name = "testchain")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides default .testchain.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the execution order of named items
    Order(OrderArgs),

    /// Run a built-in example chain
    Demo(DemoArgs),

    /// Show effective configuration
    Config(ConfigArgs),
}

/// Arguments for the `order` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct OrderArgs {
    /// Items as `name` or `name=priority` (comma-separated, in declaration order)
    #[arg(long, value_delimiter = ',', required = true)]
    pub items: Vec<String>,

    /// Order as groups (undeclared items last) instead of steps
    #[arg(long)]
    pub groups: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Built-in example chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Sequential chain where a failure causes a guarded step to skip
    Flow,
    /// Producer and consumer groups coordinated through the barrier
    Collections,
    /// Skips driven by a missing output
    Skip,
}

/// Arguments for the `demo` command.
#[derive(Debug, Clone, clap::Args)]
pub struct DemoArgs {
    /// Scenario to run
    #[arg(value_enum)]
    pub scenario: Scenario,
}

/// Arguments for the `config` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
