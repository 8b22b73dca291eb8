//! testchain - Ordered test chains with shared output and failure history.
//!
//! Steps of a chain run in declared order against a shared context. Each
//! failure is recorded so later steps can skip themselves when an earlier
//! failure of a given kind happened, and independently scheduled groups can
//! wait for each other through a process-wide barrier.
//!
//! # Modules
//!
//! - [`barrier`] - Cross-group registry and polling wait
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading and validation
//! - [`context`] - Shared output store and failure history
//! - [`error`] - Error types and result aliases
//! - [`order`] - Priority ordering of steps and groups
//! - [`runner`] - Step execution, failure recording and skip guards
//! - [`ui`] - Command output
//!
//! # Example
//!
//! ```
//! use testchain::{ChainContext, StepStatus};
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("not implemented")]
//! struct NotImplemented;
//!
//! let chain = ChainContext::new();
//! let _ = chain.step("C").run(|_| -> anyhow::Result<()> { Err(NotImplemented.into()) });
//!
//! let guarded = chain.step("D").run_unless::<NotImplemented, _, _>(|_| Ok(()));
//! assert_eq!(StepStatus::of(&guarded), StepStatus::Skipped);
//! ```

pub mod barrier;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod order;
pub mod runner;
pub mod ui;

pub use barrier::{GroupBarrier, GroupRegistration, GroupState};
pub use context::{ChainContext, ChainErrors, ChainOutput, OutputKey, OutputScope};
pub use error::{ChainError, GroupWaitTimeout, MissingOutputError, Result, StepTimeout};
pub use order::{FallbackPolicy, GroupDescriptor, OrderingEngine, Prioritized, StepDescriptor};
pub use runner::{ChainFailure, Skip, StepError, StepRunner, StepStatus};
