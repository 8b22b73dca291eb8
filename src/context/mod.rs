//! Shared chain state: output store and failure history.
//!
//! - [`ChainOutput`] - Typed key/value store steps read and write
//! - [`ChainErrors`] - Ordered history of recorded failures
//! - [`OutputKey`] - Typed key composed from an owner name and suffix
//! - [`ChainContext`] - The pair handed to every step of a chain
//!
//! A context is either chain-scoped (its own output) or process-scoped (the
//! single [`ChainOutput::process`] store shared across groups). The failure
//! history is always per context.

pub mod errors;
pub mod key;
pub mod output;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub use errors::ChainErrors;
pub use key::OutputKey;
pub use output::ChainOutput;

use crate::runner::StepRunner;

/// Where a context's output lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputScope {
    /// Output private to one chain.
    Chain,
    /// Output shared by every process-scoped context.
    Process,
}

impl fmt::Display for OutputScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputScope::Chain => write!(f, "chain"),
            OutputScope::Process => write!(f, "process"),
        }
    }
}

/// State passed to every step in a chain.
///
/// Cloning is cheap and yields a handle to the same output and history.
///
/// # Example
///
/// ```
/// use testchain::ChainContext;
///
/// let chain = ChainContext::new();
/// chain.step("produce").run(|output| {
///     output.set("answer", 42u32);
///     Ok(())
/// }).unwrap();
///
/// let answer = chain.step("consume").run(|output| Ok(output.get::<u32>("answer")?)).unwrap();
/// assert_eq!(answer, 42);
/// ```
#[derive(Debug, Clone)]
pub struct ChainContext {
    output: Arc<ChainOutput>,
    errors: Arc<ChainErrors>,
    scope: OutputScope,
    step_deadline: Option<Duration>,
}

impl ChainContext {
    /// Create a context with its own output.
    pub fn new() -> Self {
        Self::with_output(Arc::new(ChainOutput::new()))
    }

    /// Create a context writing to the process-wide output.
    ///
    /// Keys must be unique across every chain using process scope: writes
    /// are last-writer-wins.
    pub fn process_scoped() -> Self {
        Self {
            scope: OutputScope::Process,
            ..Self::with_output(ChainOutput::process())
        }
    }

    /// Create a context over an existing output store.
    pub fn with_output(output: Arc<ChainOutput>) -> Self {
        Self {
            output,
            errors: Arc::new(ChainErrors::new()),
            scope: OutputScope::Chain,
            step_deadline: None,
        }
    }

    /// A context sharing this one's output, with an empty failure history.
    ///
    /// Used to give each group its own history over a shared store.
    pub fn fork(&self) -> Self {
        Self {
            output: Arc::clone(&self.output),
            errors: Arc::new(ChainErrors::new()),
            scope: self.scope,
            step_deadline: self.step_deadline,
        }
    }

    /// Default deadline for async steps started from this context.
    ///
    /// `None` or a zero duration means async steps run until they finish.
    pub fn with_step_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.step_deadline = deadline.filter(|d| !d.is_zero());
        self
    }

    /// Default deadline for async steps, if any.
    pub fn step_deadline(&self) -> Option<Duration> {
        self.step_deadline
    }

    /// The output store.
    pub fn output(&self) -> &Arc<ChainOutput> {
        &self.output
    }

    /// The failure history.
    pub fn errors(&self) -> &ChainErrors {
        &self.errors
    }

    /// Where this context's output lives.
    pub fn scope(&self) -> OutputScope {
        self.scope
    }

    /// Prepare a step named `name` to run against this context.
    pub fn step(&self, name: impl Into<String>) -> StepRunner<'_> {
        StepRunner::new(self, name)
    }
}

impl Default for ChainContext {
    fn default() -> Self {
        Self::new()
    }
}
