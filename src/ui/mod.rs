//! Command output.
//!
//! - [`UserInterface`] trait so commands can be tested without a terminal
//! - [`TerminalUI`] writing to stdout/stderr
//! - [`MockUI`] capturing output for assertions

pub mod mock;
pub mod terminal;

pub use mock::MockUI;
pub use terminal::TerminalUI;

/// How much a command prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Regular output.
    #[default]
    Normal,
    /// Only errors and machine-readable output.
    Quiet,
}

/// Trait for user-facing output.
///
/// This trait allows capturing output in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Print a plain message. Always shown, also in quiet mode.
    fn message(&mut self, msg: &str);

    /// Print a success message.
    fn success(&mut self, msg: &str);

    /// Print a warning.
    fn warning(&mut self, msg: &str);

    /// Print an error.
    fn error(&mut self, msg: &str);

    /// Print a section header.
    fn show_header(&mut self, title: &str);
}
