//! Terminal output.

use std::io::Write;

use console::{style, Term};

use super::{OutputMode, UserInterface};

/// Writes messages to stdout and diagnostics to stderr.
///
/// Colors are applied only when the stream is a terminal.
pub struct TerminalUI {
    mode: OutputMode,
    out: Term,
    err: Term,
}

impl TerminalUI {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            out: Term::stdout(),
            err: Term::stderr(),
        }
    }

    fn shows_status(&self) -> bool {
        self.mode != OutputMode::Quiet
    }
}

impl Default for TerminalUI {
    fn default() -> Self {
        Self::new(OutputMode::Normal)
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        writeln!(self.out, "{}", msg).ok();
    }

    fn success(&mut self, msg: &str) {
        if self.shows_status() {
            writeln!(self.out, "{} {}", style("✓").green(), msg).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.shows_status() {
            writeln!(self.err, "{} {}", style("⚠").yellow(), style(msg).yellow()).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.err, "{} {}", style("✗").red(), style(msg).red()).ok();
    }

    fn show_header(&mut self, title: &str) {
        if self.shows_status() {
            writeln!(self.out, "\n{}\n", style(title).bold()).ok();
        }
    }
}
