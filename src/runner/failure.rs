//! Recorded step failures.

use std::error::Error as StdError;
use std::fmt;
use std::panic::Location;
use std::path::Path;

use crate::context::ChainErrors;

use super::outcome::StepError;

/// How a recorded failure is labelled in reports.
///
/// This is a hint for logs, not ground truth: see [`annotate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annotation {
    /// Nothing had failed in the chain before this step.
    Failed,
    /// Something had already failed in the chain before this step.
    Skipped,
}

impl Annotation {
    /// Get a display marker for this annotation.
    pub fn marker(&self) -> &'static str {
        match self {
            Annotation::Failed => "❌",
            Annotation::Skipped => "⚠️",
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::Failed => write!(f, "failed"),
            Annotation::Skipped => write!(f, "skipped"),
        }
    }
}

/// Decide the annotation for a failure about to be recorded.
///
/// Only asks whether anything was recorded earlier in the chain, not whether
/// this failure is related to it. A step whose own body threw a new error can
/// still be labelled [`Annotation::Skipped`].
pub fn annotate(errors: &ChainErrors) -> Annotation {
    if errors.is_empty() {
        Annotation::Failed
    } else {
        Annotation::Skipped
    }
}

/// A step failure enriched with the step name, its call site and an
/// annotation. The original error stays reachable through
/// [`original`](Self::original), even across nested wraps.
#[derive(Debug)]
pub struct ChainFailure {
    /// Name of the step that produced the failure.
    pub step: String,
    /// Where the step was invoked.
    pub location: &'static Location<'static>,
    /// Skip-vs-fail hint.
    pub annotation: Annotation,
    source: anyhow::Error,
}

impl ChainFailure {
    /// Wrap `source` as a failure of `step`.
    pub fn new(
        step: impl Into<String>,
        location: &'static Location<'static>,
        annotation: Annotation,
        source: anyhow::Error,
    ) -> Self {
        Self {
            step: step.into(),
            location,
            annotation,
            source,
        }
    }

    /// The error this record wraps directly.
    pub fn error(&self) -> &anyhow::Error {
        &self.source
    }

    /// The innermost non-chain error.
    ///
    /// When a step body fails with another step's failure, this walks through
    /// every layer to the error that started it.
    pub fn original(&self) -> &anyhow::Error {
        if let Some(inner) = self.source.downcast_ref::<ChainFailure>() {
            return inner.original();
        }
        if let Some(StepError::Failed(inner)) = self.source.downcast_ref::<StepError>() {
            return inner.original();
        }
        &self.source
    }

    /// Check whether the original error is of kind `K`.
    pub fn is_kind<K>(&self) -> bool
    where
        K: StdError + Send + Sync + 'static,
    {
        self.original().downcast_ref::<K>().is_some()
    }

    /// File name of the call site.
    pub fn file_name(&self) -> &str {
        let file = self.location.file();
        Path::new(file)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(file)
    }
}

impl fmt::Display for ChainFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.annotation.marker(), self.step, self.annotation)?;
        match self.annotation {
            Annotation::Skipped => write!(f, ".")?,
            Annotation::Failed => {
                write!(f, " in {} line {}", self.file_name(), self.location.line())?
            }
        }
        write!(f, "\n{}", self.source)?;
        if let Some(cause) = self.source.chain().nth(1) {
            write!(f, "\n{}", cause)?;
        }
        Ok(())
    }
}

impl StdError for ChainFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.source)
    }
}
