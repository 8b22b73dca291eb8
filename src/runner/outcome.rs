//! Non-success outcomes a step reports to the host.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::failure::ChainFailure;

/// A step was deliberately not executed.
///
/// Not a failure: hosts report it through their skip path.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{step} skipped: {reason}")]
pub struct Skip {
    /// Step that was not executed.
    pub step: String,
    /// Why it was not executed.
    pub reason: String,
    /// Step whose recorded failure caused the skip, if any.
    pub matched_step: Option<String>,
}

impl Skip {
    /// Create a skip for `step`.
    pub fn new(step: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            reason: reason.into(),
            matched_step: None,
        }
    }

    /// Skip caused by an earlier recorded failure.
    pub fn matching(step: impl Into<String>, reason: impl Into<String>, failure: &ChainFailure) -> Self {
        Self {
            matched_step: Some(failure.step.clone()),
            ..Self::new(step, reason)
        }
    }
}

/// Error returned by every runner call that did not complete normally.
#[derive(Debug, Clone, Error)]
pub enum StepError {
    /// The step ran and failed; the failure is also recorded in the chain.
    #[error(transparent)]
    Failed(Arc<ChainFailure>),

    /// The step was not executed.
    #[error(transparent)]
    Skipped(Skip),
}

impl StepError {
    /// Check if this outcome is a skip rather than a failure.
    pub fn is_skip(&self) -> bool {
        matches!(self, StepError::Skipped(_))
    }

    /// Check if this outcome is a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, StepError::Failed(_))
    }

    /// The recorded failure, if the step failed.
    pub fn failure(&self) -> Option<&Arc<ChainFailure>> {
        match self {
            StepError::Failed(failure) => Some(failure),
            StepError::Skipped(_) => None,
        }
    }

    /// The skip, if the step was skipped.
    pub fn skip(&self) -> Option<&Skip> {
        match self {
            StepError::Skipped(skip) => Some(skip),
            StepError::Failed(_) => None,
        }
    }

    /// The original error of a failure.
    pub fn original(&self) -> Option<&anyhow::Error> {
        self.failure().map(|failure| failure.original())
    }
}

/// Final state of one step, as reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Step completed successfully.
    Completed,
    /// Step failed.
    Failed,
    /// Step was not executed.
    Skipped,
}

impl StepStatus {
    /// Status of a runner result.
    pub fn of<T>(result: &Result<T, StepError>) -> Self {
        match result {
            Ok(_) => StepStatus::Completed,
            Err(StepError::Failed(_)) => StepStatus::Failed,
            Err(StepError::Skipped(_)) => StepStatus::Skipped,
        }
    }

    /// Get a display character for this status.
    pub fn display_char(&self) -> char {
        match self {
            StepStatus::Completed => '✓',
            StepStatus::Failed => '✗',
            StepStatus::Skipped => '⊘',
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
        };
        write!(f, "{}", s)
    }
}
