//! Error types for testchain operations.
//!
//! This module defines [`ChainError`], the crate-wide error type, a [`Result`]
//! alias, and the individual failure kinds a step guard can match on.
//!
//! # Error Handling Strategy
//!
//! - Step bodies fail with `anyhow::Error`; the runner keeps that error as the
//!   original cause of a [`ChainFailure`](crate::runner::ChainFailure)
//! - [`MissingOutputError`], [`StepTimeout`] and [`GroupWaitTimeout`] are
//!   separate types so a guard can name exactly one kind
//! - `ChainError` wraps them (and config/IO problems) for APIs that can fail
//!   in more than one way

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Why a requested output could not be returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingReason {
    /// No value was ever stored under the key.
    Absent,
    /// A value exists but is not of the requested type.
    TypeMismatch { expected: &'static str },
}

impl fmt::Display for MissingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingReason::Absent => write!(f, "not set"),
            MissingReason::TypeMismatch { expected } => {
                write!(f, "stored value is not a {}", expected)
            }
        }
    }
}

/// A required key is absent from the chain output, or holds the wrong type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(
    "Chain output \"{key}\" is missing or invalid ({reason}). Ensure this step runs as part of the chain or the output is present."
)]
pub struct MissingOutputError {
    pub key: String,
    pub reason: MissingReason,
}

impl MissingOutputError {
    /// Error for a key that was never set.
    pub fn absent(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reason: MissingReason::Absent,
        }
    }

    /// Error for a key whose value cannot be viewed as `expected`.
    pub fn type_mismatch(key: impl Into<String>, expected: &'static str) -> Self {
        Self {
            key: key.into(),
            reason: MissingReason::TypeMismatch { expected },
        }
    }
}

/// An async step did not finish before its deadline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Step '{step}' timed out after {timeout:?}")]
pub struct StepTimeout {
    pub step: String,
    pub timeout: Duration,
}

/// A barrier wait gave up before the awaited group finished.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Timed out after {timeout:?} waiting for group '{group}' to complete")]
pub struct GroupWaitTimeout {
    pub group: String,
    pub timeout: Duration,
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Required output missing or of the wrong type.
    #[error(transparent)]
    MissingOutput(#[from] MissingOutputError),

    /// Async step exceeded its deadline.
    #[error(transparent)]
    StepTimeout(#[from] StepTimeout),

    /// Barrier wait exceeded its deadline.
    #[error(transparent)]
    GroupWaitTimeout(#[from] GroupWaitTimeout),

    /// Groups wait on each other in a cycle and can never start.
    #[error("Circular group wait detected: {cycle}")]
    CircularWait { cycle: String },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for testchain operations.
pub type Result<T> = std::result::Result<T, ChainError>;
