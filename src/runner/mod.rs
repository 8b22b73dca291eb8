//! Step execution with failure recording and skip guards.
//!
//! - [`StepRunner`] - Runs one step body against a chain context
//! - [`ChainFailure`] - A recorded failure with step name and call site
//! - [`StepError`] - Failed-or-skipped outcome returned to the host
//! - [`StepStatus`] - Final state of a step for reporting

pub mod failure;
pub mod outcome;
pub mod step;

pub use failure::{annotate, Annotation, ChainFailure};
pub use outcome::{Skip, StepError, StepStatus};
pub use step::{StepRunner, CANCEL_GRACE};
