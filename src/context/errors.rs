//! Ordered failure history of a chain.

use std::error::Error as StdError;
use std::sync::{Arc, PoisonError, RwLock};

use crate::runner::{Annotation, ChainFailure};

/// Thread-safe, append-only stack of the failures recorded in a chain.
///
/// Records are never popped. Iteration is most-recent-first.
#[derive(Debug, Default)]
pub struct ChainErrors {
    records: RwLock<Vec<Arc<ChainFailure>>>,
}

impl ChainErrors {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure.
    pub fn push(&self, failure: Arc<ChainFailure>) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(failure);
    }

    /// Number of recorded failures.
    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Check if nothing has failed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of all records, most recent first.
    pub fn snapshot(&self) -> Vec<Arc<ChainFailure>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.iter().rev().cloned().collect()
    }

    /// The most recently recorded failure.
    pub fn latest(&self) -> Option<Arc<ChainFailure>> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Most recent record whose original failure is of kind `K`.
    pub fn find_kind<K>(&self) -> Option<Arc<ChainFailure>>
    where
        K: StdError + Send + Sync + 'static,
    {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.iter().rev().find(|f| f.is_kind::<K>()).cloned()
    }

    /// Check whether any record's original failure is of kind `K`.
    pub fn any_kind<K>(&self) -> bool
    where
        K: StdError + Send + Sync + 'static,
    {
        self.find_kind::<K>().is_some()
    }

    /// Number of records carrying the given annotation.
    pub fn count(&self, annotation: Annotation) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|f| f.annotation == annotation)
            .count()
    }
}
