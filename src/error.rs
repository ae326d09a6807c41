//! Structured errors for the transaction orchestrator.
//!
//! Almost everything this crate touches propagates as the caller's own
//! [`anyhow::Error`], unchanged: a unit of work's failure reaches the caller
//! exactly as it was returned, and backend failures pass through begin and
//! rollback untouched. The one place the crate speaks with its own voice is
//! the retry boundary, where an exhausted retry loop reports how many
//! attempts were made and embeds the last observed failure.

use thiserror::Error;

/// Errors originating in this crate rather than in the backend or the
/// caller's unit of work.
#[derive(Debug, Error)]
pub enum TxnError {
    /// A retried transaction kept failing with lock contention until the
    /// configured attempt bound was exhausted.
    ///
    /// `attempts` counts every invocation of the executor, including the
    /// first; `source` is the lock-contention error from the final attempt.
    #[error("failed after {attempts} attempts: {source}")]
    RetriesExceeded {
        /// Total number of attempts made, 1-based.
        attempts: i32,
        /// The lock-contention failure observed on the final attempt.
        source: anyhow::Error,
    },
}

impl TxnError {
    /// Check whether this error reports an exhausted retry bound.
    pub fn is_retries_exceeded(&self) -> bool {
        matches!(self, TxnError::RetriesExceeded { .. })
    }
}
