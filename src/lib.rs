//! # txnguard
//!
//! Transaction orchestration for embedded single-writer databases — the kind
//! that reports contention with a distinctive "locked" error rather than
//! blocking indefinitely.
//!
//! Three things are layered over a pluggable [`Backend`]:
//!
//! 1. **All-or-nothing execution**: [`with_txn`] / [`with_read_txn`] run a
//!    unit of work between `begin` and a guaranteed `commit` or `rollback`,
//!    on every exit path including panic.
//! 2. **Staged lifecycle hooks**: code running inside the unit of work can
//!    register pre-commit, post-commit, post-rollback, and post-complete
//!    callbacks on its [`TxnContext`], letting unrelated subsystems observe
//!    the outcome without the transaction core knowing about them.
//! 3. **Lock-contention retry**: [`Retryer`] re-runs a unit of work when,
//!    and only when, it failed because the database was locked, leaving
//!    backoff policy to a caller-supplied callback.
//!
//! ## Quick start
//!
//! ```ignore
//! use txnguard::{with_txn, Retryer};
//!
//! // One-shot write transaction with an observer:
//! with_txn(&backend, |ctx| {
//!     insert_record(ctx.handle_mut())?;
//!     ctx.add_post_commit(|| Ok(notify_listeners()));
//!     Ok(())
//! })?;
//!
//! // The same, retried while the database is locked:
//! let mut retryer = Retryer { backend: &backend, retries: 10, on_fail: None };
//! retryer.with_txn(|ctx| insert_record(ctx.handle_mut()))?;
//! ```
//!
//! ## Outcomes and hook stages
//!
//! | unit of work        | backend calls      | hook stages, in order            |
//! |---------------------|--------------------|----------------------------------|
//! | returns `Ok`        | commit             | pre-commit → post-commit → post-complete |
//! | returns `Err`       | rollback           | post-rollback → post-complete    |
//! | pre-commit veto     | rollback           | post-rollback → post-complete    |
//! | panics              | rollback           | none; the panic resumes unchanged |
//!
//! A commit failure is returned to the caller while keeping the
//! success-shaped hook sequence (post-commit → post-complete): observers
//! that fired must not be contradicted by a later post-rollback, and the
//! caller still must not lose the error.
//!
//! Errors pass through this crate untouched — a caller of [`with_txn`] sees
//! exactly the unit of work's error. The single exception is the retry
//! boundary, where exhaustion returns [`TxnError::RetriesExceeded`] naming
//! the attempt count and embedding the last failure.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod backend;
mod context;
mod error;
mod executor;
mod hooks;
mod retry;

pub use backend::{Backend, DatabaseProvider};
pub use context::TxnContext;
pub use error::TxnError;
pub use executor::{with_database, with_read_txn, with_txn};
pub use retry::{OnFail, Retryer};
