//! Capability traits the concrete storage driver implements.
//!
//! The orchestrator never talks to a database directly. It consumes two
//! narrow capabilities:
//!
//! - [`Backend`]: open, commit, and roll back transactions, plus classify
//!   errors as lock contention. Implemented by the storage driver for an
//!   embedded single-writer database (the kind that reports contention with
//!   a distinctive "locked" error instead of blocking forever).
//! - [`DatabaseProvider`]: hand out a non-transactional connection for
//!   fire-and-forget statements that manage their own atomicity.
//!
//! Both traits are injected at the call site, which keeps the executor and
//! the retryer backend-agnostic and testable with a scripted mock.

use anyhow::Result;

/// Transactional capability of a storage driver.
///
/// `commit` and `rollback` consume the handle: once a transaction span has
/// ended, its handle no longer exists and cannot be reused. Passing an
/// expired handle into the backend is thereby a compile error, not a runtime
/// surprise.
pub trait Backend {
    /// Handle for one active transaction, produced by [`Backend::begin`].
    ///
    /// Handles are owned values (`'static`): a driver whose transactions
    /// borrow a connection wraps the borrow in an owning guard.
    type Txn: 'static;

    /// Open a transaction.
    ///
    /// `exclusive` requests a write transaction: the backend serializes or
    /// rejects concurrent exclusive attempts per its own policy. Shared
    /// (non-exclusive) transactions may run concurrently with each other.
    ///
    /// This call may block on backend-internal locking; no timeout is
    /// imposed here.
    fn begin(&self, exclusive: bool) -> Result<Self::Txn>;

    /// Commit the transaction, consuming its handle.
    fn commit(&self, txn: Self::Txn) -> Result<()>;

    /// Roll the transaction back, consuming its handle.
    fn rollback(&self, txn: Self::Txn) -> Result<()>;

    /// Classify an error as lock contention.
    ///
    /// This is the only signal the retry orchestrator uses to decide whether
    /// a failed attempt is worth repeating. How "locked" is recognized
    /// (error-chain downcast, driver error code) is entirely the backend's
    /// business.
    fn is_locked(&self, err: &anyhow::Error) -> bool;
}

/// Non-transactional access to the database.
///
/// Used by [`with_database`](crate::with_database) for statements that run
/// in their own implicit transactions.
pub trait DatabaseProvider {
    /// Connection handle for ad-hoc, non-transactional execution.
    type Database;

    /// Obtain a connection outside any orchestrated transaction.
    fn with_database(&self) -> Result<Self::Database>;
}
