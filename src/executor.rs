//! The transaction executor: begin → run → (commit | rollback) → hooks.
//!
//! Every exit path of a unit of work lands in exactly one of three arms:
//!
//! - **success**: pre-commit hooks → commit → post-commit → post-complete
//! - **error** (including a pre-commit veto): rollback → post-rollback →
//!   post-complete
//! - **panic**: rollback only, then the panic resumes unchanged — a program
//!   whose state is no longer trustworthy does not get to run arbitrary
//!   observer code.
//!
//! Post-stage hooks run after the transaction handle has been consumed, so
//! an observer can never touch a closed transaction.

use std::panic::{self, AssertUnwindSafe};

use anyhow::Result;

use crate::backend::{Backend, DatabaseProvider};
use crate::context::TxnContext;

/// Execute `f` in an exclusive transaction.
///
/// If `f` returns an error the transaction is rolled back, otherwise it is
/// committed. Only one exclusive transaction runs against the backend at a
/// time; the backend serializes or rejects concurrent exclusive attempts per
/// its own policy. Use this for all mutating work.
///
/// Completion hooks fire regardless of outcome. A commit failure is returned
/// to the caller; see the crate docs for the hook shape it produces.
pub fn with_txn<B, T, F>(backend: &B, f: F) -> Result<T>
where
    B: Backend,
    F: FnOnce(&mut TxnContext<B::Txn>) -> Result<T>,
{
    const COMPLETE_ON_LOCKED: bool = true;
    const EXCLUSIVE: bool = true;
    execute(backend, f, EXCLUSIVE, COMPLETE_ON_LOCKED)
}

/// Execute `f` in a shared (non-exclusive) transaction.
///
/// Shared transactions may run concurrently with each other, but a
/// concurrent writer can still cause the backend to report lock contention
/// to a reader; that surfaces as a normal error. Retry is opt-in via
/// [`Retryer`](crate::Retryer). No read-only restriction is enforced here.
pub fn with_read_txn<B, T, F>(backend: &B, f: F) -> Result<T>
where
    B: Backend,
    F: FnOnce(&mut TxnContext<B::Txn>) -> Result<T>,
{
    const COMPLETE_ON_LOCKED: bool = true;
    const EXCLUSIVE: bool = false;
    execute(backend, f, EXCLUSIVE, COMPLETE_ON_LOCKED)
}

/// Execute `f` with a connection from `provider`, outside any orchestrated
/// transaction.
///
/// No hook lifecycle and no commit/rollback: each statement runs in its own
/// implicit transaction. Use this for fire-and-forget statements that manage
/// their own atomicity.
pub fn with_database<P, T, F>(provider: &P, f: F) -> Result<T>
where
    P: DatabaseProvider,
    F: FnOnce(&mut P::Database) -> Result<T>,
{
    let mut db = provider.with_database()?;
    f(&mut db)
}

/// The orchestration primitive under [`with_txn`] and [`with_read_txn`].
///
/// `complete_on_locked = false` suppresses post-complete hooks when the
/// failure is lock-classified; the retryer uses this to hide intermediate
/// attempts from completion observers.
pub(crate) fn execute<B, T, F>(
    backend: &B,
    f: F,
    exclusive: bool,
    complete_on_locked: bool,
) -> Result<T>
where
    B: Backend,
    F: FnOnce(&mut TxnContext<B::Txn>) -> Result<T>,
{
    // Begin failure aborts with no hooks: no transaction was ever opened.
    let handle = backend.begin(exclusive)?;
    let mut ctx = TxnContext::new(handle);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(&mut ctx)));

    match outcome {
        Err(payload) => {
            // Roll back, then let the panic continue unchanged. No hook of
            // any stage runs on this path.
            let (handle, _hooks) = ctx.into_parts();
            rollback_best_effort(backend, handle);
            panic::resume_unwind(payload);
        }
        Ok(Err(err)) => finish_rolled_back(backend, ctx, err, complete_on_locked),
        Ok(Ok(value)) => {
            // Pre-commit hooks run against the live context, in order. The
            // first failure vetoes the commit and becomes the span's error.
            for hook in ctx.hooks_mut().take_pre_commit() {
                if let Err(err) = hook(&mut ctx) {
                    return finish_rolled_back(backend, ctx, err, complete_on_locked);
                }
            }

            let (handle, mut hooks) = ctx.into_parts();
            let committed = backend.commit(handle);

            // Post hooks run with the handle already gone, whether or not
            // the commit itself succeeded.
            hooks.execute_post_commit();
            hooks.execute_post_complete();

            committed.map(|()| value)
        }
    }
}

/// Shared tail of the error paths: rollback, post-rollback hooks, then
/// post-complete hooks unless this is a suppressed lock-contention attempt.
fn finish_rolled_back<B, T>(
    backend: &B,
    ctx: TxnContext<B::Txn>,
    err: anyhow::Error,
    complete_on_locked: bool,
) -> Result<T>
where
    B: Backend,
{
    let (handle, mut hooks) = ctx.into_parts();
    rollback_best_effort(backend, handle);

    hooks.execute_post_rollback();
    if complete_on_locked || !backend.is_locked(&err) {
        hooks.execute_post_complete();
    }

    Err(err)
}

/// Rollback during cleanup is best-effort: the transaction is already being
/// abandoned and nothing more can be done locally.
fn rollback_best_effort<B: Backend>(backend: &B, handle: B::Txn) {
    if let Err(err) = backend.rollback(handle) {
        tracing::warn!(error = %err, "transaction rollback failed");
    }
}
