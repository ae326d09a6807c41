//! The transactional execution context handed to a unit of work.

use anyhow::Result;

use crate::hooks::{HookRegistry, PostFn, PreCommitFn};

/// Per-span execution context: the backend's active transaction handle plus
/// this span's hook registry.
///
/// A `TxnContext` is created by the executor right after `begin`, lent
/// (`&mut`) to the unit of work, and consumed by the executor before
/// commit or rollback. Ownership makes the span forward-only: the context
/// cannot escape the unit of work, outlive the transaction, or be reused
/// across spans.
///
/// Nested calls that share one context (passing the `&mut` borrow down the
/// call chain) share its registry; the borrow rules enforce the intended
/// strictly nested, non-parallel use.
pub struct TxnContext<H: 'static> {
    handle: H,
    hooks: HookRegistry<H>,
}

impl<H: 'static> TxnContext<H> {
    pub(crate) fn new(handle: H) -> Self {
        TxnContext {
            handle,
            hooks: HookRegistry::new(),
        }
    }

    /// The backend's transaction handle, for running statements inside this
    /// transaction.
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Mutable access to the backend's transaction handle.
    pub fn handle_mut(&mut self) -> &mut H {
        &mut self.handle
    }

    /// Register a hook to run inside this transaction just before commit.
    ///
    /// Pre-commit hooks run in registration order against the live context;
    /// the first one to return an error vetoes the commit and the
    /// transaction rolls back instead.
    pub fn add_pre_commit(&mut self, hook: impl FnOnce(&mut TxnContext<H>) -> Result<()> + 'static) {
        self.hooks.add_pre_commit(Box::new(hook) as PreCommitFn<H>);
    }

    /// Register a hook to run after this transaction commits.
    ///
    /// Runs after the transaction handle is closed; errors are logged and
    /// absorbed.
    pub fn add_post_commit(&mut self, hook: impl FnOnce() -> Result<()> + 'static) {
        self.hooks.add_post_commit(Box::new(hook) as PostFn);
    }

    /// Register a hook to run after this transaction rolls back.
    ///
    /// Runs after the transaction handle is closed; errors are logged and
    /// absorbed. Does not run on panic: an abnormal termination bypasses the
    /// hook system entirely.
    pub fn add_post_rollback(&mut self, hook: impl FnOnce() -> Result<()> + 'static) {
        self.hooks.add_post_rollback(Box::new(hook) as PostFn);
    }

    /// Register a hook to run once the transaction has completed, whether it
    /// committed or rolled back.
    ///
    /// Runs after the stage-specific hooks; errors are logged and absorbed.
    /// Under the retry orchestrator, intermediate lock-contention attempts
    /// suppress this stage so observers only see the terminal outcome.
    pub fn add_post_complete(&mut self, hook: impl FnOnce() -> Result<()> + 'static) {
        self.hooks.add_post_complete(Box::new(hook) as PostFn);
    }

    pub(crate) fn hooks_mut(&mut self) -> &mut HookRegistry<H> {
        &mut self.hooks
    }

    /// Tear the span down, separating the handle (for commit/rollback) from
    /// the registry (for the post stages).
    pub(crate) fn into_parts(self) -> (H, HookRegistry<H>) {
        (self.handle, self.hooks)
    }
}
