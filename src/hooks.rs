//! Staged lifecycle hooks for one transaction span.
//!
//! A [`HookRegistry`] is created fresh when a transaction begins, filled by
//! code running inside the unit of work (via the registration methods on
//! [`TxnContext`](crate::TxnContext)), drained exactly once per stage by the
//! executor, and discarded when the span ends. Four stages exist:
//!
//! - **pre-commit**: runs against the live transactional context, in
//!   registration order, before the backend commit. The first hook to fail
//!   vetoes the commit: the sequence stops, the transaction rolls back, and
//!   the hook's error becomes the unit of work's error.
//! - **post-commit**, **post-rollback**, **post-complete**: best-effort
//!   notifications that run after the transaction handle is gone. A failing
//!   hook is logged and absorbed so it can neither mask the primary outcome
//!   nor block sibling hooks in the same stage.
//!
//! A stage never re-executes; registering into a stage that has already been
//! dispatched is a silent no-op.

use anyhow::Result;

use crate::context::TxnContext;

/// A hook that runs inside the transaction, before commit. It receives the
/// live transactional context and may veto the commit by returning an error.
pub type PreCommitFn<H> = Box<dyn FnOnce(&mut TxnContext<H>) -> Result<()>>;

/// A hook that runs after the transaction span has ended. Errors are
/// absorbed and logged, never propagated.
pub type PostFn = Box<dyn FnOnce() -> Result<()>>;

/// The four lifecycle stages at which hooks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    PreCommit,
    PostCommit,
    PostRollback,
    PostComplete,
}

impl Stage {
    fn name(self) -> &'static str {
        match self {
            Stage::PreCommit => "pre_commit",
            Stage::PostCommit => "post_commit",
            Stage::PostRollback => "post_rollback",
            Stage::PostComplete => "post_complete",
        }
    }
}

/// Ordered hook sequences for one transaction span.
pub(crate) struct HookRegistry<H: 'static> {
    pre_commit: Vec<PreCommitFn<H>>,
    post_commit: Vec<PostFn>,
    post_rollback: Vec<PostFn>,
    post_complete: Vec<PostFn>,
    // One flag per stage, set when the stage is drained.
    dispatched: [bool; 4],
}

impl<H: 'static> HookRegistry<H> {
    pub(crate) fn new() -> Self {
        HookRegistry {
            pre_commit: Vec::new(),
            post_commit: Vec::new(),
            post_rollback: Vec::new(),
            post_complete: Vec::new(),
            dispatched: [false; 4],
        }
    }

    fn is_dispatched(&self, stage: Stage) -> bool {
        self.dispatched[stage as usize]
    }

    fn mark_dispatched(&mut self, stage: Stage) {
        self.dispatched[stage as usize] = true;
    }

    pub(crate) fn add_pre_commit(&mut self, hook: PreCommitFn<H>) {
        if !self.is_dispatched(Stage::PreCommit) {
            self.pre_commit.push(hook);
        }
    }

    pub(crate) fn add_post_commit(&mut self, hook: PostFn) {
        if !self.is_dispatched(Stage::PostCommit) {
            self.post_commit.push(hook);
        }
    }

    pub(crate) fn add_post_rollback(&mut self, hook: PostFn) {
        if !self.is_dispatched(Stage::PostRollback) {
            self.post_rollback.push(hook);
        }
    }

    pub(crate) fn add_post_complete(&mut self, hook: PostFn) {
        if !self.is_dispatched(Stage::PostComplete) {
            self.post_complete.push(hook);
        }
    }

    /// Drain the pre-commit stage for execution by the executor.
    ///
    /// Returned hooks must run against the live transactional context, so
    /// the registry hands them out instead of running them itself (it sits
    /// inside that context). Draining marks the stage dispatched; hooks
    /// registered from inside a running pre-commit hook are dropped.
    pub(crate) fn take_pre_commit(&mut self) -> Vec<PreCommitFn<H>> {
        self.mark_dispatched(Stage::PreCommit);
        std::mem::take(&mut self.pre_commit)
    }

    /// Run post-commit hooks in registration order, absorbing errors.
    pub(crate) fn execute_post_commit(&mut self) {
        let hooks = std::mem::take(&mut self.post_commit);
        self.run_post_stage(Stage::PostCommit, hooks);
    }

    /// Run post-rollback hooks in registration order, absorbing errors.
    pub(crate) fn execute_post_rollback(&mut self) {
        let hooks = std::mem::take(&mut self.post_rollback);
        self.run_post_stage(Stage::PostRollback, hooks);
    }

    /// Run post-complete hooks in registration order, absorbing errors.
    pub(crate) fn execute_post_complete(&mut self) {
        let hooks = std::mem::take(&mut self.post_complete);
        self.run_post_stage(Stage::PostComplete, hooks);
    }

    fn run_post_stage(&mut self, stage: Stage, hooks: Vec<PostFn>) {
        self.mark_dispatched(stage);
        for hook in hooks {
            if let Err(err) = hook() {
                // A faulty observer must not mask the transaction outcome
                // or starve its siblings.
                tracing::error!(stage = stage.name(), error = %err, "transaction hook failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn registry() -> HookRegistry<()> {
        HookRegistry::new()
    }

    #[test]
    fn post_stage_runs_in_registration_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut hooks = registry();
        for i in 0..3 {
            let seen = Rc::clone(&seen);
            hooks.add_post_commit(Box::new(move || {
                seen.borrow_mut().push(i);
                Ok(())
            }));
        }

        hooks.execute_post_commit();
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn post_stage_absorbs_hook_errors() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut hooks = registry();
        {
            let seen = Rc::clone(&seen);
            hooks.add_post_rollback(Box::new(move || {
                seen.borrow_mut().push("first");
                anyhow::bail!("observer fault")
            }));
        }
        {
            let seen = Rc::clone(&seen);
            hooks.add_post_rollback(Box::new(move || {
                seen.borrow_mut().push("second");
                Ok(())
            }));
        }

        hooks.execute_post_rollback();
        assert_eq!(*seen.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn registration_after_dispatch_is_a_no_op() {
        let ran = Rc::new(RefCell::new(0));
        let mut hooks = registry();
        hooks.execute_post_complete();

        let ran2 = Rc::clone(&ran);
        hooks.add_post_complete(Box::new(move || {
            *ran2.borrow_mut() += 1;
            Ok(())
        }));

        // The stage already fired; draining again must find nothing.
        hooks.execute_post_complete();
        assert_eq!(*ran.borrow(), 0);
    }

    #[test]
    fn pre_commit_drain_marks_stage_dispatched() {
        let mut hooks = registry();
        hooks.add_pre_commit(Box::new(|_| Ok(())));
        assert_eq!(hooks.take_pre_commit().len(), 1);

        hooks.add_pre_commit(Box::new(|_| Ok(())));
        assert!(hooks.take_pre_commit().is_empty());
    }
}
