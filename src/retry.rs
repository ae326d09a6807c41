//! Lock-contention retry for exclusive transactions.

use anyhow::Result;

use crate::backend::Backend;
use crate::context::TxnContext;
use crate::error::TxnError;
use crate::executor;

/// Inter-attempt policy callback: receives the lock-contention error and the
/// 1-based attempt number, and may abort the loop by returning an error.
///
/// Backoff, jitter, logging, and deadlines all live here, not in the loop —
/// the orchestrator itself has no timing dependencies.
pub type OnFail<'a> = Box<dyn FnMut(&anyhow::Error, i32) -> Result<()> + 'a>;

/// Re-runs a unit of work while it fails with lock contention.
///
/// Transactions run in exclusive mode with completion-hook suppression, so
/// post-complete observers see only the terminal outcome of the loop, never
/// an intermediate locked attempt. Any failure the backend does not classify
/// as lock contention is returned immediately, untouched.
///
/// ```ignore
/// let mut retryer = Retryer {
///     backend: &backend,
///     retries: 10,
///     on_fail: Some(Box::new(|_, attempt| {
///         std::thread::sleep(Duration::from_millis(50 * attempt as u64));
///         Ok(())
///     })),
/// };
/// retryer.with_txn(|ctx| do_writes(ctx))?;
/// ```
pub struct Retryer<'a, B> {
    /// The backend transactions run against.
    pub backend: &'a B,
    /// Number of re-tries after the first attempt, so `retries = N` allows
    /// N + 1 attempts in total. A negative value means retry forever: the
    /// loop only ends on success, a non-locked failure, or an `on_fail`
    /// veto.
    pub retries: i32,
    /// Optional inter-attempt callback; invoked between attempts, never
    /// after the terminal one.
    pub on_fail: Option<OnFail<'a>>,
}

impl<'a, B: Backend> Retryer<'a, B> {
    /// Execute `f` in an exclusive transaction, retrying on lock contention.
    ///
    /// On exhaustion returns [`TxnError::RetriesExceeded`] naming the total
    /// attempt count and embedding the last lock-contention failure.
    pub fn with_txn<T, F>(&mut self, mut f: F) -> Result<T>
    where
        F: FnMut(&mut TxnContext<B::Txn>) -> Result<T>,
    {
        const COMPLETE_ON_LOCKED: bool = false;
        const EXCLUSIVE: bool = true;

        let mut attempt = 1;
        loop {
            let err = match executor::execute(
                self.backend,
                &mut f,
                EXCLUSIVE,
                COMPLETE_ON_LOCKED,
            ) {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            // Only lock contention is a candidate for retry.
            if !self.backend.is_locked(&err) {
                return Err(err);
            }

            if self.retries >= 0 && attempt > self.retries {
                return Err(TxnError::RetriesExceeded {
                    attempts: attempt,
                    source: err,
                }
                .into());
            }

            if let Some(on_fail) = self.on_fail.as_mut() {
                // The callback may impose its own giving-up condition.
                on_fail(&err, attempt)?;
            }

            attempt += 1;
        }
    }
}
