//! Shared test fixtures: a scripted in-memory backend and a lock-contention
//! marker error.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use txnguard::{Backend, DatabaseProvider};

/// Marker error the mock backend classifies as lock contention.
#[derive(Debug, thiserror::Error)]
#[error("database table is locked")]
pub struct Locked;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Begin { exclusive: bool },
    Commit,
    Rollback,
}

/// Transaction handle handed out by the mock backend.
pub struct MockTxn {
    pub exclusive: bool,
}

/// Scripted backend: records every call and fails on cue.
///
/// Failure scripts are consumed front-to-back: each `begin`/`commit`/
/// `rollback` pops the next scripted error for that call, succeeding once
/// the script is empty.
#[derive(Default)]
pub struct MockBackend {
    ops: Mutex<Vec<Op>>,
    begin_failures: Mutex<VecDeque<anyhow::Error>>,
    commit_failures: Mutex<VecDeque<anyhow::Error>>,
    rollback_failures: Mutex<VecDeque<anyhow::Error>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_next_begin(&self, err: anyhow::Error) {
        self.begin_failures.lock().push_back(err);
    }

    pub fn fail_next_commit(&self, err: anyhow::Error) {
        self.commit_failures.lock().push_back(err);
    }

    pub fn fail_next_rollback(&self, err: anyhow::Error) {
        self.rollback_failures.lock().push_back(err);
    }

    pub fn ops(&self) -> Vec<Op> {
        self.ops.lock().clone()
    }

    pub fn begins(&self) -> usize {
        self.count(|op| matches!(op, Op::Begin { .. }))
    }

    pub fn commits(&self) -> usize {
        self.count(|op| matches!(op, Op::Commit))
    }

    pub fn rollbacks(&self) -> usize {
        self.count(|op| matches!(op, Op::Rollback))
    }

    fn count(&self, pred: impl Fn(&Op) -> bool) -> usize {
        self.ops.lock().iter().filter(|op| pred(op)).count()
    }
}

impl Backend for MockBackend {
    type Txn = MockTxn;

    fn begin(&self, exclusive: bool) -> Result<MockTxn> {
        if let Some(err) = self.begin_failures.lock().pop_front() {
            return Err(err);
        }
        self.ops.lock().push(Op::Begin { exclusive });
        Ok(MockTxn { exclusive })
    }

    fn commit(&self, _txn: MockTxn) -> Result<()> {
        self.ops.lock().push(Op::Commit);
        match self.commit_failures.lock().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn rollback(&self, _txn: MockTxn) -> Result<()> {
        self.ops.lock().push(Op::Rollback);
        match self.rollback_failures.lock().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn is_locked(&self, err: &anyhow::Error) -> bool {
        err.chain().any(|cause| cause.downcast_ref::<Locked>().is_some())
    }
}

/// Connection handle handed out by [`MockProvider`].
#[derive(Default)]
pub struct MockDb {
    pub statements: Vec<String>,
}

/// Provider for the non-transactional path.
#[derive(Default)]
pub struct MockProvider {
    pub fail: Mutex<Option<anyhow::Error>>,
}

impl DatabaseProvider for MockProvider {
    type Database = MockDb;

    fn with_database(&self) -> Result<MockDb> {
        if let Some(err) = self.fail.lock().take() {
            return Err(err);
        }
        Ok(MockDb::default())
    }
}

/// Install the test subscriber so absorbed hook and rollback failures show
/// up in captured test output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Shared event log for asserting hook ordering across closures.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn record(log: &EventLog, event: impl Into<String>) {
    log.lock().push(event.into());
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().clone()
}
