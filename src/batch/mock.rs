//! In-memory store recording every call the engine makes.
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::template::VALUES_MARKER;
use super::ExecutionContext;
use crate::db::{Db, ExecOutcome, Executor, Tx, Value};

/// A call made against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Begin,
    Execute { statement: String, binds: usize },
    Commit,
    Rollback,
}

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    calls: Vec<Call>,
    executes: usize,
    commits: usize,
    committed: Vec<Vec<i64>>,
}

/// Auto-increment store. Ids are handed out at execute time and are not
/// reused after a rollback, like a real identity column.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    state: Arc<Mutex<State>>,
    fail_begin: bool,
    fail_execute: Option<usize>,
    fail_commit: Option<usize>,
    ignored_rows: usize,
    gap_after_commit: i64,
    bind_limit: Option<usize>,
}

pub struct MockTx {
    store: MockStore,
    pending: Vec<Vec<i64>>,
}

impl MockStore {
    pub fn starting_at(first_id: i64) -> Self {
        let store = Self::default();
        store.state.lock().unwrap().next_id = first_id;
        store
    }

    pub const fn failing_begin(mut self) -> Self {
        self.fail_begin = true;
        self
    }

    /// Fail the `nth` execute, counting from zero.
    pub const fn failing_execute(mut self, nth: usize) -> Self {
        self.fail_execute = Some(nth);
        self
    }

    /// Fail the `nth` commit, counting from zero.
    pub const fn failing_commit(mut self, nth: usize) -> Self {
        self.fail_commit = Some(nth);
        self
    }

    /// Silently drop the last `rows` rows of every statement.
    pub const fn ignoring_rows(mut self, rows: usize) -> Self {
        self.ignored_rows = rows;
        self
    }

    /// Burn `gap` ids after every commit, as concurrent writers would.
    pub const fn with_gap_after_commit(mut self, gap: i64) -> Self {
        self.gap_after_commit = gap;
        self
    }

    /// Reject statements with more than `limit` binds, and report the limit.
    pub const fn with_bind_limit(mut self, limit: usize) -> Self {
        self.bind_limit = Some(limit);
        self
    }

    pub const fn context(&self) -> ExecutionContext<'_, Self> {
        ExecutionContext::SelfManaged(self)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn committed(&self) -> Vec<Vec<i64>> {
        self.state.lock().unwrap().committed.clone()
    }

    /// Bind count of every executed statement, in order.
    pub fn executed_binds(&self) -> Vec<usize> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Execute { binds, .. } => Some(binds),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl Db for MockStore {
    type Transaction = MockTx;

    async fn begin(&self) -> anyhow::Result<MockTx> {
        self.record(Call::Begin);
        if self.fail_begin {
            anyhow::bail!("pool timed out while waiting for an open connection");
        }
        Ok(MockTx {
            store: self.clone(),
            pending: Vec::new(),
        })
    }

    fn max_bind_variables(&self) -> Option<usize> {
        self.bind_limit
    }
}

#[async_trait]
impl Executor for MockTx {
    async fn execute(&mut self, statement: &str, args: &[Value]) -> anyhow::Result<ExecOutcome> {
        self.store.record(Call::Execute {
            statement: statement.to_owned(),
            binds: args.len(),
        });
        let mut state = self.store.state.lock().unwrap();
        let nth = state.executes;
        state.executes += 1;
        if self.store.fail_execute == Some(nth) {
            anyhow::bail!("NOT NULL constraint failed: t.a");
        }
        if self.store.bind_limit.is_some_and(|limit| args.len() > limit) {
            anyhow::bail!("too many SQL variables");
        }
        let rows = statement
            .split_once(VALUES_MARKER)
            .map_or(0, |(_, tuples)| tuples.matches('(').count());
        let per_row = args.len().checked_div(rows).unwrap_or(0);
        let written: Vec<Vec<i64>> = args
            .chunks(per_row.max(1))
            .take(rows.saturating_sub(self.store.ignored_rows))
            .map(|row| {
                row.iter()
                    .map(|value| match *value {
                        Value::Int(value) => value,
                        _ => 0,
                    })
                    .collect()
            })
            .collect();
        let first_generated_id = state.next_id;
        state.next_id += i64::try_from(written.len())?;
        let rows_affected = u64::try_from(written.len())?;
        self.pending.extend(written);
        Ok(ExecOutcome {
            rows_affected,
            first_generated_id,
        })
    }

    fn max_bind_variables(&self) -> Option<usize> {
        self.store.bind_limit
    }
}

#[async_trait]
impl Tx for MockTx {
    async fn commit(self) -> anyhow::Result<()> {
        self.store.record(Call::Commit);
        let mut state = self.store.state.lock().unwrap();
        let nth = state.commits;
        state.commits += 1;
        if self.store.fail_commit == Some(nth) {
            anyhow::bail!("database is locked");
        }
        state.committed.extend(self.pending);
        state.next_id += self.store.gap_after_commit;
        Ok(())
    }

    async fn rollback(self) -> anyhow::Result<()> {
        self.store.record(Call::Rollback);
        Ok(())
    }
}
