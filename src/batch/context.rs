//! Where the engine's statements run.
use super::InsertError;
use crate::db::{Db, ExecOutcome, Executor, Tx, Value};

/// Transaction boundary for a batch insert.
///
/// The caller owns the connection either way; the engine only ever owns a
/// transaction it began itself.
pub enum ExecutionContext<'a, D: Db> {
    /// The engine begins a transaction per chunk, commits it once the chunk
    /// is written and rolls it back on any failure. Chunks committed before
    /// a failing chunk stay committed.
    SelfManaged(&'a D),
    /// Every chunk runs inside the caller's transaction. The engine never
    /// commits or rolls back, so wrapping a whole call in one of these gives
    /// all-or-nothing semantics across chunks.
    CallerSupplied(&'a mut D::Transaction),
}

/// Where in a batch a statement sits, for error context.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Position {
    /// Index of the chunk.
    pub chunk: usize,
    /// Rows written by earlier chunks.
    pub inserted: usize,
}

impl<D: Db> ExecutionContext<'_, D> {
    /// The store's own per-statement bind limit, if it reports one.
    #[must_use]
    pub fn max_bind_variables(&self) -> Option<usize> {
        match *self {
            Self::SelfManaged(db) => db.max_bind_variables(),
            Self::CallerSupplied(ref tx) => tx.max_bind_variables(),
        }
    }

    /// Execute one statement, wrapped in its own transaction when
    /// self-managed.
    ///
    /// When `expected_rows` is given, a statement reporting any other row
    /// count fails with [`InsertError::RowCountMismatch`] before it would be
    /// committed.
    pub(crate) async fn execute(
        &mut self,
        statement: &str,
        args: &[Value],
        expected_rows: Option<usize>,
        position: Position,
    ) -> Result<ExecOutcome, InsertError> {
        match *self {
            Self::SelfManaged(db) => {
                let mut tx = db.begin().await.map_err(|err| InsertError::Begin {
                    chunk: position.chunk,
                    inserted: position.inserted,
                    source: err.into(),
                })?;
                let outcome =
                    match execute_checked(&mut tx, statement, args, expected_rows, position).await {
                        Ok(outcome) => outcome,
                        Err(err) => {
                            rollback(tx, position.chunk).await;
                            return Err(err);
                        }
                    };
                tx.commit().await.map_err(|err| InsertError::Commit {
                    chunk: position.chunk,
                    inserted: position.inserted,
                    source: err.into(),
                })?;
                Ok(outcome)
            }
            Self::CallerSupplied(ref mut tx) => {
                execute_checked(&mut **tx, statement, args, expected_rows, position).await
            }
        }
    }
}

/// Execute and verify the reported row count.
async fn execute_checked<E: Executor>(
    executor: &mut E,
    statement: &str,
    args: &[Value],
    expected_rows: Option<usize>,
    position: Position,
) -> Result<ExecOutcome, InsertError> {
    let outcome = executor
        .execute(statement, args)
        .await
        .map_err(|err| InsertError::Exec {
            chunk: position.chunk,
            inserted: position.inserted,
            source: err.into(),
        })?;
    if let Some(expected) = expected_rows {
        if !usize::try_from(outcome.rows_affected).is_ok_and(|rows| rows == expected) {
            return Err(InsertError::RowCountMismatch {
                chunk: position.chunk,
                inserted: position.inserted,
                expected,
                actual: outcome.rows_affected,
            });
        }
    }
    Ok(outcome)
}

/// Best-effort rollback; the original failure is what gets reported.
async fn rollback<T: Tx>(tx: T, chunk: usize) {
    if let Err(err) = tx.rollback().await {
        tracing::warn!(chunk, "Failed to roll back chunk transaction: {err:?}");
    }
}
