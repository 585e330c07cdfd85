//! Database related module.
//!
//! The batch engine never talks to sqlx directly. It consumes the [`Db`],
//! [`Tx`] and [`Executor`] capabilities defined here, which are implemented
//! for the sqlx `Any` pool by [`DatabaseConnection`] and
//! [`DatabaseTransaction`].
use async_trait::async_trait;
use sqlx::Transaction;
use std::str::FromStr;

use sqlx::any::{self, AnyPoolOptions, AnyQueryResult};
use sqlx::AnyPool;
use sqlx::ConnectOptions;
use tracing::instrument;

use crate::batch::ExecutionContext;

/// Render statements with their arguments inlined, for logging.
pub mod debug;
/// Database initialization.
pub mod init;
/// Dynamically typed bind values.
pub mod value;

pub use value::Value;

/// What the store reports after executing a single statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Number of rows written by the statement.
    pub rows_affected: u64,
    /// Generated identifier of the first row written by the statement.
    pub first_generated_id: i64,
}

#[async_trait]
/// Anything that can run a parameterized statement.
pub trait Executor: Send {
    /// Execute `statement` with `args` bound to its `?` placeholders in order.
    ///
    /// # Errors
    /// Errors if the store rejects the statement or does not report a
    /// generated identifier.
    async fn execute(&mut self, statement: &str, args: &[Value]) -> anyhow::Result<ExecOutcome>;

    /// Most bind variables the store accepts in one statement, if it has a
    /// known limit.
    fn max_bind_variables(&self) -> Option<usize> {
        None
    }
}

#[async_trait]
/// Generic transaction
pub trait Tx: Executor + Sized {
    /// Commit a transaction.
    async fn commit(self) -> anyhow::Result<()>;
    /// Rollback a transaction.
    async fn rollback(self) -> anyhow::Result<()>;
}

#[async_trait]
/// Generic Database
pub trait Db: Sync {
    /// Transaction handle handed out by [`Db::begin`].
    type Transaction: Tx;

    /// Begin a transaction.
    ///
    /// # Errors
    /// Errors if no connection can be acquired or the store refuses to start
    /// a transaction.
    async fn begin(&self) -> anyhow::Result<Self::Transaction>;

    /// Most bind variables the store accepts in one statement, if it has a
    /// known limit.
    fn max_bind_variables(&self) -> Option<usize> {
        None
    }
}

/// Type of database connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    /// Sqlite database.
    Sqlite,
    /// MySQL or MariaDB database.
    MySql,
}

impl DatabaseKind {
    /// Work out the database kind from a connection URL.
    ///
    /// # Errors
    /// Errors for schemes whose drivers cannot report generated ids, such as
    /// Postgres.
    pub fn from_url(url: &str) -> anyhow::Result<Self> {
        match url {
            url if url.starts_with("sqlite:") => Ok(Self::Sqlite),
            url if url.starts_with("mysql:") || url.starts_with("mariadb:") => Ok(Self::MySql),
            _ => anyhow::bail!("Unsupported database URL: {}", url),
        }
    }

    /// Bind variables a single statement may carry.
    ///
    /// `SQLite` defaults `SQLITE_MAX_VARIABLE_NUMBER` to 32,766; `MySQL`
    /// prepared statements take at most 65,535 placeholders.
    #[must_use]
    pub const fn max_bind_variables(self) -> usize {
        match self {
            Self::Sqlite => 32_766,
            Self::MySql => 65_535,
        }
    }

    /// Id of the first row written by a statement.
    ///
    /// `MySQL` reports the first id of a multi-row insert, `SQLite` the last.
    fn first_generated_id(self, result: &AnyQueryResult) -> anyhow::Result<i64> {
        let Some(last_insert_id) = result.last_insert_id() else {
            anyhow::bail!("{self:?} did not report a generated id for the statement");
        };
        match self {
            Self::MySql => Ok(last_insert_id),
            Self::Sqlite => {
                let Some(span) = result.rows_affected().checked_sub(1) else {
                    return Ok(last_insert_id);
                };
                last_insert_id
                    .checked_sub(i64::try_from(span)?)
                    .ok_or_else(|| anyhow::anyhow!("rowid {last_insert_id} is below the {span} rows before it"))
            }
        }
    }
}

/// Database connection.
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    /// Database connection pool.
    pub pool: AnyPool,
    /// Type of database connection.
    pub kind: DatabaseKind,
}

/// Database transaction.
pub struct DatabaseTransaction {
    /// Database transaction.
    pub tx: Transaction<'static, sqlx::Any>,
    /// Type of database the transaction runs against.
    pub kind: DatabaseKind,
}

impl DatabaseConnection {
    /// Connects to a database.
    ///
    /// # Errors
    /// Errors if the URL is unsupported or the connection to database fails.
    #[instrument(level = "trace", skip(db_url))]
    pub async fn connect(db_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let kind = DatabaseKind::from_url(db_url)?;
        any::install_default_drivers();
        let options = any::AnyConnectOptions::from_str(db_url)?.disable_statement_logging();
        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self { pool, kind })
    }

    /// Let the batch engine begin, commit and roll back one transaction per
    /// chunk on this connection.
    pub const fn context(&self) -> ExecutionContext<'_, Self> {
        ExecutionContext::SelfManaged(self)
    }
}

impl DatabaseTransaction {
    /// Run the batch engine inside this transaction. Committing or rolling
    /// back stays with the caller.
    pub fn context(&mut self) -> ExecutionContext<'_, DatabaseConnection> {
        ExecutionContext::CallerSupplied(self)
    }
}

#[async_trait]
impl Db for DatabaseConnection {
    type Transaction = DatabaseTransaction;

    #[instrument(level = "trace", skip(self))]
    async fn begin(&self) -> anyhow::Result<DatabaseTransaction> {
        let tx = self.pool.begin().await?;
        Ok(DatabaseTransaction {
            tx,
            kind: self.kind,
        })
    }

    fn max_bind_variables(&self) -> Option<usize> {
        Some(self.kind.max_bind_variables())
    }
}

#[async_trait]
impl Executor for DatabaseTransaction {
    #[instrument(level = "trace", skip_all, fields(binds = args.len()))]
    async fn execute(&mut self, statement: &str, args: &[Value]) -> anyhow::Result<ExecOutcome> {
        let query = args
            .iter()
            .fold(sqlx::query::<sqlx::Any>(statement), |query, arg| arg.bind(query));
        let result = query.execute(&mut *self.tx).await?;
        Ok(ExecOutcome {
            rows_affected: result.rows_affected(),
            first_generated_id: self.kind.first_generated_id(&result)?,
        })
    }

    fn max_bind_variables(&self) -> Option<usize> {
        Some(self.kind.max_bind_variables())
    }
}

#[async_trait]
impl Tx for DatabaseTransaction {
    /// Commit a transaction.
    async fn commit(self) -> anyhow::Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Rollback a transaction.
    async fn rollback(self) -> anyhow::Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
