//! Batch insert engine.
//!
//! Splits a list of items into chunks that stay under a bind-variable
//! ceiling, inserts each chunk with one multi-row statement and pairs every
//! item with the identifier the store generated for it.
//!
//! # Precondition
//!
//! Ids are reconstructed as `first_generated_id + offset`, which is only
//! correct when the store assigns generated identifiers **contiguously and in
//! row order within a single statement**. That holds for single-column
//! auto-increment keys (`SQLite` rowids, `MySQL` `AUTO_INCREMENT` with
//! `innodb_autoinc_lock_mode` 0 or 1). It does not hold for UUIDs, composite
//! keys, sequences with a cache or `INSERT IGNORE`-style statements that skip
//! rows. The engine cannot check this and relies on it.
use serde_derive::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::{Db, Value};
use context::Position;

pub mod chunk;
pub mod context;
pub mod error;
pub mod id;
#[cfg(test)]
mod mock;
pub mod template;

pub use context::ExecutionContext;
pub use error::InsertError;
pub use id::GeneratedId;
use template::Template;

/// Default upper bound on bind variables in a single statement. Stores cap
/// this at 65,536; staying well below keeps statements a manageable size.
pub const BIND_VARIABLE_CEILING: usize = 40_000;

/// Tunables for chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Upper bound on `rows × placeholders per row` in one statement.
    pub bind_variable_ceiling: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            bind_variable_ceiling: BIND_VARIABLE_CEILING,
        }
    }
}

/// What to insert and how.
pub struct InsertSpec<T, F> {
    /// Statement with exactly one `VALUES` marker followed by one row
    /// pattern, e.g. `INSERT INTO person (name, age) VALUES (?, ?)`.
    pub template: String,
    /// Items to insert, in order.
    pub items: Vec<T>,
    /// Bind values for one item, one per placeholder in the row pattern.
    pub extract: F,
}

impl<T, F> InsertSpec<T, F>
where
    F: Fn(&T) -> Vec<Value>,
{
    /// Create a new insert spec.
    pub fn new(template: impl Into<String>, items: Vec<T>, extract: F) -> Self {
        Self {
            template: template.into(),
            items,
            extract,
        }
    }
}

/// An inserted item and the id the store generated for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertResult<T, I = u64> {
    /// Generated identifier.
    pub id: I,
    /// The item as it was passed in.
    pub item: T,
}

/// Insert every item of `spec` and return `(id, item)` pairs in input order.
///
/// Items are inserted in chunks of at most `ceiling / placeholders` rows, one
/// statement per chunk, strictly one after another. The ceiling is the
/// configured one, lowered to the store's own limit when it reports a smaller
/// one. How chunks are committed
/// depends on `ctx`, see [`ExecutionContext`]. Read the
/// [module-level precondition](self#precondition) before using this on a
/// table.
///
/// An empty item list returns an empty result without touching the store.
///
/// # Errors
/// - [`InsertError::MalformedTemplate`] and
///   [`InsertError::InvalidPlaceholderCount`] before anything is executed.
/// - [`InsertError::ValueCountMismatch`] when the extractor disagrees with
///   the row pattern; detected before the offending chunk is executed.
/// - store failures for the chunk being inserted. Chunks committed before it
///   are not undone.
#[instrument(level = "debug", skip_all, fields(items = spec.items.len()))]
pub async fn insert<D, T, F, I>(
    spec: InsertSpec<T, F>,
    ctx: &mut ExecutionContext<'_, D>,
    config: &BatchConfig,
) -> Result<Vec<InsertResult<T, I>>, InsertError>
where
    D: Db,
    F: Fn(&T) -> Vec<Value>,
    I: GeneratedId,
{
    let InsertSpec {
        template,
        items,
        extract,
    } = spec;
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let template = Template::parse(&template)?;
    let placeholders = template.placeholders();
    let ceiling = ctx
        .max_bind_variables()
        .map_or(config.bind_variable_ceiling, |limit| {
            limit.min(config.bind_variable_ceiling)
        });
    if ceiling < config.bind_variable_ceiling {
        tracing::debug!(ceiling, "Store caps bind variables below the configured ceiling");
    }
    let size = chunk::chunk_size(placeholders, ceiling)?;

    let mut ids: Vec<I> = Vec::with_capacity(items.len());
    for (index, rows) in chunk::sub_slice(&items, size).into_iter().enumerate() {
        let position = Position {
            chunk: index,
            inserted: ids.len(),
        };
        let args = collect_args(rows, &extract, placeholders, position.inserted)?;
        let statement = template.statement(rows.len());
        tracing::debug!(chunk = index, rows = rows.len(), binds = args.len(), "Inserting chunk");
        let outcome = ctx
            .execute(&statement, &args, Some(rows.len()), position)
            .await?;
        // The chunk is written by now, so an id error counts its rows.
        let written = Position {
            chunk: index,
            inserted: position.inserted + rows.len(),
        };
        ids.extend(generated_ids::<I>(
            outcome.first_generated_id,
            rows.len(),
            written,
        )?);
    }
    tracing::info!(rows = ids.len(), "Batch insert complete");

    Ok(ids
        .into_iter()
        .zip(items)
        .map(|(id, item)| InsertResult { id, item })
        .collect())
}

/// Execute one multi-row insert and return the ids of the rows it wrote, in
/// order: `first_generated_id ..= first_generated_id + rows_affected - 1`.
///
/// For statements already known to fit under the bind-variable ceiling. The
/// same contiguity [precondition](self#precondition) as [`insert`] applies.
///
/// # Errors
/// Store failures, and [`InsertError::IdOutOfRange`] when an id does not fit
/// `I`. All are reported as chunk 0.
#[instrument(level = "debug", skip_all, fields(binds = args.len()))]
pub async fn insert_ids<D, I>(
    ctx: &mut ExecutionContext<'_, D>,
    statement: &str,
    args: &[Value],
) -> Result<Vec<I>, InsertError>
where
    D: Db,
    I: GeneratedId,
{
    let outcome = ctx
        .execute(statement, args, None, Position::default())
        .await?;
    let Ok(rows) = usize::try_from(outcome.rows_affected) else {
        return Err(InsertError::IdOutOfRange {
            chunk: 0,
            inserted: usize::MAX,
            first: outcome.first_generated_id,
            offset: outcome.rows_affected,
        });
    };
    let written = Position {
        chunk: 0,
        inserted: rows,
    };
    let ids = generated_ids(outcome.first_generated_id, rows, written)?;
    tracing::debug!(rows, "Inserted rows");
    Ok(ids)
}

/// Flatten the bind values of a chunk, checking each item against the row
/// pattern. `first_item` is the input position of the chunk's first item.
fn collect_args<T, F>(
    rows: &[T],
    extract: &F,
    placeholders: usize,
    first_item: usize,
) -> Result<Vec<Value>, InsertError>
where
    F: Fn(&T) -> Vec<Value>,
{
    let mut args = Vec::with_capacity(rows.len() * placeholders);
    for (offset, row) in rows.iter().enumerate() {
        let values = extract(row);
        if values.len() != placeholders {
            return Err(InsertError::ValueCountMismatch {
                item: first_item + offset,
                values: values.len(),
                placeholders,
            });
        }
        args.extend(values);
    }
    Ok(args)
}

/// `first, first + 1, ..` for `rows` rows. `position.inserted` already
/// includes these rows.
fn generated_ids<I: GeneratedId>(
    first: i64,
    rows: usize,
    position: Position,
) -> Result<Vec<I>, InsertError> {
    (0_u64..)
        .take(rows)
        .map(|offset| {
            I::from_generated(first, offset).ok_or(InsertError::IdOutOfRange {
                chunk: position.chunk,
                inserted: position.inserted,
                first,
                offset,
            })
        })
        .collect()
}
