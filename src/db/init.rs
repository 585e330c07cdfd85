use crate::db::DatabaseConnection;
use crate::utils::config::DatabaseConfig;

/// Connects to the configured database.
/// The URL comes from the `DATABASE_URL` environment variable when set, otherwise from the
/// `[database]` table of the config file (see [`crate::utils::config::Config::load`]).
///
/// # Errors
/// Errors if no URL is configured or the connection to database fails.
/// Connections can fail if the database is not running, or if the database URL is invalid.
pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let Some(db_url) = config.url.as_deref() else {
        anyhow::bail!("No database configured. Set the DATABASE_URL env var or `url` under [database] in the config file.");
    };
    let connection = DatabaseConnection::connect(db_url, config.max_connections).await?;
    tracing::info!(kind = ?connection.kind, "Connected to database");
    Ok(connection)
}
