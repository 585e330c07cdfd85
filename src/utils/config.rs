//! The `sqlbatch.toml` configuration file.
use crate::batch::BatchConfig;
use serde_derive::{Deserialize, Serialize};
use std::env;
use std::fs::read_to_string;
use std::path::Path;

/// Default number of pooled connections.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Top level config object.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Chunking settings.
    #[serde(default)]
    pub batch: BatchConfig,
}

/// The `[database]` table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Connection URL, e.g. `sqlite:///srv/app.sqlite3?mode=rwc` or `mysql://user@host/db`.
    pub url: Option<String>,
    /// Upper bound on pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

/// Serde default for [`DatabaseConfig::max_connections`].
const fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

impl Config {
    /// Parse a config from TOML text.
    ///
    /// # Errors
    /// Errors if the text is not valid TOML or has fields of the wrong type.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let conf: Self = toml::from_str(text)?;
        Ok(conf)
    }

    /// Load the config file at `path`, falling back to defaults when the file does not exist.
    /// A `DATABASE_URL` env var takes precedence over `[database] url`.
    ///
    /// # Errors
    /// Will error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut conf = if path.exists() {
            Self::parse(&read_to_string(path)?)?
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        if let Ok(url) = env::var("DATABASE_URL") {
            conf.database.url = Some(url);
        }
        Ok(conf)
    }
}
