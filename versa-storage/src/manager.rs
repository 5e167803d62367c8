//! Storage manager for coordinating database operations

use crate::{repositories::PromptRepository, Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::{fs, path::Path, str::FromStr, sync::Arc, time::Duration};
use tracing::info;

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
    pub migrate_on_startup: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:./data/versa.db".to_string(),
            max_connections: Some(5),
            migrate_on_startup: true,
        }
    }
}

impl DatabaseConfig {
    /// Private in-memory database, mostly useful in tests
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: Some(1),
            migrate_on_startup: true,
        }
    }

    /// Configuration for a database file on disk
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        Self {
            url: format!("sqlite:{}", path.as_ref().display()),
            ..Self::default()
        }
    }

    pub fn is_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    /// Filesystem path behind a `sqlite:` URL, if any
    pub fn file_path(&self) -> Option<&Path> {
        if self.is_memory() {
            return None;
        }
        let without_scheme = self
            .url
            .strip_prefix("sqlite://")
            .or_else(|| self.url.strip_prefix("sqlite:"))
            .unwrap_or(&self.url);
        let path = without_scheme.split('?').next().unwrap_or(without_scheme);
        if path.is_empty() {
            None
        } else {
            Some(Path::new(path))
        }
    }
}

/// Main storage manager owning the pool and the prompt repository
pub struct StorageManager {
    pool: Pool<Sqlite>,
    prompts: Arc<PromptRepository>,
}

impl StorageManager {
    /// Create a new storage manager
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database: {}", config.url);

        if let Some(parent) = config.file_path().and_then(Path::parent) {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut connect_opts = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        // Every connection to ":memory:" is a separate database
        let pool_opts = if config.is_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            connect_opts = connect_opts.journal_mode(SqliteJournalMode::Wal);
            SqlitePoolOptions::new().max_connections(config.max_connections.unwrap_or(5))
        };

        let pool = pool_opts.connect_with(connect_opts).await?;

        info!("Database connection established");

        let storage = Self::from_pool(pool);
        if config.migrate_on_startup {
            storage.migrate().await?;
        }
        Ok(storage)
    }

    /// Wrap an existing pool without running migrations
    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        let prompts = Arc::new(PromptRepository::new(pool.clone()));
        Self { pool, prompts }
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Migration(e.to_string()))?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get prompt repository
    pub fn prompts(&self) -> Arc<PromptRepository> {
        self.prompts.clone()
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    /// Get database statistics
    pub async fn stats(&self) -> Result<DatabaseStats> {
        let total_versions = self.prompts.count().await?;
        let distinct_prompts = self.prompts.count_prompts().await?;
        let active_prompts = self.prompts.count_active().await?;
        let total_usage = self.prompts.total_usage().await?;

        Ok(DatabaseStats {
            total_versions,
            distinct_prompts,
            active_prompts,
            total_usage,
        })
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }
}

/// Database statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseStats {
    pub total_versions: i64,
    pub distinct_prompts: i64,
    pub active_prompts: i64,
    pub total_usage: i64,
}
