use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use tokio::sync::Mutex;
use tracing::info;

/// Versioned key the state blob is stored under. Bump the suffix when
/// a blob from an older build should no longer be picked up.
const STATE_KEY: &str = "prop_tracker:v1";

/// Durable storage for the serialized application state. The container
/// is the only writer; implementations just move the blob.
#[async_trait]
pub trait StateStorage: Send + Sync {
    /// Read the stored blob, if any
    async fn load_blob(&self) -> Result<Option<String>>;

    /// Write the full blob, replacing any previous value
    async fn save_blob(&self, blob: &str) -> Result<()>;

    /// Remove the stored blob
    async fn clear(&self) -> Result<()>;
}

/// SQLite-backed store: one key/value row per versioned state key
pub struct SqliteStateStore {
    pool: Pool<Sqlite>,
}

impl SqliteStateStore {
    /// Open (creating if missing) the database and initialize the schema
    pub async fn new(database_url: &str) -> Result<Self> {
        // Create data directory if needed
        if let Some(path) = database_url.strip_prefix("sqlite:") {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .context("Failed to create database directory")?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid database URL")?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init_schema().await?;

        info!("State store initialized");
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS app_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create app_state table")?;

        Ok(())
    }
}

#[async_trait]
impl StateStorage for SqliteStateStore {
    async fn load_blob(&self) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM app_state WHERE key = ?")
                .bind(STATE_KEY)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to read stored state")?;

        Ok(row.map(|r| r.0))
    }

    async fn save_blob(&self, blob: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO app_state (key, value, updated_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(STATE_KEY)
        .bind(blob)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to persist state")?;

        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM app_state WHERE key = ?")
            .bind(STATE_KEY)
            .execute(&self.pool)
            .await
            .context("Failed to clear stored state")?;

        Ok(())
    }
}

/// In-memory store for tests and ephemeral runs
#[derive(Default)]
pub struct MemoryStateStore {
    blob: Mutex<Option<String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStorage for MemoryStateStore {
    async fn load_blob(&self) -> Result<Option<String>> {
        Ok(self.blob.lock().await.clone())
    }

    async fn save_blob(&self, blob: &str) -> Result<()> {
        *self.blob.lock().await = Some(blob.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.blob.lock().await = None;
        Ok(())
    }
}
