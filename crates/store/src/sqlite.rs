//! SQLite-backed session store using sqlx.
//!
//! Schema: `session(key TEXT PRIMARY KEY, value TEXT NOT NULL, updated_at)`.
//! Two keys are used: `access_token` and `tenant`.

use async_trait::async_trait;
use axis_types::{AccessToken, TenantStore, TokenStore, traits::Result};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::str::FromStr;

const ACCESS_KEY: &str = "access_token";
const TENANT_KEY: &str = "tenant";

/// A persistent [`TokenStore`] and [`TenantStore`] backed by `SQLite`.
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    /// Connects to a `SQLite` database (e.g. `"sqlite:./session.db"` or `"sqlite::memory:"`).
    ///
    /// Creates the database file and schema if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns [`AxisError::Storage`](axis_types::AxisError::Storage) if the
    /// connection or table creation fails.
    pub async fn new(database_url: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // A single connection keeps `sqlite::memory:` databases coherent.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;
        Self::migrate(&pool).await?;
        tracing::debug!(url = database_url, "session store opened");
        Ok(Self { pool })
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS session (
                key         TEXT    PRIMARY KEY,
                value       TEXT    NOT NULL,
                updated_at  INTEGER NOT NULL DEFAULT (unixepoch())
            )",
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM session WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO session (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 updated_at = unixepoch()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM session WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TokenStore for SqliteSessionStore {
    async fn load(&self) -> Result<Option<AccessToken>> {
        Ok(self.get(ACCESS_KEY).await?.map(AccessToken::new))
    }

    async fn save(&self, token: &AccessToken) -> Result<()> {
        self.put(ACCESS_KEY, token.expose()).await
    }

    async fn clear(&self) -> Result<()> {
        self.delete(ACCESS_KEY).await
    }
}

#[async_trait]
impl TenantStore for SqliteSessionStore {
    async fn current(&self) -> Result<Option<String>> {
        self.get(TENANT_KEY).await
    }

    async fn set(&self, tenant: &str) -> Result<()> {
        self.put(TENANT_KEY, tenant).await
    }

    async fn clear(&self) -> Result<()> {
        self.delete(TENANT_KEY).await
    }
}
