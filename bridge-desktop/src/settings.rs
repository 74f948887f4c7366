//! Settings Storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{SettingsStore, SettingsTransaction},
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Executor, Row, Sqlite,
};
use std::path::PathBuf;
use tracing::{debug, error};

const CREATE_SETTINGS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        value_type TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    )
"#;

const UPSERT_SETTING: &str = r#"
    INSERT INTO settings (key, value, value_type, updated_at)
    VALUES (?, ?, ?, ?)
    ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        value_type = excluded.value_type,
        updated_at = excluded.updated_at
"#;

/// SQLite-backed settings store implementation
///
/// Provides persistent key-value storage using SQLite:
/// - Type-safe value storage
/// - Transactional updates
/// - Async operations
pub struct SqliteSettingsStore {
    pool: SqlitePool,
}

impl SqliteSettingsStore {
    /// Create a new settings store with the given database path
    ///
    /// The database file and its parent directory are created if missing.
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to connect to DB: {}", e)))?;

        Self::create_table(&pool).await?;

        debug!(path = ?db_path, "Initialized settings store");

        Ok(Self { pool })
    }

    /// Create an in-memory settings store (for testing)
    ///
    /// Every pooled connection to `sqlite::memory:` opens a separate database,
    /// so the pool is pinned to one connection that is never recycled.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to connect to DB: {}", e)))?;

        Self::create_table(&pool).await?;

        Ok(Self { pool })
    }

    async fn create_table(pool: &SqlitePool) -> Result<()> {
        sqlx::query(CREATE_SETTINGS_TABLE)
            .execute(pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to create table: {}", e)))?;
        Ok(())
    }

    /// Get the current Unix timestamp
    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default()
    }

    /// Upsert a value with type information on any executor (pool or transaction)
    async fn upsert<'e, E>(executor: E, key: &str, value: &str, value_type: &str) -> Result<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(UPSERT_SETTING)
            .bind(key)
            .bind(value)
            .bind(value_type)
            .bind(Self::now())
            .execute(executor)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to set setting: {}", e)))?;

        debug!(key = key, value_type = value_type, "Stored setting");
        Ok(())
    }

    /// Get a value and verify its type
    async fn get_value(&self, key: &str, expected_type: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value, value_type FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to get setting: {}", e)))?;

        match row {
            Some(row) => {
                let value: String = row.get(0);
                let value_type: String = row.get(1);

                if value_type != expected_type {
                    error!(
                        key = key,
                        expected = expected_type,
                        actual = value_type,
                        "Type mismatch"
                    );
                    return Err(BridgeError::OperationFailed(format!(
                        "Type mismatch: expected {}, got {}",
                        expected_type, value_type
                    )));
                }

                debug!(key = key, value_type = value_type, "Retrieved setting");
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        Self::upsert(&self.pool, key, value, "string").await
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.get_value(key, "string").await
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        Self::upsert(&self.pool, key, &value.to_string(), "bool").await
    }

    async fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get_value(key, "bool").await? {
            Some(s) => Ok(Some(s.parse().map_err(|e| {
                BridgeError::OperationFailed(format!("Parse error: {}", e))
            })?)),
            None => Ok(None),
        }
    }

    async fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        Self::upsert(&self.pool, key, &value.to_string(), "i64").await
    }

    async fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        match self.get_value(key, "i64").await? {
            Some(s) => Ok(Some(s.parse().map_err(|e| {
                BridgeError::OperationFailed(format!("Parse error: {}", e))
            })?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to delete setting: {}", e)))?;

        debug!(key = key, "Deleted setting");
        Ok(())
    }

    async fn has_key(&self, key: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to check key: {}", e)))?;

        Ok(row.is_some())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to list keys: {}", e)))?;

        let keys = rows.into_iter().map(|row| row.get(0)).collect();
        Ok(keys)
    }

    async fn clear_all(&self) -> Result<()> {
        sqlx::query("DELETE FROM settings")
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to clear settings: {}", e)))?;

        debug!("Cleared all settings");
        Ok(())
    }

    async fn begin_transaction(&self) -> Result<Box<dyn SettingsTransaction + Send>> {
        let tx = self.pool.begin().await.map_err(|e| {
            BridgeError::DatabaseError(format!("Failed to begin transaction: {}", e))
        })?;

        Ok(Box::new(SqliteSettingsTransaction { tx: Some(tx) }))
    }
}

/// SQLite settings transaction
struct SqliteSettingsTransaction {
    tx: Option<sqlx::Transaction<'static, Sqlite>>,
}

impl SqliteSettingsTransaction {
    fn active(&mut self) -> Result<&mut sqlx::Transaction<'static, Sqlite>> {
        self.tx.as_mut().ok_or_else(|| {
            BridgeError::OperationFailed("Transaction already committed".to_string())
        })
    }
}

#[async_trait]
impl SettingsTransaction for SqliteSettingsTransaction {
    async fn set_string(&mut self, key: &str, value: &str) -> Result<()> {
        let tx = self.active()?;
        SqliteSettingsStore::upsert(&mut **tx, key, value, "string").await
    }

    async fn set_i64(&mut self, key: &str, value: i64) -> Result<()> {
        let tx = self.active()?;
        SqliteSettingsStore::upsert(&mut **tx, key, &value.to_string(), "i64").await
    }

    async fn delete(&mut self, key: &str) -> Result<()> {
        let tx = self.active()?;
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&mut **tx)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to delete setting: {}", e)))?;
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        let tx = self.tx.take().ok_or_else(|| {
            BridgeError::OperationFailed("Transaction already committed".to_string())
        })?;

        tx.commit()
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to commit: {}", e)))?;

        debug!("Committed transaction");
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        let tx = self.tx.take().ok_or_else(|| {
            BridgeError::OperationFailed("Transaction already committed".to_string())
        })?;

        tx.rollback()
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to rollback: {}", e)))?;

        debug!("Rolled back transaction");
        Ok(())
    }
}
