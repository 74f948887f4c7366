//! Settings Storage Abstractions
//!
//! Provides a platform-agnostic trait for typed key-value settings storage.
//! Both user preferences and internal session state (such as OAuth
//! credentials) live here; the caller decides which keys belong to which
//! persistence class.

use async_trait::async_trait;

use crate::error::Result;

/// Key-value settings storage trait
///
/// Abstracts platform-specific preferences/settings storage:
/// - Desktop: SQLite database or config files
/// - iOS: UserDefaults
/// - Android: SharedPreferences / DataStore
///
/// Values written through this trait must survive process restarts.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn save_preference(store: &dyn SettingsStore) -> Result<()> {
///     store.set_string("server_host", "musicbrainz.org").await?;
///     store.set_i64("server_port", 443).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Store a boolean value
    async fn set_bool(&self, key: &str, value: bool) -> Result<()>;

    /// Retrieve a boolean value
    async fn get_bool(&self, key: &str) -> Result<Option<bool>>;

    /// Store an integer value
    async fn set_i64(&self, key: &str, value: i64) -> Result<()>;

    /// Retrieve an integer value
    async fn get_i64(&self, key: &str) -> Result<Option<i64>>;

    /// Delete a setting
    ///
    /// Deleting a key that does not exist is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool>;

    /// List all setting keys
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Clear all settings
    async fn clear_all(&self) -> Result<()>;

    /// Begin a transaction for atomic updates
    ///
    /// Changes become visible only when [`SettingsTransaction::commit`]
    /// succeeds. Dropping the transaction without committing discards them.
    async fn begin_transaction(&self) -> Result<Box<dyn SettingsTransaction + Send>>;
}

/// Transaction for atomic settings updates
#[async_trait]
pub trait SettingsTransaction: Send {
    /// Set a string value within the transaction
    async fn set_string(&mut self, key: &str, value: &str) -> Result<()>;

    /// Set an integer value within the transaction
    async fn set_i64(&mut self, key: &str, value: i64) -> Result<()>;

    /// Delete a key within the transaction
    async fn delete(&mut self, key: &str) -> Result<()>;

    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}
