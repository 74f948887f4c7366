//! Credential Storage
//!
//! Persists the five OAuth credential fields in the host `SettingsStore`.
//!
//! ## Consistency
//!
//! - Every write goes through one `SettingsTransaction`, so a multi-field
//!   update lands completely or not at all
//! - Reads are served from an in-memory snapshot that is swapped only after a
//!   successful commit, so readers never observe a partial write
//! - Writers are serialized; a token refresh cannot interleave with a logout
//! - Every `clear_all` starts a new epoch. A request that began before the
//!   clear can use [`TokenStore::update_in_epoch`] so its late result is
//!   rejected instead of landing in the next login's credential
//! - Token values are never logged
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::{CredentialField, TokenStore};
//! use std::sync::Arc;
//! # use bridge_traits::storage::SettingsStore;
//! # async fn example(settings: Arc<dyn SettingsStore>) -> core_auth::Result<()> {
//! let store = TokenStore::load(settings).await?;
//!
//! store.set(CredentialField::Username, "alice").await?;
//! assert!(!store.is_logged_in());
//!
//! store.clear_all().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::{Credential, CredentialField, CredentialValue};
use bridge_traits::storage::{SettingsStore, SettingsTransaction};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Durable storage for the account credential.
///
/// Cloning is cheap; clones share the snapshot and the underlying store.
#[derive(Clone)]
pub struct TokenStore {
    settings: Arc<dyn SettingsStore>,
    snapshot: Arc<RwLock<Credential>>,
    write_lock: Arc<Mutex<()>>,
    epoch: Arc<AtomicU64>,
}

fn storage_error(context: &str, error: impl std::fmt::Display) -> AuthError {
    AuthError::SettingsStorageFailed(format!("{}: {}", context, error))
}

impl TokenStore {
    /// Read the persisted credential from `settings`.
    ///
    /// Missing keys load as empty values.
    pub async fn load(settings: Arc<dyn SettingsStore>) -> Result<Self> {
        let mut credential = Credential::default();

        for field in CredentialField::ALL {
            let value = if field.is_integer() {
                settings
                    .get_i64(field.key())
                    .await
                    .map_err(|e| storage_error("Failed to read credential", e))?
                    .map(CredentialValue::Integer)
            } else {
                settings
                    .get_string(field.key())
                    .await
                    .map_err(|e| storage_error("Failed to read credential", e))?
                    .map(CredentialValue::Text)
            };

            if let Some(value) = value {
                credential.set(field, value);
            }
        }

        info!(
            has_refresh_token = credential.is_logged_in(),
            has_username = !credential.username.is_empty(),
            "Loaded stored credential"
        );

        Ok(Self {
            settings,
            snapshot: Arc::new(RwLock::new(credential)),
            write_lock: Arc::new(Mutex::new(())),
            epoch: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Copy of the current credential
    pub fn credential(&self) -> Credential {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Current value of a single field
    pub fn get(&self, field: CredentialField) -> CredentialValue {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(field)
    }

    /// `true` iff a refresh token is stored
    pub fn is_logged_in(&self) -> bool {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_logged_in()
    }

    /// Number of times the credential has been cleared
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Persist a single field.
    ///
    /// # Errors
    ///
    /// `SettingsStorageFailed` if the value has the wrong kind for the field
    /// (text for the expiry, an integer for anything else) or the store fails.
    pub async fn set(&self, field: CredentialField, value: impl Into<CredentialValue>) -> Result<()> {
        let value = value.into();
        if field.is_secret() {
            debug!(field = %field, "Setting credential field");
        } else if let Some(number) = value.as_integer() {
            debug!(field = %field, value = number, "Setting credential field");
        } else {
            debug!(
                field = %field,
                value = value.as_text().unwrap_or_default(),
                "Setting credential field"
            );
        }

        self.update(move |credential| {
            if credential.set(field, value) {
                Ok(())
            } else {
                Err(AuthError::SettingsStorageFailed(format!(
                    "Wrong value type for {}",
                    field
                )))
            }
        })
        .await
        .map(|_| ())
    }

    /// Replace the whole credential in one transaction
    pub async fn apply(&self, credential: Credential) -> Result<()> {
        self.update(move |current| {
            *current = credential;
            Ok(())
        })
        .await
        .map(|_| ())
    }

    /// Edit the credential and persist the result atomically.
    ///
    /// `edit` runs on a copy; the snapshot changes only if both `edit` and
    /// the commit succeed. Returns the committed credential.
    pub async fn update<F>(&self, edit: F) -> Result<Credential>
    where
        F: FnOnce(&mut Credential) -> Result<()> + Send,
    {
        self.write(None, edit).await
    }

    /// Like [`update`](Self::update), but only while no `clear_all` has run
    /// since `epoch` was read.
    ///
    /// # Errors
    ///
    /// `CredentialReset` if the credential was cleared in the meantime;
    /// nothing is written.
    pub async fn update_in_epoch<F>(&self, epoch: u64, edit: F) -> Result<Credential>
    where
        F: FnOnce(&mut Credential) -> Result<()> + Send,
    {
        self.write(Some(epoch), edit).await
    }

    async fn write<F>(&self, expected_epoch: Option<u64>, edit: F) -> Result<Credential>
    where
        F: FnOnce(&mut Credential) -> Result<()> + Send,
    {
        let _guard = self.write_lock.lock().await;

        if let Some(expected) = expected_epoch {
            let current = self.epoch();
            if current != expected {
                debug!(expected = expected, current = current, "Discarding stale credential write");
                return Err(AuthError::CredentialReset);
            }
        }

        let mut next = self.credential();
        edit(&mut next)?;

        let mut tx = self
            .settings
            .begin_transaction()
            .await
            .map_err(|e| storage_error("Failed to begin transaction", e))?;

        if let Err(e) = write_credential(tx.as_mut(), &next).await {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Failed to roll back credential write");
            }
            return Err(e);
        }

        tx.commit()
            .await
            .map_err(|e| storage_error("Failed to commit credential", e))?;

        *self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = next.clone();

        debug!(
            has_refresh_token = next.is_logged_in(),
            expires_at = next.access_token_expires_at,
            "Stored credential"
        );

        Ok(next)
    }

    /// Reset every credential field to absent.
    ///
    /// The in-memory credential is cleared even when deleting from the store
    /// fails; the failure is still reported. Unrelated settings are kept.
    pub async fn clear_all(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        self.epoch.fetch_add(1, Ordering::SeqCst);
        *self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Credential::default();

        let mut tx = self
            .settings
            .begin_transaction()
            .await
            .map_err(|e| storage_error("Failed to begin transaction", e))?;

        for field in CredentialField::ALL {
            if let Err(e) = tx.delete(field.key()).await {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Failed to roll back credential clear");
                }
                return Err(storage_error("Failed to clear credential", e));
            }
        }

        tx.commit()
            .await
            .map_err(|e| storage_error("Failed to commit credential clear", e))?;

        info!("Cleared stored credential");
        Ok(())
    }
}

async fn write_credential(
    tx: &mut (dyn SettingsTransaction + Send),
    credential: &Credential,
) -> Result<()> {
    for field in CredentialField::ALL {
        let result = match credential.get(field) {
            CredentialValue::Text(value) => tx.set_string(field.key(), &value).await,
            CredentialValue::Integer(value) => tx.set_i64(field.key(), value).await,
        };
        result.map_err(|e| storage_error("Failed to write credential", e))?;
    }
    Ok(())
}
