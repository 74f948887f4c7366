//! # Core Configuration Module
//!
//! Provides configuration management for the MusicBrainz account core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the bridges and identity-service settings the account
//! core needs. It enforces fail-fast validation so a misconfigured host finds
//! out at startup rather than halfway through a login.
//!
//! ## Required Dependencies
//!
//! - `SettingsStore` - Where the credential is persisted
//! - `HttpClient` - Talks to the identity service
//!
//! Both have desktop defaults when the `desktop-shims` feature is enabled: a
//! SQLite store at `settings_path` and a reqwest client using the configured
//! `User-Agent`.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, IdentityServiceConfig};
//!
//! let config = CoreConfig::builder()
//!     .settings_path("/home/alice/.config/mbaccount/settings.db")
//!     .identity(IdentityServiceConfig::default().with_host("test.musicbrainz.org"))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::{CoreConfig, IdentityServiceConfig};
//!
//! // An empty host is rejected before any bridge is created
//! let config = CoreConfig::builder()
//!     .identity(IdentityServiceConfig::default().with_host(""))
//!     .build()
//!     .expect("Should fail - empty identity host");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{Clock, HttpClient, SettingsStore, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable holding the OAuth client id
pub const CLIENT_ID_ENV: &str = "MUSICBRAINZ_OAUTH_CLIENT_ID";

/// Environment variable holding the OAuth client secret
pub const CLIENT_SECRET_ENV: &str = "MUSICBRAINZ_OAUTH_CLIENT_SECRET";

/// Redirect URI for installed applications that display the code to the user
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Core configuration for the account core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Path of the settings database (empty when a store was injected)
    pub settings_path: PathBuf,

    /// Credential and preferences storage
    pub settings_store: Arc<dyn SettingsStore>,

    /// HTTP client used for identity-service requests
    pub http_client: Arc<dyn HttpClient>,

    /// Time source for token expiry
    pub clock: Arc<dyn Clock>,

    /// Identity service endpoint and client registration
    pub identity: IdentityServiceConfig,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("settings_path", &self.settings_path)
            .field("settings_store", &"SettingsStore { ... }")
            .field("http_client", &"HttpClient { ... }")
            .field("clock", &"Clock { ... }")
            .field("identity", &self.identity)
            .finish()
    }
}

/// Identity service (MusicBrainz server) settings.
///
/// The client id and secret identify this application to the server. They
/// should never be hardcoded; [`Default`] reads them from
/// `MUSICBRAINZ_OAUTH_CLIENT_ID` / `MUSICBRAINZ_OAUTH_CLIENT_SECRET`.
///
/// # Example
///
/// ```no_run
/// use core_runtime::config::IdentityServiceConfig;
///
/// let config = IdentityServiceConfig::default()
///     .with_host("beta.musicbrainz.org")
///     .with_client_credentials("my-client-id", "my-client-secret");
/// assert_eq!(config.base_url(), "https://beta.musicbrainz.org");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityServiceConfig {
    /// Server host name
    pub host: String,

    /// Server port; 443 selects HTTPS, anything else plain HTTP
    pub port: u16,

    /// OAuth client id
    pub client_id: String,

    /// OAuth client secret
    pub client_secret: String,

    /// Redirect URI registered for the client
    pub redirect_uri: String,

    /// `User-Agent` sent with every request
    pub user_agent: String,
}

impl Default for IdentityServiceConfig {
    fn default() -> Self {
        Self {
            host: "musicbrainz.org".to_string(),
            port: 443,
            client_id: std::env::var(CLIENT_ID_ENV)
                .unwrap_or_else(|_| "placeholder_client_id".to_string()),
            client_secret: std::env::var(CLIENT_SECRET_ENV).unwrap_or_default(),
            redirect_uri: OOB_REDIRECT_URI.to_string(),
            user_agent: concat!("mbaccount/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl std::fmt::Debug for IdentityServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityServiceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl IdentityServiceConfig {
    /// Sets the server host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the server port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the OAuth client id and secret
    pub fn with_client_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_id = client_id.into();
        self.client_secret = client_secret.into();
        self
    }

    /// Sets the redirect URI
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }

    /// Sets the `User-Agent`
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Root URL of the server, without a trailing slash
    pub fn base_url(&self) -> String {
        if self.port == 443 {
            format!("https://{}", self.host)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config(
                "Identity service host cannot be empty. Use .with_host() to set it.".to_string(),
            ));
        }

        if self.host.contains("://") || self.host.contains('/') {
            return Err(Error::Config(format!(
                "Identity service host must be a bare host name, got '{}'",
                self.host
            )));
        }

        if self.port == 0 {
            return Err(Error::Config(
                "Identity service port must be greater than 0".to_string(),
            ));
        }

        if self.client_id.trim().is_empty() {
            return Err(Error::Config(format!(
                "OAuth client id cannot be empty. Set {} or use .with_client_credentials().",
                CLIENT_ID_ENV
            )));
        }

        if self.redirect_uri.trim().is_empty() {
            return Err(Error::Config("Redirect URI cannot be empty".to_string()));
        }

        if self.user_agent.trim().is_empty() {
            return Err(Error::Config("User agent cannot be empty".to_string()));
        }

        Ok(())
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        self.identity.validate()
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required for credential persistence. \
                 Desktop: enable the 'desktop-shims' feature and set .settings_path() to use the default SqliteSettingsStore. \
                 Other hosts: inject platform-native settings with .settings_store()."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required to reach the identity service. \
                 Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
                 Other hosts: inject one with .http_client()."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(settings_path: &std::path::Path) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;
    use std::thread;
    use tokio::runtime::{Handle, Runtime};

    if settings_path.as_os_str().is_empty() {
        return Err(Error::Config(
            "Settings path is required when no SettingsStore is injected. Use .settings_path() to set it."
                .to_string(),
        ));
    }

    let init_store = |path: PathBuf| -> Result<SqliteSettingsStore> {
        let runtime = Runtime::new().map_err(|e| {
            Error::Internal(format!(
                "Failed to create Tokio runtime for default settings store: {}",
                e
            ))
        })?;

        runtime
            .block_on(SqliteSettingsStore::new(path))
            .map_err(|e| {
                Error::Internal(format!("Failed to initialize default SettingsStore: {}", e))
            })
    };

    let path = settings_path.to_path_buf();
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(move || init_store(path))
            .join()
            .map_err(|_| {
                Error::Internal(
                    "Worker thread panicked while creating default SettingsStore".to_string(),
                )
            })??,
        Err(_) => init_store(path)?,
    };

    tracing::debug!(
        file = %crate::logging::strip_path(&settings_path.to_string_lossy()),
        "Using default SQLite settings store"
    );

    let store: Arc<dyn SettingsStore> = Arc::new(store);
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store(_settings_path: &std::path::Path) -> Result<Arc<dyn SettingsStore>> {
    Err(settings_store_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(user_agent: &str) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::with_options(
        std::time::Duration::from_secs(30),
        user_agent,
    ));
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_user_agent: &str) -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Call [`build()`](CoreConfigBuilder::build) once every option is set. The
/// identity settings are validated before any default bridge is created.
#[derive(Default)]
pub struct CoreConfigBuilder {
    settings_path: Option<PathBuf>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    http_client: Option<Arc<dyn HttpClient>>,
    clock: Option<Arc<dyn Clock>>,
    identity: Option<IdentityServiceConfig>,
}

impl CoreConfigBuilder {
    /// Sets the path of the settings database.
    ///
    /// Only used to create the desktop default store; ignored when a store is
    /// injected with [`settings_store`](Self::settings_store).
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .settings_path("/path/to/settings.db");
    /// ```
    pub fn settings_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    /// Sets the settings store implementation.
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the time source. Default: [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the identity service configuration.
    ///
    /// Default: [`IdentityServiceConfig::default()`].
    pub fn identity(mut self, identity: IdentityServiceConfig) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The identity configuration is invalid
    /// - A required bridge is missing and has no default
    /// - The default settings store cannot be opened
    pub fn build(self) -> Result<CoreConfig> {
        let identity = self.identity.unwrap_or_default();
        identity.validate()?;

        let settings_path = self.settings_path.unwrap_or_default();

        let settings_store = match self.settings_store {
            Some(store) => store,
            None => provide_default_settings_store(&settings_path)?,
        };

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(&identity.user_agent)?,
        };

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);

        let config = CoreConfig {
            settings_path,
            settings_store,
            http_client,
            clock,
            identity,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::storage::SettingsTransaction;
    use bridge_traits::{BridgeError, FixedClock, HttpRequest, HttpResponse};

    type BridgeResult<T> = std::result::Result<T, BridgeError>;

    struct MockSettingsStore;

    #[async_trait]
    impl SettingsStore for MockSettingsStore {
        async fn set_string(&self, _key: &str, _value: &str) -> BridgeResult<()> {
            Ok(())
        }

        async fn get_string(&self, _key: &str) -> BridgeResult<Option<String>> {
            Ok(None)
        }

        async fn set_bool(&self, _key: &str, _value: bool) -> BridgeResult<()> {
            Ok(())
        }

        async fn get_bool(&self, _key: &str) -> BridgeResult<Option<bool>> {
            Ok(None)
        }

        async fn set_i64(&self, _key: &str, _value: i64) -> BridgeResult<()> {
            Ok(())
        }

        async fn get_i64(&self, _key: &str) -> BridgeResult<Option<i64>> {
            Ok(None)
        }

        async fn delete(&self, _key: &str) -> BridgeResult<()> {
            Ok(())
        }

        async fn has_key(&self, _key: &str) -> BridgeResult<bool> {
            Ok(false)
        }

        async fn list_keys(&self) -> BridgeResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn clear_all(&self) -> BridgeResult<()> {
            Ok(())
        }

        async fn begin_transaction(&self) -> BridgeResult<Box<dyn SettingsTransaction + Send>> {
            Ok(Box::new(MockTransaction))
        }
    }

    struct MockTransaction;

    #[async_trait]
    impl SettingsTransaction for MockTransaction {
        async fn set_string(&mut self, _key: &str, _value: &str) -> BridgeResult<()> {
            Ok(())
        }

        async fn set_i64(&mut self, _key: &str, _value: i64) -> BridgeResult<()> {
            Ok(())
        }

        async fn delete(&mut self, _key: &str) -> BridgeResult<()> {
            Ok(())
        }

        async fn commit(self: Box<Self>) -> BridgeResult<()> {
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> BridgeResult<()> {
            Ok(())
        }
    }

    struct MockHttpClient;

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Err(BridgeError::OperationFailed("offline".to_string()))
        }
    }

    fn identity() -> IdentityServiceConfig {
        IdentityServiceConfig::default().with_client_credentials("client", "secret")
    }

    fn injected_builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .settings_store(Arc::new(MockSettingsStore))
            .http_client(Arc::new(MockHttpClient))
            .identity(identity())
    }

    #[test]
    fn test_builder_with_injected_bridges() {
        let config = injected_builder().build().unwrap();

        assert!(config.settings_path.as_os_str().is_empty());
        assert_eq!(config.identity.host, "musicbrainz.org");
        assert_eq!(config.identity.port, 443);
        assert_eq!(config.identity.redirect_uri, OOB_REDIRECT_URI);
    }

    #[test]
    fn test_builder_uses_injected_clock() {
        let config = injected_builder()
            .clock(Arc::new(FixedClock::at_unix(83)))
            .build()
            .unwrap();

        assert_eq!(config.clock.unix_timestamp(), 83);
    }

    #[test]
    fn test_base_url_uses_https_on_443() {
        let config = identity();
        assert_eq!(config.base_url(), "https://musicbrainz.org");
    }

    #[test]
    fn test_base_url_uses_http_on_other_ports() {
        let config = identity().with_host("localhost").with_port(5000);
        assert_eq!(config.base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_validate_rejects_empty_host() {
        let result = injected_builder()
            .identity(identity().with_host(""))
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_host_with_scheme() {
        let result = identity().with_host("https://musicbrainz.org").validate();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let result = identity().with_port(0).validate();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_client_id() {
        let result = identity().with_client_credentials("", "secret").validate();
        match result {
            Err(Error::Config(message)) => assert!(message.contains(CLIENT_ID_ENV)),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_identity_debug_redacts_secret() {
        let rendered = format!("{:?}", identity().with_client_credentials("id", "hunter2"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_config_is_cloneable() {
        let config = injected_builder().build().unwrap();
        let cloned = config.clone();
        assert_eq!(config.identity, cloned.identity);
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_settings_store() {
        let result = CoreConfig::builder()
            .http_client(Arc::new(MockHttpClient))
            .identity(identity())
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "SettingsStore")
            }
            other => panic!("expected missing capability, got {:?}", other.map(|_| ())),
        }
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_default_requires_settings_path() {
        let result = CoreConfig::builder()
            .http_client(Arc::new(MockHttpClient))
            .identity(identity())
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings_path = dir.path().join("settings.db");

        let config = CoreConfig::builder()
            .settings_path(&settings_path)
            .identity(identity())
            .build()
            .expect("desktop defaults should succeed");

        let settings = config.settings_store.clone();
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            settings.set_string("oauth_username", "alice").await.unwrap();
            let value = settings.get_string("oauth_username").await.unwrap();
            assert_eq!(value.as_deref(), Some("alice"));
        });

        assert!(settings_path.exists());
    }
}
