//! # Identity Service Client
//!
//! OAuth 2.0 authorization-code flow against a MusicBrainz server, for
//! installed applications that cannot receive a redirect.
//!
//! ## Flow
//!
//! 1. [`IdentityClient::build_authorization_url`] produces the consent page URL
//! 2. The user approves and copies the code shown by the server
//! 3. [`IdentityClient::exchange_authorization_code`] trades the code for tokens
//! 4. [`IdentityClient::fetch_username`] resolves who the tokens belong to
//!
//! Access tokens are short-lived. [`IdentityClient::access_token`] hands out
//! the stored token while it is fresh and renews it with the refresh token
//! otherwise.
//!
//! ## Endpoints
//!
//! | Operation | Request |
//! |-----------|---------|
//! | authorize | `GET /oauth2/authorize` (browser) |
//! | exchange, refresh | `POST /oauth2/token` |
//! | revoke | `POST /oauth2/revoke` |
//! | identity | `GET /oauth2/userinfo` |

use crate::error::{AuthError, Result};
use crate::token_store::TokenStore;
use crate::types::Credential;
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::time::Clock;
use core_runtime::config::{CoreConfig, IdentityServiceConfig};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Upper bound for each remote revocation request
pub const REVOKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Seconds subtracted from `expires_in` so tokens are renewed before the
/// server starts rejecting them.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// Operations against the identity service.
///
/// Every async operation resolves exactly once. Failures never modify the
/// stored credential.
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// `true` iff a refresh token is stored. No I/O.
    fn is_logged_in(&self) -> bool;

    /// Consent page URL for `scopes`. Deterministic, no I/O.
    fn build_authorization_url(&self, scopes: &str) -> Result<String>;

    /// Trade an authorization code for tokens and store them.
    ///
    /// A refresh token missing from the response leaves the stored one in place.
    async fn exchange_authorization_code(&self, code: &str, scopes: &str) -> Result<()>;

    /// Clear the local credential, then revoke the tokens it held remotely
    /// (best effort).
    async fn revoke_tokens(&self);

    /// Resolve and store the account name.
    async fn fetch_username(&self) -> Result<String>;

    /// A usable access token, refreshing it first if it expired.
    ///
    /// `None` when not logged in.
    async fn access_token(&self) -> Result<Option<String>>;

    /// Obtain a new access token with the stored refresh token.
    async fn refresh_access_token(&self) -> Result<()>;
}

/// Token endpoint response body.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    token_type: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

/// Userinfo endpoint response body.
#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: Option<String>,
}

/// [`IdentityClient`] for musicbrainz.org and compatible servers.
pub struct MusicBrainzIdentityClient {
    config: IdentityServiceConfig,
    http_client: Arc<dyn HttpClient>,
    token_store: TokenStore,
    clock: Arc<dyn Clock>,
    /// Serializes refreshes so concurrent callers share one renewal
    refresh_lock: Mutex<()>,
}

impl MusicBrainzIdentityClient {
    pub fn new(
        config: IdentityServiceConfig,
        http_client: Arc<dyn HttpClient>,
        token_store: TokenStore,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            http_client,
            token_store,
            clock,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Build a client from runtime configuration, loading the stored credential.
    pub async fn from_config(config: &CoreConfig) -> Result<Self> {
        let token_store = TokenStore::load(Arc::clone(&config.settings_store)).await?;
        Ok(Self::new(
            config.identity.clone(),
            Arc::clone(&config.http_client),
            token_store,
            Arc::clone(&config.clock),
        ))
    }

    /// The credential store this client writes to
    pub fn token_store(&self) -> &TokenStore {
        &self.token_store
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/oauth2/{}", self.config.base_url(), path)
    }

    fn expires_at(&self, expires_in: i64) -> i64 {
        self.clock.unix_timestamp() + expires_in - EXPIRY_MARGIN_SECS
    }

    async fn post_form(&self, path: &str, params: &[(&str, &str)]) -> Result<HttpResponse> {
        let request = HttpRequest::new(HttpMethod::Post, self.endpoint(path))
            .header("User-Agent", self.config.user_agent.clone())
            .header("Accept", "application/json")
            .form(params)
            .map_err(|e| AuthError::InvalidResponse(format!("Failed to encode form: {}", e)))?;

        self.http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))
    }

    fn parse_token_response(response: &HttpResponse) -> std::result::Result<TokenResponse, String> {
        if !response.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(format!("Token endpoint returned {}: {}", response.status, body));
        }

        let token: TokenResponse = response
            .json()
            .map_err(|e| format!("Failed to parse token response: {}", e))?;

        if token.access_token.is_empty() {
            return Err("Token response has an empty access_token".to_string());
        }

        Ok(token)
    }

    async fn revoke_token(&self, token: &str, kind: &str) {
        let params = [
            ("token", token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        match self.post_form("revoke", &params).await {
            Ok(response) if response.is_success() => {
                debug!(kind = kind, "Revoked token");
            }
            Ok(response) => {
                warn!(kind = kind, status = response.status, "Token revocation rejected");
            }
            Err(e) => {
                warn!(kind = kind, error = %e, "Token revocation failed");
            }
        }
    }

    /// Revoke each token remotely, giving up on any request after [`REVOKE_TIMEOUT`]
    async fn revoke_remote(&self, credential: &Credential) {
        let tokens = [
            (credential.refresh_token.as_str(), "refresh_token"),
            (credential.access_token.as_str(), "access_token"),
        ];

        for (token, kind) in tokens {
            if token.is_empty() {
                continue;
            }
            if timeout(REVOKE_TIMEOUT, self.revoke_token(token, kind))
                .await
                .is_err()
            {
                warn!(kind = kind, "Token revocation timed out");
            }
        }
    }

    /// Refresh with the lock already held
    async fn refresh_locked(&self) -> Result<Credential> {
        let epoch = self.token_store.epoch();
        let refresh_token = self.token_store.credential().refresh_token;
        if refresh_token.is_empty() {
            return Err(AuthError::NotAuthenticated);
        }

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self.post_form("token", &params).await?;
        let token = Self::parse_token_response(&response).map_err(|reason| {
            warn!(status = response.status, "Access token refresh failed");
            AuthError::TokenRefreshFailed(reason)
        })?;

        let expires_at = self.expires_at(token.expires_in);
        let credential = self
            .token_store
            .update_in_epoch(epoch, move |credential| {
                // A re-login replaced the refresh token while the request was in flight
                if credential.refresh_token != refresh_token {
                    return Err(AuthError::NotAuthenticated);
                }
                credential.access_token = token.access_token;
                credential.access_token_expires_at = expires_at;
                if let Some(refresh_token) = token.refresh_token.filter(|t| !t.is_empty()) {
                    credential.refresh_token = refresh_token;
                }
                Ok(())
            })
            .await?;

        info!(expires_at = expires_at, "Refreshed access token");
        Ok(credential)
    }
}

#[async_trait]
impl IdentityClient for MusicBrainzIdentityClient {
    fn is_logged_in(&self) -> bool {
        self.token_store.is_logged_in()
    }

    #[instrument(skip(self), fields(host = %self.config.host))]
    fn build_authorization_url(&self, scopes: &str) -> Result<String> {
        let mut url = Url::parse(&self.endpoint("authorize")).map_err(|e| {
            AuthError::InvalidAuthorizationUrl(format!("Invalid identity service URL: {}", e))
        })?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", scopes);

        Ok(url.into())
    }

    #[instrument(skip(self, code), fields(host = %self.config.host))]
    async fn exchange_authorization_code(&self, code: &str, scopes: &str) -> Result<()> {
        let epoch = self.token_store.epoch();
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        debug!("Exchanging authorization code for tokens");

        let response = self.post_form("token", &params).await?;
        let token = Self::parse_token_response(&response).map_err(|reason| {
            warn!(status = response.status, "Authorization code exchange failed");
            AuthError::TokenExchangeFailed(reason)
        })?;

        let expires_at = self.expires_at(token.expires_in);
        let issued = Credential {
            refresh_token: token.refresh_token.unwrap_or_default(),
            access_token: token.access_token,
            access_token_expires_at: expires_at,
            granted_scopes: token
                .scope
                .filter(|scope| !scope.is_empty())
                .unwrap_or_else(|| scopes.to_string()),
            username: String::new(),
        };

        let write = {
            let issued = issued.clone();
            self.token_store
                .update_in_epoch(epoch, move |credential| {
                    credential.access_token = issued.access_token;
                    credential.access_token_expires_at = issued.access_token_expires_at;
                    credential.granted_scopes = issued.granted_scopes;
                    if !issued.refresh_token.is_empty() {
                        credential.refresh_token = issued.refresh_token;
                    }
                    Ok(())
                })
                .await
        };

        let credential = match write {
            Ok(credential) => credential,
            Err(AuthError::CredentialReset) => {
                info!("Credential cleared during exchange, revoking the new tokens");
                self.revoke_remote(&issued).await;
                return Err(AuthError::CredentialReset);
            }
            Err(e) => return Err(e),
        };

        info!(
            expires_at = expires_at,
            has_refresh_token = credential.is_logged_in(),
            scopes = %credential.granted_scopes,
            "Exchanged authorization code for tokens"
        );

        Ok(())
    }

    #[instrument(skip(self), fields(host = %self.config.host))]
    async fn revoke_tokens(&self) {
        let credential = self.token_store.credential();

        if let Err(e) = self.token_store.clear_all().await {
            warn!(error = %e, "Failed to clear stored credential");
        }

        self.revoke_remote(&credential).await;
    }

    #[instrument(skip(self), fields(host = %self.config.host))]
    async fn fetch_username(&self) -> Result<String> {
        let epoch = self.token_store.epoch();
        let access_token = self
            .access_token()
            .await?
            .ok_or(AuthError::NotAuthenticated)?;

        let request = HttpRequest::new(HttpMethod::Get, self.endpoint("userinfo"))
            .header("User-Agent", self.config.user_agent.clone())
            .header("Accept", "application/json")
            .bearer_token(access_token);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        if !response.is_success() {
            warn!(status = response.status, "Userinfo request failed");
            return Err(AuthError::UsernameFetchFailed(format!(
                "Userinfo endpoint returned {}",
                response.status
            )));
        }

        let info: UserInfo = response
            .json()
            .map_err(|e| AuthError::InvalidResponse(format!("Failed to parse userinfo: {}", e)))?;

        let username = info
            .sub
            .filter(|sub| !sub.is_empty())
            .ok_or_else(|| AuthError::InvalidResponse("Userinfo has no 'sub'".to_string()))?;

        let stored = username.clone();
        self.token_store
            .update_in_epoch(epoch, move |credential| {
                credential.username = stored;
                Ok(())
            })
            .await?;

        info!(username = %username, "Fetched account name");
        Ok(username)
    }

    async fn access_token(&self) -> Result<Option<String>> {
        if !self.is_logged_in() {
            return Ok(None);
        }

        let _guard = self.refresh_lock.lock().await;

        let epoch = self.token_store.epoch();
        let credential = self.token_store.credential();
        if !credential.is_logged_in() {
            return Ok(None);
        }
        if credential.has_valid_access_token(self.clock.unix_timestamp()) {
            return Ok(Some(credential.access_token));
        }

        if !credential.access_token.is_empty() {
            debug!("Forgetting expired access token");
            self.token_store
                .update_in_epoch(epoch, |credential| {
                    credential.access_token.clear();
                    credential.access_token_expires_at = 0;
                    Ok(())
                })
                .await?;
        }

        let refreshed = self.refresh_locked().await?;
        Ok(Some(refreshed.access_token))
    }

    #[instrument(skip(self), fields(host = %self.config.host))]
    async fn refresh_access_token(&self) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_store::tests::{MemorySettingsStore, Stored};
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::time::FixedClock;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn json_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: body.as_bytes().to_vec().into(),
        }
    }

    fn form_body(request: &HttpRequest) -> String {
        request
            .body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }

    fn config() -> IdentityServiceConfig {
        IdentityServiceConfig::default().with_client_credentials("client-id", "client-secret")
    }

    async fn client_with(
        http: MockHttpClient,
        settings: MemorySettingsStore,
        now: i64,
    ) -> MusicBrainzIdentityClient {
        let store = TokenStore::load(Arc::new(settings)).await.unwrap();
        MusicBrainzIdentityClient::new(
            config(),
            Arc::new(http),
            store,
            Arc::new(FixedClock::at_unix(now)),
        )
    }

    fn logged_in_settings(access_token: &str, expires: i64) -> MemorySettingsStore {
        MemorySettingsStore::with_values(&[
            ("oauth_refresh_token", Stored::Text("R".to_string())),
            ("oauth_access_token", Stored::Text(access_token.to_string())),
            ("oauth_access_token_expires", Stored::Integer(expires)),
        ])
    }

    #[tokio::test]
    async fn test_build_authorization_url() {
        let client = client_with(MockHttpClient::new(), MemorySettingsStore::default(), 0).await;

        let url = client.build_authorization_url("profile tag").unwrap();

        assert!(url.starts_with("https://musicbrainz.org/oauth2/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("redirect_uri=urn%3Aietf%3Awg%3Aoauth%3A2.0%3Aoob"));
        assert!(url.contains("scope=profile+tag"));
        assert!(!client.is_logged_in());
    }

    #[tokio::test]
    async fn test_build_authorization_url_plain_http_port() {
        let store = TokenStore::load(Arc::new(MemorySettingsStore::default()))
            .await
            .unwrap();
        let client = MusicBrainzIdentityClient::new(
            config().with_host("localhost").with_port(5000),
            Arc::new(MockHttpClient::new()),
            store,
            Arc::new(FixedClock::at_unix(0)),
        );

        let url = client.build_authorization_url("profile").unwrap();
        assert!(url.starts_with("http://localhost:5000/oauth2/authorize?"));
    }

    #[tokio::test]
    async fn test_build_authorization_url_invalid_host() {
        let store = TokenStore::load(Arc::new(MemorySettingsStore::default()))
            .await
            .unwrap();
        let client = MusicBrainzIdentityClient::new(
            config().with_host("bad host"),
            Arc::new(MockHttpClient::new()),
            store,
            Arc::new(FixedClock::at_unix(0)),
        );

        let result = client.build_authorization_url("profile");
        assert!(matches!(result, Err(AuthError::InvalidAuthorizationUrl(_))));
    }

    #[tokio::test]
    async fn test_exchange_stores_tokens() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|request| {
                let body = form_body(request);
                request.url == "https://musicbrainz.org/oauth2/token"
                    && body.contains("grant_type=authorization_code")
                    && body.contains("code=abc123")
                    && body.contains("client_secret=client-secret")
            })
            .times(1)
            .returning(|_| {
                Ok(json_response(
                    200,
                    r#"{"access_token":"A","refresh_token":"R","expires_in":100,"token_type":"Bearer"}"#,
                ))
            });

        let client = client_with(http, MemorySettingsStore::default(), 83).await;
        client
            .exchange_authorization_code("abc123", "profile tag")
            .await
            .unwrap();

        let credential = client.token_store().credential();
        assert_eq!(credential.refresh_token, "R");
        assert_eq!(credential.access_token, "A");
        assert_eq!(credential.access_token_expires_at, 123);
        assert_eq!(credential.granted_scopes, "profile tag");
        assert!(client.is_logged_in());
    }

    #[tokio::test]
    async fn test_exchange_prefers_granted_scope_and_keeps_refresh_token() {
        let mut http = MockHttpClient::new();
        http.expect_execute().times(1).returning(|_| {
            Ok(json_response(
                200,
                r#"{"access_token":"A2","scope":"profile"}"#,
            ))
        });

        let client = client_with(http, logged_in_settings("A1", 0), 1000).await;
        client
            .exchange_authorization_code("code", "profile tag")
            .await
            .unwrap();

        let credential = client.token_store().credential();
        assert_eq!(credential.refresh_token, "R");
        assert_eq!(credential.access_token, "A2");
        assert_eq!(credential.access_token_expires_at, 1000 + 3600 - 60);
        assert_eq!(credential.granted_scopes, "profile");
    }

    #[tokio::test]
    async fn test_exchange_failure_leaves_credential_untouched() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(400, r#"{"error":"invalid_grant"}"#)));

        let client = client_with(http, MemorySettingsStore::default(), 0).await;
        let result = client.exchange_authorization_code("bad", "profile").await;

        assert!(matches!(result, Err(AuthError::TokenExchangeFailed(_))));
        assert_eq!(client.token_store().credential(), Credential::default());
    }

    #[tokio::test]
    async fn test_failed_exchange_while_logged_in_keeps_credential() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(400, r#"{"error":"invalid_grant"}"#)));

        let client = client_with(http, logged_in_settings("A", 500), 100).await;
        let before = client.token_store().credential();
        let result = client.exchange_authorization_code("bad", "profile").await;

        assert!(matches!(result, Err(AuthError::TokenExchangeFailed(_))));
        assert!(before.is_logged_in());
        assert_eq!(client.token_store().credential(), before);
    }

    #[tokio::test]
    async fn test_exchange_rejects_missing_access_token() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(200, r#"{"refresh_token":"R"}"#)));

        let client = client_with(http, MemorySettingsStore::default(), 0).await;
        let result = client.exchange_authorization_code("code", "profile").await;

        assert!(matches!(result, Err(AuthError::TokenExchangeFailed(_))));
        assert!(!client.is_logged_in());
    }

    #[tokio::test]
    async fn test_exchange_network_error() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Err(BridgeError::OperationFailed("Connection refused".to_string())));

        let client = client_with(http, MemorySettingsStore::default(), 0).await;
        let result = client.exchange_authorization_code("code", "profile").await;

        assert!(matches!(result, Err(AuthError::NetworkError(_))));
    }

    #[tokio::test]
    async fn test_fetch_username_uses_fresh_token() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|request| {
                request.url == "https://musicbrainz.org/oauth2/userinfo"
                    && request.headers.get("Authorization") == Some(&"Bearer A".to_string())
            })
            .times(1)
            .returning(|_| Ok(json_response(200, r#"{"sub":"alice","metabrainz_user_id":1}"#)));

        let client = client_with(http, logged_in_settings("A", 500), 100).await;
        let username = client.fetch_username().await.unwrap();

        assert_eq!(username, "alice");
        assert_eq!(client.token_store().credential().username, "alice");
    }

    #[tokio::test]
    async fn test_fetch_username_failure_keeps_username() {
        let settings = logged_in_settings("A", 500);
        settings
            .values
            .lock()
            .unwrap()
            .insert("oauth_username".to_string(), Stored::Text("old".to_string()));

        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(503, "")));

        let client = client_with(http, settings, 100).await;
        let result = client.fetch_username().await;

        assert!(matches!(result, Err(AuthError::UsernameFetchFailed(_))));
        assert_eq!(client.token_store().credential().username, "old");
    }

    #[tokio::test]
    async fn test_fetch_username_requires_login() {
        let client = client_with(MockHttpClient::new(), MemorySettingsStore::default(), 0).await;
        let result = client.fetch_username().await;
        assert!(matches!(result, Err(AuthError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_access_token_refreshes_when_expired() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|request| {
                let body = form_body(request);
                body.contains("grant_type=refresh_token") && body.contains("refresh_token=R")
            })
            .times(1)
            .returning(|_| Ok(json_response(200, r#"{"access_token":"A2","expires_in":600}"#)));

        let client = client_with(http, logged_in_settings("A1", 100), 100).await;
        let token = client.access_token().await.unwrap();

        assert_eq!(token.as_deref(), Some("A2"));
        let credential = client.token_store().credential();
        assert_eq!(credential.access_token_expires_at, 100 + 600 - 60);
        assert_eq!(credential.refresh_token, "R");
    }

    #[tokio::test]
    async fn test_access_token_refresh_failure_forgets_stale_token() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(401, r#"{"error":"invalid_grant"}"#)));

        let client = client_with(http, logged_in_settings("A1", 50), 100).await;
        let result = client.access_token().await;

        assert!(matches!(result, Err(AuthError::TokenRefreshFailed(_))));
        let credential = client.token_store().credential();
        assert!(credential.access_token.is_empty());
        assert!(credential.is_logged_in());
    }

    #[tokio::test]
    async fn test_access_token_none_when_logged_out() {
        let client = client_with(MockHttpClient::new(), MemorySettingsStore::default(), 0).await;
        assert_eq!(client.access_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_revoke_clears_even_when_server_fails() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|request| request.url == "https://musicbrainz.org/oauth2/revoke")
            .times(2)
            .returning(|_| Err(BridgeError::OperationFailed("timeout".to_string())));

        let settings = logged_in_settings("A", 500);
        let client = client_with(http, settings.clone(), 100).await;
        client.revoke_tokens().await;

        assert!(!client.is_logged_in());
        assert_eq!(client.token_store().credential(), Credential::default());
        assert_eq!(settings.value("oauth_refresh_token"), None);
    }

    #[tokio::test]
    async fn test_revoke_clears_before_contacting_server() {
        let settings = logged_in_settings("A", 500);
        let observed = settings.clone();

        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(2)
            .returning(move |request| {
                assert_eq!(observed.value("oauth_refresh_token"), None);
                assert_eq!(observed.value("oauth_access_token"), None);
                let body = form_body(&request);
                assert!(body.starts_with("token=R&") || body.starts_with("token=A&"));
                Ok(json_response(200, ""))
            });

        let client = client_with(http, settings, 100).await;
        client.revoke_tokens().await;

        assert_eq!(client.token_store().credential(), Credential::default());
    }

    #[tokio::test]
    async fn test_revoke_when_logged_out_makes_no_request() {
        let client = client_with(MockHttpClient::new(), MemorySettingsStore::default(), 0).await;
        client.revoke_tokens().await;
        assert!(!client.is_logged_in());
    }
}
