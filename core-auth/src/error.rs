use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("Username fetch failed: {0}")]
    UsernameFetchFailed(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Settings storage failed: {0}")]
    SettingsStorageFailed(String),

    #[error("Invalid authorization URL: {0}")]
    InvalidAuthorizationUrl(String),

    #[error("A login attempt is already in progress")]
    LoginInProgress,

    #[error("Credential was cleared while the request was in flight")]
    CredentialReset,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Invalid response from identity service: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Runtime(#[from] core_runtime::Error),
}

impl AuthError {
    /// Whether retrying the same operation later can succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AuthError::NetworkError(_)
                | AuthError::TokenExchangeFailed(_)
                | AuthError::UsernameFetchFailed(_)
                | AuthError::TokenRefreshFailed(_)
                | AuthError::LoginInProgress
        )
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
