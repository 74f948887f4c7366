use serde::{Deserialize, Serialize};
use std::fmt;

/// Scopes requested by a plain "Log in" from the settings screen.
pub const DEFAULT_SCOPES: &str = "profile tag rating collection submit_isrc submit_barcode";

/// Which lifetime a stored setting belongs to.
///
/// `Setting` values are user preferences shown in the options UI. `Persist`
/// values are internal session state the user never edits directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersistenceClass {
    Setting,
    Persist,
}

/// One of the five persisted credential fields.
///
/// # Examples
///
/// ```
/// use core_auth::{CredentialField, PersistenceClass};
///
/// assert_eq!(CredentialField::RefreshToken.key(), "oauth_refresh_token");
/// assert_eq!(
///     CredentialField::Username.persistence_class(),
///     PersistenceClass::Persist
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialField {
    RefreshToken,
    AccessToken,
    AccessTokenExpires,
    RefreshTokenScopes,
    Username,
}

impl CredentialField {
    /// All credential fields, in storage order
    pub const ALL: [CredentialField; 5] = [
        CredentialField::RefreshToken,
        CredentialField::AccessToken,
        CredentialField::AccessTokenExpires,
        CredentialField::RefreshTokenScopes,
        CredentialField::Username,
    ];

    /// Settings key the field is stored under
    pub fn key(self) -> &'static str {
        match self {
            CredentialField::RefreshToken => "oauth_refresh_token",
            CredentialField::AccessToken => "oauth_access_token",
            CredentialField::AccessTokenExpires => "oauth_access_token_expires",
            CredentialField::RefreshTokenScopes => "oauth_refresh_token_scopes",
            CredentialField::Username => "oauth_username",
        }
    }

    pub fn persistence_class(self) -> PersistenceClass {
        PersistenceClass::Persist
    }

    /// `true` for the expiry timestamp, stored as an integer
    pub fn is_integer(self) -> bool {
        matches!(self, CredentialField::AccessTokenExpires)
    }

    /// Token fields must never appear in logs
    pub fn is_secret(self) -> bool {
        matches!(
            self,
            CredentialField::RefreshToken | CredentialField::AccessToken
        )
    }
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Value of a single credential field.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialValue {
    Text(String),
    Integer(i64),
}

impl CredentialValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CredentialValue::Text(value) => Some(value),
            CredentialValue::Integer(_) => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CredentialValue::Integer(value) => Some(*value),
            CredentialValue::Text(_) => None,
        }
    }
}

impl fmt::Debug for CredentialValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialValue::Text(value) if value.is_empty() => f.write_str("Text(\"\")"),
            CredentialValue::Text(_) => f.write_str("Text(..)"),
            CredentialValue::Integer(value) => write!(f, "Integer({})", value),
        }
    }
}

impl From<&str> for CredentialValue {
    fn from(value: &str) -> Self {
        CredentialValue::Text(value.to_string())
    }
}

impl From<String> for CredentialValue {
    fn from(value: String) -> Self {
        CredentialValue::Text(value)
    }
}

impl From<i64> for CredentialValue {
    fn from(value: i64) -> Self {
        CredentialValue::Integer(value)
    }
}

/// The persisted MusicBrainz account credential.
///
/// Empty strings mean "absent"; an expiry of `0` means unknown or expired.
/// A non-empty `refresh_token` is the only signal of being logged in.
///
/// The `Debug` output never contains token values.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub refresh_token: String,
    pub access_token: String,
    /// Unix seconds after which the access token must be renewed
    pub access_token_expires_at: i64,
    /// Space-delimited scopes granted to the refresh token
    pub granted_scopes: String,
    pub username: String,
}

impl Credential {
    pub fn is_logged_in(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// Whether the access token may still be used at `now` (Unix seconds)
    pub fn has_valid_access_token(&self, now: i64) -> bool {
        !self.access_token.is_empty() && now < self.access_token_expires_at
    }

    pub fn get(&self, field: CredentialField) -> CredentialValue {
        match field {
            CredentialField::RefreshToken => self.refresh_token.clone().into(),
            CredentialField::AccessToken => self.access_token.clone().into(),
            CredentialField::AccessTokenExpires => self.access_token_expires_at.into(),
            CredentialField::RefreshTokenScopes => self.granted_scopes.clone().into(),
            CredentialField::Username => self.username.clone().into(),
        }
    }

    /// Replace one field. Returns `false` if the value has the wrong kind.
    pub(crate) fn set(&mut self, field: CredentialField, value: CredentialValue) -> bool {
        match (field, value) {
            (CredentialField::AccessTokenExpires, CredentialValue::Integer(value)) => {
                self.access_token_expires_at = value;
            }
            (CredentialField::AccessTokenExpires, CredentialValue::Text(_)) => return false,
            (_, CredentialValue::Integer(_)) => return false,
            (CredentialField::RefreshToken, CredentialValue::Text(value)) => {
                self.refresh_token = value
            }
            (CredentialField::AccessToken, CredentialValue::Text(value)) => {
                self.access_token = value
            }
            (CredentialField::RefreshTokenScopes, CredentialValue::Text(value)) => {
                self.granted_scopes = value
            }
            (CredentialField::Username, CredentialValue::Text(value)) => self.username = value,
        }
        true
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &str| if value.is_empty() { "" } else { "[REDACTED]" };
        f.debug_struct("Credential")
            .field("refresh_token", &redact(&self.refresh_token))
            .field("access_token", &redact(&self.access_token))
            .field("access_token_expires_at", &self.access_token_expires_at)
            .field("granted_scopes", &self.granted_scopes)
            .field("username", &self.username)
            .finish()
    }
}

/// Where the login state machine currently is.
///
/// Only `LoggedOut` and `LoggedIn` are settled; the others exist while a
/// `login()` call is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionPhase {
    LoggedOut,
    AwaitingCode,
    Exchanging,
    FetchingIdentity,
    LoggedIn,
}

impl SessionPhase {
    /// The settled phase implied by the stored credential
    pub fn settled(logged_in: bool) -> Self {
        if logged_in {
            SessionPhase::LoggedIn
        } else {
            SessionPhase::LoggedOut
        }
    }

    pub fn is_settled(self) -> bool {
        matches!(self, SessionPhase::LoggedOut | SessionPhase::LoggedIn)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::LoggedOut => "logged_out",
            SessionPhase::AwaitingCode => "awaiting_code",
            SessionPhase::Exchanging => "exchanging",
            SessionPhase::FetchingIdentity => "fetching_identity",
            SessionPhase::LoggedIn => "logged_in",
        };
        f.write_str(name)
    }
}

/// How a `login()` attempt ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Tokens were stored. `username` is `None` if the identity fetch failed.
    LoggedIn { username: Option<String> },
    /// The user dismissed the code prompt
    Cancelled,
    /// A logout happened while the attempt was in flight
    Superseded,
}

/// What the settings screen shows about the account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoginStatus {
    pub logged_in: bool,
    /// Present once the identity service told us who the user is
    pub username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_keys_are_stable() {
        let keys: Vec<&str> = CredentialField::ALL.iter().map(|f| f.key()).collect();
        assert_eq!(
            keys,
            vec![
                "oauth_refresh_token",
                "oauth_access_token",
                "oauth_access_token_expires",
                "oauth_refresh_token_scopes",
                "oauth_username",
            ]
        );
        assert!(CredentialField::ALL
            .iter()
            .all(|f| f.persistence_class() == PersistenceClass::Persist));
    }

    #[test]
    fn test_logged_in_depends_only_on_refresh_token() {
        let mut credential = Credential {
            access_token: "A".to_string(),
            access_token_expires_at: i64::MAX,
            username: "alice".to_string(),
            ..Default::default()
        };
        assert!(!credential.is_logged_in());

        credential.refresh_token = "R".to_string();
        credential.access_token.clear();
        credential.access_token_expires_at = 0;
        assert!(credential.is_logged_in());
    }

    #[test]
    fn test_access_token_validity() {
        let credential = Credential {
            access_token: "A".to_string(),
            access_token_expires_at: 123,
            ..Default::default()
        };
        assert!(credential.has_valid_access_token(122));
        assert!(!credential.has_valid_access_token(123));
        assert!(!Credential::default().has_valid_access_token(0));
    }

    #[test]
    fn test_set_rejects_wrong_kind() {
        let mut credential = Credential::default();
        assert!(!credential.set(CredentialField::AccessTokenExpires, "soon".into()));
        assert!(!credential.set(CredentialField::Username, 5.into()));
        assert!(credential.set(CredentialField::AccessTokenExpires, 123.into()));
        assert_eq!(
            credential.get(CredentialField::AccessTokenExpires),
            CredentialValue::Integer(123)
        );
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let credential = Credential {
            refresh_token: "refresh-secret".to_string(),
            access_token: "access-secret".to_string(),
            access_token_expires_at: 123,
            granted_scopes: "profile".to_string(),
            username: "alice".to_string(),
        };
        let rendered = format!("{:?}", credential);
        assert!(!rendered.contains("refresh-secret"));
        assert!(!rendered.contains("access-secret"));
        assert!(rendered.contains("alice"));
        assert!(!format!("{:?}", credential.get(CredentialField::AccessToken))
            .contains("access-secret"));
    }

    #[test]
    fn test_settled_phase() {
        assert_eq!(SessionPhase::settled(true), SessionPhase::LoggedIn);
        assert_eq!(SessionPhase::settled(false), SessionPhase::LoggedOut);
        assert!(!SessionPhase::Exchanging.is_settled());
    }

    #[test]
    fn test_login_status_json() {
        let status = LoginStatus {
            logged_in: true,
            username: Some("alice".to_string()),
        };
        assert_eq!(
            serde_json::to_string(&status).unwrap(),
            r#"{"logged_in":true,"username":"alice"}"#
        );
    }

    #[test]
    fn test_secret_fields_and_value_accessors() {
        let secret: Vec<CredentialField> = CredentialField::ALL
            .into_iter()
            .filter(|field| field.is_secret())
            .collect();
        assert_eq!(
            secret,
            vec![CredentialField::RefreshToken, CredentialField::AccessToken]
        );

        assert_eq!(CredentialValue::from("alice").as_text(), Some("alice"));
        assert_eq!(CredentialValue::from("alice").as_integer(), None);
        assert_eq!(CredentialValue::from(123).as_integer(), Some(123));
        assert_eq!(CredentialValue::from(123).as_text(), None);
    }
}
