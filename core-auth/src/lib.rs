//! # Account Module
//!
//! MusicBrainz account login for desktop clients.
//!
//! ## Overview
//!
//! This module signs the user in to a MusicBrainz server with OAuth 2.0,
//! keeps the resulting credential across restarts, and tells the rest of the
//! application when the login state changes.
//!
//! ## Features
//!
//! - Authorization-code flow for installed applications (out-of-band code)
//! - Access token renewal with the stored refresh token
//! - Token revocation on logout
//! - Atomic credential persistence through the host settings store
//! - Login state notifications for UI and event bus listeners
//!
//! ## Components
//!
//! - [`TokenStore`]: the persisted [`Credential`]
//! - [`IdentityClient`] / [`MusicBrainzIdentityClient`]: identity service calls
//! - [`OAuthSession`]: the login state machine
//! - [`SessionObserver`]: login state listeners

pub mod error;
pub mod oauth;
pub mod observer;
pub mod session;
pub mod token_store;
pub mod types;

pub use error::{AuthError, Result};
pub use oauth::{IdentityClient, MusicBrainzIdentityClient, EXPIRY_MARGIN_SECS, REVOKE_TIMEOUT};
pub use observer::{CollectionReloader, SessionObserver};
pub use session::{OAuthSession, PROMPT_LABEL, PROMPT_TITLE};
pub use token_store::TokenStore;
pub use types::{
    Credential, CredentialField, CredentialValue, LoginOutcome, LoginStatus, PersistenceClass,
    SessionPhase, DEFAULT_SCOPES,
};
