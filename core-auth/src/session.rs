//! # OAuth Session
//!
//! Drives the interactive login of one running application.
//!
//! ## State machine
//!
//! ```text
//!            login()                 code entered            exchange ok
//! LoggedOut ─────────► AwaitingCode ─────────────► Exchanging ──────────► FetchingIdentity
//!     ▲                    │ cancel                    │ failure                  │ ok or failure
//!     │                    ▼                           ▼                          ▼
//!     └──────── settled phase implied by the credential ◄──────         LoggedIn
//!
//! logout() / restore_defaults(): any phase ──► LoggedOut
//! ```
//!
//! Only one attempt runs at a time; a second `login()` is rejected with
//! [`AuthError::LoginInProgress`]. A `logout()` during an attempt supersedes
//! it: tokens the attempt obtains afterwards are never stored and are revoked
//! again.
//!
//! ## Notifications
//!
//! Observers receive `true` once per completed login and `false` once per
//! logout or reset. Cancelled, failed and rejected attempts are silent.
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::{LoginOutcome, OAuthSession, DEFAULT_SCOPES};
//! # async fn example(session: OAuthSession) -> core_auth::Result<()> {
//! session.add_observer(std::sync::Arc::new(|logged_in: bool| {
//!     println!("logged in: {}", logged_in);
//! }));
//!
//! match session.login(DEFAULT_SCOPES).await? {
//!     LoginOutcome::LoggedIn { username } => println!("Welcome {:?}", username),
//!     LoginOutcome::Cancelled | LoginOutcome::Superseded => {}
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::oauth::{IdentityClient, MusicBrainzIdentityClient};
use crate::observer::SessionObserver;
use crate::token_store::TokenStore;
use crate::types::{LoginOutcome, LoginStatus, SessionPhase};
use bridge_traits::ui::{BrowserLauncher, TextPrompt};
use core_runtime::config::CoreConfig;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{debug, info, instrument, warn};

/// Title of the authorization code dialog
pub const PROMPT_TITLE: &str = "MusicBrainz Account";

/// Label next to the authorization code input
pub const PROMPT_LABEL: &str = "Authorization code:";

#[derive(Debug)]
struct SessionState {
    phase: SessionPhase,
    pending_scopes: String,
    /// Id of the attempt in flight, if any
    attempt: Option<u64>,
    next_attempt: u64,
}

/// Login, logout and account status for the MusicBrainz account.
///
/// Share it behind an `Arc`; every method takes `&self`.
pub struct OAuthSession {
    identity: Arc<dyn IdentityClient>,
    token_store: TokenStore,
    browser: Arc<dyn BrowserLauncher>,
    prompt: Arc<dyn TextPrompt>,
    state: Mutex<SessionState>,
    observers: RwLock<Vec<Arc<dyn SessionObserver>>>,
    event_bus: Option<EventBus>,
}

/// Puts the session back into its settled phase when an attempt ends
/// without completing, including when the `login()` future is dropped.
struct AttemptGuard<'a> {
    session: &'a OAuthSession,
    id: u64,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        let logged_in = self.session.identity.is_logged_in();
        let mut state = self.session.state();
        if state.attempt == Some(self.id) {
            state.attempt = None;
            state.pending_scopes.clear();
            state.phase = SessionPhase::settled(logged_in);
            debug!(attempt = self.id, phase = %state.phase, "Login attempt ended");
        }
    }
}

/// Sends the logout notification once `logout()` finishes or is dropped.
struct LogoutNotice<'a> {
    session: &'a OAuthSession,
}

impl Drop for LogoutNotice<'_> {
    fn drop(&mut self) {
        self.session.notify(false);
    }
}

impl OAuthSession {
    /// Create a session over an identity client and the credential store it uses.
    ///
    /// Starts `LoggedIn` when a refresh token is already stored.
    pub fn new(
        identity: Arc<dyn IdentityClient>,
        token_store: TokenStore,
        browser: Arc<dyn BrowserLauncher>,
        prompt: Arc<dyn TextPrompt>,
    ) -> Self {
        let phase = SessionPhase::settled(identity.is_logged_in());
        info!(phase = %phase, "Created account session");

        Self {
            identity,
            token_store,
            browser,
            prompt,
            state: Mutex::new(SessionState {
                phase,
                pending_scopes: String::new(),
                attempt: None,
                next_attempt: 1,
            }),
            observers: RwLock::new(Vec::new()),
            event_bus: None,
        }
    }

    /// Create a session talking to the server described by `config`.
    pub async fn from_config(
        config: &CoreConfig,
        browser: Arc<dyn BrowserLauncher>,
        prompt: Arc<dyn TextPrompt>,
    ) -> Result<Self> {
        let identity = MusicBrainzIdentityClient::from_config(config).await?;
        let token_store = identity.token_store().clone();
        Ok(Self::new(Arc::new(identity), token_store, browser, prompt))
    }

    /// Publish account events on `event_bus`.
    ///
    /// The bus also receives login state changes like any other observer.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.observers
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Arc::new(event_bus.clone()));
        self.event_bus = Some(event_bus);
        self
    }

    /// Register a listener for login state changes
    pub fn add_observer(&self, observer: Arc<dyn SessionObserver>) {
        self.observers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(observer);
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn phase(&self) -> SessionPhase {
        self.state().phase
    }

    /// Scopes of the attempt in flight
    pub fn pending_scopes(&self) -> Option<String> {
        let state = self.state();
        (!state.pending_scopes.is_empty()).then(|| state.pending_scopes.clone())
    }

    pub fn is_logged_in(&self) -> bool {
        self.identity.is_logged_in()
    }

    /// Logged-in flag and account name for display
    pub fn status(&self) -> LoginStatus {
        let logged_in = self.identity.is_logged_in();
        let username = self.token_store.credential().username;
        LoginStatus {
            logged_in,
            username: (logged_in && !username.is_empty()).then_some(username),
        }
    }

    /// Run the interactive authorization flow for `scopes`.
    ///
    /// Opens the consent page, asks the user for the code the server shows
    /// and exchanges it for tokens. A failed username lookup does not fail
    /// the login.
    ///
    /// # Errors
    ///
    /// - `LoginInProgress` if another attempt is running
    /// - `InvalidAuthorizationUrl` if the server address is unusable
    /// - `TokenExchangeFailed` / `NetworkError` if the code was not accepted;
    ///   the stored credential is unchanged
    #[instrument(skip(self))]
    pub async fn login(&self, scopes: &str) -> Result<LoginOutcome> {
        let attempt = self.begin_attempt()?;

        let url = match self.identity.build_authorization_url(scopes) {
            Ok(url) => url,
            Err(e) => {
                self.emit_error(&e);
                return Err(e);
            }
        };

        self.state().pending_scopes = scopes.to_string();
        self.emit(AuthEvent::AuthorizationRequested {
            scopes: scopes.to_string(),
        });

        info!(attempt = attempt.id, "Opening authorization page");
        self.browser.open(&url);

        let response = self.prompt.get_text(PROMPT_TITLE, PROMPT_LABEL).await;
        let code = match response.into_text() {
            Some(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => {
                info!(attempt = attempt.id, "Login cancelled");
                return Ok(LoginOutcome::Cancelled);
            }
        };

        if !self.advance(attempt.id, SessionPhase::Exchanging) {
            info!(attempt = attempt.id, "Login superseded before exchange");
            return Ok(LoginOutcome::Superseded);
        }

        if let Err(e) = self
            .identity
            .exchange_authorization_code(&code, scopes)
            .await
        {
            if !self.is_current(attempt.id) {
                return Ok(self.discard_superseded(attempt.id));
            }
            warn!(attempt = attempt.id, error = %e, "Login failed");
            self.emit_error(&e);
            return Err(e);
        }

        if !self.advance(attempt.id, SessionPhase::FetchingIdentity) {
            return Ok(self.discard_superseded(attempt.id));
        }

        let username = match self.identity.fetch_username().await {
            Ok(username) => Some(username),
            Err(e) => {
                warn!(attempt = attempt.id, error = %e, "Logged in without account name");
                self.emit_error(&e);
                None
            }
        };

        let completed = {
            let mut state = self.state();
            if state.attempt == Some(attempt.id) {
                state.attempt = None;
                state.pending_scopes.clear();
                state.phase = SessionPhase::LoggedIn;
                true
            } else {
                false
            }
        };

        if !completed {
            return Ok(self.discard_superseded(attempt.id));
        }

        info!(attempt = attempt.id, username = ?username, "Logged in");
        self.notify(true);
        Ok(LoginOutcome::LoggedIn { username })
    }

    /// Forget and revoke the credential, abandoning any attempt in flight.
    ///
    /// Safe from any phase, including when already logged out. The local
    /// credential is gone before the server is contacted, so dropping the
    /// returned future early still leaves the session logged out, and
    /// observers are told either way.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        {
            let mut state = self.state();
            if let Some(attempt) = state.attempt.take() {
                info!(attempt = attempt, "Logout supersedes login attempt");
            }
            state.pending_scopes.clear();
            state.phase = SessionPhase::LoggedOut;
        }

        let _notice = LogoutNotice { session: self };
        self.identity.revoke_tokens().await;
        info!("Logged out");
    }

    /// Reset the account to first-run state.
    pub async fn restore_defaults(&self) {
        debug!("Restoring account defaults");
        self.logout().await;
    }

    /// Retry the account name lookup while logged in.
    ///
    /// Does not notify observers.
    #[instrument(skip(self))]
    pub async fn refresh_username(&self) -> Result<String> {
        if !self.identity.is_logged_in() {
            return Err(AuthError::NotAuthenticated);
        }

        self.identity.fetch_username().await.map_err(|e| {
            self.emit_error(&e);
            e
        })
    }

    /// Access token for an authenticated request, renewed if needed
    pub async fn access_token(&self) -> Result<Option<String>> {
        let expires_before = self.token_store.credential().access_token_expires_at;
        let token = self.identity.access_token().await.map_err(|e| {
            self.emit_error(&e);
            e
        })?;

        let expires_at = self.token_store.credential().access_token_expires_at;
        if token.is_some() && expires_at != expires_before {
            self.emit(AuthEvent::TokenRefreshed { expires_at });
        }

        Ok(token)
    }

    fn begin_attempt(&self) -> Result<AttemptGuard<'_>> {
        let mut state = self.state();
        if state.attempt.is_some() {
            warn!(phase = %state.phase, "Rejected login while another attempt is running");
            return Err(AuthError::LoginInProgress);
        }

        let id = state.next_attempt;
        state.next_attempt += 1;
        state.attempt = Some(id);
        state.phase = SessionPhase::AwaitingCode;
        drop(state);

        Ok(AttemptGuard { session: self, id })
    }

    fn is_current(&self, id: u64) -> bool {
        self.state().attempt == Some(id)
    }

    /// Move attempt `id` to `phase`; `false` if it was superseded
    fn advance(&self, id: u64, phase: SessionPhase) -> bool {
        let mut state = self.state();
        if state.attempt != Some(id) {
            return false;
        }
        state.phase = phase;
        true
    }

    /// The logout that superseded attempt `id` already cleared and revoked
    /// whatever it had stored.
    fn discard_superseded(&self, id: u64) -> LoginOutcome {
        info!(attempt = id, "Login superseded");
        LoginOutcome::Superseded
    }

    fn notify(&self, logged_in: bool) {
        let observers = self
            .observers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        for observer in observers {
            observer.login_state_changed(logged_in);
        }
    }

    fn emit(&self, event: AuthEvent) {
        if let Some(bus) = &self.event_bus {
            if bus.emit(CoreEvent::Auth(event)).is_err() {
                debug!("No subscribers for account event");
            }
        }
    }

    fn emit_error(&self, error: &AuthError) {
        self.emit(AuthEvent::AuthError {
            message: error.to_string(),
            recoverable: error.is_recoverable(),
        });
    }
}
