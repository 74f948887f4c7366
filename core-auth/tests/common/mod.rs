//! Shared fixtures for account integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_desktop::SqliteSettingsStore;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::storage::SettingsStore;
use bridge_traits::time::FixedClock;
use bridge_traits::ui::{BrowserLauncher, PromptResponse, TextPrompt};
use core_auth::{MusicBrainzIdentityClient, OAuthSession, SessionObserver, TokenStore};
use core_runtime::config::IdentityServiceConfig;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const NOW: i64 = 83;

/// Answers requests from per-path queues and records every request.
#[derive(Default)]
pub struct ScriptedHttpClient {
    responses: Mutex<HashMap<String, VecDeque<(u16, String)>>>,
    requests: Mutex<Vec<HttpRequest>>,
    holds: Mutex<HashMap<String, Hold>>,
}

#[derive(Clone)]
pub struct Hold {
    pub arrived: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl ScriptedHttpClient {
    pub fn respond(&self, path: &str, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back((status, body.to_string()));
    }

    /// Park the next request to `path` until released
    pub fn hold(&self, path: &str) -> Hold {
        let hold = Hold {
            arrived: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        };
        self.holds
            .lock()
            .unwrap()
            .insert(path.to_string(), hold.clone());
        hold
    }

    pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.url.ends_with(path))
            .cloned()
            .collect()
    }

    pub fn body_of(request: &HttpRequest) -> String {
        request
            .body
            .as_ref()
            .map(|body| String::from_utf8_lossy(body).into_owned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let path = request
            .url
            .find("/oauth2/")
            .map(|at| request.url[at..].to_string())
            .unwrap_or_default();
        self.requests.lock().unwrap().push(request);

        let hold = self.holds.lock().unwrap().remove(&path);
        if let Some(hold) = hold {
            hold.arrived.notify_one();
            hold.release.notified().await;
        }

        let scripted = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&path)
            .and_then(|queue| queue.pop_front());

        match scripted {
            Some((status, body)) => Ok(HttpResponse {
                status,
                headers: HashMap::new(),
                body: body.into_bytes().into(),
            }),
            None => Err(BridgeError::OperationFailed(format!(
                "No response scripted for {}",
                path
            ))),
        }
    }
}

#[derive(Default)]
pub struct RecordingBrowser {
    pub opened: Mutex<Vec<String>>,
}

impl BrowserLauncher for RecordingBrowser {
    fn open(&self, url: &str) {
        self.opened.lock().unwrap().push(url.to_string());
    }
}

/// Hands out queued answers; an empty queue dismisses the prompt
#[derive(Default)]
pub struct QueuedPrompt {
    answers: Mutex<VecDeque<PromptResponse>>,
}

impl QueuedPrompt {
    pub fn answer(&self, response: PromptResponse) {
        self.answers.lock().unwrap().push_back(response);
    }
}

#[async_trait]
impl TextPrompt for QueuedPrompt {
    async fn get_text(&self, _title: &str, _label: &str) -> PromptResponse {
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(PromptResponse::cancelled)
    }
}

#[derive(Default)]
pub struct Notifications(Mutex<Vec<bool>>);

impl Notifications {
    pub fn seen(&self) -> Vec<bool> {
        self.0.lock().unwrap().clone()
    }
}

impl SessionObserver for Notifications {
    fn login_state_changed(&self, logged_in: bool) {
        self.0.lock().unwrap().push(logged_in);
    }
}

pub struct Harness {
    pub session: Arc<OAuthSession>,
    pub store: TokenStore,
    pub http: Arc<ScriptedHttpClient>,
    pub prompt: Arc<QueuedPrompt>,
    pub browser: Arc<RecordingBrowser>,
    pub notifications: Arc<Notifications>,
}

impl Harness {
    pub async fn in_memory() -> Self {
        let settings = SqliteSettingsStore::in_memory().await.unwrap();
        Self::with_settings(Arc::new(settings)).await
    }

    pub async fn with_settings(settings: Arc<dyn SettingsStore>) -> Self {
        let http = Arc::new(ScriptedHttpClient::default());
        let prompt = Arc::new(QueuedPrompt::default());
        let browser = Arc::new(RecordingBrowser::default());
        let notifications = Arc::new(Notifications::default());

        let store = TokenStore::load(settings).await.unwrap();
        let identity = MusicBrainzIdentityClient::new(
            IdentityServiceConfig::default().with_client_credentials("test-client", "test-secret"),
            http.clone(),
            store.clone(),
            Arc::new(FixedClock::at_unix(NOW)),
        );

        let session = OAuthSession::new(
            Arc::new(identity),
            store.clone(),
            browser.clone(),
            prompt.clone(),
        );
        session.add_observer(notifications.clone());

        Self {
            session: Arc::new(session),
            store,
            http,
            prompt,
            browser,
            notifications,
        }
    }

    /// Script a successful exchange and identity lookup for "alice"
    pub fn script_login(&self) {
        self.prompt.answer(PromptResponse::confirmed("abc123"));
        self.http.respond(
            "/oauth2/token",
            200,
            r#"{"access_token":"A","refresh_token":"R","expires_in":100,"token_type":"Bearer"}"#,
        );
        self.http
            .respond("/oauth2/userinfo", 200, r#"{"sub":"alice"}"#);
    }
}
