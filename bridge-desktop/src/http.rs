//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy},
};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// `User-Agent` sent when the caller does not configure one
pub const DEFAULT_USER_AGENT: &str = concat!("mbaccount/", env!("CARGO_PKG_VERSION"));

/// Reqwest-based HTTP client implementation
///
/// Retries transport failures, 5xx and 429 with exponential backoff for
/// idempotent methods. TLS is provided by rustls.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a new HTTP client with custom timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_options(timeout, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with custom timeout and `User-Agent`
    ///
    /// Falls back to reqwest's default client if the builder rejects the
    /// configuration (for example when no TLS backend can be initialised).
    pub fn with_options(timeout: Duration, user_agent: &str) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent(user_agent)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build configured HTTP client, using defaults");
                Client::new()
            });

        Self { client }
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Convert bridge HttpMethod to reqwest Method
    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }

    /// Build reqwest request from bridge request
    fn build_request(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let method = Self::convert_method(request.method);
        let mut req = self.client.request(method, &request.url);

        // Add headers
        for (key, value) in request.headers {
            req = req.header(key, value);
        }

        // Add body if present
        if let Some(body) = request.body {
            req = req.body(body);
        }

        // Add timeout if specified
        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        req
    }

    async fn read_response(response: reqwest::Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to read body: {}", e)))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    fn classify_error(error: &reqwest::Error) -> BridgeError {
        if error.is_timeout() {
            BridgeError::OperationFailed("Request timed out".to_string())
        } else if error.is_connect() {
            BridgeError::OperationFailed(format!("Connection failed: {}", error))
        } else {
            BridgeError::OperationFailed(error.to_string())
        }
    }

    fn backoff(policy: &RetryPolicy, attempt: u32) -> Duration {
        if policy.use_exponential_backoff {
            (policy.base_delay * 2u32.saturating_pow(attempt - 1)).min(policy.max_delay)
        } else {
            policy.base_delay
        }
    }

    /// Send `request`, retrying transport errors, 5xx and 429 up to `policy.max_attempts`
    async fn send_with_policy(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let mut last_error = None;

        for attempt in 1..=policy.max_attempts.max(1) {
            debug!(
                attempt = attempt,
                max_attempts = policy.max_attempts,
                method = ?request.method,
                url = %request.url,
                "Sending HTTP request"
            );

            match self.build_request(request.clone()).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if status < 500 && status != 429 {
                        return Self::read_response(response).await;
                    }
                    warn!(status = status, attempt = attempt, "Retryable HTTP status");
                    if attempt >= policy.max_attempts {
                        return Self::read_response(response).await;
                    }
                    last_error = Some(BridgeError::OperationFailed(format!(
                        "HTTP {} error",
                        status
                    )));
                }
                Err(e) => {
                    warn!(error = %e, attempt = attempt, "HTTP request failed");
                    last_error = Some(Self::classify_error(&e));
                }
            }

            if attempt < policy.max_attempts {
                let delay = Self::backoff(&policy, attempt);
                debug!(delay_ms = delay.as_millis() as u64, "Retrying after delay");
                sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            BridgeError::OperationFailed("All retry attempts exhausted".to_string())
        }))
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    /// Idempotent requests use the default retry policy; token and revoke
    /// POSTs are sent exactly once.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let policy = if request.method.is_idempotent() {
            RetryPolicy::default()
        } else {
            RetryPolicy {
                max_attempts: 1,
                ..RetryPolicy::default()
            }
        };
        self.send_with_policy(request, policy).await
    }

    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        self.send_with_policy(request, policy).await
    }
}
