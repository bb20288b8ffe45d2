//! Resilient call executor
//!
//! Issues one JSON request with bearer authorization and retries it on a
//! fixed set of transient statuses and on connection-level errors. Failures
//! never escape: after the retry budget is spent the call yields `None`.

use crate::auth::TokenProvider;
use crate::error::Result;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Statuses treated as transient by the executor
pub const RETRYABLE_STATUSES: [u16; 7] = [400, 403, 404, 500, 502, 503, 504];

/// Retry configuration for remote calls
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, the first one included
    pub max_attempts: u32,

    /// Base of the exponential backoff
    pub backoff_factor: Duration,

    /// Upper bound for a single backoff sleep
    pub max_backoff: Duration,

    /// Timeout for a single attempt
    pub request_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff_factor: Duration::from_secs(1),
            max_backoff: Duration::from_secs(120),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    /// Sleep before the `retry`-th retry (1-based): `factor * 2^(retry - 1)`
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.backoff_factor
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }

    pub fn is_retryable(status: StatusCode) -> bool {
        RETRYABLE_STATUSES.contains(&status.as_u16())
    }
}

/// Buffered response of a completed call
#[derive(Debug, Clone)]
pub struct CallResponse {
    status: StatusCode,
    body: String,
}

impl CallResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    /// Decode a successful body; `None` for an error status or a body that
    /// does not match `T`
    pub fn json<T: DeserializeOwned>(&self) -> Option<T> {
        if !self.is_success() {
            tracing::warn!("Unexpected status {}: {}", self.status, self.body);
            return None;
        }
        match serde_json::from_str(&self.body) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Undecodable response body ({}): {}", e, self.body);
                None
            }
        }
    }
}

/// Outcome of one attempt that should be retried
enum Retry {
    Status(StatusCode),
    Transport(String),
}

impl std::fmt::Display for Retry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Retry::Status(status) => write!(f, "status {}", status),
            Retry::Transport(e) => write!(f, "{}", e),
        }
    }
}

/// Executes remote calls with automatic retry
pub struct CallExecutor {
    client: Client,
    tokens: Arc<dyn TokenProvider>,
    retry: RetryConfig,
}

impl CallExecutor {
    pub fn new(tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        Self::with_retry(tokens, RetryConfig::default())
    }

    pub fn with_retry(tokens: Arc<dyn TokenProvider>, retry: RetryConfig) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            tokens,
            retry,
        })
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Execute a request, retrying transient failures
    ///
    /// Returns the first response whose status is outside
    /// [`RETRYABLE_STATUSES`], or `None` once every attempt has failed.
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<&serde_json::Value>,
    ) -> Option<CallResponse> {
        let payload = body.map(|b| b.to_string());

        tracing::debug!(
            "Performing HTTP request: {} {} query={:?} body={}",
            method,
            url,
            query,
            payload.as_deref().unwrap_or("<none>")
        );

        let mut last_failure = None;

        for attempt in 1..=self.retry.max_attempts {
            if attempt > 1 {
                let delay = self.retry.delay_before_retry(attempt - 1);
                tracing::debug!(
                    "Retrying {} {} in {:?} (attempt {}/{})",
                    method,
                    url,
                    delay,
                    attempt,
                    self.retry.max_attempts
                );
                tokio::time::sleep(delay).await;
            }

            // Read per attempt: the supplier may rotate the token mid-run.
            let token = match self.tokens.access_token().await {
                Ok(token) => token,
                Err(e) => {
                    tracing::warn!(
                        "HTTP request {} {} query={:?} body={} has failed: {}",
                        method,
                        url,
                        query,
                        payload.as_deref().unwrap_or("<none>"),
                        e
                    );
                    return None;
                }
            };

            let mut request = self
                .client
                .request(method.clone(), url)
                .bearer_auth(token)
                .header(CONTENT_TYPE, "application/json")
                .timeout(self.retry.request_timeout);
            if let Some(query) = query {
                request = request.query(query);
            }
            if let Some(payload) = &payload {
                request = request.body(payload.clone());
            }

            let failure = match request.send().await {
                Ok(response) if RetryConfig::is_retryable(response.status()) => {
                    Retry::Status(response.status())
                }
                Ok(response) => {
                    let status = response.status();
                    match response.text().await {
                        Ok(text) => {
                            tracing::debug!("{} {} -> {}", method, url, status);
                            return Some(CallResponse::new(status, text));
                        }
                        Err(e) => Retry::Transport(e.to_string()),
                    }
                }
                Err(e) => Retry::Transport(e.to_string()),
            };

            tracing::debug!(
                "{} {} attempt {}/{} failed: {}",
                method,
                url,
                attempt,
                self.retry.max_attempts,
                failure
            );
            last_failure = Some(failure);
        }

        tracing::warn!(
            "HTTP request {} {} query={:?} body={} has failed after {} attempts: {}",
            method,
            url,
            query,
            payload.as_deref().unwrap_or("<none>"),
            self.retry.max_attempts,
            last_failure
                .map(|f| f.to_string())
                .unwrap_or_else(|| "no attempt made".to_string())
        );
        None
    }

    pub async fn get(&self, url: &str) -> Option<CallResponse> {
        self.execute(Method::GET, url, None, None).await
    }

    pub async fn post(&self, url: &str, body: &serde_json::Value) -> Option<CallResponse> {
        self.execute(Method::POST, url, None, Some(body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            backoff_factor: Duration::ZERO,
            request_timeout: Duration::from_secs(5),
            ..RetryConfig::default()
        }
    }

    fn executor() -> CallExecutor {
        CallExecutor::with_retry(Arc::new(StaticToken::new("test-token")), fast_retry()).unwrap()
    }

    async fn received(server: &MockServer) -> usize {
        server.received_requests().await.unwrap().len()
    }

    /// Fail with `status` on the first `failures` requests, then succeed
    async fn flaky_server(status: u16, failures: u64) -> MockServer {
        let server = MockServer::start().await;
        if failures > 0 {
            Mock::given(method("GET"))
                .and(path("/flaky"))
                .respond_with(ResponseTemplate::new(status))
                .up_to_n_times(failures)
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_before_retry(1), Duration::from_secs(1));
        assert_eq!(config.delay_before_retry(2), Duration::from_secs(2));
        assert_eq!(config.delay_before_retry(3), Duration::from_secs(4));
        assert_eq!(config.delay_before_retry(8), Duration::from_secs(120)); // capped
        assert_eq!(config.delay_before_retry(40), Duration::from_secs(120));
    }

    #[test]
    fn test_retryable_statuses() {
        for code in RETRYABLE_STATUSES {
            assert!(RetryConfig::is_retryable(StatusCode::from_u16(code).unwrap()));
        }
        assert!(!RetryConfig::is_retryable(StatusCode::UNAUTHORIZED));
        assert!(!RetryConfig::is_retryable(StatusCode::CONFLICT));
        assert!(!RetryConfig::is_retryable(StatusCode::OK));
    }

    #[tokio::test]
    async fn test_sends_auth_and_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"projectId": "my-test-project-123"})))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let response = executor()
            .post(
                &format!("{}/projects", server.uri()),
                &serde_json::json!({"projectId": "my-test-project-123"}),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_query_params_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apps"))
            .and(query_param("pageSize", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let response = executor()
            .execute(
                Method::GET,
                &format!("{}/apps", server.uri()),
                Some(&[("pageSize", "5")]),
                None,
            )
            .await;

        assert!(response.is_some());
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        for failures in [0u64, 1, 4, 9] {
            let server = flaky_server(503, failures).await;

            let response = executor()
                .get(&format!("{}/flaky", server.uri()))
                .await
                .expect("success within budget");

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(received(&server).await as u64, failures + 1);
        }
    }

    #[tokio::test]
    async fn test_retries_every_listed_status() {
        for status in RETRYABLE_STATUSES {
            let server = flaky_server(status, 2).await;
            let response = executor().get(&format!("{}/flaky", server.uri())).await;
            assert!(response.is_some(), "status {} should be retried", status);
            assert_eq!(received(&server).await, 3);
        }
    }

    #[tokio::test]
    async fn test_gives_up_after_ten_attempts() {
        let server = flaky_server(500, 10).await;

        let response = executor().get(&format!("{}/flaky", server.uri())).await;

        assert!(response.is_none());
        assert_eq!(received(&server).await, 10);
    }

    #[tokio::test]
    async fn test_does_not_retry_unlisted_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("denied"))
            .mount(&server)
            .await;

        let response = executor()
            .get(&format!("{}/secure", server.uri()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.text(), "denied");
        assert!(response.json::<serde_json::Value>().is_none());
        assert_eq!(received(&server).await, 1);
    }

    #[tokio::test]
    async fn test_connection_error_yields_none() {
        // Bind then drop a listener so the port refuses connections
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let response = executor()
            .get(&format!("http://127.0.0.1:{}/unreachable", port))
            .await;

        assert!(response.is_none());
    }

    #[test]
    fn test_call_response_json() {
        let response = CallResponse::new(StatusCode::OK, r#"{"projectId": "p"}"#);
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["projectId"], "p");

        let garbage = CallResponse::new(StatusCode::OK, "not json");
        assert!(garbage.json::<serde_json::Value>().is_none());
    }
}
