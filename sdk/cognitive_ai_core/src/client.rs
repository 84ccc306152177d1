//! HTTP client for cognitive services.
//!
//! This module provides [`CognitiveClient`], the entry point for interacting
//! with the service REST APIs. The client handles authentication, HTTP
//! transport, versioning, and transient-error retries.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cognitive_ai_core::client::CognitiveClient;
//! use cognitive_ai_core::auth::ServiceCredential;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CognitiveClient::builder()
//!     .endpoint("https://gateway.cognitive.example.com/visual-recognition/api")
//!     .credential(ServiceCredential::api_key("your-key"))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::auth::ServiceCredential;
use crate::error::{is_retriable_status, CognitiveError, CognitiveResult};
use reqwest::Client as HttpClient;
use url::Url;

use std::time::Duration;

/// Default service version date sent with every request.
pub const DEFAULT_VERSION: &str = "2018-03-19";

/// Default connection timeout (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default read/response timeout (2 minutes).
///
/// Classifier training uploads carry zip archives of example images, so the
/// read timeout is more generous than a typical JSON API would need.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for automatic retry behavior on transient errors.
///
/// Applies to idempotent JSON calls ([`CognitiveClient::get`] and
/// [`CognitiveClient::post_json`]). Multipart uploads and deletions are
/// single-attempt; see [`CognitiveClient::post_multipart`] and
/// [`CognitiveClient::delete`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (not counting the initial request).
    pub max_retries: u32,
    /// Initial backoff duration before the first retry.
    /// Subsequent retries use exponential backoff (2^attempt * initial_backoff).
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

/// The base client for interacting with cognitive service APIs.
///
/// Handles authentication, HTTP transport, and endpoint management. Service
/// crates (`cognitive_ai_vision`) build their endpoint bindings on top of it.
///
/// The client is cheaply cloneable and can be shared across threads.
#[derive(Debug, Clone)]
pub struct CognitiveClient {
    pub(crate) http: HttpClient,
    pub(crate) endpoint: Url,
    pub(crate) credential: ServiceCredential,
    pub(crate) version: String,
    pub(crate) retry_policy: RetryPolicy,
}

/// Builder for constructing a [`CognitiveClient`].
///
/// Use [`CognitiveClient::builder()`] to create a new builder.
#[derive(Debug, Default)]
pub struct CognitiveClientBuilder {
    endpoint: Option<String>,
    credential: Option<ServiceCredential>,
    version: Option<String>,
    http_client: Option<HttpClient>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    retry_policy: Option<RetryPolicy>,
}

impl CognitiveClient {
    /// Create a new builder for configuring a `CognitiveClient`.
    pub fn builder() -> CognitiveClientBuilder {
        CognitiveClientBuilder::default()
    }

    /// Get the base endpoint URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Get the service version date being used.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Get the retry policy configuration.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Build a full URL for an API path, appending the `version` query
    /// parameter the service requires on every call.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be joined to the endpoint URL.
    pub fn url(&self, path: &str) -> CognitiveResult<Url> {
        let mut url = self.endpoint.join(path).map_err(|e| {
            CognitiveError::invalid_endpoint_with_source("failed to construct URL", e)
        })?;
        url.query_pairs_mut().append_pair("version", &self.version);
        Ok(url)
    }

    /// Send a GET request with automatic retry on transient errors.
    ///
    /// Retries on retriable HTTP statuses (429, 500, 502, 503, 504) with
    /// exponential backoff and jitter.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails, the request fails after all
    /// retries, or the server returns a non-retriable error response.
    pub async fn get(&self, path: &str) -> CognitiveResult<reqwest::Response> {
        let url = self.url(path)?;
        let auth = self.credential.resolve()?;

        for attempt in 0..=self.retry_policy.max_retries {
            let response = self
                .http
                .get(url.clone())
                .header("Authorization", &auth)
                .send()
                .await?;

            let status = response.status().as_u16();

            if response.status().is_success() {
                return Ok(response);
            }

            if !is_retriable_status(status) || attempt == self.retry_policy.max_retries {
                return Self::check_response(response).await;
            }

            tracing::debug!(status, attempt, "retriable status, backing off");
            tokio::time::sleep(self.backoff_for(attempt)).await;
        }

        unreachable!("retry loop should return before reaching here")
    }

    /// Send a POST request with a JSON body and automatic retry on transient
    /// errors.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails, serialization fails, the
    /// request fails after all retries, or the server returns a non-retriable
    /// error response.
    pub async fn post_json<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> CognitiveResult<reqwest::Response> {
        let url = self.url(path)?;
        let auth = self.credential.resolve()?;

        for attempt in 0..=self.retry_policy.max_retries {
            let response = self
                .http
                .post(url.clone())
                .header("Authorization", &auth)
                .json(body)
                .send()
                .await?;

            let status = response.status().as_u16();

            if response.status().is_success() {
                return Ok(response);
            }

            if !is_retriable_status(status) || attempt == self.retry_policy.max_retries {
                return Self::check_response(response).await;
            }

            tracing::debug!(status, attempt, "retriable status, backing off");
            tokio::time::sleep(self.backoff_for(attempt)).await;
        }

        unreachable!("retry loop should return before reaching here")
    }

    /// Send a POST request with a multipart form body.
    ///
    /// Single attempt: multipart bodies are consumed when sent and cannot be
    /// replayed, so no transport-level retry happens here. Callers that need
    /// retries rebuild the form per attempt (see the training workflow in
    /// `cognitive_ai_vision`).
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails, the request fails, or the
    /// server returns an error response.
    pub async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> CognitiveResult<reqwest::Response> {
        let url = self.url(path)?;
        let auth = self.credential.resolve()?;

        let response = self
            .http
            .post(url)
            .header("Authorization", &auth)
            .multipart(form)
            .send()
            .await?;

        Self::check_response(response).await
    }

    /// Send a GET request without retrying.
    ///
    /// Single attempt: any failure propagates directly to the caller. Used
    /// for downloads where the caller owns the retry decision.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails, the request fails, or the
    /// server returns an error response.
    pub async fn get_once(&self, path: &str) -> CognitiveResult<reqwest::Response> {
        let url = self.url(path)?;
        let auth = self.credential.resolve()?;

        let response = self
            .http
            .get(url)
            .header("Authorization", &auth)
            .send()
            .await?;

        Self::check_response(response).await
    }

    /// Send a DELETE request.
    ///
    /// Single attempt: deletions are never retried automatically and any
    /// failure propagates directly to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails, the request fails, or the
    /// server returns an error response.
    pub async fn delete(&self, path: &str) -> CognitiveResult<reqwest::Response> {
        let url = self.url(path)?;
        let auth = self.credential.resolve()?;

        let response = self
            .http
            .delete(url)
            .header("Authorization", &auth)
            .send()
            .await?;

        Self::check_response(response).await
    }

    /// Exponential backoff with ±25% jitter for the given attempt number.
    ///
    /// The doubling factor saturates so large attempt numbers cannot
    /// overflow.
    fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.checked_pow(attempt).unwrap_or(u32::MAX);
        let base = self.retry_policy.initial_backoff.saturating_mul(factor);
        let jitter = 0.75 + fastrand::f64() * 0.5;
        base.mul_f64(jitter)
    }

    /// Maximum length for error messages to prevent sensitive data leaks.
    const MAX_ERROR_MESSAGE_LEN: usize = 1000;

    /// Redact bearer tokens and API keys from a message, then truncate it.
    pub(crate) fn truncate_message(msg: &str) -> String {
        let mut sanitized = String::with_capacity(msg.len());
        for word in msg.split_inclusive(char::is_whitespace) {
            let trimmed = word.trim_end();
            let prior_bearer = sanitized.trim_end().ends_with("Bearer");
            if prior_bearer || trimmed.starts_with("sk-") {
                sanitized.push_str("[REDACTED]");
                sanitized.push_str(&word[trimmed.len()..]);
            } else {
                sanitized.push_str(word);
            }
        }

        if sanitized.len() > Self::MAX_ERROR_MESSAGE_LEN {
            let mut end = Self::MAX_ERROR_MESSAGE_LEN;
            while !sanitized.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated)", &sanitized[..end])
        } else {
            sanitized
        }
    }

    /// Check the response status and return an error if not successful.
    async fn check_response(response: reqwest::Response) -> CognitiveResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        // Structured service errors look like {"error": {"code", "message"}}.
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
            if let Some(err_obj) = value.get("error") {
                return Err(CognitiveError::Api {
                    status,
                    code: err_obj
                        .get("code")
                        .and_then(|c| c.as_str())
                        .unwrap_or("unknown")
                        .to_string(),
                    message: Self::truncate_message(
                        err_obj
                            .get("message")
                            .and_then(|m| m.as_str())
                            .unwrap_or(&body),
                    ),
                });
            }
        }

        Err(CognitiveError::Http {
            status,
            message: Self::truncate_message(&body),
        })
    }
}

impl CognitiveClientBuilder {
    /// Set the service endpoint URL.
    ///
    /// If not set, the builder will check the `COGNITIVE_AI_ENDPOINT`
    /// environment variable.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the credential to use for authentication.
    ///
    /// If not set, the builder will use [`ServiceCredential::from_env()`],
    /// which checks `COGNITIVE_AI_API_KEY` and falls back to a
    /// platform-provided bearer token.
    pub fn credential(mut self, credential: ServiceCredential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Set the service version date.
    ///
    /// Defaults to [`DEFAULT_VERSION`].
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set a custom HTTP client.
    ///
    /// Use this to configure proxies or other HTTP settings.
    ///
    /// **Note:** If you provide a custom HTTP client, any timeout
    /// configuration via [`connect_timeout`](Self::connect_timeout) or
    /// [`read_timeout`](Self::read_timeout) will be ignored.
    pub fn http_client(mut self, client: HttpClient) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the read timeout.
    ///
    /// Covers the entire request/response cycle including reading the body.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Set the retry policy for transient errors on idempotent calls.
    ///
    /// Defaults to 3 retries with 500ms initial backoff.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Build the `CognitiveClient`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No endpoint is provided and `COGNITIVE_AI_ENDPOINT` is not set
    /// - The endpoint URL is invalid
    pub fn build(self) -> CognitiveResult<CognitiveClient> {
        let http = self.http_client.unwrap_or_else(|| {
            let connect_timeout = self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
            let read_timeout = self.read_timeout.unwrap_or(DEFAULT_READ_TIMEOUT);

            reqwest::Client::builder()
                .connect_timeout(connect_timeout)
                .timeout(read_timeout)
                .build()
                .expect("failed to build HTTP client")
        });

        let endpoint_str = self
            .endpoint
            .or_else(|| std::env::var("COGNITIVE_AI_ENDPOINT").ok())
            .ok_or_else(|| {
                CognitiveError::MissingConfig(
                    "endpoint is required. Set it via builder or COGNITIVE_AI_ENDPOINT env var."
                        .into(),
                )
            })?;

        let endpoint = Url::parse(&endpoint_str).map_err(|e| {
            CognitiveError::invalid_endpoint_with_source("invalid endpoint URL", e)
        })?;

        let credential = self
            .credential
            .map(Ok)
            .unwrap_or_else(ServiceCredential::from_env)?;

        Ok(CognitiveClient {
            http,
            endpoint,
            credential,
            version: self.version.unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            retry_policy: self.retry_policy.unwrap_or_default(),
        })
    }
}
