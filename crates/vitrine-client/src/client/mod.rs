//! HTTP client for the storefront REST API.

mod auth;
mod cart;
mod catalog;

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use vitrine_core::AppConfig;

use crate::error::ApiError;
use crate::rate_limit::retry_with_backoff;

/// Message used when a failed response carries no server-provided message.
pub(crate) const GENERIC_FAILURE: &str = "API request failed";

/// Transport tuning shared by every request an [`ApiClient`] sends.
#[derive(Clone)]
pub struct TransportOptions {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Additional attempts after the first failure for retriable errors.
    pub max_retries: u32,
    /// Base delay for exponential backoff: `backoff_base_secs * 2^attempt`.
    pub backoff_base_secs: u64,
    pub session_token: Option<String>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "vitrine/0.1 (storefront-client)".to_owned(),
            max_retries: 3,
            backoff_base_secs: 2,
            session_token: None,
        }
    }
}

impl TransportOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.http_timeout_secs,
            user_agent: config.http_user_agent.clone(),
            max_retries: config.http_max_retries,
            backoff_base_secs: config.http_backoff_base_secs,
            session_token: config.session_token.clone(),
        }
    }
}

/// Client for the storefront REST API.
///
/// Every request is JSON in and out and carries the configured credential.
/// HTTP 429 and network failures are retried with exponential backoff; any
/// other non-2xx response becomes [`ApiError::Status`] with the server's
/// message, except 401/404 from `auth/` endpoints, which become
/// [`ApiError::Unauthenticated`].
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_secs: u64,
    session_token: Option<String>,
}

impl ApiClient {
    /// Creates a client from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidBaseUrl`] if `api_base_url` is not an
    /// absolute http(s) URL, or [`ApiError::Http`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        Self::with_base_url(&config.api_base_url, TransportOptions::from_config(config))
    }

    /// Creates a client against an explicit base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::new`].
    pub fn with_base_url(base_url: &str, options: TransportOptions) -> Result<Self, ApiError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed).map_err(|e| ApiError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: "expected an absolute http(s) URL".to_owned(),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(options.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: parsed,
            max_retries: options.max_retries,
            backoff_base_secs: options.backoff_base_secs,
            session_token: options.session_token,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the URL for `segments` under the base path, percent-encoding
    /// each segment and appending `query` pairs.
    fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: "URL cannot carry a path".to_owned(),
            })?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    pub(crate) async fn get_json(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<Value, ApiError> {
        self.send_json::<()>(Method::GET, segments, query, None).await
    }

    /// Sends one request with retry and maps the response to JSON.
    ///
    /// A 2xx response with an empty body yields `Value::Null`. A 2xx body of
    /// the form `{"success": false, ...}` is treated as a failed request.
    ///
    /// # Errors
    ///
    /// - [`ApiError::RateLimited`]: HTTP 429 after all retries exhausted.
    /// - [`ApiError::Http`]: network failure after all retries exhausted.
    /// - [`ApiError::Unauthenticated`]: 401/404 from an `auth/` endpoint.
    /// - [`ApiError::Status`]: any other non-2xx status (not retried).
    /// - [`ApiError::Deserialize`]: 2xx body is not valid JSON (not retried).
    pub(crate) async fn send_json<B>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = self.endpoint(segments, query)?;
        let is_auth_endpoint = segments.first() == Some(&"auth");

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            let method = method.clone();
            async move {
                let mut request = self
                    .client
                    .request(method, url.clone())
                    .header(CONTENT_TYPE, "application/json")
                    .header(ACCEPT, "application/json");
                if let Some(token) = &self.session_token {
                    request = request.bearer_auth(token);
                }
                if let Some(body) = body {
                    request = request.json(body);
                }

                let response = request.send().await?;
                let status = response.status();

                if status == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok());
                    return Err(ApiError::RateLimited {
                        url: url.to_string(),
                        retry_after_secs,
                    });
                }

                if is_auth_endpoint
                    && (status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND)
                {
                    return Err(ApiError::Unauthenticated {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }

                let text = response.text().await?;

                if !status.is_success() {
                    return Err(ApiError::Status {
                        status: status.as_u16(),
                        url: url.to_string(),
                        message: server_message(&text),
                    });
                }

                parse_success_body(&text, status, &url)
            }
        })
        .await
    }
}

/// Extracts the server's `message` (or `error`) string from an error body.
fn server_message(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|body| {
            body.get("message")
                .or_else(|| body.get("error"))
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE.to_owned())
}

fn parse_success_body(text: &str, status: StatusCode, url: &Url) -> Result<Value, ApiError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    let body: Value = serde_json::from_str(text).map_err(|e| ApiError::Deserialize {
        context: url.to_string(),
        source: e,
    })?;
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(ApiError::Status {
            status: status.as_u16(),
            url: url.to_string(),
            message: server_message(text),
        });
    }
    Ok(body)
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
