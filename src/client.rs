//! HTTP client for the chat backend.
//!
//! The backend exposes two endpoints relative to a configured base URL:
//!
//! - `GET ai/chat/string?message=<text>` answers with a plain-text reply.
//! - `GET actuator/health` answers 2xx while the service is up.
//!
//! [`ChatTransport`] is the seam the session talks through; [`ChatBackend`]
//! is the reqwest implementation.

use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response};
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_HEALTH_CHECKS, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS,
    CLIENT_TIMEOUTS,
};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Deadline for a whole chat exchange, body included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline for the health probe.
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Reply substituted for a successful response with an empty body.
pub const EMPTY_REPLY_FALLBACK: &str = "No response was received.";

const CHAT_PATH: &str = "ai/chat/string";
const HEALTH_PATH: &str = "actuator/health";

/// A way to reach the chat backend.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends one message and returns the plain-text reply.
    ///
    /// Implementations classify failures into the remote variants of
    /// [`Error`] and never retry.
    async fn ask(&self, message: &str) -> Result<String>;

    /// Probes whether the backend is reachable and healthy.
    async fn health(&self) -> bool;
}

/// Client for the chat backend.
#[derive(Debug, Clone)]
pub struct ChatBackend {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    health_timeout: Duration,
}

impl ChatBackend {
    /// Create a client for the backend at `base_url` with default timeouts.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_options(base_url, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        base_url: &str,
        timeout: Option<Duration>,
        health_timeout: Option<Duration>,
    ) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        let client = ReqwestClient::builder()
            .default_headers(Self::default_headers())
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
            health_timeout: health_timeout.unwrap_or(DEFAULT_HEALTH_TIMEOUT),
        })
    }

    /// The normalized base URL, always ending in `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The client-side deadline for a chat exchange.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the chat URL carrying `message` as its query parameter.
    pub fn chat_url(&self, message: &str) -> Result<Url> {
        let mut url = self.base_url.join(CHAT_PATH)?;
        url.query_pairs_mut().append_pair("message", message);
        Ok(url)
    }

    /// Builds the health probe URL.
    pub fn health_url(&self) -> Result<Url> {
        Ok(self.base_url.join(HEALTH_PATH)?)
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/plain"));
        headers
    }

    /// Convert a non-success response into our Error type.
    async fn process_error_response(response: Response) -> Error {
        let status = response.status();
        let status_code = status.as_u16();
        let reason = status
            .canonical_reason()
            .map(String::from)
            .unwrap_or_else(|| format!("status {status_code}"));
        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            reason.clone()
        } else {
            body
        };

        match status_code {
            404 => Error::not_found(message),
            500 => Error::internal_server(message),
            _ => Error::api(status_code, reason),
        }
    }

    async fn exchange(&self, url: Url) -> Result<String> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::timeout(
                    format!("Request timed out: {}", e),
                    Some(self.timeout.as_secs_f64()),
                )
            } else {
                Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
            }
        })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        response.text().await.map_err(|e| {
            Error::http_client(
                format!("Failed to read response body: {}", e),
                Some(Box::new(e)),
            )
        })
    }
}

#[async_trait::async_trait]
impl ChatTransport for ChatBackend {
    async fn ask(&self, message: &str) -> Result<String> {
        let url = self.chat_url(message)?;
        log::debug!(
            "GET {}{} ({} chars)",
            self.base_url,
            CHAT_PATH,
            message.chars().count()
        );
        CLIENT_REQUESTS.click();
        let start = Instant::now();

        // Dropping the exchange future on expiry aborts the request.
        let result = match tokio::time::timeout(self.timeout, self.exchange(url)).await {
            Ok(result) => result,
            Err(_) => {
                CLIENT_TIMEOUTS.click();
                Err(Error::timeout(
                    "request timed out",
                    Some(self.timeout.as_secs_f64()),
                ))
            }
        };
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        match result {
            Ok(body) => {
                log::debug!("reply of {} bytes in {:?}", body.len(), start.elapsed());
                if body.is_empty() {
                    Ok(EMPTY_REPLY_FALLBACK.to_string())
                } else {
                    Ok(body)
                }
            }
            Err(err) => {
                CLIENT_REQUEST_ERRORS.click();
                log::warn!("chat exchange failed: {err}");
                Err(err)
            }
        }
    }

    async fn health(&self) -> bool {
        CLIENT_HEALTH_CHECKS.click();
        let url = match self.health_url() {
            Ok(url) => url,
            Err(_) => return false,
        };
        let probe = self.client.get(url).send();
        match tokio::time::timeout(self.health_timeout, probe).await {
            Ok(Ok(response)) => {
                log::debug!("health probe answered {}", response.status());
                response.status().is_success()
            }
            Ok(Err(err)) => {
                log::debug!("health probe failed: {err}");
                false
            }
            Err(_) => {
                log::debug!("health probe timed out");
                false
            }
        }
    }
}

/// Parses `base_url` and ensures its path ends with `/` so endpoint paths
/// join beneath it rather than replacing its last segment.
fn normalize_base_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url.trim())?;
    if url.cannot_be_a_base() {
        return Err(Error::url(
            format!("base URL cannot be a base: {base_url}"),
            None,
        ));
    }
    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ChatBackend::new(DEFAULT_BASE_URL).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8080/");
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(client.health_timeout, DEFAULT_HEALTH_TIMEOUT);

        let client = ChatBackend::with_options(
            "https://chat.example.com/api",
            Some(Duration::from_secs(5)),
            Some(Duration::from_secs(1)),
        )
        .unwrap();
        assert_eq!(client.base_url().as_str(), "https://chat.example.com/api/");
        assert_eq!(client.timeout(), Duration::from_secs(5));
        assert_eq!(client.health_timeout, Duration::from_secs(1));
    }

    #[test]
    fn invalid_base_url() {
        let err = ChatBackend::new("not a url").unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
        let err = ChatBackend::new("mailto:someone@example.com").unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[test]
    fn chat_url_encodes_message() {
        let client = ChatBackend::new("http://localhost:8080").unwrap();
        let url = client.chat_url("what is 1+1 & why?").unwrap();
        assert_eq!(url.path(), "/ai/chat/string");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![("message".to_string(), "what is 1+1 & why?".to_string())]
        );
    }

    #[test]
    fn chat_url_keeps_base_path() {
        let client = ChatBackend::new("http://example.com/backend?x=1#frag").unwrap();
        let url = client.chat_url("hi").unwrap();
        assert_eq!(url.as_str(), "http://example.com/backend/ai/chat/string?message=hi");
    }

    #[test]
    fn health_url() {
        let client = ChatBackend::new("http://localhost:8080/").unwrap();
        assert_eq!(
            client.health_url().unwrap().as_str(),
            "http://localhost:8080/actuator/health"
        );
    }
}
