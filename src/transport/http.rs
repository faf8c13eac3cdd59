//! `reqwest`-backed transport.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::trace;
use url::Url;

use crate::error::{Error, Result};

use super::HttpTransport;

// ============================================================================
// Constants
// ============================================================================

/// Content type the hub expects for frame bodies.
const TEXT_PLAIN_UTF8: &str = "text/plain;charset=UTF-8";

// ============================================================================
// ReqwestTransport
// ============================================================================

/// HTTP transport over a shared [`reqwest::Client`].
///
/// The client carries no global timeout; each request sets its own so the
/// poll GET can stay open for as long as the hub holds it.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with a fresh connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wraps an existing client (proxies, custom roots, user agent, ...).
    #[inline]
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Sends a request and maps the outcome onto the crate error contract.
    async fn execute(&self, request: RequestBuilder, timeout: Option<Duration>) -> Result<String> {
        let request = match timeout {
            Some(duration) => request.timeout(duration),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| Error::network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::network(e.to_string()))?;

        trace!(status = status.as_u16(), len = body.len(), "HTTP response");

        if status.is_success() {
            Ok(body)
        } else {
            Err(Error::http(status.as_u16(), error_message(status, &body)))
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url, bearer: &str, timeout: Option<Duration>) -> Result<String> {
        let request = self.client.get(url.clone()).bearer_auth(bearer);
        self.execute(request, timeout).await
    }

    async fn post(
        &self,
        url: &Url,
        bearer: &str,
        body: String,
        timeout: Option<Duration>,
    ) -> Result<String> {
        let request = self
            .client
            .post(url.clone())
            .bearer_auth(bearer)
            .header(CONTENT_TYPE, TEXT_PLAIN_UTF8)
            .body(body);
        self.execute(request, timeout).await
    }

    async fn delete(&self, url: &Url, bearer: &str, timeout: Option<Duration>) -> Result<()> {
        let request = self.client.delete(url.clone()).bearer_auth(bearer);
        self.execute(request, timeout).await.map(drop)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Fields hubs commonly use for error descriptions in JSON bodies.
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    title: Option<String>,
}

/// Picks the most descriptive error text available for a failed response.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error).or(b.title))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown status")
                .to_string()
        })
}

// ============================================================================
// Tests
// ============================================================================
