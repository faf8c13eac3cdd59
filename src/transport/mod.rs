//! HTTP transport layer.
//!
//! The session only needs four request shapes from the outside world, so the
//! transport is a narrow async trait. [`ReqwestTransport`] is the default
//! implementation; embedders with their own HTTP bridge implement
//! [`HttpTransport`] directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  HubClient      │  POST /negotiate             │  Hub            │
//! │                 │─────────────────────────────►│                 │
//! │  Session        │  POST ?id=token  (frames)    │  Long-polling   │
//! │  → Transport    │─────────────────────────────►│  endpoint       │
//! │                 │  GET  ?id=token  (held open) │                 │
//! │                 │◄─────────────────────────────│                 │
//! └─────────────────┘  DELETE ?id=token (optional) └─────────────────┘
//! ```
//!
//! # Error Contract
//!
//! Implementations must map failures onto the crate error so the poll loop
//! can classify them:
//!
//! - non-2xx status → [`Error::Http`] with the status code
//! - anything below HTTP (DNS, connect, reset, timeout) → [`Error::Network`]
//! - a verb the platform cannot issue → [`Error::UnsupportedMethod`]
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `http` | `reqwest`-backed transport |

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Submodules
// ============================================================================

/// `reqwest`-backed transport.
pub mod http;

#[cfg(test)]
pub(crate) mod scripted;

// ============================================================================
// Re-exports
// ============================================================================

pub use http::ReqwestTransport;

// ============================================================================
// HttpTransport
// ============================================================================

/// Minimal HTTP surface used by the hub session.
///
/// Every request carries the bearer credential the client was built with.
/// `timeout` is `None` for an open-ended request (the poll GET by default).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issues a GET and returns the response body.
    async fn get(&self, url: &Url, bearer: &str, timeout: Option<Duration>) -> Result<String>;

    /// Issues a POST with a `text/plain` body and returns the response body.
    async fn post(
        &self,
        url: &Url,
        bearer: &str,
        body: String,
        timeout: Option<Duration>,
    ) -> Result<String>;

    /// Issues a DELETE.
    ///
    /// The default reports [`Error::UnsupportedMethod`]; the session then
    /// skips the close notification and leaves the hub to reap the session.
    async fn delete(&self, url: &Url, bearer: &str, timeout: Option<Duration>) -> Result<()> {
        let _ = (url, bearer, timeout);
        Err(Error::unsupported_method("DELETE"))
    }
}
