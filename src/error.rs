//! Error types for the hub client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use hub_longpoll::{HubClient, Result};
//!
//! async fn example(client: &HubClient) -> Result<()> {
//!     let rooms = client.invoke("GetWarRooms", vec![]).await?;
//!     println!("{rooms}");
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidUrl`] |
//! | Session | [`Error::NotRunning`], [`Error::Negotiate`], [`Error::Handshake`], [`Error::ConnectionClosed`] |
//! | Transport | [`Error::Http`], [`Error::Network`], [`Error::UnsupportedMethod`] |
//! | Invocation | [`Error::Hub`], [`Error::InvocationTimeout`], [`Error::Protocol`] |
//! | External | [`Error::Json`], [`Error::ChannelClosed`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;

use crate::identifiers::InvocationId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when client configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Hub URL could not be parsed.
    #[error("Invalid hub URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// The session is not running.
    ///
    /// Returned by `invoke` before `start`, after `stop`, while a reconnect
    /// is in progress, or after the reconnect budget ran out.
    #[error("Connection not open")]
    NotRunning,

    /// Negotiation with the hub failed.
    #[error("Negotiate failed: {message}")]
    Negotiate {
        /// Description of the negotiate failure.
        message: String,
    },

    /// The hub rejected the protocol handshake.
    #[error("Handshake failed: {message}")]
    Handshake {
        /// Error message returned by the hub.
        message: String,
    },

    /// Session was torn down while a call was in flight.
    ///
    /// Returned to pending invocations on `stop`, reconnect, or server close.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Non-success HTTP status from the hub.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body or status reason.
        message: String,
    },

    /// Network-level failure (DNS, connect, reset, request timeout).
    #[error("Network error: {message}")]
    Network {
        /// Description of the network failure.
        message: String,
    },

    /// The transport cannot express this HTTP verb.
    #[error("Unsupported method: {method}")]
    UnsupportedMethod {
        /// The HTTP verb that is not supported.
        method: &'static str,
    },

    // ========================================================================
    // Invocation Errors
    // ========================================================================
    /// The hub completed an invocation with an error.
    #[error("{message}")]
    Hub {
        /// Error message from the completion frame.
        message: String,
    },

    /// No completion arrived before the invocation deadline.
    #[error("Invoke timeout for {method} (invocation {invocation_id}) after {timeout_ms}ms")]
    InvocationTimeout {
        /// Hub method that was invoked.
        method: String,
        /// Correlation id of the timed-out call.
        invocation_id: InvocationId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Protocol violation or unexpected payload.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a negotiate error.
    #[inline]
    pub fn negotiate(message: impl Into<String>) -> Self {
        Self::Negotiate {
            message: message.into(),
        }
    }

    /// Creates a handshake error.
    #[inline]
    pub fn handshake(message: impl Into<String>) -> Self {
        Self::Handshake {
            message: message.into(),
        }
    }

    /// Creates an HTTP status error.
    #[inline]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[inline]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates an unsupported method error.
    #[inline]
    pub fn unsupported_method(method: &'static str) -> Self {
        Self::UnsupportedMethod { method }
    }

    /// Creates a hub completion error.
    #[inline]
    pub fn hub(message: impl Into<String>) -> Self {
        Self::Hub {
            message: message.into(),
        }
    }

    /// Creates an invocation timeout error.
    #[inline]
    pub fn invocation_timeout(
        method: impl Into<String>,
        invocation_id: InvocationId,
        timeout_ms: u64,
    ) -> Self {
        Self::InvocationTimeout {
            method: method.into(),
            invocation_id,
            timeout_ms,
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::InvocationTimeout { .. })
    }

    /// Returns `true` if the poll loop should treat this as a lost session.
    ///
    /// The hub answers 404 for a connection token it no longer knows;
    /// network-level failures mean the hub is unreachable. Both require a
    /// fresh negotiate. Everything else is retried on the same session.
    #[inline]
    #[must_use]
    pub fn is_connection_loss(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. } | Self::Network { .. })
    }

    /// Returns `true` if this is a connection-level error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::NotRunning
                | Self::ConnectionClosed
                | Self::Network { .. }
                | Self::Negotiate { .. }
                | Self::Handshake { .. }
        )
    }

    /// Returns the HTTP status code, if this is an HTTP error.
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::http(503, "Service Unavailable");
        assert_eq!(err.to_string(), "HTTP 503: Service Unavailable");

        let err = Error::network("connection refused");
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn test_hub_error_display_is_raw_message() {
        let err = Error::hub("War room not found");
        assert_eq!(err.to_string(), "War room not found");
    }

    #[test]
    fn test_handshake_error_display() {
        let err = Error::handshake("unsupported protocol");
        assert_eq!(err.to_string(), "Handshake failed: unsupported protocol");
    }

    #[test]
    fn test_is_connection_loss() {
        assert!(Error::http(404, "Not Found").is_connection_loss());
        assert!(Error::network("reset").is_connection_loss());

        assert!(!Error::http(500, "Internal").is_connection_loss());
        assert!(!Error::http(401, "Unauthorized").is_connection_loss());
        assert!(!Error::protocol("bad").is_connection_loss());
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::invocation_timeout("GetWarRooms", InvocationId::new(3), 30_000);
        assert!(timeout_err.is_timeout());
        assert!(timeout_err.to_string().contains("GetWarRooms"));
        assert!(!Error::NotRunning.is_timeout());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::NotRunning.is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(Error::negotiate("boom").is_connection_error());
        assert!(!Error::config("test").is_connection_error());
    }

    #[test]
    fn test_status() {
        assert_eq!(Error::http(404, "x").status(), Some(404));
        assert_eq!(Error::NotRunning.status(), None);
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_from_url_error() {
        let url_err = url::Url::parse("not a url").unwrap_err();
        let err: Error = url_err.into();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
