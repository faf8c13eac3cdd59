//! Type-safe identifiers for hub sessions and invocations.
//!
//! Newtype wrappers keep connection ids, connection tokens and invocation
//! correlation ids from being mixed up at compile time.
//!
//! | Type | Assigned by | Used for |
//! |------|-------------|----------|
//! | [`ConnectionId`] | Hub (negotiate) | Logging, diagnostics |
//! | [`ConnectionToken`] | Hub (negotiate) | Addressing poll/send/close requests |
//! | [`InvocationId`] | Client (counter) | Request/completion correlation |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// ConnectionId
// ============================================================================

/// Connection identifier assigned by the hub during negotiate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Creates a connection ID from a string.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// ConnectionToken
// ============================================================================

/// Token that addresses a negotiated session in `?id=` query parameters.
///
/// Falls back to the [`ConnectionId`] when the hub does not issue one.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionToken(String);

impl ConnectionToken {
    /// Creates a connection token from a string.
    #[inline]
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&ConnectionId> for ConnectionToken {
    fn from(id: &ConnectionId) -> Self {
        Self(id.0.clone())
    }
}

// Tokens address the session; keep them out of logs.
impl fmt::Debug for ConnectionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConnectionToken(..)")
    }
}

// ============================================================================
// InvocationId
// ============================================================================

/// Correlation id attached to a client invocation and echoed in its
/// completion.
///
/// Client-issued ids are the decimal form of a per-client counter starting
/// at 1. Ids arriving from the hub are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(String);

impl InvocationId {
    /// Creates an invocation ID from a counter value.
    #[inline]
    #[must_use]
    pub fn new(counter: u64) -> Self {
        Self(counter.to_string())
    }

    /// Returns the ID as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for InvocationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
