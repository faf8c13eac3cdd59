//! Client timing and reconnection options.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use hub_longpoll::{ClientOptions, ReconnectPolicy};
//!
//! let options = ClientOptions::new()
//!     .with_invocation_timeout(Duration::from_secs(10))
//!     .with_reconnect_policy(ReconnectPolicy::new().with_budget(8));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::session::ReconnectPolicy;

// ============================================================================
// Constants
// ============================================================================

/// Deadline for one `invoke`, from posting the frame to its completion.
pub const DEFAULT_INVOCATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for negotiate, handshake and send requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause after a poll failure that does not indicate connection loss.
pub const DEFAULT_RETRY_PAUSE: Duration = Duration::from_secs(2);

// ============================================================================
// ClientOptions
// ============================================================================

/// Timing configuration of a [`HubClient`](crate::HubClient).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Deadline for each invocation.
    pub invocation_timeout: Duration,

    /// Timeout for every request except the long-poll GET.
    pub request_timeout: Duration,

    /// Timeout for the long-poll GET. `None` leaves it open-ended; the hub
    /// decides when to answer.
    pub poll_timeout: Option<Duration>,

    /// Pause before retrying after a transient poll failure.
    pub retry_pause: Duration,

    /// Reconnection behaviour after connection loss.
    pub reconnect: ReconnectPolicy,
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            invocation_timeout: DEFAULT_INVOCATION_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll_timeout: None,
            retry_pause: DEFAULT_RETRY_PAUSE,
            reconnect: ReconnectPolicy::new(),
        }
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ClientOptions {
    /// Sets the invocation deadline.
    #[inline]
    #[must_use]
    pub const fn with_invocation_timeout(mut self, timeout: Duration) -> Self {
        self.invocation_timeout = timeout;
        self
    }

    /// Sets the timeout for non-poll requests.
    #[inline]
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Bounds the long-poll GET.
    #[inline]
    #[must_use]
    pub const fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = Some(timeout);
        self
    }

    /// Sets the pause after a transient poll failure.
    #[inline]
    #[must_use]
    pub const fn with_retry_pause(mut self, pause: Duration) -> Self {
        self.retry_pause = pause;
        self
    }

    /// Sets the reconnection policy.
    #[inline]
    #[must_use]
    pub const fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ClientOptions::default();

        assert_eq!(options.invocation_timeout, Duration::from_secs(30));
        assert_eq!(options.request_timeout, Duration::from_secs(30));
        assert_eq!(options.poll_timeout, None);
        assert_eq!(options.retry_pause, Duration::from_secs(2));
        assert_eq!(options.reconnect, ReconnectPolicy::new());
    }

    #[test]
    fn test_builder_chain() {
        let options = ClientOptions::new()
            .with_invocation_timeout(Duration::from_secs(5))
            .with_request_timeout(Duration::from_secs(10))
            .with_poll_timeout(Duration::from_secs(120))
            .with_retry_pause(Duration::from_millis(250))
            .with_reconnect_policy(ReconnectPolicy::disabled());

        assert_eq!(options.invocation_timeout, Duration::from_secs(5));
        assert_eq!(options.request_timeout, Duration::from_secs(10));
        assert_eq!(options.poll_timeout, Some(Duration::from_secs(120)));
        assert_eq!(options.retry_pause, Duration::from_millis(250));
        assert_eq!(options.reconnect.budget, 0);
    }
}
